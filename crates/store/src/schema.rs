//! The on-disk schema. `max_value`/`solution_set` are stored as decimal
//! text rather than an integer column since values can exceed 64 bits for
//! large N; `get_best_bound`'s `ORDER BY length(x), x` trick recovers
//! correct numeric ordering over those text columns without a custom
//! collation.

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS results (
    id                   INTEGER PRIMARY KEY,
    n                    INTEGER NOT NULL,
    max_value            TEXT NOT NULL,
    solution_set         TEXT NOT NULL,
    status               TEXT NOT NULL,
    nodes_explored       INTEGER NOT NULL,
    elapsed_seconds      REAL NOT NULL,
    completion_timestamp INTEGER NOT NULL,
    UNIQUE(n, max_value, solution_set)
);

CREATE INDEX IF NOT EXISTS results_n_idx ON results(n);
CREATE INDEX IF NOT EXISTS results_status_idx ON results(status);

CREATE TABLE IF NOT EXISTS optimal_sets (
    id           INTEGER PRIMARY KEY,
    n            INTEGER NOT NULL,
    solution_set TEXT NOT NULL,
    UNIQUE(n, solution_set)
);

CREATE INDEX IF NOT EXISTS optimal_sets_n_idx ON optimal_sets(n);

INSERT INTO schema_version (version)
SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM schema_version);
";
