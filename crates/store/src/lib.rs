//! SQLite-backed persistence for solver results, so a multi-N run can
//! resume, seed later runs with known bounds, and report aggregate
//! progress without re-deriving it from log output.

mod schema;

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use erdos_bigint::BigUint;
use erdos_engine::{SolutionResult, SolutionStatus};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed solution set in database: {0}")]
    MalformedSolutionSet(String),
    #[error("malformed status in database: {0}")]
    MalformedStatus(String),
}

/// Summary counters over every `n` the store has ever recorded a result
/// for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_results: u64,
    pub total_optimal: u64,
    pub min_n: Option<usize>,
    pub max_n: Option<usize>,
    pub total_nodes_explored: u64,
}

/// A single persisted result row, decoded back into domain types.
#[derive(Debug, Clone)]
pub struct StoredResult {
    pub target_n: usize,
    pub max_value: BigUint,
    pub solution: Vec<BigUint>,
    pub status: SolutionStatus,
    pub nodes_explored: u64,
    pub elapsed_seconds: f64,
    pub completion_timestamp: SystemTime,
}

/// Thread-safe handle onto the results database. Cheap to clone-share via
/// `Arc` across a worker pool; every operation takes the lock for the
/// duration of one statement.
pub struct ResultStore {
    conn: Mutex<Connection>,
}

impl ResultStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        // WAL plus a busy timeout covers SQLite's own file-locking side of
        // concurrent access; the in-process Mutex below still serializes
        // every statement, since WAL alone doesn't give the ordering
        // guarantees a worker pool's save-then-read sequencing wants.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(schema::SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// The smallest `max_value` recorded for `n`, if any — a candidate seed
    /// for `SolverConfig::with_initial_bound` on a later run.
    pub fn get_best_bound(&self, n: usize) -> Result<Option<BigUint>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let value: Option<String> = conn
            .query_row(
                "SELECT max_value FROM results WHERE n = ?1 \
                 ORDER BY length(max_value) ASC, max_value ASC LIMIT 1",
                params![n as i64],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|s| parse_biguint(&s))
            .transpose()
    }

    pub fn has_optimal(&self, n: usize) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM results WHERE n = ?1 AND status = 'OPTIMAL')",
            params![n as i64],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Idempotent: the same `(n, max_value, solution)` triple is recorded
    /// at most once, so re-running a completed N is safe.
    pub fn save_result(&self, result: &SolutionResult) -> Result<(), StoreError> {
        let Some(max_value) = result.max_value.as_ref() else {
            return Ok(());
        };
        let solution_set = encode_solution(&result.solution);
        let timestamp = result
            .completion_timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64;

        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO results \
             (n, max_value, solution_set, status, nodes_explored, elapsed_seconds, completion_timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.target_n as i64,
                max_value.to_string(),
                solution_set,
                result.status.as_str(),
                result.nodes_explored as i64,
                result.elapsed_seconds,
                timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn save_optima(&self, n: usize, optima: &[Vec<BigUint>]) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        for solution in optima {
            conn.execute(
                "INSERT OR IGNORE INTO optimal_sets (n, solution_set) VALUES (?1, ?2)",
                params![n as i64, encode_solution(solution)],
            )?;
        }
        Ok(())
    }

    /// The most recently completed result for `n`, preferring a proven
    /// `OPTIMAL` row over a merely `FEASIBLE` one.
    pub fn load_result(&self, n: usize) -> Result<Option<StoredResult>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let row = conn
            .query_row(
                "SELECT max_value, solution_set, status, nodes_explored, elapsed_seconds, completion_timestamp \
                 FROM results WHERE n = ?1 \
                 ORDER BY (status = 'OPTIMAL') DESC, completion_timestamp DESC LIMIT 1",
                params![n as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((max_value, solution_set, status, nodes_explored, elapsed_seconds, timestamp)) = row
        else {
            return Ok(None);
        };

        Ok(Some(StoredResult {
            target_n: n,
            max_value: parse_biguint(&max_value)?,
            solution: decode_solution(&solution_set)?,
            status: status
                .parse()
                .map_err(|_| StoreError::MalformedStatus(status.clone()))?,
            nodes_explored: nodes_explored as u64,
            elapsed_seconds,
            completion_timestamp: UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64),
        }))
    }

    pub fn load_optima(&self, n: usize) -> Result<Vec<Vec<BigUint>>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT solution_set FROM optimal_sets WHERE n = ?1")?;
        let rows = stmt.query_map(params![n as i64], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode_solution(&row?)?);
        }
        Ok(out)
    }

    /// Every distinct `n` with at least one stored result, ascending.
    pub fn list_known_n(&self) -> Result<Vec<usize>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT DISTINCT n FROM results ORDER BY n ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        rows.map(|r| r.map(|v| v as usize).map_err(StoreError::from))
            .collect()
    }

    pub fn aggregate_stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT COUNT(*), \
                    COALESCE(SUM(status = 'OPTIMAL'), 0), \
                    MIN(n), MAX(n), \
                    COALESCE(SUM(nodes_explored), 0) \
             FROM results",
            [],
            |row| {
                Ok(StoreStats {
                    total_results: row.get::<_, i64>(0)? as u64,
                    total_optimal: row.get::<_, i64>(1)? as u64,
                    min_n: row.get::<_, Option<i64>>(2)?.map(|v| v as usize),
                    max_n: row.get::<_, Option<i64>>(3)?.map(|v| v as usize),
                    total_nodes_explored: row.get::<_, i64>(4)? as u64,
                })
            },
        )
        .map_err(StoreError::from)
    }
}

/// Renders as `[1, 2, 5, 11, 22, 40]`, the result-store's textual
/// text format.
fn encode_solution(solution: &[BigUint]) -> String {
    let inner = solution
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

fn decode_solution(encoded: &str) -> Result<Vec<BigUint>, StoreError> {
    let inner = encoded
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| StoreError::MalformedSolutionSet(encoded.to_string()))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner.split(", ").map(parse_biguint).collect()
}

fn parse_biguint(s: &str) -> Result<BigUint, StoreError> {
    s.parse()
        .map_err(|_| StoreError::MalformedSolutionSet(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use erdos_engine::SolutionStatus;

    fn sample_result(n: usize, max: u64, status: SolutionStatus) -> SolutionResult {
        SolutionResult {
            target_n: n,
            max_value: Some(BigUint::from_u64(max)),
            solution: (1..=max).filter(|v| *v <= max).map(BigUint::from_u64).take(n).collect(),
            elapsed_seconds: 0.1,
            status,
            nodes_explored: 42,
            completion_timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = ResultStore::open_in_memory().unwrap();
        let result = sample_result(4, 7, SolutionStatus::Optimal);
        store.save_result(&result).unwrap();

        let loaded = store.load_result(4).unwrap().unwrap();
        assert_eq!(loaded.max_value, BigUint::from_u64(7));
        assert_eq!(loaded.status, SolutionStatus::Optimal);
        assert_eq!(loaded.nodes_explored, 42);
    }

    #[test]
    fn save_result_is_idempotent() {
        let store = ResultStore::open_in_memory().unwrap();
        let result = sample_result(4, 7, SolutionStatus::Optimal);
        store.save_result(&result).unwrap();
        store.save_result(&result).unwrap();
        let stats = store.aggregate_stats().unwrap();
        assert_eq!(stats.total_results, 1);
    }

    #[test]
    fn has_optimal_reflects_status() {
        let store = ResultStore::open_in_memory().unwrap();
        assert!(!store.has_optimal(5).unwrap());
        store
            .save_result(&sample_result(5, 13, SolutionStatus::Feasible))
            .unwrap();
        assert!(!store.has_optimal(5).unwrap());
        store
            .save_result(&sample_result(5, 13, SolutionStatus::Optimal))
            .unwrap();
        assert!(store.has_optimal(5).unwrap());
    }

    #[test]
    fn best_bound_picks_smallest_by_numeric_value_not_string_order() {
        let store = ResultStore::open_in_memory().unwrap();
        store
            .save_result(&sample_result(6, 9_999, SolutionStatus::Feasible))
            .unwrap();
        store
            .save_result(&sample_result(6, 24, SolutionStatus::Feasible))
            .unwrap();
        let best = store.get_best_bound(6).unwrap().unwrap();
        assert_eq!(best, BigUint::from_u64(24));
    }

    #[test]
    fn save_and_load_optima() {
        let store = ResultStore::open_in_memory().unwrap();
        let a = vec![BigUint::from_u64(3), BigUint::from_u64(5), BigUint::from_u64(6), BigUint::from_u64(7)];
        let b = vec![BigUint::from_u64(1), BigUint::from_u64(2), BigUint::from_u64(4), BigUint::from_u64(7)];
        store.save_optima(4, std::slice::from_ref(&a)).unwrap();
        store.save_optima(4, std::slice::from_ref(&b)).unwrap();
        let loaded = store.load_optima(4).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn open_persists_across_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");

        {
            let store = ResultStore::open(&path).unwrap();
            store
                .save_result(&sample_result(4, 7, SolutionStatus::Optimal))
                .unwrap();
        }

        let reopened = ResultStore::open(&path).unwrap();
        let loaded = reopened.load_result(4).unwrap().unwrap();
        assert_eq!(loaded.max_value, BigUint::from_u64(7));
    }

    #[test]
    fn aggregate_stats_over_multiple_n() {
        let store = ResultStore::open_in_memory().unwrap();
        store
            .save_result(&sample_result(4, 7, SolutionStatus::Optimal))
            .unwrap();
        store
            .save_result(&sample_result(5, 13, SolutionStatus::Optimal))
            .unwrap();
        let stats = store.aggregate_stats().unwrap();
        assert_eq!(stats.total_results, 2);
        assert_eq!(stats.total_optimal, 2);
        assert_eq!(stats.min_n, Some(4));
        assert_eq!(stats.max_n, Some(5));
    }
}
