use std::path::PathBuf;

use clap::Parser;

/// Branch-and-bound search for minimal-max Sidon-like (B_h) sequences.
#[derive(Debug, Parser)]
#[command(name = "erdos_solver", version, about)]
pub struct Cli {
    /// Solve exactly this N.
    #[arg(short = 'n', long = "n")]
    pub n: Option<usize>,

    /// First N in a range (default: last-solved+1 from the store, or 1).
    #[arg(short = 's', long = "start-n")]
    pub start_n: Option<usize>,

    /// Last N in a range.
    #[arg(short = 'm', long = "max-n")]
    pub max_n: Option<usize>,

    /// Concurrent engines when solving a range.
    #[arg(short = 'w', long = "workers", default_value_t = 1)]
    pub workers: usize,

    /// Result-store path.
    #[arg(short = 'd', long = "db", default_value = "erdos_solver.db")]
    pub db: PathBuf,

    /// Enumerate every sequence tied for the optimal max.
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Stop at the first admissible full completion.
    #[arg(short = 'f', long = "first-only")]
    pub first_only: bool,

    /// Print stored result(s). Bare `--show` prints every stored N.
    #[arg(long = "show", num_args = 0..=1, default_missing_value = "")]
    pub show: Option<String>,

    /// Print result-store aggregates.
    #[arg(long = "stats")]
    pub stats: bool,

    /// Debug-level logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// What the parsed CLI invocation resolves to, once `--n` vs
/// `--start-n`/`--max-n` vs `--show`/`--stats` are disambiguated.
pub enum Command {
    Solve { start_n: usize, max_n: usize, workers: usize },
    Show(Option<usize>),
    Stats,
}

impl Cli {
    pub fn command(&self, last_solved: impl FnOnce() -> usize) -> Command {
        if self.stats {
            return Command::Stats;
        }
        if let Some(show) = &self.show {
            let n = if show.is_empty() { None } else { show.parse().ok() };
            return Command::Show(n);
        }
        if let Some(n) = self.n {
            return Command::Solve {
                start_n: n,
                max_n: n,
                workers: 1,
            };
        }
        let start_n = self.start_n.unwrap_or_else(|| last_solved() + 1);
        let max_n = self.max_n.unwrap_or(start_n);
        Command::Solve {
            start_n,
            max_n,
            workers: self.workers.max(1),
        }
    }
}
