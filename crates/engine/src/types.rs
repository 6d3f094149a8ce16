use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use erdos_bigint::BigUint;
use erdos_oracle::OracleKind;

/// Immutable configuration for one `solve()` call.
#[derive(Clone)]
pub struct SolverConfig {
    pub target_n: usize,
    /// `None` means "derive the default `2^(N-1)+1` bound".
    pub initial_bound: Option<BigUint>,
    pub find_all_optima: bool,
    pub first_only: bool,
    pub oracle_kind: OracleKind,
    pub log_interval_sec: f64,
    pub stop_flag: Arc<AtomicBool>,
}

impl SolverConfig {
    pub fn new(target_n: usize) -> Self {
        Self {
            target_n,
            initial_bound: None,
            find_all_optima: false,
            first_only: false,
            oracle_kind: OracleKind::Auto,
            log_interval_sec: 5.0,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_initial_bound(mut self, bound: BigUint) -> Self {
        self.initial_bound = Some(bound);
        self
    }

    pub fn with_find_all_optima(mut self, yes: bool) -> Self {
        self.find_all_optima = yes;
        self
    }

    pub fn with_first_only(mut self, yes: bool) -> Self {
        self.first_only = yes;
        self
    }

    pub fn with_oracle_kind(mut self, kind: OracleKind) -> Self {
        self.oracle_kind = kind;
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = flag;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    Optimal,
    Feasible,
    NoSolution,
    Timeout,
    Interrupted,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Feasible => "FEASIBLE",
            SolutionStatus::NoSolution => "NO_SOLUTION",
            SolutionStatus::Timeout => "TIMEOUT",
            SolutionStatus::Interrupted => "INTERRUPTED",
        }
    }
}

impl std::str::FromStr for SolutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPTIMAL" => Ok(SolutionStatus::Optimal),
            "FEASIBLE" => Ok(SolutionStatus::Feasible),
            "NO_SOLUTION" => Ok(SolutionStatus::NoSolution),
            "TIMEOUT" => Ok(SolutionStatus::Timeout),
            "INTERRUPTED" => Ok(SolutionStatus::Interrupted),
            other => Err(format!("unknown solution status {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolutionResult {
    pub target_n: usize,
    pub max_value: Option<BigUint>,
    pub solution: Vec<BigUint>,
    pub elapsed_seconds: f64,
    pub status: SolutionStatus,
    pub nodes_explored: u64,
    pub completion_timestamp: std::time::SystemTime,
}

/// Monotone counters and timing the engine updates as it runs.
pub struct SearchStats {
    pub nodes_explored: u64,
    pub current_depth: usize,
    pub best_max_so_far: Option<BigUint>,
    pub solutions_found: u64,
    pub start_wallclock: Instant,
    pub last_log_wallclock: Instant,
}

impl SearchStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            nodes_explored: 0,
            current_depth: 0,
            best_max_so_far: None,
            solutions_found: 0,
            start_wallclock: now,
            last_log_wallclock: now,
        }
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Adaptive node-count cadence for progress-log checks: frequent early on
/// while depth/bound estimates are volatile, coarser once the search has
/// settled into its steady state.
pub fn log_check_interval(nodes_explored: u64) -> u64 {
    if nodes_explored < 100_000 {
        1024
    } else {
        65536
    }
}
