//! Dispatches one `BacktrackEngine::solve` per N across a bounded number of
//! OS threads, consulting and updating the result store around each run.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use erdos_bigint::BigUint;
use erdos_engine::{BacktrackEngine, SolutionResult, SolverConfig};
use erdos_store::ResultStore;

/// The worker-pool driver's between-dispatch poll. This is the only
/// cooperative sleep anywhere in the system — the search core itself
/// never blocks.
const DRIVER_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WorkerPool {
    store: Arc<ResultStore>,
    stop_flag: Arc<AtomicBool>,
    find_all_optima: bool,
    first_only: bool,
}

impl WorkerPool {
    pub fn new(
        store: Arc<ResultStore>,
        stop_flag: Arc<AtomicBool>,
        find_all_optima: bool,
        first_only: bool,
    ) -> Self {
        Self {
            store,
            stop_flag,
            find_all_optima,
            first_only,
        }
    }

    /// Runs every N in `start_n..=max_n` across up to `workers` concurrent
    /// threads, each owning its own engine and oracle, and returns the
    /// results in the order their N was dispatched (not completion order).
    pub fn run(&self, start_n: usize, max_n: usize, workers: usize) -> Vec<SolutionResult> {
        let queue: VecDeque<usize> = (start_n..=max_n).collect();
        let queue = Arc::new(Mutex::new(queue));

        let handles: Vec<_> = (0..workers.max(1))
            .map(|_| {
                let queue = Arc::clone(&queue);
                let store = Arc::clone(&self.store);
                let stop_flag = Arc::clone(&self.stop_flag);
                let find_all_optima = self.find_all_optima;
                let first_only = self.first_only;
                thread::spawn(move || {
                    run_worker(queue, store, stop_flag, find_all_optima, first_only)
                })
            })
            .collect();

        // The driver loop: wait for every thread to finish, polling instead
        // of blocking on join() so the stop-flag-triggered shutdown path
        // stays observable from this thread too.
        while !handles.iter().all(|h| h.is_finished()) {
            thread::sleep(DRIVER_POLL_INTERVAL);
        }

        handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker thread panicked"))
            .collect()
    }
}

fn run_worker(
    queue: Arc<Mutex<VecDeque<usize>>>,
    store: Arc<ResultStore>,
    stop_flag: Arc<AtomicBool>,
    find_all_optima: bool,
    first_only: bool,
) -> Vec<SolutionResult> {
    let mut results = Vec::new();
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            return results;
        }
        let n = {
            let mut queue = queue.lock().expect("worker queue mutex poisoned");
            queue.pop_front()
        };
        let Some(n) = n else {
            return results;
        };

        match store.has_optimal(n) {
            Ok(true) => {
                if let Ok(Some(existing)) = store.load_result(n) {
                    results.push(SolutionResult {
                        target_n: existing.target_n,
                        max_value: Some(existing.max_value),
                        solution: existing.solution,
                        elapsed_seconds: existing.elapsed_seconds,
                        status: existing.status,
                        nodes_explored: existing.nodes_explored,
                        completion_timestamp: existing.completion_timestamp,
                    });
                }
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!(n, error = %err, "result store lookup failed; proceeding without a seed bound");
            }
        }

        let seed_bound: Option<BigUint> = store.get_best_bound(n).unwrap_or_else(|err| {
            tracing::error!(n, error = %err, "result store bound lookup failed");
            None
        });

        let mut config = SolverConfig::new(n)
            .with_find_all_optima(find_all_optima)
            .with_first_only(first_only)
            .with_stop_flag(Arc::clone(&stop_flag));
        if let Some(bound) = seed_bound {
            config = config.with_initial_bound(bound);
        }

        let mut engine = BacktrackEngine::new(config);
        let result = if find_all_optima {
            let (result, optima) = engine.solve_all_optima();
            if let Err(err) = store.save_optima(n, &optima) {
                tracing::error!(n, error = %err, "failed to persist optimal sets");
            }
            result
        } else {
            engine.solve()
        };

        if let Err(err) = store.save_result(&result) {
            tracing::error!(n, error = %err, "failed to persist result");
        }

        results.push(result);
    }
}
