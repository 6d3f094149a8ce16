mod cli;
mod worker;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use erdos_engine::SolutionStatus;
use erdos_store::ResultStore;

use crate::cli::{Cli, Command};
use crate::worker::WorkerPool;

fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();
    erdos_logging::install(args.verbose);

    let store = Arc::new(ResultStore::open(&args.db)?);

    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop_flag);
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received; finishing in-flight work and stopping");
            stop_flag.store(true, Ordering::Relaxed);
        })?;
    }

    let command = args.command(|| {
        store
            .list_known_n()
            .ok()
            .and_then(|ns| ns.into_iter().max())
            .unwrap_or(0)
    });

    match command {
        Command::Stats => {
            print_stats(&store)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show(n) => {
            print_show(&store, n)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Solve {
            start_n,
            max_n,
            workers,
        } => {
            let pool = WorkerPool::new(Arc::clone(&store), Arc::clone(&stop_flag), args.all, args.first_only);
            let results = pool.run(start_n, max_n, workers);

            let mut interrupted = false;
            for result in &results {
                println!(
                    "N={}: status={} max={} elapsed={:.3}s nodes={}",
                    result.target_n,
                    result.status.as_str(),
                    result
                        .max_value
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    result.elapsed_seconds,
                    result.nodes_explored,
                );
                if result.status == SolutionStatus::Interrupted {
                    interrupted = true;
                }
            }

            Ok(if interrupted {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn print_show(store: &ResultStore, n: Option<usize>) -> anyhow::Result<()> {
    let ns = match n {
        Some(n) => vec![n],
        None => store.list_known_n()?,
    };
    for n in ns {
        match store.load_result(n)? {
            Some(result) => println!(
                "N={}: status={} max={} solution={:?} nodes={} elapsed={:.3}s",
                result.target_n,
                result.status.as_str(),
                result.max_value,
                result
                    .solution
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                result.nodes_explored,
                result.elapsed_seconds,
            ),
            None => println!("N={n}: no stored result"),
        }
    }
    Ok(())
}

fn print_stats(store: &ResultStore) -> anyhow::Result<()> {
    let stats = store.aggregate_stats()?;
    println!("total results:   {}", stats.total_results);
    println!("proven optimal:  {}", stats.total_optimal);
    println!(
        "n range:         {}",
        match (stats.min_n, stats.max_n) {
            (Some(lo), Some(hi)) => format!("{lo}..={hi}"),
            _ => "-".to_string(),
        }
    );
    println!("nodes explored:  {}", stats.total_nodes_explored);
    Ok(())
}
