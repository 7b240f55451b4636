//! Minibank Simulator
//!
//! Runs scenarios and random load against an in-process ledger.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod metrics;
mod scenario;

use controller::SimulationController;
use scenario::Scenario;

/// Minibank Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Minibank scenario runner and load simulator")]
struct Args {
    /// Scenario to run (walkthrough, overdraft-race, statement-window, recorder-fault, all)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Concurrent load workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Submissions per second per worker
    #[arg(long, default_value = "100.0")]
    rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Run duration in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0")]
    duration: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Minibank Simulator");

    match args.scenario.as_deref() {
        Some("all") => {
            for name in Scenario::NAMES {
                let controller = SimulationController::new(args.workers, args.rate, args.seed);
                controller.run_scenario(Scenario::load(name)?).await?;
                controller.shutdown().await;
            }
            info!("All scenarios passed");
            return Ok(());
        }
        Some(name) => {
            let controller = SimulationController::new(args.workers, args.rate, args.seed);
            controller.run_scenario(Scenario::load(name)?).await?;
            controller.shutdown().await;
            return Ok(());
        }
        None => {}
    }

    info!("Workers: {}", args.workers);
    info!("Rate: {}/s per worker", args.rate);
    info!("Press Ctrl+C to stop");

    let controller = SimulationController::new(args.workers, args.rate, args.seed);
    let duration = if args.duration > 0 {
        Some(std::time::Duration::from_secs(args.duration))
    } else {
        None
    };

    let started = std::time::Instant::now();
    controller.run(duration).await?;
    let elapsed = started.elapsed().as_secs_f64();
    controller.shutdown().await;

    // Print metrics
    let metrics = controller.get_metrics().await;
    let recorder = controller.recorder_stats();
    info!("Simulation complete, all accounts within limit");
    info!("Total transactions: {}", metrics.total_transactions);
    info!("Accepted: {}", metrics.accepted);
    info!("Rejected by limit: {}", metrics.rejected);
    info!("Failed: {}", metrics.failed);
    info!("Acceptance rate: {:.1}%", metrics.acceptance_rate() * 100.0);
    info!("Throughput: {:.0}/s", metrics.throughput(elapsed));
    info!(
        "Latency: avg {}us, p50 {}us, p99 {}us",
        metrics.average_latency_us(),
        metrics.p50_latency_us(),
        metrics.p99_latency_us()
    );
    info!(
        "Log entries written: {}, failed: {}, dropped: {}",
        recorder.written, recorder.failed, recorder.dropped
    );

    Ok(())
}
