//! Paywire Simulator
//!
//! Drives one network of the ledger service with a scripted scenario or
//! random traffic, then checks that value was conserved.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paywire_common::Network;
use paywire_service::{Service, ServiceConfig};

mod controller;
mod metrics;
mod scenario;

use controller::SimulationController;
use scenario::Scenario;

/// Paywire Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Paywire ledger scenario runner and traffic simulator")]
struct Args {
    /// Network to drive (mainnet or testnet3)
    #[arg(short, long, default_value = "testnet3")]
    network: Network,

    /// Scenario to run: a built-in name or a path to a .json file
    #[arg(short, long)]
    scenario: Option<String>,

    /// Accounts created for random traffic
    #[arg(short, long, default_value = "10")]
    accounts: usize,

    /// Random operations to issue
    #[arg(short, long, default_value = "10000")]
    operations: usize,

    /// Concurrent traffic workers
    #[arg(long, default_value = "4")]
    tasks: usize,

    /// Webhook URL to register before running (repeatable)
    #[arg(long = "hook")]
    hooks: Vec<String>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Print Prometheus metrics when done
    #[arg(long)]
    metrics: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::from_env();

    // RUST_LOG wins over the configured level.
    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    ));
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if args.seed.is_some() {
        config.id_seed = args.seed;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let service = Arc::new(Service::with_defaults(config)?);
    service.start()?;

    info!("Starting Paywire Simulator");
    info!("Network: {}", args.network);

    for url in &args.hooks {
        service.chain(args.network).create_hook(url)?;
        info!(url = %url, "Registered hook");
    }

    let mut controller = SimulationController::new(service.clone(), args.network, args.seed);

    match &args.scenario {
        Some(name) => {
            let scenario = Scenario::load(name)?;
            controller.run_scenario(scenario).await?;
        }
        None => {
            controller
                .run_traffic(args.accounts, args.operations, args.tasks)
                .await?;
        }
    }

    service.stop().await?;

    let metrics = controller.metrics();
    info!("Simulation complete");
    info!("Total operations: {}", metrics.total_operations);
    info!("Accepted: {}", metrics.successful_operations);
    info!("Rejected: {}", metrics.rejected_operations);
    for (code, count) in &metrics.rejections {
        info!("  {}: {}", code, count);
    }
    info!("Success rate: {:.1}%", metrics.success_rate() * 100.0);
    info!("Average latency: {}us", metrics.average_latency_us());
    info!("p99 latency: {}us", metrics.p99_latency_us());

    if args.metrics {
        println!("{}", service.to_prometheus());
    }

    Ok(())
}
