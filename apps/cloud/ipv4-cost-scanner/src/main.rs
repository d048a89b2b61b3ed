//! IPv4 Cost Scanner
//!
//! Finds every public IPv4 address an AWS account pays for, across all
//! regions, and prices it per month. Runs as a one-shot command.

use clap::{Parser, Subcommand, ValueEnum};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_ip_costs::{Category, InventoryProvider, ScatterGatherCoordinator};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod config;
mod export;
mod providers;
mod render;
mod subnets;

use config::{Config, ScanArgs};
use providers::AwsInventory;

#[derive(Parser)]
#[command(name = "ipv4-cost-scanner")]
#[command(about = "Find and price every public IPv4 address in an AWS account")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scan: ScanArgs,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every category and print the results (default)
    Scan {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Scan instances only and write them to a CSV file
    ExportCsv {
        #[arg(short, long, default_value = export::DEFAULT_CSV_PATH)]
        output: PathBuf,
    },

    /// List subnets and their auto-assign public IP setting
    Subnets {
        /// Flip the auto-assign public IP setting of every subnet
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?.with_args(&cli.scan);
    init_tracing(&config.environment, cli.debug);

    if cli.metrics {
        observability::init_metrics().wrap_err("Failed to install metrics recorder")?;
    }

    let outcome = run(cli.command, config).await;

    if cli.metrics {
        eprintln!("{}", observability::render_metrics());
    }

    outcome
}

async fn run(command: Option<Commands>, config: Config) -> Result<()> {
    let inventory = Arc::new(AwsInventory::load(&config.aws).await);
    let provider: Arc<dyn InventoryProvider> = inventory.clone();
    let max_in_flight = config.scan.max_in_flight;
    let coordinator = ScatterGatherCoordinator::new(provider, config.scan);

    match command.unwrap_or(Commands::Scan {
        format: OutputFormat::Table,
    }) {
        Commands::Scan { format } => {
            info!("Starting IPv4 cost scan");
            let snapshot = coordinator.scan().await.wrap_err("Scan aborted")?;

            match format {
                OutputFormat::Table => println!("{}", render::render_snapshot(&snapshot)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            }

            info!(
                scan_id = %snapshot.scan_id(),
                addresses = snapshot.total_count(),
                cost = %snapshot.total_cost(),
                "Scan complete"
            );
        }

        Commands::ExportCsv { output } => {
            let result = coordinator
                .collect_one(Category::Instances)
                .await
                .wrap_err("Instance scan aborted")?;

            let rows = export::export_instances(&output, &result)?;
            println!("Wrote {} instances to {}", rows, output.display());

            if let Some(error) = result.combined_error() {
                eprintln!("warning: {}", error);
            }
        }

        Commands::Subnets { toggle } => {
            let regions = coordinator
                .regions()
                .await
                .wrap_err("Unable to list regions")?;

            let report = subnets::survey(inventory.as_ref(), &regions, toggle, max_in_flight).await;
            println!("{}", report.render());
        }
    }

    Ok(())
}
