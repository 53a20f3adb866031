use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use configuration::{CredentialBackend, DashboardConfig};
use core_types::{Chain, Environment, Resolution, VolumeTable};
use database::{ServiceMetrics, VolumeQueryService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the perps volume dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(backend) = cli.credentials {
        config.credentials = backend;
    }
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Volume(args) => handle_volume(args, config).await,
        Commands::Serve(args) => {
            if let Some(addr) = args.addr {
                config.server.addr = addr;
            }
            web_server::run_server(config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Perps trading volume from the analytics warehouse.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the dashboard settings file. A missing file means defaults.
    #[arg(long, global = true, default_value = "dashboard.toml")]
    config: PathBuf,

    /// Where to read database credentials from (overrides the settings file).
    #[arg(long, global = true, value_enum)]
    credentials: Option<CredentialBackend>,

    /// Which schemas to query, "prod" or "dev" (overrides the settings file).
    #[arg(long, global = true)]
    environment: Option<Environment>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the volume table for one chain.
    Volume(VolumeArgs),
    /// Run the dashboard web server.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct VolumeArgs {
    /// The chain to query (e.g., "base_mainnet").
    #[arg(long)]
    chain: Chain,

    /// The start of the window, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// The end of the window, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// "daily" or "hourly".
    #[arg(long, default_value = "daily")]
    resolution: Resolution,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on (overrides the settings file).
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Volume Command Logic
// ==============================================================================

async fn handle_volume(args: VolumeArgs, config: DashboardConfig) -> anyhow::Result<()> {
    let source = configuration::source_for(&config);
    let service = VolumeQueryService::from_source(
        source.as_ref(),
        config.environment,
        &config.pool,
        Arc::new(ServiceMetrics::new()),
    )?;

    let result = service
        .get_volume(
            args.chain,
            web_server::pages::midnight(args.from),
            web_server::pages::midnight(args.to),
            args.resolution,
        )
        .await;
    service.close().await;

    let table = result?;
    tracing::info!(chain = %args.chain, rows = table.len(), "Fetched volume.");
    println!("{}", render_table(&table));
    Ok(())
}

fn render_table(volume: &VolumeTable) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(volume.columns().to_vec());
    for record in volume.records() {
        table.add_row(vec![
            Cell::new(record.ts.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{:.2}", record.volume)),
            Cell::new(format!("{:.2}", record.cumulative_volume)),
        ]);
    }
    table
}
