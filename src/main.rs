// Donor Network - CLI
// Builds the network graph from the CSV tables and prints it

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donor_network::{snapshot_from_sources, EngineConfig, TableSources};

/// Command-line arguments for donor-network
#[derive(Parser, Debug)]
#[command(name = "donor-network")]
#[command(about = "Resolve donor ↔ beneficiary relationships into a network graph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the graph snapshot as JSON
    Graph {
        #[command(flatten)]
        tables: TableArgs,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print connection totals
    Summary {
        #[command(flatten)]
        tables: TableArgs,
    },
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Primary contribution ledger (CSV)
    #[arg(long, env = "DONOR_NETWORK_DONATIONS")]
    donations: PathBuf,

    /// Secondary ledger (CSV)
    #[arg(long, env = "DONOR_NETWORK_INVESTORS")]
    investors: Option<PathBuf>,

    /// Beneficiary table (CSV)
    #[arg(long, env = "DONOR_NETWORK_BENEFICIARIES")]
    beneficiaries: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long, env = "DONOR_NETWORK_CONFIG")]
    config: Option<PathBuf>,
}

impl TableArgs {
    fn sources(&self) -> TableSources {
        let sources = TableSources::new(&self.donations, &self.beneficiaries);
        match &self.investors {
            Some(path) => sources.with_investors(path),
            None => sources,
        }
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donor_network=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Graph { tables, pretty } => {
            let config = tables.engine_config()?;
            let snapshot = snapshot_from_sources(&tables.sources(), &config);

            let json = if pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{}", json);
        }
        Command::Summary { tables } => {
            let config = tables.engine_config()?;
            let snapshot = snapshot_from_sources(&tables.sources(), &config);
            let summary = snapshot.summary();

            info!(fingerprint = %snapshot.fingerprint(), "summary computed");

            println!("🕸️  Donor Network");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("Connections:              {}", summary.connection_count);
            println!(
                "Contributors (connected): {} / {}",
                summary.connected_contributors, summary.contributors
            );
            println!(
                "Beneficiaries (connected): {} / {}",
                summary.connected_beneficiaries, summary.beneficiaries
            );
            println!("Monthly support:          {:.0}", summary.total_monthly_support);
            println!("Rows skipped:             {}", summary.skipped_rows);
        }
    }

    Ok(())
}
