//! runnerscaled — the runnerscale daemon.
//!
//! Assembles the scale-up engine with its collaborators:
//! - GitHub App client (installations, check runs, runners, tokens)
//! - Runner inventory (redb)
//! - Runner provisioner (webhook or dry run)
//!
//! # Usage
//!
//! ```text
//! runnerscaled handle --event-source aws:sqs --message event.json
//! runnerscaled inventory list --owner acme
//! runnerscaled categories --file categories.toml
//! ```

mod handle;
mod inventory;
mod provision;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,runnerscale=debug,runnerscaled=debug";

#[derive(Parser)]
#[command(name = "runnerscaled", about = "Self-hosted runner scale-up daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "RUNNERSCALE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one queued-job event and launch runners as needed.
    ///
    /// Category ceilings count the runners recorded in the inventory
    /// database, which this command only reads. Whatever launches the
    /// instances must record them, or `inventory add` must, for
    /// `max_available` to hold.
    Handle(handle::HandleArgs),

    /// Inspect or edit the local runner inventory.
    Inventory {
        /// Inventory database file.
        #[arg(long, env = "RUNNERSCALE_DB", default_value = "runnerscale.redb")]
        db: PathBuf,

        #[command(subcommand)]
        command: inventory::InventoryCommand,
    },

    /// Validate a category table and print it back.
    Categories {
        /// Category table (TOML).
        #[arg(long, env = "RUNNER_CATEGORIES_FILE", default_value = "categories.toml")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Handle(args) => handle::run(args).await,
        Command::Inventory { db, command } => inventory::run(&db, command),
        Command::Categories { file } => print_categories(&file),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_categories(path: &std::path::Path) -> anyhow::Result<()> {
    let table = runnerscale_core::CategoryTable::from_file(path)?;
    tracing::info!(path = ?path, categories = table.len(), "category table valid");
    print!("{}", table.to_toml_string()?);
    Ok(())
}
