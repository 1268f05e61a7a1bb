//! `handle` — run one scale-up decision.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use runnerscale_core::{ActionRequestMessage, CategoryTable, RunnerProvisioner, ScaleUpConfig};
use runnerscale_github::{GithubAppConfig, GithubAuthenticator};
use runnerscale_scaleup::{CategoryOutcome, ScaleUp, ScaleUpReport};
use runnerscale_state::InventoryStore;

use crate::provision::{DryRunProvisioner, WebhookProvisioner};

#[derive(Args)]
pub struct HandleArgs {
    /// Transport tag the event arrived on, e.g. `aws:sqs`.
    #[arg(long)]
    event_source: String,

    /// Event JSON file; read from stdin when omitted.
    #[arg(long)]
    message: Option<PathBuf>,

    /// Category table (TOML).
    #[arg(long, env = "RUNNER_CATEGORIES_FILE", default_value = "categories.toml")]
    categories: PathBuf,

    /// Inventory database file.
    #[arg(long, env = "RUNNERSCALE_DB", default_value = "runnerscale.redb")]
    db: PathBuf,

    /// Endpoint that launches runner instances.
    #[arg(long, env = "RUNNER_PROVISIONER_URL", required_unless_present = "dry_run")]
    provisioner_url: Option<String>,

    /// Log creation requests instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

pub async fn run(args: HandleArgs) -> anyhow::Result<()> {
    let config = ScaleUpConfig::from_env()?;
    let categories = CategoryTable::from_file(&args.categories)
        .with_context(|| format!("loading {}", args.categories.display()))?;
    let app = GithubAppConfig::from_env()?;
    let auth = GithubAuthenticator::new(&config.api_base_url(), &app)?;

    if let Some(parent) = args.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let inventory = InventoryStore::open(&args.db)?;
    info!(path = ?args.db, "inventory store opened");

    let provisioner: Arc<dyn RunnerProvisioner> = match (&args.provisioner_url, args.dry_run) {
        (_, true) => Arc::new(DryRunProvisioner),
        (Some(url), false) => Arc::new(WebhookProvisioner::new(url.clone())?),
        (None, false) => anyhow::bail!("RUNNER_PROVISIONER_URL is not set"),
    };

    let message = read_message(args.message.as_deref())?;

    let engine = ScaleUp::new(
        config,
        Arc::new(categories),
        Arc::new(auth),
        Arc::new(inventory),
        provisioner,
    );

    let report = engine.handle(&args.event_source, &message).await?;
    log_report(&report);
    report.into_result()?;
    Ok(())
}

fn read_message(path: Option<&std::path::Path>) -> anyhow::Result<ActionRequestMessage> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    serde_json::from_str(&raw).context("decoding action request message")
}

fn log_report(report: &ScaleUpReport) {
    match report {
        ScaleUpReport::Skipped { status } => {
            info!(%status, "event skipped");
        }
        ScaleUpReport::Evaluated { scope, outcomes } => {
            for (category, outcome) in outcomes {
                match outcome {
                    CategoryOutcome::AtCapacity { current, max } => {
                        info!(%scope, %category, current, max, "at capacity")
                    }
                    CategoryOutcome::IdleRunnerAvailable { idle } => {
                        info!(%scope, %category, idle, "idle runner available")
                    }
                    CategoryOutcome::Provisioned => info!(%scope, %category, "runner requested"),
                    CategoryOutcome::Failed(e) => warn!(%scope, %category, error = %e, "failed"),
                }
            }
            info!(%scope, provisioned = report.provisioned(), "event handled");
        }
    }
}
