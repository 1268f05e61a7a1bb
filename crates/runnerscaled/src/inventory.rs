//! `inventory` — maintain the local runner inventory by hand.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Subcommand};
use tracing::info;

use runnerscale_core::{RunnerRecord, Scope};
use runnerscale_state::InventoryStore;

#[derive(Subcommand)]
pub enum InventoryCommand {
    /// Print tracked runners as JSON lines.
    List {
        #[arg(long, env = "ENVIRONMENT", default_value = "default")]
        environment: String,

        /// Restrict to one organization, or with `--repo` one repository.
        #[arg(long)]
        owner: Option<String>,

        #[arg(long, requires = "owner")]
        repo: Option<String>,

        /// Ignore `--environment` and list every tracked runner.
        #[arg(long, conflicts_with_all = ["owner", "repo"])]
        all_environments: bool,
    },

    /// Track a runner.
    Add {
        #[arg(long)]
        instance_id: String,

        #[arg(long)]
        category: String,

        #[command(flatten)]
        target: ScopeArgs,

        /// Launch time as Unix seconds; now when omitted.
        #[arg(long)]
        launch_time: Option<u64>,
    },

    /// Stop tracking a runner.
    Remove {
        #[arg(long)]
        instance_id: String,

        #[command(flatten)]
        target: ScopeArgs,
    },
}

/// Organization scope with `--owner` alone, repository scope with `--repo`.
#[derive(Args)]
pub struct ScopeArgs {
    #[arg(long, env = "ENVIRONMENT", default_value = "default")]
    environment: String,

    /// Organization or repository owner.
    #[arg(long)]
    owner: String,

    #[arg(long)]
    repo: Option<String>,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        match &self.repo {
            Some(repo) => Scope::Repository {
                owner: self.owner.clone(),
                repo: repo.clone(),
            },
            None => Scope::Organization {
                org: self.owner.clone(),
            },
        }
    }
}

pub fn run(db: &Path, command: InventoryCommand) -> anyhow::Result<()> {
    let store = InventoryStore::open(db)?;
    for line in execute(&store, command)? {
        println!("{line}");
    }
    Ok(())
}

/// Apply `command` and return the lines to print.
fn execute(store: &InventoryStore, command: InventoryCommand) -> anyhow::Result<Vec<String>> {
    match command {
        InventoryCommand::List {
            environment,
            owner,
            repo,
            all_environments,
        } => {
            let records = match owner {
                Some(owner) => {
                    let target = ScopeArgs {
                        environment,
                        owner,
                        repo,
                    };
                    store.list_runners(&target.environment, &target.scope())?
                }
                None if all_environments => store.list_all()?,
                None => store.list_environment(&environment)?,
            };
            records
                .iter()
                .map(|r| serde_json::to_string(r).map_err(anyhow::Error::from))
                .collect()
        }
        InventoryCommand::Add {
            instance_id,
            category,
            target,
            launch_time,
        } => {
            let record = RunnerRecord {
                instance_id,
                environment: target.environment.clone(),
                scope: target.scope(),
                category,
                launch_time: launch_time.unwrap_or_else(epoch_secs),
            };
            store.put_runner(&record)?;
            info!(key = %record.table_key(), "runner tracked");
            Ok(vec![record.table_key()])
        }
        InventoryCommand::Remove {
            instance_id,
            target,
        } => {
            let key = format!(
                "{}:{}:{}",
                target.environment,
                target.scope().storage_key(),
                instance_id
            );
            if store.delete_runner(&key)? {
                info!(%key, "runner untracked");
                Ok(vec![key])
            } else {
                anyhow::bail!("no tracked runner {key}")
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(owner: &str, repo: Option<&str>) -> ScopeArgs {
        ScopeArgs {
            environment: "prod".to_string(),
            owner: owner.to_string(),
            repo: repo.map(str::to_string),
        }
    }

    fn add(store: &InventoryStore, id: &str, scope: ScopeArgs) -> Vec<String> {
        execute(
            store,
            InventoryCommand::Add {
                instance_id: id.to_string(),
                category: "linux.large".to_string(),
                target: scope,
                launch_time: Some(1_700_000_000),
            },
        )
        .unwrap()
    }

    #[test]
    fn add_list_remove() {
        let store = InventoryStore::open_in_memory().unwrap();

        assert_eq!(
            add(&store, "i-1", target("acme", None)),
            vec!["prod:org/acme:i-1"]
        );
        add(&store, "i-2", target("acme", Some("widgets")));

        let all = execute(
            &store,
            InventoryCommand::List {
                environment: "prod".to_string(),
                owner: None,
                repo: None,
                all_environments: false,
            },
        )
        .unwrap();
        assert_eq!(all.len(), 2);

        let org_only = execute(
            &store,
            InventoryCommand::List {
                environment: "prod".to_string(),
                owner: Some("acme".to_string()),
                repo: None,
                all_environments: false,
            },
        )
        .unwrap();
        assert_eq!(org_only.len(), 1);
        let record: RunnerRecord = serde_json::from_str(&org_only[0]).unwrap();
        assert_eq!(record.instance_id, "i-1");
        assert_eq!(record.launch_time, 1_700_000_000);

        let removed = execute(
            &store,
            InventoryCommand::Remove {
                instance_id: "i-1".to_string(),
                target: target("acme", None),
            },
        )
        .unwrap();
        assert_eq!(removed, vec!["prod:org/acme:i-1"]);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    fn list(store: &InventoryStore, environment: &str, all_environments: bool) -> usize {
        execute(
            store,
            InventoryCommand::List {
                environment: environment.to_string(),
                owner: None,
                repo: None,
                all_environments,
            },
        )
        .unwrap()
        .len()
    }

    #[test]
    fn unscoped_list_honours_environment() {
        let store = InventoryStore::open_in_memory().unwrap();
        add(&store, "i-1", target("acme", None));
        add(&store, "i-2", target("acme", Some("widgets")));
        add(
            &store,
            "i-3",
            ScopeArgs {
                environment: "staging".to_string(),
                owner: "acme".to_string(),
                repo: None,
            },
        );

        assert_eq!(list(&store, "prod", false), 2);
        assert_eq!(list(&store, "staging", false), 1);
        assert_eq!(list(&store, "dev", false), 0);
        assert_eq!(list(&store, "dev", true), 3);
    }

    #[test]
    fn removing_unknown_runner_fails() {
        let store = InventoryStore::open_in_memory().unwrap();
        let result = execute(
            &store,
            InventoryCommand::Remove {
                instance_id: "i-404".to_string(),
                target: target("acme", None),
            },
        );
        assert!(result.is_err());
    }
}
