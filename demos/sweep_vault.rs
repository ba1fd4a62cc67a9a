//! Interactive vault sweep
//!
//! Runs one decommissioning pass over a vault, asking on the terminal before
//! starting a job, deleting archives or deleting the vault. Run it again later
//! to pick up where the previous pass stopped.
//!
//! ```bash
//! cargo run --example sweep_vault -- <region> [vault] [--dry-run] [--new-job]
//! ```
//!
//! Without a vault name it lists the vaults in the region.

use clap::Parser;
use glacier_sweep::{
    Config, Confirm, RetrievalJob, SweepOptions, SweepState, VaultInventory, VaultSweeper, glacier,
};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Run one decommissioning pass over a Glacier vault
#[derive(Parser, Debug)]
#[command(name = "sweep_vault")]
#[command(about = "Empty and delete a Glacier vault, one resumable pass at a time", long_about = None)]
struct Args {
    /// AWS region holding the vault
    region: String,

    /// Vault to sweep; lists the region's vaults when omitted
    vault: Option<String>,

    /// Forward reads but only log deletions and job starts
    #[arg(long)]
    dry_run: bool,

    /// Offer to start a new inventory job even when a usable one exists
    #[arg(long)]
    new_job: bool,
}

/// Asks yes/no questions on stdin
struct Prompt;

impl Prompt {
    async fn ask(question: String) -> bool {
        tokio::task::spawn_blocking(move || {
            print!("{question} [y/N] ");
            std::io::stdout().flush().ok();
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer).ok();
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl Confirm for Prompt {
    async fn start_new_job(&self, vault_name: &str, existing: &[RetrievalJob]) -> bool {
        for job in existing {
            println!(
                "  {} {} created {}",
                job.job_id, job.status, job.creation_date
            );
        }
        Prompt::ask(format!(
            "{vault_name} already has {} usable inventory job(s). Start another?",
            existing.len()
        ))
        .await
    }

    async fn empty_vault(&self, vault_name: &str, job: &RetrievalJob) -> bool {
        Prompt::ask(format!(
            "Inventory job {} for {vault_name} is ready. Delete every archive it lists?",
            job.job_id
        ))
        .await
    }

    async fn delete_vault(&self, vault_name: &str, inventory: &VaultInventory) -> bool {
        Prompt::ask(format!(
            "{vault_name} was empty as of {}. Delete the vault?",
            inventory.inventory_date
        ))
        .await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Config {
        region: Some(args.region.clone()),
        dry_run: args.dry_run,
        ..Default::default()
    };
    config.validate()?;

    let client = glacier::connect(&config).await?;
    let sweeper = VaultSweeper::from_config(client, Arc::new(Prompt), &config);

    let Some(vault) = args.vault.as_deref() else {
        let vaults = sweeper.list_vaults(&config.account_id).await?;
        if vaults.is_empty() {
            println!("No vaults in {}", args.region);
        }
        for v in vaults {
            println!(
                "{:<40} {:>10} archives {:>16} bytes",
                v.vault_name, v.number_of_archives, v.size_in_bytes
            );
        }
        return Ok(());
    };

    let options = SweepOptions {
        force_new_job: args.new_job,
        ..Default::default()
    };
    let report = sweeper.sweep(&config.account_id, vault, &options).await?;

    match report.final_state() {
        Some(SweepState::JobPending) | Some(SweepState::VaultEmpty)
            if report.inventory_is_stale() =>
        {
            match &report.next_job_id {
                Some(job_id) => println!(
                    "Inventory was stale. Started fresh inventory job {job_id}; run again once it finishes."
                ),
                None => println!("Inventory was stale. Run again with --new-job."),
            }
        }
        Some(SweepState::JobPending) => {
            println!("Inventory job pending. Run again in a few hours.")
        }
        Some(SweepState::JobFailed) => println!("Inventory job failed. Run again to start another."),
        Some(SweepState::ArchivesDeleting) => {
            if let Some(deletion) = &report.deletion {
                println!(
                    "{} of {} archives deleted. Failed:",
                    deletion.succeeded, deletion.attempted
                );
                for failure in &deletion.failed {
                    println!("  {}: {}", failure.archive_id, failure.error);
                }
            }
        }
        Some(SweepState::VaultEmpty) if report.deletion.is_some() => {
            println!("All archives deleted. Run again later to confirm with a fresh inventory.")
        }
        Some(state) => println!("{vault}: {state}"),
        None => {}
    }

    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = Args::try_parse_from(["sweep_vault", "eu-west-1", "photos", "--dry-run", "--new-job"])
            .unwrap();
        assert_eq!(args.region, "eu-west-1");
        assert_eq!(args.vault.as_deref(), Some("photos"));
        assert!(args.dry_run);
        assert!(args.new_job);
    }

    #[test]
    fn test_vault_is_optional() {
        let args = Args::try_parse_from(["sweep_vault", "eu-west-1"]).unwrap();
        assert!(args.vault.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_misspelled_flag_is_rejected() {
        let err = Args::try_parse_from(["sweep_vault", "eu-west-1", "photos", "--dryrun"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_region_is_required() {
        assert!(Args::try_parse_from(["sweep_vault"]).is_err());
    }
}
