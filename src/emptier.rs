//! Emptying a vault from its inventory, and deleting it once empty

use crate::config::DeletionConfig;
use crate::error::PreconditionError;
use crate::glacier::GlacierApi;
use crate::inventory::InventoryFetcher;
use crate::types::{ArchiveFailure, DeletionReport, EmptyVaultOutcome, VaultInventory};
use crate::Result;
use std::sync::Arc;

/// Deletes every archive a vault inventory lists, then the vault itself
///
/// Archives are deleted one at a time, in inventory order. A failed
/// deletion is recorded and the pass continues with the next archive.
#[derive(Clone)]
pub struct VaultEmptier {
    api: Arc<dyn GlacierApi>,
    fetcher: InventoryFetcher,
    config: DeletionConfig,
}

impl VaultEmptier {
    /// Create an emptier over `api` with default deletion settings
    pub fn new(api: Arc<dyn GlacierApi>) -> Self {
        Self {
            fetcher: InventoryFetcher::new(api.clone()),
            api,
            config: DeletionConfig::default(),
        }
    }

    /// Use `config` for archive deletion
    pub fn with_config(mut self, config: DeletionConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch the inventory of `job_id` and delete every archive it lists
    ///
    /// Returns [`EmptyVaultOutcome::EligibleForDeletion`] when the inventory
    /// is empty; the vault itself is never deleted here. Any failure to fetch
    /// or decode the inventory aborts before a single deletion is attempted.
    pub async fn empty_vault(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> Result<EmptyVaultOutcome> {
        let inventory = self
            .fetcher
            .fetch_inventory(account_id, vault_name, job_id)
            .await?;
        check_vault_matches(vault_name, &inventory)?;

        if inventory.is_empty() {
            tracing::info!(vault = vault_name, "No archives to delete, vault can be deleted");
            return Ok(EmptyVaultOutcome::EligibleForDeletion(inventory));
        }

        let report = self
            .delete_archives(account_id, vault_name, &inventory)
            .await;
        Ok(EmptyVaultOutcome::ArchivesDeleted(report))
    }

    /// Issue one DeleteArchive per archive in `inventory`, never stopping early
    pub async fn delete_archives(
        &self,
        account_id: &str,
        vault_name: &str,
        inventory: &VaultInventory,
    ) -> DeletionReport {
        tracing::info!(
            vault = vault_name,
            archives = inventory.archives.len(),
            total_bytes = inventory.total_size(),
            "Deleting archives"
        );

        let mut report = DeletionReport::default();

        for archive in &inventory.archives {
            report.attempted += 1;
            tracing::debug!(vault = vault_name, archive_id = %archive.archive_id, "Deleting archive");

            match self
                .api
                .delete_archive(account_id, vault_name, &archive.archive_id)
                .await
            {
                Ok(()) => report.succeeded += 1,
                Err(e) if e.is_not_found() && self.config.treat_not_found_as_deleted => {
                    tracing::debug!(
                        vault = vault_name,
                        archive_id = %archive.archive_id,
                        "Archive already deleted"
                    );
                    report.succeeded += 1;
                    report.already_absent += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        vault = vault_name,
                        archive_id = %archive.archive_id,
                        error = %e,
                        "Failed to delete archive"
                    );
                    report.failed.push(ArchiveFailure {
                        archive_id: archive.archive_id.clone(),
                        error: e,
                    });
                }
            }
        }

        tracing::info!(
            vault = vault_name,
            attempted = report.attempted,
            succeeded = report.succeeded,
            already_absent = report.already_absent,
            failed = report.failed_count(),
            "Archive deletion pass finished"
        );
        report
    }

    /// Delete the vault, given an inventory proving it empty
    ///
    /// Rejected without contacting the service when `inventory` still lists
    /// archives or belongs to another vault. Callers obtain confirmation
    /// before calling this.
    pub async fn delete_vault(
        &self,
        account_id: &str,
        vault_name: &str,
        inventory: &VaultInventory,
    ) -> Result<()> {
        check_vault_matches(vault_name, inventory)?;
        if !inventory.is_empty() {
            return Err(PreconditionError::VaultNotEmpty {
                vault_name: vault_name.to_string(),
                archive_count: inventory.archives.len(),
            }
            .into());
        }

        self.api.delete_vault(account_id, vault_name).await?;
        tracing::info!(vault = vault_name, "Vault deleted");
        Ok(())
    }
}

/// Reject inventories whose ARN names a different vault, or no vault at all
fn check_vault_matches(vault_name: &str, inventory: &VaultInventory) -> Result<()> {
    match inventory.vault_name() {
        Some(found) if found == vault_name => Ok(()),
        Some(found) => Err(PreconditionError::VaultMismatch {
            expected: vault_name.to_string(),
            found: found.to_string(),
        }
        .into()),
        None => Err(PreconditionError::UnknownVault {
            vault_arn: inventory.vault_arn.clone(),
        }
        .into()),
    }
}
