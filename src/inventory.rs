//! Downloading and decoding vault inventories

use crate::error::{ParseError, PreconditionError};
use crate::glacier::GlacierApi;
use crate::types::{JobStatus, VaultInventory};
use crate::Result;
use std::sync::Arc;

/// Decode an inventory job's JSON output
///
/// `VaultARN`, `InventoryDate` and `ArchiveList` are required, as are all
/// five fields of every archive entry. Unknown fields are ignored.
pub fn parse_inventory(payload: &[u8]) -> std::result::Result<VaultInventory, ParseError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Fetches the output of completed inventory jobs
#[derive(Clone)]
pub struct InventoryFetcher {
    api: Arc<dyn GlacierApi>,
}

impl InventoryFetcher {
    /// Create a fetcher over `api`
    pub fn new(api: Arc<dyn GlacierApi>) -> Self {
        Self { api }
    }

    /// Download and decode the inventory produced by `job_id`
    ///
    /// The job is described first. If that call fails the error is returned
    /// without touching the output; if the job is not a succeeded inventory
    /// retrieval the request is rejected as a precondition violation.
    pub async fn fetch_inventory(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> Result<VaultInventory> {
        let job = self.api.describe_job(account_id, vault_name, job_id).await?;

        if !job.is_inventory() {
            return Err(PreconditionError::NotInventoryJob {
                job_id: job_id.to_string(),
                action: job.action.to_string(),
            }
            .into());
        }
        match job.status {
            JobStatus::Succeeded => {}
            JobStatus::InProgress => {
                return Err(PreconditionError::JobNotComplete {
                    job_id: job_id.to_string(),
                }
                .into());
            }
            JobStatus::Failed => {
                return Err(PreconditionError::JobFailed {
                    job_id: job_id.to_string(),
                    reason: job
                        .status_message
                        .unwrap_or_else(|| "no status message".to_string()),
                }
                .into());
            }
        }

        let payload = self
            .api
            .get_job_output(account_id, vault_name, job_id)
            .await?;
        let inventory = parse_inventory(&payload).inspect_err(|e| {
            tracing::error!(vault = vault_name, job_id, error = %e, "Inventory payload is malformed");
        })?;

        tracing::info!(
            vault = vault_name,
            job_id,
            archives = inventory.archives.len(),
            total_bytes = inventory.total_size(),
            inventory_date = %inventory.inventory_date,
            "Fetched vault inventory"
        );
        Ok(inventory)
    }
}
