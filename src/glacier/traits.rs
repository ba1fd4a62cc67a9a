//! The storage client seam

use crate::types::{RetrievalJob, VaultSummary};
use async_trait::async_trait;

/// Parameters for a new inventory-retrieval job
///
/// The retrieval type and output format are fixed; only the optional
/// service-side extras are configurable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryJobRequest {
    /// Description attached to the job
    pub description: Option<String>,
    /// SNS topic notified on completion
    pub sns_topic: Option<String>,
}

/// Region-scoped access to the Glacier operations the sweep needs
///
/// Every call is a single request/response; implementations must not retry
/// or wait internally. Errors are reported as [`crate::Error::Service`]
/// (or [`crate::Error::Parse`] for undecodable responses).
///
/// # Examples
///
/// ```no_run
/// use glacier_sweep::glacier::{GlacierApi, SdkGlacier};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sdk_config = aws_config::load_from_env().await;
/// let glacier = SdkGlacier::new(aws_sdk_glacier::Client::new(&sdk_config));
///
/// for job in glacier.list_jobs("-", "my-vault").await? {
///     println!("{} {}", job.job_id, job.status);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait GlacierApi: Send + Sync {
    /// List every vault in the account and region, following pagination
    async fn list_vaults(&self, account_id: &str) -> crate::Result<Vec<VaultSummary>>;

    /// List every retrieval job the service still tracks for a vault
    ///
    /// Order is whatever the service returns; callers sort.
    async fn list_jobs(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> crate::Result<Vec<RetrievalJob>>;

    /// Start an inventory-retrieval job and return its id
    async fn initiate_job(
        &self,
        account_id: &str,
        vault_name: &str,
        request: &InventoryJobRequest,
    ) -> crate::Result<String>;

    /// Fetch the current status of one job
    async fn describe_job(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<RetrievalJob>;

    /// Download the full output of a completed job
    async fn get_job_output(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<Vec<u8>>;

    /// Delete a single archive
    async fn delete_archive(
        &self,
        account_id: &str,
        vault_name: &str,
        archive_id: &str,
    ) -> crate::Result<()>;

    /// Delete a vault (the service refuses if it still holds archives)
    async fn delete_vault(&self, account_id: &str, vault_name: &str) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
