//! Read-only decorator that logs mutating calls instead of sending them

use super::traits::{GlacierApi, InventoryJobRequest};
use crate::types::{JobAction, JobStatus, RetrievalJob, VaultSummary};
use async_trait::async_trait;
use chrono::Utc;

/// Job id handed out instead of starting a real inventory job
pub const DRY_RUN_JOB_ID: &str = "dry-run-inventory-job";

/// Wraps another [`GlacierApi`], forwarding reads and skipping writes
///
/// `initiate_job` returns [`DRY_RUN_JOB_ID`], which `describe_job` reports
/// as permanently in progress. Archive and vault deletions are logged and
/// reported as successful without reaching the service.
#[derive(Debug, Clone)]
pub struct DryRun<G> {
    inner: G,
}

impl<G: GlacierApi> DryRun<G> {
    /// Wrap `inner`
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    /// The wrapped client
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: GlacierApi> GlacierApi for DryRun<G> {
    async fn list_vaults(&self, account_id: &str) -> crate::Result<Vec<VaultSummary>> {
        self.inner.list_vaults(account_id).await
    }

    async fn list_jobs(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> crate::Result<Vec<RetrievalJob>> {
        self.inner.list_jobs(account_id, vault_name).await
    }

    async fn initiate_job(
        &self,
        _account_id: &str,
        vault_name: &str,
        _request: &InventoryJobRequest,
    ) -> crate::Result<String> {
        tracing::info!(vault = vault_name, "Dry run: would initiate inventory retrieval");
        Ok(DRY_RUN_JOB_ID.to_string())
    }

    async fn describe_job(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<RetrievalJob> {
        if job_id != DRY_RUN_JOB_ID {
            return self.inner.describe_job(account_id, vault_name, job_id).await;
        }

        Ok(RetrievalJob {
            job_id: job_id.to_string(),
            vault_name: vault_name.to_string(),
            account_id: account_id.to_string(),
            vault_arn: None,
            action: JobAction::InventoryRetrieval,
            creation_date: Utc::now(),
            completion_date: None,
            status: JobStatus::InProgress,
            status_message: Some("dry run".to_string()),
        })
    }

    async fn get_job_output(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<Vec<u8>> {
        self.inner.get_job_output(account_id, vault_name, job_id).await
    }

    async fn delete_archive(
        &self,
        _account_id: &str,
        vault_name: &str,
        archive_id: &str,
    ) -> crate::Result<()> {
        tracing::info!(vault = vault_name, archive_id, "Dry run: would delete archive");
        Ok(())
    }

    async fn delete_vault(&self, _account_id: &str, vault_name: &str) -> crate::Result<()> {
        tracing::info!(vault = vault_name, "Dry run: would delete vault");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::glacier::InMemoryGlacier;

    #[tokio::test]
    async fn test_writes_never_reach_inner_client() {
        let inner = InMemoryGlacier::new("012345678901", "us-east-1");
        inner.create_vault("v");
        inner.add_archive("v", "A1", 10);
        let glacier = DryRun::new(inner);

        let job_id = glacier
            .initiate_job("-", "v", &InventoryJobRequest::default())
            .await
            .unwrap();
        glacier.delete_archive("-", "v", "A1").await.unwrap();
        glacier.delete_vault("-", "v").await.unwrap();

        assert_eq!(job_id, DRY_RUN_JOB_ID);
        assert!(glacier.inner().calls().is_empty());
        assert_eq!(glacier.inner().archive_ids("v"), vec!["A1".to_string()]);
        assert!(glacier.inner().has_vault("v"));
    }

    #[tokio::test]
    async fn test_dry_run_job_stays_in_progress() {
        let glacier = DryRun::new(InMemoryGlacier::new("012345678901", "us-east-1"));
        let job = glacier
            .describe_job("-", "v", DRY_RUN_JOB_ID)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(glacier.inner().calls().is_empty());
    }

    #[tokio::test]
    async fn test_reads_are_forwarded() {
        let inner = InMemoryGlacier::new("012345678901", "us-east-1");
        inner.create_vault("v");
        let glacier = DryRun::new(inner);

        assert!(glacier.list_jobs("-", "v").await.unwrap().is_empty());
        assert_eq!(glacier.list_vaults("-").await.unwrap().len(), 1);
        assert_eq!(glacier.inner().calls().len(), 2);
    }
}
