//! Inventory-retrieval job lifecycle: listing, starting and checking jobs
//!
//! Jobs run remotely for hours. Nothing here waits: every call is a single
//! point-in-time request, and callers re-check later (typically on the next
//! run) when a job is still in progress.

use crate::glacier::{GlacierApi, InventoryJobRequest};
use crate::types::RetrievalJob;
use crate::Result;
use std::sync::Arc;

/// Most recent job by creation date
///
/// Scans for the maximum rather than relying on sort order. When several
/// jobs share the latest creation date, the one appearing last in `jobs`
/// wins. Returns `None` for an empty slice.
pub fn most_recent(jobs: &[RetrievalJob]) -> Option<&RetrievalJob> {
    jobs.iter().max_by_key(|job| job.creation_date)
}

/// Result of [`JobRegistry::ensure_inventory_job`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsuredJob {
    /// An in-progress or succeeded inventory job already existed
    Existing(RetrievalJob),
    /// No usable job existed, so a new one was started
    Initiated(String),
}

impl EnsuredJob {
    /// The id of the job to follow
    pub fn job_id(&self) -> &str {
        match self {
            EnsuredJob::Existing(job) => &job.job_id,
            EnsuredJob::Initiated(job_id) => job_id,
        }
    }
}

/// Reads, starts and describes inventory-retrieval jobs for vaults
#[derive(Clone)]
pub struct JobRegistry {
    api: Arc<dyn GlacierApi>,
    request: InventoryJobRequest,
}

impl JobRegistry {
    /// Create a registry over `api` with default job parameters
    pub fn new(api: Arc<dyn GlacierApi>) -> Self {
        Self {
            api,
            request: InventoryJobRequest::default(),
        }
    }

    /// Use `request` for jobs started by this registry
    pub fn with_request(mut self, request: InventoryJobRequest) -> Self {
        self.request = request;
        self
    }

    /// All jobs the service tracks for the vault, oldest first
    ///
    /// An empty vector means no jobs exist; that is not an error.
    pub async fn list_jobs(&self, account_id: &str, vault_name: &str) -> Result<Vec<RetrievalJob>> {
        let mut jobs = self.api.list_jobs(account_id, vault_name).await?;
        jobs.sort_by_key(|job| job.creation_date);

        if jobs.is_empty() {
            tracing::info!(vault = vault_name, account_id, "No existing jobs for vault");
        } else {
            tracing::debug!(vault = vault_name, count = jobs.len(), "Listed retrieval jobs");
        }
        Ok(jobs)
    }

    /// Most recent inventory job that is still in progress or has succeeded
    ///
    /// Failed jobs and archive-retrieval jobs are ignored.
    pub async fn usable_job(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> Result<Option<RetrievalJob>> {
        let jobs: Vec<RetrievalJob> = self
            .list_jobs(account_id, vault_name)
            .await?
            .into_iter()
            .filter(|job| job.is_inventory() && job.status.is_usable())
            .collect();
        Ok(most_recent(&jobs).cloned())
    }

    /// Start a new inventory-retrieval job and return its id
    ///
    /// Creates exactly one remote job and never retries. Callers decide
    /// whether a new job is wanted; [`ensure_inventory_job`](Self::ensure_inventory_job)
    /// makes that decision from the registry.
    pub async fn initiate_inventory_retrieval(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> Result<String> {
        let job_id = self
            .api
            .initiate_job(account_id, vault_name, &self.request)
            .await
            .inspect_err(|e| {
                tracing::error!(vault = vault_name, error = %e, "Failed to initiate retrieval job");
            })?;

        tracing::info!(vault = vault_name, job_id = %job_id, "Inventory retrieval job initiated");
        Ok(job_id)
    }

    /// Reuse the most recent usable inventory job, or start one if none exists
    pub async fn ensure_inventory_job(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> Result<EnsuredJob> {
        if let Some(job) = self.usable_job(account_id, vault_name).await? {
            tracing::info!(
                vault = vault_name,
                job_id = %job.job_id,
                status = %job.status,
                "Reusing existing inventory job"
            );
            return Ok(EnsuredJob::Existing(job));
        }

        let job_id = self
            .initiate_inventory_retrieval(account_id, vault_name)
            .await?;
        Ok(EnsuredJob::Initiated(job_id))
    }

    /// Current status of a job
    ///
    /// A job that has not completed is a normal result. Errors, including
    /// unknown or expired job ids, propagate immediately.
    pub async fn describe_job(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> Result<RetrievalJob> {
        let job = self.api.describe_job(account_id, vault_name, job_id).await?;
        tracing::debug!(
            vault = vault_name,
            job_id,
            status = %job.status,
            "Described retrieval job"
        );
        Ok(job)
    }
}
