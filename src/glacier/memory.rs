//! In-process Glacier model for tests and offline runs

use super::traits::{GlacierApi, InventoryJobRequest};
use crate::error::ServiceError;
use crate::types::{Archive, JobAction, JobStatus, RetrievalJob, VaultInventory, VaultSummary};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A request received by [`InMemoryGlacier`], recorded in call order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    /// ListVaults
    ListVaults,
    /// ListJobs for a vault
    ListJobs {
        /// Target vault
        vault: String,
    },
    /// InitiateJob for a vault
    InitiateJob {
        /// Target vault
        vault: String,
    },
    /// DescribeJob
    DescribeJob {
        /// Target vault
        vault: String,
        /// Job being described
        job_id: String,
    },
    /// GetJobOutput
    GetJobOutput {
        /// Target vault
        vault: String,
        /// Job whose output is read
        job_id: String,
    },
    /// DeleteArchive
    DeleteArchive {
        /// Target vault
        vault: String,
        /// Archive being deleted
        archive_id: String,
    },
    /// DeleteVault
    DeleteVault {
        /// Vault being deleted
        vault: String,
    },
}

impl Call {
    fn operation(&self) -> &'static str {
        match self {
            Call::ListVaults => "ListVaults",
            Call::ListJobs { .. } => "ListJobs",
            Call::InitiateJob { .. } => "InitiateJob",
            Call::DescribeJob { .. } => "DescribeJob",
            Call::GetJobOutput { .. } => "GetJobOutput",
            Call::DeleteArchive { .. } => "DeleteArchive",
            Call::DeleteVault { .. } => "DeleteVault",
        }
    }
}

#[derive(Debug)]
struct VaultState {
    created: DateTime<Utc>,
    archives: Vec<Archive>,
    jobs: Vec<RetrievalJob>,
}

#[derive(Debug, Default)]
struct State {
    vaults: BTreeMap<String, VaultState>,
    outputs: HashMap<String, Vec<u8>>,
    failures: HashMap<Call, ServiceError>,
    calls: Vec<Call>,
    next_job: u64,
}

/// [`GlacierApi`] implementation that keeps vaults, archives and jobs in memory
///
/// Jobs never progress on their own: tests move them along with
/// [`complete_job`](Self::complete_job) and [`fail_job`](Self::fail_job).
/// Any request can be made to fail with [`fail_on`](Self::fail_on).
///
/// # Examples
///
/// ```
/// use glacier_sweep::glacier::{GlacierApi, InMemoryGlacier, InventoryJobRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let glacier = InMemoryGlacier::new("012345678901", "us-east-1");
/// glacier.create_vault("photos");
/// glacier.add_archive("photos", "archive-1", 1024);
///
/// let job_id = glacier
///     .initiate_job("-", "photos", &InventoryJobRequest::default())
///     .await?;
/// glacier.complete_job(&job_id);
///
/// let job = glacier.describe_job("-", "photos", &job_id).await?;
/// assert!(job.completed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryGlacier {
    account_id: String,
    region: String,
    epoch: DateTime<Utc>,
    state: Mutex<State>,
}

impl InMemoryGlacier {
    /// Create an empty model for one account and region
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            epoch: Utc::now(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timestamps advance one minute per created object so ordering is deterministic
    fn tick(&self, state: &mut State) -> DateTime<Utc> {
        state.next_job += 1;
        self.epoch + Duration::minutes(state.next_job as i64)
    }

    /// ARN the service would assign to `vault_name`
    pub fn vault_arn(&self, vault_name: &str) -> String {
        format!(
            "arn:aws:glacier:{}:{}:vaults/{}",
            self.region, self.account_id, vault_name
        )
    }

    /// Create a vault (no-op if it exists)
    pub fn create_vault(&self, vault_name: &str) {
        let mut state = self.state();
        let created = self.tick(&mut state);
        state
            .vaults
            .entry(vault_name.to_string())
            .or_insert_with(|| VaultState {
                created,
                archives: Vec::new(),
                jobs: Vec::new(),
            });
    }

    /// Store an archive in an existing vault
    pub fn add_archive(&self, vault_name: &str, archive_id: &str, size: i64) {
        let mut state = self.state();
        let creation_date = self.tick(&mut state);
        if let Some(vault) = state.vaults.get_mut(vault_name) {
            vault.archives.push(Archive {
                archive_id: archive_id.to_string(),
                description: String::new(),
                creation_date,
                size,
                sha256_tree_hash: format!("{:064x}", size),
            });
        }
    }

    /// Register a job directly, bypassing InitiateJob
    pub fn insert_job(&self, job: RetrievalJob) {
        let mut state = self.state();
        if let Some(vault) = state.vaults.get_mut(&job.vault_name) {
            vault.jobs.push(job);
        }
    }

    /// Mark a job succeeded and snapshot the vault's current archives as its output
    pub fn complete_job(&self, job_id: &str) {
        let mut state = self.state();
        let now = self.tick(&mut state);
        let mut output = None;

        for (name, vault) in state.vaults.iter_mut() {
            if let Some(job) = vault.jobs.iter_mut().find(|j| j.job_id == job_id) {
                job.status = JobStatus::Succeeded;
                job.completion_date = Some(now);
                let inventory = VaultInventory {
                    vault_arn: self.vault_arn(name),
                    inventory_date: now,
                    archives: vault.archives.clone(),
                };
                output = serde_json::to_vec(&inventory).ok();
                break;
            }
        }

        if let Some(bytes) = output {
            state.outputs.entry(job_id.to_string()).or_insert(bytes);
        }
    }

    /// Mark a job failed with the given status message
    pub fn fail_job(&self, job_id: &str, message: &str) {
        let mut state = self.state();
        let now = self.tick(&mut state);
        for vault in state.vaults.values_mut() {
            if let Some(job) = vault.jobs.iter_mut().find(|j| j.job_id == job_id) {
                job.status = JobStatus::Failed;
                job.completion_date = Some(now);
                job.status_message = Some(message.to_string());
            }
        }
    }

    /// Replace the output a job will return (kept when the job later completes)
    pub fn set_job_output(&self, job_id: &str, output: impl Into<Vec<u8>>) {
        self.state()
            .outputs
            .insert(job_id.to_string(), output.into());
    }

    /// Make every future request equal to `call` fail with `error`
    pub fn fail_on(&self, call: Call, error: ServiceError) {
        self.state().failures.insert(call, error);
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of recorded requests for the given operation name (e.g., "DeleteArchive")
    pub fn call_count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Archive ids currently stored in a vault
    pub fn archive_ids(&self, vault_name: &str) -> Vec<String> {
        self.state()
            .vaults
            .get(vault_name)
            .map(|v| v.archives.iter().map(|a| a.archive_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether the vault exists
    pub fn has_vault(&self, vault_name: &str) -> bool {
        self.state().vaults.contains_key(vault_name)
    }

    /// Record the call, then apply account checks and injected failures
    fn begin(&self, account_id: &str, call: Call) -> Result<MutexGuard<'_, State>, ServiceError> {
        let mut state = self.state();
        state.calls.push(call.clone());

        if account_id != "-" && account_id != self.account_id {
            return Err(ServiceError::new(
                call.operation(),
                format!("access denied for account {account_id}"),
            )
            .with_code("AccessDeniedException"));
        }
        if let Some(error) = state.failures.get(&call) {
            return Err(error.clone());
        }
        Ok(state)
    }
}

fn vault_not_found(operation: &'static str, vault_name: &str) -> ServiceError {
    ServiceError::not_found(operation, format!("Vault not found: {vault_name}"))
}

#[async_trait]
impl GlacierApi for InMemoryGlacier {
    async fn list_vaults(&self, account_id: &str) -> crate::Result<Vec<VaultSummary>> {
        let state = self.begin(account_id, Call::ListVaults)?;
        Ok(state
            .vaults
            .iter()
            .map(|(name, vault)| VaultSummary {
                vault_name: name.clone(),
                vault_arn: Some(self.vault_arn(name)),
                number_of_archives: vault.archives.len() as i64,
                size_in_bytes: vault.archives.iter().map(|a| a.size).sum(),
                creation_date: Some(vault.created),
                last_inventory_date: None,
            })
            .collect())
    }

    async fn list_jobs(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> crate::Result<Vec<RetrievalJob>> {
        let call = Call::ListJobs {
            vault: vault_name.to_string(),
        };
        let state = self.begin(account_id, call)?;
        let vault = state
            .vaults
            .get(vault_name)
            .ok_or_else(|| vault_not_found("ListJobs", vault_name))?;
        Ok(vault.jobs.clone())
    }

    async fn initiate_job(
        &self,
        account_id: &str,
        vault_name: &str,
        _request: &InventoryJobRequest,
    ) -> crate::Result<String> {
        let call = Call::InitiateJob {
            vault: vault_name.to_string(),
        };
        let mut state = self.begin(account_id, call)?;
        if !state.vaults.contains_key(vault_name) {
            return Err(vault_not_found("InitiateJob", vault_name).into());
        }

        let creation_date = self.tick(&mut state);
        let job_id = format!("job-{}", state.next_job);
        let job = RetrievalJob {
            job_id: job_id.clone(),
            vault_name: vault_name.to_string(),
            account_id: account_id.to_string(),
            vault_arn: Some(self.vault_arn(vault_name)),
            action: JobAction::InventoryRetrieval,
            creation_date,
            completion_date: None,
            status: JobStatus::InProgress,
            status_message: None,
        };
        if let Some(vault) = state.vaults.get_mut(vault_name) {
            vault.jobs.push(job);
        }
        Ok(job_id)
    }

    async fn describe_job(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<RetrievalJob> {
        let call = Call::DescribeJob {
            vault: vault_name.to_string(),
            job_id: job_id.to_string(),
        };
        let state = self.begin(account_id, call)?;
        let vault = state
            .vaults
            .get(vault_name)
            .ok_or_else(|| vault_not_found("DescribeJob", vault_name))?;
        vault
            .jobs
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::not_found("DescribeJob", format!("Job not found: {job_id}")).into()
            })
    }

    async fn get_job_output(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<Vec<u8>> {
        let call = Call::GetJobOutput {
            vault: vault_name.to_string(),
            job_id: job_id.to_string(),
        };
        let state = self.begin(account_id, call)?;
        let vault = state
            .vaults
            .get(vault_name)
            .ok_or_else(|| vault_not_found("GetJobOutput", vault_name))?;
        let job = vault
            .jobs
            .iter()
            .find(|j| j.job_id == job_id)
            .ok_or_else(|| ServiceError::not_found("GetJobOutput", format!("Job not found: {job_id}")))?;

        if job.status != JobStatus::Succeeded {
            return Err(ServiceError::new(
                "GetJobOutput",
                format!("The job is not currently available for download: {job_id}"),
            )
            .with_code("InvalidParameterValueException")
            .into());
        }

        Ok(state.outputs.get(job_id).cloned().unwrap_or_default())
    }

    async fn delete_archive(
        &self,
        account_id: &str,
        vault_name: &str,
        archive_id: &str,
    ) -> crate::Result<()> {
        let call = Call::DeleteArchive {
            vault: vault_name.to_string(),
            archive_id: archive_id.to_string(),
        };
        let mut state = self.begin(account_id, call)?;
        let vault = state
            .vaults
            .get_mut(vault_name)
            .ok_or_else(|| vault_not_found("DeleteArchive", vault_name))?;
        let position = vault
            .archives
            .iter()
            .position(|a| a.archive_id == archive_id)
            .ok_or_else(|| {
                ServiceError::not_found(
                    "DeleteArchive",
                    format!("Archive not found: {archive_id}"),
                )
            })?;
        vault.archives.remove(position);
        Ok(())
    }

    async fn delete_vault(&self, account_id: &str, vault_name: &str) -> crate::Result<()> {
        let call = Call::DeleteVault {
            vault: vault_name.to_string(),
        };
        let mut state = self.begin(account_id, call)?;
        let vault = state
            .vaults
            .get(vault_name)
            .ok_or_else(|| vault_not_found("DeleteVault", vault_name))?;
        if !vault.archives.is_empty() {
            return Err(ServiceError::new(
                "DeleteVault",
                format!("Vault not empty or recently written to: {vault_name}"),
            )
            .with_code("InvalidParameterValueException")
            .into());
        }
        state.vaults.remove(vault_name);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}
