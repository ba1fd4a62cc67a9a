//! One pass of the vault decommissioning state machine
//!
//! ```text
//! NoJob ──initiate──▶ JobPending ──describe──▶ JobCompleted ──fetch──▶ InventoryKnown
//!                       │    ▲                                           │        │
//!                       └────┘ (re-check on a later run)                 ▼        ▼
//!                     JobFailed                                  VaultNonEmpty  VaultEmpty ──▶ VaultDeleted
//!                                                                       │           ▲
//!                                                                       ▼           │
//!                                                               ArchivesDeleting ───┘
//! ```
//!
//! A sweep never waits for a job: it stops in `JobPending` and the caller
//! runs it again later. Destructive steps are gated by [`Confirm`].
//!
//! When a deletion pass finds every archive already gone, the inventory is
//! stale; `VaultEmpty` then leads back to `JobPending` through a fresh
//! inventory job, which is what eventually proves the vault empty.

use crate::config::Config;
use crate::emptier::VaultEmptier;
use crate::glacier::{GlacierApi, InventoryJobRequest};
use crate::jobs::{JobRegistry, most_recent};
use crate::types::{
    DeletionReport, EmptyVaultOutcome, JobStatus, RetrievalJob, VaultInventory, VaultSummary,
};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a vault stands in the decommissioning lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepState {
    /// No usable inventory job exists
    NoJob,
    /// An inventory job is running
    JobPending,
    /// The service reported the job as failed
    JobFailed,
    /// The inventory job succeeded
    JobCompleted,
    /// The operator declined to empty the vault
    Declined,
    /// The inventory has been downloaded and decoded
    InventoryKnown,
    /// The inventory lists archives
    VaultNonEmpty,
    /// Archive deletions were issued; some may have failed
    ArchivesDeleting,
    /// No archives remain as far as this run knows
    VaultEmpty,
    /// The vault was deleted
    VaultDeleted,
}

impl SweepState {
    /// States that may directly follow this one
    pub fn successors(&self) -> &'static [SweepState] {
        use SweepState::*;
        match self {
            NoJob => &[JobPending],
            JobPending => &[JobPending, JobCompleted, JobFailed],
            JobFailed => &[],
            JobCompleted => &[InventoryKnown, Declined],
            Declined => &[],
            InventoryKnown => &[VaultEmpty, VaultNonEmpty],
            VaultNonEmpty => &[ArchivesDeleting],
            ArchivesDeleting => &[VaultEmpty],
            VaultEmpty => &[VaultDeleted, JobPending],
            VaultDeleted => &[],
        }
    }

    /// Whether `next` is a legal transition from this state
    pub fn can_transition_to(&self, next: SweepState) -> bool {
        self.successors().contains(&next)
    }

    /// Whether a sweep may stop here
    ///
    /// Besides the final states, a pending job, a partially failed deletion
    /// pass and an undeleted empty vault are valid places to stop and
    /// resume from on a later run.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            SweepState::JobPending
                | SweepState::JobFailed
                | SweepState::Declined
                | SweepState::ArchivesDeleting
                | SweepState::VaultEmpty
                | SweepState::VaultDeleted
        )
    }
}

impl std::fmt::Display for SweepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SweepState::NoJob => "no_job",
            SweepState::JobPending => "job_pending",
            SweepState::JobFailed => "job_failed",
            SweepState::JobCompleted => "job_completed",
            SweepState::Declined => "declined",
            SweepState::InventoryKnown => "inventory_known",
            SweepState::VaultNonEmpty => "vault_non_empty",
            SweepState::ArchivesDeleting => "archives_deleting",
            SweepState::VaultEmpty => "vault_empty",
            SweepState::VaultDeleted => "vault_deleted",
        };
        f.write_str(name)
    }
}

/// Operator decisions for the destructive or costly steps of a sweep
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Start another inventory job although `existing` jobs are usable
    async fn start_new_job(&self, vault_name: &str, existing: &[RetrievalJob]) -> bool;

    /// Delete every archive listed by the completed `job`
    async fn empty_vault(&self, vault_name: &str, job: &RetrievalJob) -> bool;

    /// Delete the vault now that `inventory` shows it empty
    async fn delete_vault(&self, vault_name: &str, inventory: &VaultInventory) -> bool;
}

/// Approves every step
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn start_new_job(&self, _vault_name: &str, _existing: &[RetrievalJob]) -> bool {
        true
    }

    async fn empty_vault(&self, _vault_name: &str, _job: &RetrievalJob) -> bool {
        true
    }

    async fn delete_vault(&self, _vault_name: &str, _inventory: &VaultInventory) -> bool {
        true
    }
}

/// Declines every step, so a sweep only reports status
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

#[async_trait]
impl Confirm for AssumeNo {
    async fn start_new_job(&self, _vault_name: &str, _existing: &[RetrievalJob]) -> bool {
        false
    }

    async fn empty_vault(&self, _vault_name: &str, _job: &RetrievalJob) -> bool {
        false
    }

    async fn delete_vault(&self, _vault_name: &str, _inventory: &VaultInventory) -> bool {
        false
    }
}

/// Per-run choices
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Follow this job instead of picking one from the registry
    pub job_id: Option<String>,
    /// Offer to start a new job even when a usable one exists
    pub force_new_job: bool,
}

/// What one sweep pass did
#[must_use]
#[derive(Debug)]
pub struct SweepReport {
    /// The vault swept
    pub vault_name: String,
    /// The job followed, if one was found or started
    pub job_id: Option<String>,
    /// Every state entered, in order
    pub path: Vec<SweepState>,
    /// Inventory fetched during this pass
    pub inventory: Option<VaultInventory>,
    /// Result of the archive deletion pass, if one ran
    pub deletion: Option<DeletionReport>,
    /// Fresh inventory job started after a pass found nothing left to delete
    pub next_job_id: Option<String>,
}

impl SweepReport {
    fn new(vault_name: &str) -> Self {
        Self {
            vault_name: vault_name.to_string(),
            job_id: None,
            path: Vec::new(),
            inventory: None,
            deletion: None,
            next_job_id: None,
        }
    }

    /// Whether the pass re-drained an inventory whose archives were all gone
    ///
    /// Such an inventory cannot prove anything further; only a new inventory
    /// job moves the vault towards deletion.
    pub fn inventory_is_stale(&self) -> bool {
        self.deletion.as_ref().is_some_and(|d| {
            d.attempted > 0 && d.already_absent == d.attempted && d.is_complete()
        })
    }

    /// The state the sweep stopped in
    pub fn final_state(&self) -> Option<SweepState> {
        self.path.last().copied()
    }

    fn enter(&mut self, state: SweepState) {
        if let Some(previous) = self.final_state() {
            debug_assert!(
                previous.can_transition_to(state),
                "illegal sweep transition {previous} -> {state}"
            );
        }
        tracing::info!(vault = %self.vault_name, state = %state, "Sweep state changed");
        self.path.push(state);
    }
}

/// Drives a vault from "unknown contents" towards deletion, one pass at a time
///
/// # Examples
///
/// ```
/// use glacier_sweep::glacier::InMemoryGlacier;
/// use glacier_sweep::sweeper::{AssumeYes, SweepOptions, SweepState, VaultSweeper};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let glacier = Arc::new(InMemoryGlacier::new("012345678901", "us-east-1"));
/// glacier.create_vault("old-backups");
///
/// let sweeper = VaultSweeper::new(glacier.clone(), Arc::new(AssumeYes));
///
/// // First run starts an inventory job and stops.
/// let report = sweeper.sweep("-", "old-backups", &SweepOptions::default()).await?;
/// assert_eq!(report.final_state(), Some(SweepState::JobPending));
///
/// // Hours later the job has finished; the next run deletes the empty vault.
/// glacier.complete_job(report.job_id.as_deref().ok_or("no job started")?);
/// let report = sweeper.sweep("-", "old-backups", &SweepOptions::default()).await?;
/// assert_eq!(report.final_state(), Some(SweepState::VaultDeleted));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VaultSweeper {
    api: Arc<dyn GlacierApi>,
    registry: JobRegistry,
    emptier: VaultEmptier,
    confirm: Arc<dyn Confirm>,
}

impl VaultSweeper {
    /// Create a sweeper with default job and deletion settings
    pub fn new(api: Arc<dyn GlacierApi>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            registry: JobRegistry::new(api.clone()),
            emptier: VaultEmptier::new(api.clone()),
            api,
            confirm,
        }
    }

    /// Create a sweeper using the job and deletion settings of `config`
    pub fn from_config(
        api: Arc<dyn GlacierApi>,
        confirm: Arc<dyn Confirm>,
        config: &Config,
    ) -> Self {
        let request = InventoryJobRequest {
            description: config.job.description.clone(),
            sns_topic: config.job.sns_topic.clone(),
        };
        Self {
            registry: JobRegistry::new(api.clone()).with_request(request),
            emptier: VaultEmptier::new(api.clone()).with_config(config.deletion.clone()),
            api,
            confirm,
        }
    }

    /// The job registry used by this sweeper
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// The emptier used by this sweeper
    pub fn emptier(&self) -> &VaultEmptier {
        &self.emptier
    }

    /// Vaults in the account and region, sorted by name
    ///
    /// An account without vaults yields an empty list.
    pub async fn list_vaults(&self, account_id: &str) -> Result<Vec<VaultSummary>> {
        let mut vaults = self.api.list_vaults(account_id).await?;
        vaults.sort_by(|a, b| a.vault_name.cmp(&b.vault_name));
        if vaults.is_empty() {
            tracing::info!(account_id, client = self.api.name(), "No vaults found");
        }
        Ok(vaults)
    }

    /// Run one pass over `vault_name`
    ///
    /// Service, parse and precondition errors abort the pass; per-archive
    /// deletion failures are reported in [`SweepReport::deletion`].
    pub async fn sweep(
        &self,
        account_id: &str,
        vault_name: &str,
        options: &SweepOptions,
    ) -> Result<SweepReport> {
        let mut report = SweepReport::new(vault_name);

        let job_id = match &options.job_id {
            Some(job_id) => job_id.clone(),
            None => self.select_job(account_id, vault_name, options, &mut report).await?,
        };
        report.job_id = Some(job_id.clone());

        let job = self
            .registry
            .describe_job(account_id, vault_name, &job_id)
            .await?;
        if report.final_state().is_none() {
            report.enter(SweepState::JobPending);
        }
        match job.status {
            JobStatus::InProgress => {
                tracing::info!(vault = vault_name, job_id = %job_id, "Inventory retrieval in progress, re-run later");
                return Ok(report);
            }
            JobStatus::Failed => {
                report.enter(SweepState::JobFailed);
                tracing::warn!(
                    vault = vault_name,
                    job_id = %job_id,
                    reason = job.status_message.as_deref().unwrap_or("unknown"),
                    "Inventory retrieval failed"
                );
                return Ok(report);
            }
            JobStatus::Succeeded => report.enter(SweepState::JobCompleted),
        }

        if !self.confirm.empty_vault(vault_name, &job).await {
            report.enter(SweepState::Declined);
            tracing::info!(vault = vault_name, "Skipping cleanup");
            return Ok(report);
        }

        match self
            .emptier
            .empty_vault(account_id, vault_name, &job_id)
            .await?
        {
            EmptyVaultOutcome::EligibleForDeletion(inventory) => {
                report.enter(SweepState::InventoryKnown);
                report.enter(SweepState::VaultEmpty);
                if self.confirm.delete_vault(vault_name, &inventory).await {
                    self.emptier
                        .delete_vault(account_id, vault_name, &inventory)
                        .await?;
                    report.enter(SweepState::VaultDeleted);
                }
                report.inventory = Some(inventory);
            }
            EmptyVaultOutcome::ArchivesDeleted(deletion) => {
                report.enter(SweepState::InventoryKnown);
                report.enter(SweepState::VaultNonEmpty);
                report.enter(SweepState::ArchivesDeleting);
                if deletion.is_complete() {
                    // Deleting the vault needs a fresh inventory showing it empty.
                    report.enter(SweepState::VaultEmpty);
                }
                report.deletion = Some(deletion);
                if report.inventory_is_stale() {
                    self.refresh_inventory(account_id, vault_name, &job, &mut report)
                        .await?;
                }
            }
        }

        Ok(report)
    }

    /// Offer a new inventory job in place of a fully drained one
    async fn refresh_inventory(
        &self,
        account_id: &str,
        vault_name: &str,
        stale: &RetrievalJob,
        report: &mut SweepReport,
    ) -> Result<()> {
        tracing::info!(
            vault = vault_name,
            job_id = %stale.job_id,
            "Every listed archive was already deleted, inventory is stale"
        );
        if !self
            .confirm
            .start_new_job(vault_name, std::slice::from_ref(stale))
            .await
        {
            return Ok(());
        }

        let job_id = self
            .registry
            .initiate_inventory_retrieval(account_id, vault_name)
            .await?;
        report.enter(SweepState::JobPending);
        report.next_job_id = Some(job_id);
        Ok(())
    }

    /// Pick the job to follow, starting one when none is usable
    async fn select_job(
        &self,
        account_id: &str,
        vault_name: &str,
        options: &SweepOptions,
        report: &mut SweepReport,
    ) -> Result<String> {
        let jobs = self.registry.list_jobs(account_id, vault_name).await?;
        let usable: Vec<RetrievalJob> = jobs
            .iter()
            .filter(|job| job.is_inventory() && job.status.is_usable())
            .cloned()
            .collect();

        if let Some(job) = most_recent(&usable) {
            let replace = options.force_new_job
                && self.confirm.start_new_job(vault_name, &usable).await;
            if !replace {
                return Ok(job.job_id.clone());
            }
        }

        report.enter(SweepState::NoJob);
        let job_id = self
            .registry
            .initiate_inventory_retrieval(account_id, vault_name)
            .await?;
        report.enter(SweepState::JobPending);
        Ok(job_id)
    }
}
