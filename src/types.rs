//! Core types for glacier-sweep

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Retrieval type passed to InitiateJob for a full vault manifest
pub const INVENTORY_RETRIEVAL: &str = "inventory-retrieval";

/// Output format requested for inventory jobs
pub const INVENTORY_FORMAT: &str = "JSON";

/// Status code reported by the service for a retrieval job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job accepted and still running (typically several hours)
    InProgress,
    /// Job finished and its output can be downloaded
    Succeeded,
    /// Job finished without producing output
    Failed,
}

impl JobStatus {
    /// Parse the service's status code ("InProgress", "Succeeded", "Failed")
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "InProgress" => Some(JobStatus::InProgress),
            "Succeeded" => Some(JobStatus::Succeeded),
            "Failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// The service's status code for this status
    pub fn as_code(&self) -> &'static str {
        match self {
            JobStatus::InProgress => "InProgress",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }

    /// Whether a job in this status can still yield an inventory
    pub fn is_usable(&self) -> bool {
        matches!(self, JobStatus::InProgress | JobStatus::Succeeded)
    }

    /// Whether the job has stopped running
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// What a retrieval job was started for
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobAction {
    /// Full vault manifest
    InventoryRetrieval,
    /// Single archive download
    ArchiveRetrieval,
    /// S3 Select query over an archive
    Select,
    /// Action code this crate does not know about
    Other(String),
}

impl JobAction {
    /// Parse the service's action code
    pub fn from_code(code: &str) -> Self {
        match code {
            "InventoryRetrieval" => JobAction::InventoryRetrieval,
            "ArchiveRetrieval" => JobAction::ArchiveRetrieval,
            "Select" => JobAction::Select,
            other => JobAction::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for JobAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobAction::InventoryRetrieval => f.write_str("InventoryRetrieval"),
            JobAction::ArchiveRetrieval => f.write_str("ArchiveRetrieval"),
            JobAction::Select => f.write_str("Select"),
            JobAction::Other(code) => f.write_str(code),
        }
    }
}

/// An asynchronous retrieval job as last reported by the service
///
/// Jobs are created remotely and only ever observed here; the service
/// expires them on its own schedule (about a day after completion).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalJob {
    /// Opaque, service-assigned job identifier
    pub job_id: String,
    /// Vault the job runs against
    pub vault_name: String,
    /// Account that owns the vault ("-" for the caller's own account)
    pub account_id: String,
    /// ARN of the vault, when the service reported it
    pub vault_arn: Option<String>,
    /// What the job retrieves
    pub action: JobAction,
    /// When the job was initiated
    pub creation_date: DateTime<Utc>,
    /// When the job finished, if it has
    pub completion_date: Option<DateTime<Utc>>,
    /// Current status code
    pub status: JobStatus,
    /// Free-form status or failure message from the service
    pub status_message: Option<String>,
}

impl RetrievalJob {
    /// True once the job succeeded and its output can be fetched
    pub fn completed(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// True for inventory-retrieval jobs
    pub fn is_inventory(&self) -> bool {
        self.action == JobAction::InventoryRetrieval
    }
}

/// A stored archive as listed in a vault inventory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Opaque archive identifier, unique within the vault
    #[serde(rename = "ArchiveId")]
    pub archive_id: String,
    /// Description supplied at upload time (often empty)
    #[serde(rename = "ArchiveDescription")]
    pub description: String,
    /// Upload time
    #[serde(rename = "CreationDate")]
    pub creation_date: DateTime<Utc>,
    /// Size in bytes
    #[serde(rename = "Size")]
    pub size: i64,
    /// SHA-256 tree hash of the archive contents
    #[serde(rename = "SHA256TreeHash")]
    pub sha256_tree_hash: String,
}

/// Manifest of a vault produced by a completed inventory-retrieval job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultInventory {
    /// ARN of the inventoried vault
    #[serde(rename = "VaultARN")]
    pub vault_arn: String,
    /// Point in time the inventory reflects
    #[serde(rename = "InventoryDate")]
    pub inventory_date: DateTime<Utc>,
    /// Archives in the vault, in the order the service listed them
    #[serde(rename = "ArchiveList")]
    pub archives: Vec<Archive>,
}

impl VaultInventory {
    /// Vault name taken from the ARN (`arn:aws:glacier:<region>:<account>:vaults/<name>`)
    pub fn vault_name(&self) -> Option<&str> {
        self.vault_arn
            .rsplit_once(":vaults/")
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
    }

    /// True when the inventory lists no archives
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Sum of all archive sizes in bytes
    pub fn total_size(&self) -> i64 {
        self.archives.iter().map(|a| a.size).sum()
    }
}

/// Summary of a vault as returned by ListVaults
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSummary {
    /// Vault name
    pub vault_name: String,
    /// Vault ARN
    pub vault_arn: Option<String>,
    /// Archive count as of the last service-side inventory
    pub number_of_archives: i64,
    /// Total size as of the last service-side inventory
    pub size_in_bytes: i64,
    /// When the vault was created
    pub creation_date: Option<DateTime<Utc>>,
    /// When the service last inventoried the vault (roughly daily)
    pub last_inventory_date: Option<DateTime<Utc>>,
}

/// One archive that could not be deleted
#[derive(Debug)]
pub struct ArchiveFailure {
    /// The archive that is still in the vault
    pub archive_id: String,
    /// Why the deletion failed
    pub error: Error,
}

/// Result of deleting every archive of an inventory
///
/// `attempted == succeeded + failed.len()` always holds.
#[must_use]
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Number of DeleteArchive calls issued
    pub attempted: usize,
    /// Archives confirmed gone, including those already absent
    pub succeeded: usize,
    /// Archives the service reported as already deleted
    pub already_absent: usize,
    /// Archives that are still present, with the cause
    pub failed: Vec<ArchiveFailure>,
}

impl DeletionReport {
    /// Number of archives that failed to delete
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// True when every attempted deletion succeeded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Identifiers of the archives that failed to delete, in attempt order
    pub fn failed_archive_ids(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.archive_id.as_str())
    }
}

/// What [`VaultEmptier::empty_vault`](crate::emptier::VaultEmptier::empty_vault) did
#[must_use]
#[derive(Debug)]
pub enum EmptyVaultOutcome {
    /// The inventory lists no archives; the vault may be deleted once confirmed
    EligibleForDeletion(VaultInventory),
    /// Archives were listed and a deletion pass ran over all of them
    ArchivesDeleted(DeletionReport),
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(arn: &str, sizes: &[i64]) -> VaultInventory {
        VaultInventory {
            vault_arn: arn.to_string(),
            inventory_date: "2024-05-01T10:00:00Z".parse().unwrap(),
            archives: sizes
                .iter()
                .enumerate()
                .map(|(i, size)| Archive {
                    archive_id: format!("A{i}"),
                    description: String::new(),
                    creation_date: "2024-04-01T10:00:00Z".parse().unwrap(),
                    size: *size,
                    sha256_tree_hash: "00".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_job_status_codes() {
        for status in [JobStatus::InProgress, JobStatus::Succeeded, JobStatus::Failed] {
            assert_eq!(JobStatus::from_code(status.as_code()), Some(status));
        }
        assert_eq!(JobStatus::from_code("Expired"), None);
    }

    #[test]
    fn test_job_status_usability() {
        assert!(JobStatus::InProgress.is_usable());
        assert!(JobStatus::Succeeded.is_usable());
        assert!(!JobStatus::Failed.is_usable());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_action_unknown_code_is_preserved() {
        assert_eq!(
            JobAction::from_code("InventoryRetrieval"),
            JobAction::InventoryRetrieval
        );
        let other = JobAction::from_code("Restore");
        assert_eq!(other, JobAction::Other("Restore".into()));
        assert_eq!(other.to_string(), "Restore");
    }

    #[test]
    fn test_vault_name_from_arn() {
        let inv = inventory("arn:aws:glacier:us-west-2:012345678901:vaults/photos", &[]);
        assert_eq!(inv.vault_name(), Some("photos"));

        let inv = inventory("not-an-arn", &[]);
        assert_eq!(inv.vault_name(), None);

        let inv = inventory("arn:aws:glacier:us-west-2:012345678901:vaults/", &[]);
        assert_eq!(inv.vault_name(), None);
    }

    #[test]
    fn test_total_size_sums_archives() {
        let inv = inventory("arn:aws:glacier:us-west-2:1:vaults/v", &[10, 20, 5]);
        assert_eq!(inv.total_size(), 35);
        assert!(!inv.is_empty());
    }

    #[test]
    fn test_deletion_report_accessors() {
        let report = DeletionReport {
            attempted: 2,
            succeeded: 1,
            already_absent: 0,
            failed: vec![ArchiveFailure {
                archive_id: "A1".into(),
                error: crate::error::ServiceError::new("DeleteArchive", "boom").into(),
            }],
        };
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failed_archive_ids().collect::<Vec<_>>(), vec!["A1"]);
    }
}
