//! # glacier-sweep
//!
//! Library for decommissioning Amazon S3 Glacier vaults.
//!
//! A vault cannot be deleted while it holds archives, and the only way to
//! learn which archives it holds is an inventory-retrieval job that takes
//! hours to finish. glacier-sweep drives that workflow one pass at a time:
//! find or start an inventory job, wait for it across runs, download and
//! decode the inventory, delete every listed archive, and finally delete the
//! vault once an inventory shows it empty.
//!
//! ## Design Philosophy
//!
//! - **Resumable** - Nothing waits in-process; every pass ends in a state a later run can pick up
//! - **Best-effort deletion** - One failed archive never stops the rest of the batch
//! - **Explicit confirmation** - Starting jobs, emptying and deleting vaults go through [`Confirm`]
//! - **Testable seam** - All service access goes through [`GlacierApi`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use glacier_sweep::{AssumeNo, Config, SweepOptions, VaultSweeper, glacier};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         region: Some("eu-west-1".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let client = glacier::connect(&config).await?;
//!     let sweeper = VaultSweeper::from_config(client, Arc::new(AssumeNo), &config);
//!
//!     for vault in sweeper.list_vaults(&config.account_id).await? {
//!         let report = sweeper
//!             .sweep(&config.account_id, &vault.vault_name, &SweepOptions::default())
//!             .await?;
//!         println!("{}: {:?}", vault.vault_name, report.final_state());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Archive deletion and vault removal
pub mod emptier;
/// Error types
pub mod error;
/// Glacier service clients
pub mod glacier;
/// Inventory download and decoding
pub mod inventory;
/// Retrieval job lifecycle
pub mod jobs;
/// Sweep orchestration
pub mod sweeper;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, DeletionConfig, JobConfig};
pub use emptier::VaultEmptier;
pub use error::{Error, ParseError, PreconditionError, Result, ServiceError};
pub use glacier::{GlacierApi, InventoryJobRequest};
pub use inventory::{InventoryFetcher, parse_inventory};
pub use jobs::{EnsuredJob, JobRegistry, most_recent};
pub use sweeper::{
    AssumeNo, AssumeYes, Confirm, SweepOptions, SweepReport, SweepState, VaultSweeper,
};
pub use types::{
    Archive, ArchiveFailure, DeletionReport, EmptyVaultOutcome, JobAction, JobStatus,
    RetrievalJob, VaultInventory, VaultSummary,
};
