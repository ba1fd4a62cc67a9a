//! Glacier service access
//!
//! The core talks to the service only through the [`GlacierApi`] trait, so
//! the same sweep logic runs against the real service or an in-process model.
//!
//! - [`SdkGlacier`]: the AWS SDK client
//! - [`InMemoryGlacier`]: vaults, archives and jobs held in memory
//! - [`DryRun`]: decorator that forwards reads and only logs writes
//!
//! ## Usage
//!
//! ```no_run
//! use glacier_sweep::{Config, glacier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         region: Some("us-west-2".into()),
//!         dry_run: true,
//!         ..Default::default()
//!     };
//!
//!     let client = glacier::connect(&config).await?;
//!     println!("using {} client", client.name());
//!     Ok(())
//! }
//! ```

mod dry_run;
mod memory;
mod sdk;
mod traits;

pub use dry_run::{DRY_RUN_JOB_ID, DryRun};
pub use memory::{Call, InMemoryGlacier};
pub use sdk::SdkGlacier;
pub use traits::{GlacierApi, InventoryJobRequest};

use crate::config::Config;
use std::sync::Arc;

/// Build the SDK-backed client described by `config`
///
/// Wraps it in [`DryRun`] when `config.dry_run` is set.
pub async fn connect(config: &Config) -> crate::Result<Arc<dyn GlacierApi>> {
    let client = SdkGlacier::from_config(config).await?;
    if config.dry_run {
        tracing::info!("Dry run enabled, mutating calls will be skipped");
        Ok(Arc::new(DryRun::new(client)))
    } else {
        Ok(Arc::new(client))
    }
}
