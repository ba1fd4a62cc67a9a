//! Test configuration helpers for live AWS runs

use glacier_sweep::Config;

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load live test configuration from environment variables
///
/// Required environment variables:
/// - `GLACIER_TEST_REGION` - Region holding the scratch vault
/// - `GLACIER_TEST_VAULT` - Name of a vault the tests may inspect
///
/// Optional environment variables:
/// - `GLACIER_TEST_ACCOUNT` - Account id (default: `-`)
///
/// Credentials come from the usual AWS provider chain.
pub fn load_live_config() -> Result<(Config, String), ConfigError> {
    dotenvy::dotenv().ok();

    let region = std::env::var("GLACIER_TEST_REGION")
        .map_err(|_| ConfigError("GLACIER_TEST_REGION not set in environment".to_string()))?;

    let vault = std::env::var("GLACIER_TEST_VAULT")
        .map_err(|_| ConfigError("GLACIER_TEST_VAULT not set in environment".to_string()))?;

    let account_id = std::env::var("GLACIER_TEST_ACCOUNT").unwrap_or_else(|_| "-".to_string());

    let config = Config {
        account_id,
        region: Some(region),
        // Live tests must never delete anything.
        dry_run: true,
        ..Default::default()
    };
    Ok((config, vault))
}

/// Whether live credentials are configured
pub fn has_live_credentials() -> bool {
    load_live_config().is_ok()
}
