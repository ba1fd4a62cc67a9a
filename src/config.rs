//! Configuration types for glacier-sweep

use crate::error::{Error, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig, retry::RetryConfig};
use serde::{Deserialize, Serialize};

/// Account id that tells Glacier to use the account owning the credentials
pub const CURRENT_ACCOUNT: &str = "-";

/// Longest job description Glacier accepts
const MAX_JOB_DESCRIPTION_LEN: usize = 1024;

/// Settings for inventory-retrieval jobs started by this crate
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Description attached to new jobs (printable ASCII, at most 1024 bytes)
    #[serde(default)]
    pub description: Option<String>,

    /// SNS topic ARN notified when a job completes
    #[serde(default)]
    pub sns_topic: Option<String>,
}

/// Archive deletion behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeletionConfig {
    /// Count archives the service reports as missing as deleted (default: true)
    ///
    /// Repeating a sweep against a stale inventory then reports the
    /// previously deleted archives as `already_absent` instead of failed.
    #[serde(default = "default_true")]
    pub treat_not_found_as_deleted: bool,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            treat_not_found_as_deleted: true,
        }
    }
}

/// Main configuration for glacier-sweep
///
/// The account and region identify where the vault lives; everything else
/// tunes how the service is called.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Twelve-digit account id, or "-" for the credentials' own account (default: "-")
    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// Region override (None = resolve from the environment/profile)
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override, for local emulators and tests
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Maximum attempts per SDK call, 1 disables SDK-level retries (default: 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Log mutating calls instead of sending them (default: false)
    #[serde(default)]
    pub dry_run: bool,

    /// Inventory job settings
    #[serde(default)]
    pub job: JobConfig,

    /// Archive deletion settings
    #[serde(default)]
    pub deletion: DeletionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            region: None,
            endpoint_url: None,
            max_attempts: default_max_attempts(),
            dry_run: false,
            job: JobConfig::default(),
            deletion: DeletionConfig::default(),
        }
    }
}

impl Config {
    /// Check every setting, reporting the first invalid key
    pub fn validate(&self) -> Result<()> {
        if self.account_id != CURRENT_ACCOUNT
            && !(self.account_id.len() == 12 && self.account_id.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(config_error(
                format!(
                    "account_id must be \"-\" or a 12-digit account number, got {:?}",
                    self.account_id
                ),
                "account_id",
            ));
        }

        if matches!(&self.region, Some(region) if region.trim().is_empty()) {
            return Err(config_error("region must not be empty", "region"));
        }

        if self.max_attempts == 0 {
            return Err(config_error(
                "max_attempts must be at least 1",
                "max_attempts",
            ));
        }

        if let Some(description) = &self.job.description {
            if description.len() > MAX_JOB_DESCRIPTION_LEN {
                return Err(config_error(
                    format!("job description exceeds {MAX_JOB_DESCRIPTION_LEN} bytes"),
                    "job.description",
                ));
            }
            if !description.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
                return Err(config_error(
                    "job description must be printable ASCII",
                    "job.description",
                ));
            }
        }

        if let Some(topic) = &self.job.sns_topic
            && !topic.starts_with("arn:")
        {
            return Err(config_error(
                format!("sns_topic must be an ARN, got {topic:?}"),
                "job.sns_topic",
            ));
        }

        Ok(())
    }

    /// Load shared AWS configuration with this config's overrides applied
    ///
    /// Credentials and any unset region come from the standard provider
    /// chain (environment, profile, instance metadata).
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(self.max_attempts));

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        loader.load().await
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_account_id() -> String {
    CURRENT_ACCOUNT.to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_true() -> bool {
    true
}
