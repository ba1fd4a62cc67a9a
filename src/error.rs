//! Error types for glacier-sweep
//!
//! Errors fall into four families:
//! - [`ServiceError`]: a call to the Glacier service failed (network, auth,
//!   throttling, unknown job or vault)
//! - [`ParseError`]: a job output or service response could not be decoded
//! - [`PreconditionError`]: an operation was rejected locally before any
//!   mutating call reached the service
//! - configuration errors, carrying the offending key
//!
//! Per-archive deletion failures are not raised through this type; they are
//! collected into a [`DeletionReport`](crate::types::DeletionReport).

use thiserror::Error;

/// Result type alias for glacier-sweep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error code Glacier returns for unknown vaults, jobs and archives
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Main error type for glacier-sweep
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "account_id")
        key: Option<String>,
    },

    /// Remote Glacier call failed
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Job output or service response could not be decoded
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Operation rejected before contacting the service
    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionError),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Service(e) if e.is_not_found() => "not_found",
            Error::Service(e) if e.is_throttling() => "throttled",
            Error::Service(_) => "service_error",
            Error::Parse(_) => "parse_error",
            Error::Precondition(_) => "precondition_violation",
        }
    }

    /// True when the service reported the target resource as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Service(e) if e.is_not_found())
    }
}

/// A failed call to the Glacier service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}{}", code_suffix(.code))]
pub struct ServiceError {
    /// The API operation that failed (e.g., "DescribeJob")
    pub operation: &'static str,
    /// Service error code when the service returned one (e.g., "ResourceNotFoundException")
    pub code: Option<String>,
    /// Human-readable description of the failure
    pub message: String,
}

impl ServiceError {
    /// Create a service error without an error code
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a service error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Create a "not found" error for the given operation
    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, message).with_code(RESOURCE_NOT_FOUND)
    }

    /// True when the service reported the target resource as absent
    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some(RESOURCE_NOT_FOUND)
    }

    /// True for throttling and request-limit errors
    ///
    /// The crate never retries on its own; this lets callers build their
    /// own retry policy.
    pub fn is_throttling(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some("ThrottlingException" | "LimitExceededException" | "RequestTimeoutException")
        )
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Decoding failures for job output and service responses
#[derive(Debug, Error)]
pub enum ParseError {
    /// Payload is not valid JSON or does not match the expected shape
    #[error("invalid inventory payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A timestamp field could not be parsed as RFC 3339
    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp {
        /// The field holding the timestamp (e.g., "CreationDate")
        field: &'static str,
        /// The raw value that failed to parse
        value: String,
        /// Underlying chrono error
        #[source]
        source: chrono::ParseError,
    },

    /// A required field was absent from a service response
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// The API operation whose response was incomplete
        operation: &'static str,
        /// The missing field
        field: &'static str,
    },
}

/// Operations rejected locally before any mutating call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// Job output requested before the job finished
    #[error("job {job_id} has not completed yet")]
    JobNotComplete {
        /// The job that is still in progress
        job_id: String,
    },

    /// Job output requested for a job the service marked as failed
    #[error("job {job_id} failed: {reason}")]
    JobFailed {
        /// The failed job
        job_id: String,
        /// Status message reported by the service
        reason: String,
    },

    /// Inventory requested from a job that is not an inventory retrieval
    #[error("job {job_id} is a {action} job, not an inventory retrieval")]
    NotInventoryJob {
        /// The job that was used
        job_id: String,
        /// The job's actual action (e.g., "ArchiveRetrieval")
        action: String,
    },

    /// Vault deletion requested while the known inventory still lists archives
    #[error("vault {vault_name} still holds {archive_count} archives")]
    VaultNotEmpty {
        /// The vault that was about to be deleted
        vault_name: String,
        /// Number of archives in the known inventory
        archive_count: usize,
    },

    /// Inventory belongs to a different vault than the one being acted on
    #[error("inventory for vault {found} cannot be applied to vault {expected}")]
    VaultMismatch {
        /// The vault the caller named
        expected: String,
        /// The vault named by the inventory's ARN
        found: String,
    },

    /// Inventory whose ARN names no vault, so it proves nothing about any vault
    #[error("inventory ARN {vault_arn:?} does not identify a vault")]
    UnknownVault {
        /// The ARN found in the inventory
        vault_arn: String,
    },
}
