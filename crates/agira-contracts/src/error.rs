//! Runtime error types for the Agira reporting core.
//!
//! All fallible operations in the workspace return `AgiraResult<T>`.
//! Report-side variants propagate to the caller; `CacheBackend` never leaves
//! the agent cache service.

use thiserror::Error;

/// The end-user text shown for any report-side failure.
pub const REPORT_FAILURE_MESSAGE: &str = "The report could not be generated.";

/// The unified error type for the Agira reporting core.
#[derive(Debug, Error)]
pub enum AgiraError {
    /// No template factory is registered under the requested report key.
    #[error("report template '{key}' is not registered")]
    NotRegistered { key: String },

    /// A report key was registered twice.
    ///
    /// This is a startup programming error and should abort the process.
    #[error("report template '{key}' is already registered")]
    DuplicateRegistration { key: String },

    /// The report context does not satisfy the template's context schema.
    #[error("invalid report context: {reason}")]
    InvalidContext { reason: String },

    /// The template or layout engine failed while building the document.
    #[error("report rendering failed: {reason}")]
    RenderFailed { reason: String },

    /// The rendered file or its database row could not be persisted.
    #[error("report storage failed: {reason}")]
    StorageFailed { reason: String },

    /// The cache backing store failed or is unreachable.
    #[error("cache backend error: {reason}")]
    CacheBackend { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl AgiraError {
    /// True for every error raised while generating or storing a report.
    pub fn is_report_failure(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered { .. }
                | Self::DuplicateRegistration { .. }
                | Self::InvalidContext { .. }
                | Self::RenderFailed { .. }
                | Self::StorageFailed { .. }
        )
    }

    /// Text safe to show an end user. Internal details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        if self.is_report_failure() {
            REPORT_FAILURE_MESSAGE
        } else {
            "An internal error occurred."
        }
    }
}

/// Convenience alias used throughout the Agira crates.
pub type AgiraResult<T> = Result<T, AgiraError>;
