//! Error types for curcheck.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into three categories:
//! - **Verification**: A billing source failed one of the reachability checks
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Internal**: I/O and serialization failures outside of a check
//!
//! Transport failures inside a check never surface here on their own; they
//! are absorbed into the verification kind of the step that made the call.
//!
//! Each error has a stable error code (e.g., `CURCHECK-V001`) for programmatic
//! handling. Verification errors additionally carry a stable kind string
//! (e.g., `RoleArnUnreachable`) that UIs render verbatim.
//!
//! ## Fix Suggestions
//!
//! Each error type can provide actionable fix suggestions via the
//! [`CurcheckError::fix_suggestions()`] method.

pub mod suggestions;

use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A verification step failed (missing input, unreachable resource, bad export).
    Verification,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Verification => "Verification error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Verification => "V",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// The billing source failed verification
    VerificationFailed = 2,
    /// Invalid configuration or arguments
    ConfigError = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for curcheck operations.
///
/// Each variant has:
/// - A stable error code (e.g., `CURCHECK-V001`)
/// - A category for classification
/// - A retryable flag for callers that re-issue verification requests
#[derive(Error, Debug)]
pub enum CurcheckError {
    // ==========================================================================
    // Verification errors (Category: Verification)
    // ==========================================================================
    /// No role ARN was supplied.
    #[error("a role ARN is required to access the AWS account")]
    MissingRoleArn,

    /// No bucket name was supplied.
    #[error("an S3 bucket name is required for the billing source")]
    MissingBucket,

    /// The role could not be assumed, or the exchange returned incomplete credentials.
    #[error("unable to access account resources with ARN {role_arn}")]
    RoleArnUnreachable { role_arn: String, transient: bool },

    /// The bucket does not exist or is not reachable with the assumed role.
    #[error("bucket {bucket} could not be found with {role_arn}")]
    BillingSourceNotFound {
        bucket: String,
        role_arn: String,
        transient: bool,
    },

    /// Neither report configuration API could be read.
    #[error("unable to obtain report data with {credential}")]
    ReportAccessDenied { credential: String, transient: bool },

    /// No configured export writes to the declared bucket.
    #[error(
        "cost management requires that an AWS Cost and Usage Report is configured for bucket: {bucket}"
    )]
    ReportConfigMissing { bucket: String },

    /// A matching export uses a compression the ingestion pipeline cannot read.
    #[error(
        "{compression} compression is not supported (export {export}); reports must use one of: {allowed}"
    )]
    UnsupportedCompression {
        export: String,
        compression: String,
        /// Accepted compressions, comma separated.
        allowed: String,
    },

    /// A matching export omits resource identifiers.
    #[error("required Resource IDs are not included in report {export}")]
    ResourcesNotIncluded { export: String },

    /// An expected report object does not exist.
    #[error("file {key} could not be found within bucket {bucket}")]
    ReportNotFound { key: String, bucket: String },

    /// An expected report object could not be retrieved for a reason other than absence.
    #[error("file {key} could not be retrieved from bucket {bucket}: {reason}")]
    ReportFileUnreachable {
        key: String,
        bucket: String,
        reason: String,
        transient: bool,
    },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Generic configuration or argument error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CurcheckError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.category() {
            ErrorCategory::Verification => ExitCode::VerificationFailed,
            ErrorCategory::Configuration => ExitCode::ConfigError,
            ErrorCategory::Internal => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRoleArn
            | Self::MissingBucket
            | Self::RoleArnUnreachable { .. }
            | Self::BillingSourceNotFound { .. }
            | Self::ReportAccessDenied { .. }
            | Self::ReportConfigMissing { .. }
            | Self::UnsupportedCompression { .. }
            | Self::ResourcesNotIncluded { .. }
            | Self::ReportNotFound { .. }
            | Self::ReportFileUnreachable { .. } => ErrorCategory::Verification,

            Self::ConfigInvalid { .. } | Self::Config(_) => ErrorCategory::Configuration,

            Self::Io(_) | Self::Json(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the stable kind string surfaced to UIs.
    ///
    /// Verification failures use the names of the reachability taxonomy;
    /// everything else reports its category.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingRoleArn => "MissingRoleArn",
            Self::MissingBucket => "MissingBucket",
            Self::RoleArnUnreachable { .. } => "RoleArnUnreachable",
            Self::BillingSourceNotFound { .. } => "BillingSourceNotFound",
            Self::ReportAccessDenied { .. } => "ReportAccessDenied",
            Self::ReportConfigMissing { .. } => "ReportConfigMissing",
            Self::UnsupportedCompression { .. } => "UnsupportedCompression",
            Self::ResourcesNotIncluded { .. } => "ResourcesNotIncluded",
            Self::ReportNotFound { .. } => "ReportNotFound",
            Self::ReportFileUnreachable { .. } => "ReportFileUnreachable",
            Self::ConfigInvalid { .. } | Self::Config(_) => "Configuration",
            Self::Io(_) | Self::Json(_) => "Internal",
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `CURCHECK-{category}{number}` where category is:
    /// - V: Verification
    /// - C: Configuration
    /// - X: Internal
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Verification errors (V001-V099)
            Self::MissingRoleArn => "CURCHECK-V001",
            Self::MissingBucket => "CURCHECK-V002",
            Self::RoleArnUnreachable { .. } => "CURCHECK-V003",
            Self::BillingSourceNotFound { .. } => "CURCHECK-V004",
            Self::ReportAccessDenied { .. } => "CURCHECK-V005",
            Self::ReportConfigMissing { .. } => "CURCHECK-V006",
            Self::UnsupportedCompression { .. } => "CURCHECK-V007",
            Self::ResourcesNotIncluded { .. } => "CURCHECK-V008",
            Self::ReportNotFound { .. } => "CURCHECK-V009",
            Self::ReportFileUnreachable { .. } => "CURCHECK-V010",

            // Configuration errors (C001-C099)
            Self::ConfigInvalid { .. } => "CURCHECK-C001",
            Self::Config(_) => "CURCHECK-C002",

            // Internal errors (X001-X099)
            Self::Io(_) => "CURCHECK-X001",
            Self::Json(_) => "CURCHECK-X002",
        }
    }

    /// Returns whether repeating the request might succeed.
    ///
    /// Only failures that came from an absorbed transport error (timeout,
    /// connection failure, throttling) are retryable. Missing input and
    /// misconfigured exports never are.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RoleArnUnreachable { transient, .. }
            | Self::BillingSourceNotFound { transient, .. }
            | Self::ReportAccessDenied { transient, .. }
            | Self::ReportFileUnreachable { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Returns the bucket name if this error concerns a specific bucket.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::BillingSourceNotFound { bucket, .. }
            | Self::ReportConfigMissing { bucket }
            | Self::ReportNotFound { bucket, .. }
            | Self::ReportFileUnreachable { bucket, .. } => Some(bucket),
            _ => None,
        }
    }

    /// Returns actionable fix suggestions for this error.
    ///
    /// # Example
    ///
    /// ```
    /// use curcheck::error::CurcheckError;
    ///
    /// let err = CurcheckError::ReportConfigMissing { bucket: "cost-reports".to_string() };
    /// let suggestions = err.fix_suggestions();
    /// assert!(!suggestions.is_empty());
    /// ```
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::MissingRoleArn => suggestions::missing_role_arn_suggestions(),
            Self::MissingBucket => suggestions::missing_bucket_suggestions(),
            Self::RoleArnUnreachable {
                role_arn,
                transient,
            } => suggestions::role_unreachable_suggestions(role_arn, *transient),
            Self::BillingSourceNotFound {
                bucket, role_arn, ..
            } => suggestions::bucket_not_found_suggestions(bucket, role_arn),
            Self::ReportAccessDenied { credential, .. } => {
                suggestions::report_access_denied_suggestions(credential)
            }
            Self::ReportConfigMissing { bucket } => {
                suggestions::report_config_missing_suggestions(bucket)
            }
            Self::UnsupportedCompression {
                export,
                compression,
                allowed,
            } => suggestions::unsupported_compression_suggestions(export, compression, allowed),
            Self::ResourcesNotIncluded { export } => {
                suggestions::resources_not_included_suggestions(export)
            }
            Self::ReportNotFound { key, bucket } => {
                suggestions::report_not_found_suggestions(key, bucket)
            }
            Self::ReportFileUnreachable { key, bucket, .. } => {
                suggestions::report_file_unreachable_suggestions(key, bucket)
            }
            Self::ConfigInvalid {
                key,
                value,
                message,
            } => suggestions::config_invalid_suggestions(key, value, message),
            Self::Config(msg) => vec![FixSuggestion::new(
                vec!["curcheck --help".to_string()],
                format!("Configuration error: {msg}"),
            )],
            Self::Io(err) => vec![FixSuggestion::new(
                vec!["# Check file permissions and paths".to_string()],
                format!("I/O error: {err}."),
            )],
            Self::Json(err) => vec![FixSuggestion::new(
                vec!["# Validate the source file with: jq . <file>".to_string()],
                format!("JSON parsing error: {err}. The source file may be malformed."),
            )],
        }
    }
}

/// Result type alias for curcheck operations.
pub type Result<T> = std::result::Result<T, CurcheckError>;

// =============================================================================
// Tests
// =============================================================================
