//! Classified outcome of an outbound AWS call.
//!
//! Every outbound seam (token exchange, object storage, report configuration)
//! returns `Result<_, AccessFailure>`. The verifier decides what each class
//! means for the user; the seams only say what happened.

use thiserror::Error;

/// Why an outbound call did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessFailure {
    /// The request was rejected before it was sent (bad parameters, unparsable ARN).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The service answered, but the caller is not allowed or the resource is not set up.
    #[error("not configured: {0}")]
    NotConfigured(String),
    /// The service answered that the addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The service could not be reached or did not answer in time.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl AccessFailure {
    /// Whether a later identical request might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotConfigured(_) => "not_configured",
            Self::NotFound(_) => "not_found",
            Self::Transient(_) => "transient",
        }
    }

    /// The underlying detail message.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidRequest(d)
            | Self::NotConfigured(d)
            | Self::NotFound(d)
            | Self::Transient(d) => d,
        }
    }
}
