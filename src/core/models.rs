//! Data models for billing source verification.
//!
//! All values here are call-scoped: they are built for one verification,
//! passed down by reference and dropped when the call returns.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CurcheckError;

/// Schema element that marks an export as carrying resource IDs.
pub const RESOURCES_ELEMENT: &str = "RESOURCES";

// =============================================================================
// Input
// =============================================================================

/// Cross-account role reference supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedCredential {
    /// IAM role ARN to assume.
    #[serde(default)]
    pub role_arn: String,
    /// External ID required by the role's trust policy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl DelegatedCredential {
    #[must_use]
    pub fn new(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            external_id: None,
        }
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Where the cost reports are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceDescriptor {
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Region of the bucket; also scopes the token exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_region: Option<String>,
    /// Bucket access is enough; skip export validation.
    #[serde(default)]
    pub storage_only: bool,
}

impl DataSourceDescriptor {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            bucket_region: None,
            storage_only: false,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.bucket_region = Some(region.into());
        self
    }

    #[must_use]
    pub const fn storage_only(mut self) -> Self {
        self.storage_only = true;
        self
    }
}

/// A registered billing source: credentials plus data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSource {
    pub credentials: DelegatedCredential,
    pub data_source: DataSourceDescriptor,
}

// =============================================================================
// Resolved credentials
// =============================================================================

/// Short-lived credentials obtained from the token exchange.
///
/// A credential is usable only when every field is present and non-empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl ResolvedCredential {
    /// A credential with every field set.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            session_token: Some(session_token.into()),
        }
    }

    /// The "no credentials obtained" value.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }

    /// Whether every field is present and non-empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        [
            &self.access_key_id,
            &self.secret_access_key,
            &self.session_token,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }

    /// The three fields, if usable.
    #[must_use]
    pub fn parts(&self) -> Option<(&str, &str, &str)> {
        if !self.is_usable() {
            return None;
        }
        Some((
            self.access_key_id.as_deref()?,
            self.secret_access_key.as_deref()?,
            self.session_token.as_deref()?,
        ))
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "** redacted **");
        f.debug_struct("ResolvedCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

// =============================================================================
// Export definitions
// =============================================================================

/// Generation of the report configuration API that produced a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportApi {
    /// BCM Data Exports (current).
    DataExports,
    /// Cost and Usage Report definitions (legacy).
    CostAndUsageReport,
}

impl ExportApi {
    /// Whether this is the current export API.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(self, Self::DataExports)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DataExports => "data-exports",
            Self::CostAndUsageReport => "cur",
        }
    }
}

impl fmt::Display for ExportApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One configured cost and usage export, normalized across API generations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDefinition {
    pub name: String,
    pub destination_bucket: String,
    pub compression: String,
    #[serde(default)]
    pub additional_schema_elements: BTreeSet<String>,
    /// Explicit include-resources flag; only the current API has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_resources: Option<bool>,
}

impl ExportDefinition {
    /// Whether the export lists the resource ID schema element.
    #[must_use]
    pub fn lists_resources(&self) -> bool {
        self.additional_schema_elements.contains(RESOURCES_ELEMENT)
    }
}

/// Export definitions together with the API generation they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExports {
    pub definitions: Vec<ExportDefinition>,
    pub api: ExportApi,
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of a reachability verification.
#[derive(Debug)]
pub enum VerificationOutcome {
    /// Every applicable check passed.
    Verified {
        /// The current export API answered. Reserved for callers that record it.
        uses_current_export_api: bool,
    },
    /// A check failed; the error carries the stable kind and message.
    Failed(CurcheckError),
}

impl VerificationOutcome {
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// The stable kind of the failure, if any.
    #[must_use]
    pub const fn error_kind(&self) -> Option<&'static str> {
        match self {
            Self::Verified { .. } => None,
            Self::Failed(err) => Some(err.error_kind()),
        }
    }

    /// Convert into a `Result`, yielding the export API flag on success.
    ///
    /// # Errors
    ///
    /// Returns the verification error when the outcome is `Failed`.
    pub fn into_result(self) -> crate::error::Result<bool> {
        match self {
            Self::Verified {
                uses_current_export_api,
            } => Ok(uses_current_export_api),
            Self::Failed(err) => Err(err),
        }
    }
}

impl From<crate::error::Result<bool>> for VerificationOutcome {
    fn from(result: crate::error::Result<bool>) -> Self {
        match result {
            Ok(uses_current_export_api) => Self::Verified {
                uses_current_export_api,
            },
            Err(err) => Self::Failed(err),
        }
    }
}
