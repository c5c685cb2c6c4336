//! Export configuration policy.
//!
//! A billing source is only ingestible when at least one export writes into
//! its bucket, and every such export uses a supported compression and
//! carries resource identifiers.

use std::collections::BTreeSet;

use crate::core::models::{ExportApi, ExportDefinition};
use crate::error::{CurcheckError, Result};

/// Compressions the ingestion pipeline reads by default.
pub const DEFAULT_ALLOWED_COMPRESSIONS: [&str; 2] = ["GZIP", "PLAIN"];

/// Enforces bucket, compression and resource policy on export definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfigValidator {
    /// Upper-cased allowed compression values.
    allowed_compressions: BTreeSet<String>,
}

impl Default for ReportConfigValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_COMPRESSIONS)
    }
}

impl ReportConfigValidator {
    /// Create a validator accepting the given compressions (case-insensitive).
    #[must_use]
    pub fn new<I, S>(allowed_compressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_compressions: allowed_compressions
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Whether `compression` is accepted.
    #[must_use]
    pub fn allows(&self, compression: &str) -> bool {
        self.allowed_compressions
            .contains(&compression.trim().to_ascii_uppercase())
    }

    /// Allowed compressions, upper-cased.
    #[must_use]
    pub const fn allowed_compressions(&self) -> &BTreeSet<String> {
        &self.allowed_compressions
    }

    fn allowed_list(&self) -> String {
        self.allowed_compressions
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Exports whose destination bucket contains `bucket`.
    #[must_use]
    pub fn matching<'a>(
        definitions: &'a [ExportDefinition],
        bucket: &str,
    ) -> Vec<&'a ExportDefinition> {
        definitions
            .iter()
            .filter(|def| def.destination_bucket.contains(bucket))
            .collect()
    }

    /// Validate the exports targeting `bucket`.
    ///
    /// Returns whether the definitions came from the current export API.
    ///
    /// # Errors
    ///
    /// - [`CurcheckError::ReportConfigMissing`] when no export targets the bucket
    /// - [`CurcheckError::UnsupportedCompression`] for the first export with a
    ///   compression outside the allowed set
    /// - [`CurcheckError::ResourcesNotIncluded`] for the first export without
    ///   resource identifiers
    pub fn validate(
        &self,
        definitions: &[ExportDefinition],
        bucket: &str,
        api: ExportApi,
    ) -> Result<bool> {
        let matched = Self::matching(definitions, bucket);
        if matched.is_empty() {
            return Err(CurcheckError::ReportConfigMissing {
                bucket: bucket.to_string(),
            });
        }

        for def in matched {
            if !self.allows(&def.compression) {
                return Err(CurcheckError::UnsupportedCompression {
                    export: def.name.clone(),
                    compression: def.compression.clone(),
                    allowed: self.allowed_list(),
                });
            }

            let declares_resources = api.is_current() && def.include_resources == Some(true);
            if !def.lists_resources() && !declares_resources {
                return Err(CurcheckError::ResourcesNotIncluded {
                    export: def.name.clone(),
                });
            }

            tracing::debug!(export = %def.name, bucket, "Export passed validation");
        }

        Ok(api.is_current())
    }
}
