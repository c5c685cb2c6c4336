//! Report file reachability.
//!
//! Confirms that each object key a manifest lists is present in the billing
//! bucket, using freshly brokered credentials.

use crate::core::access::AccessFailure;
use crate::core::broker::CredentialBroker;
use crate::core::models::BillingSource;
use crate::core::storage::StorageAccessChecker;
use crate::error::{CurcheckError, Result};

/// Checks report objects one by one, stopping at the first failure.
#[derive(Clone)]
pub struct FileReachabilityChecker {
    broker: CredentialBroker,
    storage: StorageAccessChecker,
}

impl FileReachabilityChecker {
    #[must_use]
    pub const fn new(broker: CredentialBroker, storage: StorageAccessChecker) -> Self {
        Self { broker, storage }
    }

    /// Confirm that every key in `keys` exists in the source's bucket.
    ///
    /// Keys are requested in order; keys after the first failure are never
    /// requested. An empty key list succeeds without any outbound call.
    ///
    /// # Errors
    ///
    /// - [`CurcheckError::MissingRoleArn`] / [`CurcheckError::MissingBucket`]
    ///   for an incomplete source
    /// - [`CurcheckError::RoleArnUnreachable`] when no usable credential could
    ///   be brokered
    /// - [`CurcheckError::ReportNotFound`] for the first absent key
    /// - [`CurcheckError::ReportFileUnreachable`] for any other retrieval error
    pub async fn check_files(&self, source: &BillingSource, keys: &[String]) -> Result<()> {
        let role_arn = source.credentials.role_arn.trim();
        if role_arn.is_empty() {
            return Err(CurcheckError::MissingRoleArn);
        }
        let bucket = source.data_source.bucket.trim();
        if bucket.is_empty() {
            return Err(CurcheckError::MissingBucket);
        }
        if keys.is_empty() {
            return Ok(());
        }

        let region = source
            .data_source
            .bucket_region
            .as_deref()
            .filter(|r| !r.trim().is_empty());

        let resolved = match self.broker.try_assume(&source.credentials, region).await {
            Ok(resolved) if resolved.is_usable() => resolved,
            Ok(_) => {
                return Err(CurcheckError::RoleArnUnreachable {
                    role_arn: role_arn.to_string(),
                    transient: false,
                });
            }
            Err(failure) => {
                return Err(CurcheckError::RoleArnUnreachable {
                    role_arn: role_arn.to_string(),
                    transient: failure.is_transient(),
                });
            }
        };

        for key in keys {
            match self.storage.fetch(bucket, key, &resolved, region).await {
                Ok(()) => tracing::debug!(bucket, key = %key, "Report file reachable"),
                Err(AccessFailure::NotFound(_)) => {
                    return Err(CurcheckError::ReportNotFound {
                        key: key.clone(),
                        bucket: bucket.to_string(),
                    });
                }
                Err(failure) => {
                    return Err(CurcheckError::ReportFileUnreachable {
                        key: key.clone(),
                        bucket: bucket.to_string(),
                        reason: failure.to_string(),
                        transient: failure.is_transient(),
                    });
                }
            }
        }

        tracing::info!(bucket, count = keys.len(), "All report files reachable");
        Ok(())
    }
}
