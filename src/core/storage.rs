//! Storage access checks against the billing bucket.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::access::AccessFailure;
use crate::core::diagnostics::{DiagnosticEvent, SharedObserver, default_observer};
use crate::core::models::ResolvedCredential;

/// Region used when the billing source does not declare one.
pub const DEFAULT_STORAGE_REGION: &str = "us-east-1";

const COMPONENT: &str = "storage";

/// Outbound object storage (S3).
pub trait ObjectStore: Send + Sync {
    /// Confirm the bucket exists and is reachable.
    fn head_bucket<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
        region: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>>;

    /// Retrieve one object. Absence is reported as [`AccessFailure::NotFound`].
    fn get_object<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
        region: &'a str,
        bucket: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>>;
}

/// Checks that a bucket exists and is reachable with brokered credentials.
#[derive(Clone)]
pub struct StorageAccessChecker {
    store: Arc<dyn ObjectStore>,
    default_region: String,
    observer: SharedObserver,
}

impl StorageAccessChecker {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            default_region: DEFAULT_STORAGE_REGION.to_string(),
            observer: default_observer(),
        }
    }

    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// The region a probe without an explicit region uses.
    #[must_use]
    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    /// Whether the bucket is reachable. Every failure yields `false`.
    pub async fn exists(
        &self,
        bucket: &str,
        cred: &ResolvedCredential,
        region: Option<&str>,
    ) -> bool {
        self.probe(bucket, cred, region).await.is_ok()
    }

    /// Probe the bucket, exposing the classified failure.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessFailure`] reported by the object store.
    pub async fn probe(
        &self,
        bucket: &str,
        cred: &ResolvedCredential,
        region: Option<&str>,
    ) -> Result<(), AccessFailure> {
        let region = region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.default_region);

        tracing::debug!(bucket, region, "Probing bucket");

        self.store
            .head_bucket(cred, region, bucket)
            .await
            .inspect_err(|failure| {
                self.observer.record(DiagnosticEvent::warn(
                    COMPONENT,
                    format!("bucket {bucket} is not reachable in {region}: {failure}"),
                ));
            })
    }

    /// Retrieve one object from the bucket.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessFailure`] reported by the object store.
    pub async fn fetch(
        &self,
        bucket: &str,
        key: &str,
        cred: &ResolvedCredential,
        region: Option<&str>,
    ) -> Result<(), AccessFailure> {
        let region = region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.default_region);

        tracing::debug!(bucket, key, region, "Fetching object");

        self.store
            .get_object(cred, region, bucket, key)
            .await
            .inspect_err(|failure| {
                self.observer.record(DiagnosticEvent::warn(
                    COMPONENT,
                    format!("object {key} in {bucket} is not retrievable: {failure}"),
                ));
            })
    }
}
