//! Test utilities for curcheck.
//!
//! Provides in-memory fakes of the outbound AWS seams, test data factories,
//! temp directories and assertion macros for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use curcheck::test_utils::*;
//!
//! let exchange = FakeTokenExchange::returning(usable_credential());
//! let store = FakeObjectStore::with_bucket("cost-reports").with_objects(["a.csv.gz"]);
//! let current = FakeCatalog::new(ExportApi::DataExports, vec![make_test_export("cost-reports")]);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::core::access::AccessFailure;
use crate::core::broker::{AssumeRoleRequest, CredentialBroker, TokenExchange};
use crate::core::exports::{ExportCatalog, ReportConfigResolver};
use crate::core::files::FileReachabilityChecker;
use crate::core::models::{
    BillingSource, DataSourceDescriptor, DelegatedCredential, ExportApi, ExportDefinition,
    RESOURCES_ELEMENT, ResolvedCredential,
};
use crate::core::storage::{ObjectStore, StorageAccessChecker};
use crate::core::verifier::ReachabilityVerifier;

/// Role ARN used by the factories.
pub const TEST_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/CostManagement";

/// Bucket used by the factories.
pub const TEST_BUCKET: &str = "cost-reports";

// =============================================================================
// Test Data Factories
// =============================================================================

/// A credential with every field set.
#[must_use]
pub fn usable_credential() -> ResolvedCredential {
    ResolvedCredential::new("ASIATESTACCESSKEY", "test-secret-key", "test-session-token")
}

/// A delegated credential for [`TEST_ROLE_ARN`].
#[must_use]
pub fn make_test_delegated_credential() -> DelegatedCredential {
    DelegatedCredential::new(TEST_ROLE_ARN)
}

/// A data source for [`TEST_BUCKET`] without a region.
#[must_use]
pub fn make_test_data_source() -> DataSourceDescriptor {
    DataSourceDescriptor::new(TEST_BUCKET)
}

/// A complete billing source for [`TEST_ROLE_ARN`] and [`TEST_BUCKET`].
#[must_use]
pub fn make_test_billing_source() -> BillingSource {
    BillingSource {
        credentials: make_test_delegated_credential(),
        data_source: make_test_data_source(),
    }
}

/// A legacy-shaped export that passes validation for `bucket`.
#[must_use]
pub fn make_test_export(bucket: &str) -> ExportDefinition {
    ExportDefinition {
        name: "daily-cost".to_string(),
        destination_bucket: bucket.to_string(),
        compression: "GZIP".to_string(),
        additional_schema_elements: BTreeSet::from([RESOURCES_ELEMENT.to_string()]),
        include_resources: None,
    }
}

/// A current-API export for `bucket` with the given include-resources flag.
#[must_use]
pub fn make_test_data_export(bucket: &str, include_resources: bool) -> ExportDefinition {
    ExportDefinition {
        name: "daily-export".to_string(),
        destination_bucket: bucket.to_string(),
        compression: "GZIP".to_string(),
        additional_schema_elements: BTreeSet::new(),
        include_resources: Some(include_resources),
    }
}

/// Sample config TOML with every section set.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
timeout_seconds = 10

[aws]
session_name = "CurcheckTestSession"
default_region = "eu-west-1"
billing_region = "us-east-1"

[validation]
allowed_compressions = ["GZIP"]
"#
    .to_string()
}

// =============================================================================
// Fake Token Exchange
// =============================================================================

/// Token exchange answering every request with a fixed result.
#[derive(Debug)]
pub struct FakeTokenExchange {
    result: Result<ResolvedCredential, AccessFailure>,
    requests: Mutex<Vec<(AssumeRoleRequest, Option<String>)>>,
}

impl FakeTokenExchange {
    #[must_use]
    pub fn returning(cred: ResolvedCredential) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(cred),
            requests: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn failing(failure: AccessFailure) -> Arc<Self> {
        Arc::new(Self {
            result: Err(failure),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request received, with its region.
    ///
    /// # Panics
    ///
    /// Panics if the request log lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<(AssumeRoleRequest, Option<String>)> {
        self.requests.lock().expect("request log").clone()
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests().len()
    }

    /// Regions of every request received.
    #[must_use]
    pub fn regions(&self) -> Vec<Option<String>> {
        self.requests().into_iter().map(|(_, region)| region).collect()
    }
}

impl TokenExchange for FakeTokenExchange {
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
        region: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ResolvedCredential, AccessFailure>> {
        self.requests
            .lock()
            .expect("request log")
            .push((request.clone(), region.map(ToString::to_string)));
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

// =============================================================================
// Fake Object Store
// =============================================================================

/// Object store backed by in-memory bucket and key sets.
#[derive(Debug, Default)]
pub struct FakeObjectStore {
    buckets: Mutex<BTreeSet<String>>,
    objects: Mutex<BTreeSet<String>>,
    head_failure: Mutex<Option<AccessFailure>>,
    key_failures: Mutex<HashMap<String, AccessFailure>>,
    head_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    /// A store without any bucket.
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store containing `bucket`.
    #[must_use]
    pub fn with_bucket(bucket: &str) -> Arc<Self> {
        let store = Self::default();
        store
            .buckets
            .lock()
            .expect("buckets")
            .insert(bucket.to_string());
        Arc::new(store)
    }

    /// Add objects that `get_object` finds.
    #[must_use]
    pub fn with_objects<I, S>(self: Arc<Self>, keys: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects
            .lock()
            .expect("objects")
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Make `head_bucket` fail with `failure`.
    #[must_use]
    pub fn failing_head(self: Arc<Self>, failure: AccessFailure) -> Arc<Self> {
        *self.head_failure.lock().expect("head failure") = Some(failure);
        self
    }

    /// Make `get_object` for `key` fail with `failure`.
    #[must_use]
    pub fn failing_key(self: Arc<Self>, key: &str, failure: AccessFailure) -> Arc<Self> {
        self.key_failures
            .lock()
            .expect("key failures")
            .insert(key.to_string(), failure);
        self
    }

    #[must_use]
    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Keys passed to `get_object`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log lock is poisoned.
    #[must_use]
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested.lock().expect("requested keys").clone()
    }
}

impl ObjectStore for FakeObjectStore {
    fn head_bucket<'a>(
        &'a self,
        _cred: &'a ResolvedCredential,
        _region: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let result = if let Some(failure) = self.head_failure.lock().expect("head failure").clone()
        {
            Err(failure)
        } else if self.buckets.lock().expect("buckets").contains(bucket) {
            Ok(())
        } else {
            Err(AccessFailure::NotFound(format!("bucket {bucket}")))
        };
        Box::pin(async move { result })
    }

    fn get_object<'a>(
        &'a self,
        _cred: &'a ResolvedCredential,
        _region: &'a str,
        bucket: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>> {
        self.requested
            .lock()
            .expect("requested keys")
            .push(key.to_string());
        let result = if let Some(failure) = self.key_failures.lock().expect("key failures").get(key)
        {
            Err(failure.clone())
        } else if !self.buckets.lock().expect("buckets").contains(bucket) {
            Err(AccessFailure::NotFound(format!("NoSuchBucket: {bucket}")))
        } else if self.objects.lock().expect("objects").contains(key) {
            Ok(())
        } else {
            Err(AccessFailure::NotFound(format!("NoSuchKey: {key}")))
        };
        Box::pin(async move { result })
    }
}

// =============================================================================
// Fake Export Catalog
// =============================================================================

/// Export catalog answering with a fixed result.
#[derive(Debug)]
pub struct FakeCatalog {
    api: ExportApi,
    result: Result<Vec<ExportDefinition>, AccessFailure>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    #[must_use]
    pub fn new(api: ExportApi, definitions: Vec<ExportDefinition>) -> Arc<Self> {
        Arc::new(Self {
            api,
            result: Ok(definitions),
            calls: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn failing(api: ExportApi, failure: AccessFailure) -> Arc<Self> {
        Arc::new(Self {
            api,
            result: Err(failure),
            calls: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExportCatalog for FakeCatalog {
    fn api(&self) -> ExportApi {
        self.api
    }

    fn list_exports<'a>(
        &'a self,
        _cred: &'a ResolvedCredential,
    ) -> BoxFuture<'a, Result<Vec<ExportDefinition>, AccessFailure>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// The fakes behind one verifier, kept for assertions.
#[derive(Debug, Clone)]
pub struct FakeServices {
    pub exchange: Arc<FakeTokenExchange>,
    pub store: Arc<FakeObjectStore>,
    pub current: Arc<FakeCatalog>,
    pub legacy: Arc<FakeCatalog>,
}

impl FakeServices {
    /// Services under which [`make_test_billing_source`] verifies through the
    /// current export API.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            exchange: FakeTokenExchange::returning(usable_credential()),
            store: FakeObjectStore::with_bucket(TEST_BUCKET),
            current: FakeCatalog::new(
                ExportApi::DataExports,
                vec![make_test_data_export(TEST_BUCKET, true)],
            ),
            legacy: FakeCatalog::new(ExportApi::CostAndUsageReport, Vec::new()),
        }
    }

    #[must_use]
    pub fn broker(&self) -> CredentialBroker {
        CredentialBroker::new(self.exchange.clone())
    }

    #[must_use]
    pub fn storage(&self) -> StorageAccessChecker {
        StorageAccessChecker::new(self.store.clone())
    }

    #[must_use]
    pub fn verifier(&self) -> ReachabilityVerifier {
        ReachabilityVerifier::new(
            self.broker(),
            self.storage(),
            ReportConfigResolver::new(self.current.clone(), self.legacy.clone()),
        )
    }

    #[must_use]
    pub fn file_checker(&self) -> FileReachabilityChecker {
        FileReachabilityChecker::new(self.broker(), self.storage())
    }

    /// Total outbound calls made through any fake.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.exchange.calls()
            + self.store.head_calls()
            + self.store.requested_keys().len()
            + self.current.calls()
            + self.legacy.calls()
    }
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// # Examples
///
/// ```rust,ignore
/// use curcheck::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config.toml", "[general]\ntimeout_seconds = 30");
/// assert!(dir.file_exists("config.toml"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_store_distinguishes_missing_bucket_and_key() {
        let store = FakeObjectStore::with_bucket("b").with_objects(["k"]);
        let cred = usable_credential();

        assert!(store.head_bucket(&cred, "us-east-1", "b").await.is_ok());
        assert!(matches!(
            store.head_bucket(&cred, "us-east-1", "x").await,
            Err(AccessFailure::NotFound(_))
        ));
        assert!(store.get_object(&cred, "us-east-1", "b", "k").await.is_ok());
        assert!(matches!(
            store.get_object(&cred, "us-east-1", "b", "other").await,
            Err(AccessFailure::NotFound(msg)) if msg.contains("NoSuchKey")
        ));
        assert_eq!(store.head_calls(), 2);
        assert_eq!(store.requested_keys(), vec!["k", "other"]);
    }

    #[test]
    fn test_dir_round_trips_files() {
        let dir = TestDir::new();
        dir.create_file("nested/config.toml", "x = 1");
        assert!(dir.file_exists("nested/config.toml"));
        assert_eq!(dir.read_file("nested/config.toml").unwrap(), "x = 1");
    }

    #[tokio::test]
    async fn healthy_services_verify() {
        let services = FakeServices::healthy();
        let outcome = services
            .verifier()
            .verify(&make_test_delegated_credential(), &make_test_data_source())
            .await;
        assert!(outcome.is_verified());
        assert_eq!(services.total_calls(), 3);
    }
}
