//! Production implementations of the outbound AWS seams.
//!
//! - [`sts::StsTokenExchange`]: STS `AssumeRole` through the AWS SDK
//! - [`s3::S3ObjectStore`]: S3 `HeadBucket` / `GetObject` through the AWS SDK
//! - [`report_api`]: BCM Data Exports and legacy CUR definitions through
//!   their AWS SDK clients
//!
//! Clients are built per call from the brokered credentials.
//! SDK retries are disabled: every call is attempted exactly once and its
//! failure is classified into an [`AccessFailure`].

pub mod report_api;
pub mod s3;
pub mod sts;

use std::sync::Arc;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;

use crate::core::access::AccessFailure;
use crate::core::broker::CredentialBroker;
use crate::core::diagnostics::SharedObserver;
use crate::core::exports::ReportConfigResolver;
use crate::core::files::FileReachabilityChecker;
use crate::core::models::ResolvedCredential;
use crate::core::storage::StorageAccessChecker;
use crate::core::validator::ReportConfigValidator;
use crate::core::verifier::ReachabilityVerifier;
use crate::storage::config::Config;

const PROVIDER_NAME: &str = "curcheck-assumed-role";

/// Region used by the billing APIs, which only exist in `us-east-1`.
pub const DEFAULT_BILLING_REGION: &str = "us-east-1";

/// Connection settings shared by every AWS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub timeout: Duration,
    pub session_name: String,
    /// Region used when the billing source has none.
    pub default_region: String,
    /// Region of the report configuration APIs.
    pub billing_region: String,
    pub sts_endpoint: Option<String>,
    pub s3_endpoint: Option<String>,
    pub data_exports_endpoint: Option<String>,
    pub cur_endpoint: Option<String>,
}

impl AwsSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.general.timeout_seconds),
            session_name: config.aws.session_name.clone(),
            default_region: config.aws.default_region.clone(),
            billing_region: config.aws.billing_region.clone(),
            sts_endpoint: config.aws.sts_endpoint.clone(),
            s3_endpoint: config.aws.s3_endpoint.clone(),
            data_exports_endpoint: config.aws.data_exports_endpoint.clone(),
            cur_endpoint: config.aws.cur_endpoint.clone(),
        }
    }

    /// Timeouts applied to every SDK operation.
    #[must_use]
    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::builder()
            .connect_timeout(self.timeout)
            .operation_timeout(self.timeout)
            .build()
    }

    /// Load shared SDK configuration for `region` from the environment.
    pub async fn sdk_config(&self, region: &str, endpoint: Option<&str>) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(self.timeout_config())
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Verification components wired to the real AWS services.
#[derive(Clone)]
pub struct AwsServices {
    pub broker: CredentialBroker,
    pub storage: StorageAccessChecker,
    pub resolver: ReportConfigResolver,
    pub validator: ReportConfigValidator,
}

impl AwsServices {
    /// Build every component from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, observer: &SharedObserver) -> Self {
        let settings = Arc::new(AwsSettings::from_config(config));

        let broker = CredentialBroker::new(Arc::new(sts::StsTokenExchange::new(settings.clone())))
            .with_session_name(settings.session_name.clone())
            .with_observer(observer.clone());
        let storage = StorageAccessChecker::new(Arc::new(s3::S3ObjectStore::new(settings.clone())))
            .with_default_region(settings.default_region.clone())
            .with_observer(observer.clone());
        let resolver = ReportConfigResolver::new(
            Arc::new(report_api::DataExportsCatalog::new(settings.clone())),
            Arc::new(report_api::CostAndUsageReportCatalog::new(settings)),
        )
        .with_observer(observer.clone());
        let validator = ReportConfigValidator::new(&config.validation.allowed_compressions);

        Self {
            broker,
            storage,
            resolver,
            validator,
        }
    }

    #[must_use]
    pub fn verifier(&self, observer: SharedObserver) -> ReachabilityVerifier {
        ReachabilityVerifier::new(
            self.broker.clone(),
            self.storage.clone(),
            self.resolver.clone(),
        )
        .with_validator(self.validator.clone())
        .with_observer(observer)
    }

    #[must_use]
    pub fn file_checker(&self) -> FileReachabilityChecker {
        FileReachabilityChecker::new(self.broker.clone(), self.storage.clone())
    }
}

/// Static credentials for an SDK client from a brokered credential.
pub(crate) fn static_credentials(
    cred: &ResolvedCredential,
) -> Result<Credentials, AccessFailure> {
    let (access_key_id, secret_access_key, session_token) = cred
        .parts()
        .ok_or_else(|| AccessFailure::InvalidRequest("credential is missing a field".to_string()))?;
    Ok(Credentials::new(
        access_key_id,
        secret_access_key,
        Some(session_token.to_string()),
        None,
        PROVIDER_NAME,
    ))
}

// =============================================================================
// Error classification
// =============================================================================

/// Classify an SDK error from any AWS service client.
pub(crate) fn classify_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> AccessFailure
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err {
        SdkError::ConstructionFailure(_) => {
            AccessFailure::InvalidRequest(DisplayErrorContext(err).to_string())
        }
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            let code = ctx.err().code();
            let detail = match (code, ctx.err().message()) {
                (Some(code), Some(message)) => format!("HTTP {status}: {code}: {message}"),
                (Some(code), None) => format!("HTTP {status}: {code}"),
                (None, _) => format!("HTTP {status}: {}", DisplayErrorContext(err)),
            };
            classify_service_error(code, status, detail)
        }
        _ => AccessFailure::Transient(DisplayErrorContext(err).to_string()),
    }
}

/// Classify a service error response by error code, then by HTTP status.
#[must_use]
pub fn classify_service_error(code: Option<&str>, status: u16, detail: String) -> AccessFailure {
    match code {
        Some(
            "ValidationError"
            | "ValidationException"
            | "InvalidParameterValue"
            | "InvalidInput"
            | "MalformedPolicyDocument"
            | "PackedPolicyTooLarge",
        ) => AccessFailure::InvalidRequest(detail),
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound" | "ResourceNotFoundException") => {
            AccessFailure::NotFound(detail)
        }
        Some(
            "Throttling"
            | "ThrottlingException"
            | "RequestTimeout"
            | "SlowDown"
            | "ServiceUnavailable"
            | "InternalError"
            | "InternalFailure"
            | "InternalServerException",
        ) => AccessFailure::Transient(detail),
        _ if status == 404 => AccessFailure::NotFound(detail),
        _ if status == 429 || status >= 500 => AccessFailure::Transient(detail),
        _ => AccessFailure::NotConfigured(detail),
    }
}
