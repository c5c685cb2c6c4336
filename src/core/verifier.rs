//! Reachability verification of a billing source.
//!
//! Stages run strictly in order and the first failure ends the run:
//!
//! ```text
//! Init -> RoleChecked -> BucketChecked -> CredentialResolved
//!      -> StorageChecked -> ReportChecked -> Verified
//! ```
//!
//! Each outbound call is made at most once per verification.

use std::time::Instant;

use crate::core::broker::CredentialBroker;
use crate::core::diagnostics::{DiagnosticEvent, SharedObserver, default_observer};
use crate::core::exports::ReportConfigResolver;
use crate::core::models::{DataSourceDescriptor, DelegatedCredential, VerificationOutcome};
use crate::core::report::{CheckStatus, StageCheck, VerificationReport, VerificationStage};
use crate::core::storage::StorageAccessChecker;
use crate::core::validator::ReportConfigValidator;
use crate::error::{CurcheckError, Result};

const COMPONENT: &str = "verifier";

/// Sequences the broker, storage probe, resolver and validator.
#[derive(Clone)]
pub struct ReachabilityVerifier {
    broker: CredentialBroker,
    storage: StorageAccessChecker,
    resolver: ReportConfigResolver,
    validator: ReportConfigValidator,
    observer: SharedObserver,
}

impl ReachabilityVerifier {
    #[must_use]
    pub fn new(
        broker: CredentialBroker,
        storage: StorageAccessChecker,
        resolver: ReportConfigResolver,
    ) -> Self {
        Self {
            broker,
            storage,
            resolver,
            validator: ReportConfigValidator::default(),
            observer: default_observer(),
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: ReportConfigValidator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Verify that the billing source is reachable and correctly configured.
    pub async fn verify(
        &self,
        cred: &DelegatedCredential,
        source: &DataSourceDescriptor,
    ) -> VerificationOutcome {
        self.verify_with_report(cred, source).await.0
    }

    /// Verify and record a check for every stage reached.
    pub async fn verify_with_report(
        &self,
        cred: &DelegatedCredential,
        source: &DataSourceDescriptor,
    ) -> (VerificationOutcome, VerificationReport) {
        let started = Instant::now();
        let mut report = VerificationReport::new(cred.role_arn.trim(), source.bucket.trim());

        let result = self.run(cred, source, &mut report).await;

        report.verified = result.is_ok();
        report.error_kind = result
            .as_ref()
            .err()
            .map(|err| err.error_kind().to_string());
        report.total_duration = started.elapsed();

        match &result {
            Ok(uses_current) => tracing::info!(
                bucket = %report.bucket,
                uses_current_export_api = uses_current,
                "Billing source verified"
            ),
            Err(err) => tracing::info!(
                bucket = %report.bucket,
                error_kind = err.error_kind(),
                "Billing source verification failed"
            ),
        }

        (VerificationOutcome::from(result), report)
    }

    async fn run(
        &self,
        cred: &DelegatedCredential,
        source: &DataSourceDescriptor,
        report: &mut VerificationReport,
    ) -> Result<bool> {
        let stage_started = Instant::now();
        let role_arn = cred.role_arn.trim();
        if role_arn.is_empty() {
            return Err(fail(
                report,
                VerificationStage::RoleChecked,
                stage_started,
                CurcheckError::MissingRoleArn,
            ));
        }
        pass(report, VerificationStage::RoleChecked, stage_started, None);

        let stage_started = Instant::now();
        let bucket = source.bucket.trim();
        if bucket.is_empty() {
            return Err(fail(
                report,
                VerificationStage::BucketChecked,
                stage_started,
                CurcheckError::MissingBucket,
            ));
        }
        pass(report, VerificationStage::BucketChecked, stage_started, None);

        if source.storage_only {
            for stage in [
                VerificationStage::CredentialResolved,
                VerificationStage::StorageChecked,
                VerificationStage::ReportChecked,
            ] {
                report.push(StageCheck::new(stage, CheckStatus::skipped("storage only source")));
            }
            report.push(StageCheck::new(VerificationStage::Verified, CheckStatus::pass()));
            return Ok(false);
        }

        let region = source.bucket_region.as_deref().filter(|r| !r.trim().is_empty());

        let stage_started = Instant::now();
        let resolved = match self.broker.try_assume(cred, region).await {
            Ok(resolved) if resolved.is_usable() => resolved,
            Ok(_) => {
                return Err(fail(
                    report,
                    VerificationStage::CredentialResolved,
                    stage_started,
                    CurcheckError::RoleArnUnreachable {
                        role_arn: role_arn.to_string(),
                        transient: false,
                    },
                ));
            }
            Err(failure) => {
                return Err(fail(
                    report,
                    VerificationStage::CredentialResolved,
                    stage_started,
                    CurcheckError::RoleArnUnreachable {
                        role_arn: role_arn.to_string(),
                        transient: failure.is_transient(),
                    },
                ));
            }
        };
        pass(report, VerificationStage::CredentialResolved, stage_started, None);

        let stage_started = Instant::now();
        if let Err(failure) = self.storage.probe(bucket, &resolved, region).await {
            return Err(fail(
                report,
                VerificationStage::StorageChecked,
                stage_started,
                CurcheckError::BillingSourceNotFound {
                    bucket: bucket.to_string(),
                    role_arn: role_arn.to_string(),
                    transient: failure.is_transient(),
                },
            ));
        }
        pass(report, VerificationStage::StorageChecked, stage_started, None);

        let stage_started = Instant::now();
        let exports = match self.resolver.resolve(&resolved, role_arn).await {
            Ok(exports) => exports,
            Err(err) => {
                return Err(fail(report, VerificationStage::ReportChecked, stage_started, err));
            }
        };
        report.export_api = Some(exports.api);

        let uses_current = match self.validator.validate(&exports.definitions, bucket, exports.api) {
            Ok(uses_current) => uses_current,
            Err(err) => {
                return Err(fail(report, VerificationStage::ReportChecked, stage_started, err));
            }
        };
        pass(
            report,
            VerificationStage::ReportChecked,
            stage_started,
            Some(format!("{} API", exports.api)),
        );

        if uses_current {
            self.observer.record(DiagnosticEvent::info(
                COMPONENT,
                format!("bucket {bucket} is served by an AWS data export"),
            ));
        }

        report.push(StageCheck::new(VerificationStage::Verified, CheckStatus::pass()));
        Ok(uses_current)
    }
}

fn pass(
    report: &mut VerificationReport,
    stage: VerificationStage,
    started: Instant,
    details: Option<String>,
) {
    report.push(
        StageCheck::new(stage, CheckStatus::Pass { details }).with_duration(started.elapsed()),
    );
}

fn fail(
    report: &mut VerificationReport,
    stage: VerificationStage,
    started: Instant,
    err: CurcheckError,
) -> CurcheckError {
    let suggestion = err
        .fix_suggestions()
        .into_iter()
        .next()
        .and_then(|s| s.commands.into_iter().next());
    report.push(
        StageCheck::new(
            stage,
            CheckStatus::Fail {
                reason: err.to_string(),
                suggestion,
            },
        )
        .with_duration(started.elapsed()),
    );
    err
}
