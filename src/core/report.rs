//! Per-stage verification report.
//!
//! The verifier records one [`StageCheck`] for every stage it reaches so the
//! CLI can render a doctor-style report next to the pass/fail decision.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::models::ExportApi;

/// Stages of a verification, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
    Init,
    RoleChecked,
    BucketChecked,
    CredentialResolved,
    StorageChecked,
    ReportChecked,
    Verified,
}

impl VerificationStage {
    /// Human-readable check name for the stage.
    #[must_use]
    pub const fn check_name(self) -> &'static str {
        match self {
            Self::Init => "Verification started",
            Self::RoleChecked => "Role ARN provided",
            Self::BucketChecked => "Bucket provided",
            Self::CredentialResolved => "Role assumed",
            Self::StorageChecked => "Bucket reachable",
            Self::ReportChecked => "Cost export configured",
            Self::Verified => "Billing source verified",
        }
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.check_name())
    }
}

/// Result of a single check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Check passed with optional details.
    Pass { details: Option<String> },
    /// Check failed with reason and optional fix suggestion.
    Fail {
        reason: String,
        suggestion: Option<String>,
    },
    /// Check was not run.
    Skipped { reason: String },
}

impl CheckStatus {
    #[must_use]
    pub const fn pass() -> Self {
        Self::Pass { details: None }
    }

    #[must_use]
    pub fn pass_with(details: impl Into<String>) -> Self {
        Self::Pass {
            details: Some(details.into()),
        }
    }

    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Whether this status counts as passing.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Pass { .. } | Self::Skipped { .. })
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { details } => {
                if let Some(details) = details {
                    write!(f, "pass ({details})")
                } else {
                    write!(f, "pass")
                }
            }
            Self::Fail { reason, suggestion } => {
                if let Some(suggestion) = suggestion {
                    write!(f, "fail: {reason} (suggestion: {suggestion})")
                } else {
                    write!(f, "fail: {reason}")
                }
            }
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// One stage's check result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageCheck {
    pub stage: VerificationStage,
    pub name: String,
    pub status: CheckStatus,
    pub duration: Option<Duration>,
}

impl StageCheck {
    #[must_use]
    pub fn new(stage: VerificationStage, status: CheckStatus) -> Self {
        Self {
            stage,
            name: stage.check_name().to_string(),
            status,
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Complete verification report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub role_arn: String,
    pub bucket: String,
    pub checks: Vec<StageCheck>,
    /// Export API that answered, when the report stage was reached.
    pub export_api: Option<ExportApi>,
    pub verified: bool,
    /// Stable kind of the failure, if any.
    pub error_kind: Option<String>,
    pub total_duration: Duration,
}

impl VerificationReport {
    #[must_use]
    pub fn new(role_arn: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, check: StageCheck) {
        self.checks.push(check);
    }

    /// The last stage reached.
    #[must_use]
    pub fn last_stage(&self) -> VerificationStage {
        self.checks
            .last()
            .map_or(VerificationStage::Init, |c| c.stage)
    }

    /// Returns (`passed`, `failed`, `skipped`).
    #[must_use]
    pub fn summary(&self) -> (usize, usize, usize) {
        self.checks
            .iter()
            .fold((0, 0, 0), |(p, f, s), check| match check.status {
                CheckStatus::Pass { .. } => (p + 1, f, s),
                CheckStatus::Fail { .. } => (p, f + 1, s),
                CheckStatus::Skipped { .. } => (p, f, s + 1),
            })
    }
}

/// Outcome of a report file check, for rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileCheckReport {
    pub bucket: String,
    pub keys: Vec<String>,
    pub found: bool,
    pub error_kind: Option<String>,
    pub message: Option<String>,
}

impl FileCheckReport {
    /// Build from the result of a file check.
    #[must_use]
    pub fn from_result(bucket: &str, keys: &[String], result: &crate::error::Result<()>) -> Self {
        let (error_kind, message) = match result {
            Ok(()) => (None, None),
            Err(err) => (Some(err.error_kind().to_string()), Some(err.to_string())),
        };
        Self {
            bucket: bucket.to_string(),
            keys: keys.to_vec(),
            found: result.is_ok(),
            error_kind,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_display_formats() {
        let fail = CheckStatus::Fail {
            reason: "bucket missing".to_string(),
            suggestion: Some("create it".to_string()),
        };
        assert_eq!(CheckStatus::pass().to_string(), "pass");
        assert_eq!(CheckStatus::pass_with("cur").to_string(), "pass (cur)");
        assert!(fail.to_string().contains("bucket missing"));
        assert!(CheckStatus::skipped("storage only").to_string().starts_with("skipped"));
        assert!(fail.is_failure());
        assert!(!fail.is_ready());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(VerificationStage::Init < VerificationStage::RoleChecked);
        assert!(VerificationStage::StorageChecked < VerificationStage::ReportChecked);
        assert!(VerificationStage::ReportChecked < VerificationStage::Verified);
    }

    #[test]
    fn report_summary_counts() {
        let mut report = VerificationReport::new("arn", "bucket");
        assert_eq!(report.last_stage(), VerificationStage::Init);

        report.push(StageCheck::new(VerificationStage::RoleChecked, CheckStatus::pass()));
        report.push(StageCheck::new(
            VerificationStage::ReportChecked,
            CheckStatus::skipped("storage only"),
        ));
        report.push(StageCheck::new(
            VerificationStage::StorageChecked,
            CheckStatus::Fail {
                reason: "x".to_string(),
                suggestion: None,
            },
        ));

        assert_eq!(report.summary(), (1, 1, 1));
        assert_eq!(report.last_stage(), VerificationStage::StorageChecked);
    }

    #[test]
    fn report_serializes_to_camel_case_json() {
        let mut report = VerificationReport::new("arn:aws:iam::123456789012:role/Cost", "b");
        report.push(StageCheck::new(VerificationStage::RoleChecked, CheckStatus::pass()));
        report.export_api = Some(ExportApi::DataExports);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"roleArn\""));
        assert!(json.contains("\"exportApi\":\"data_exports\""));
        assert!(json.contains("\"status\":\"pass\""));
        assert!(json.contains("\"stage\":\"role_checked\""));
    }

    #[test]
    fn file_check_report_carries_error_kind() {
        let keys = vec!["a.csv.gz".to_string()];
        let ok = FileCheckReport::from_result("b", &keys, &Ok(()));
        assert!(ok.found);
        assert!(ok.error_kind.is_none());

        let err = Err(crate::error::CurcheckError::ReportNotFound {
            key: "a.csv.gz".to_string(),
            bucket: "b".to_string(),
        });
        let failed = FileCheckReport::from_result("b", &keys, &err);
        assert!(!failed.found);
        assert_eq!(failed.error_kind.as_deref(), Some("ReportNotFound"));
        assert!(failed.message.unwrap().contains("a.csv.gz"));
    }
}
