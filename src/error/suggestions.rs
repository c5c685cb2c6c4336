//! Fix suggestion database for curcheck errors.
//!
//! Provides actionable fix suggestions mapped to specific error types,
//! including commands, context explanations, and prevention tips.

const CUR_SETUP_DOC: &str =
    "https://docs.aws.amazon.com/cur/latest/userguide/dataexports-create-standard.html";
const ASSUME_ROLE_DOC: &str =
    "https://docs.aws.amazon.com/IAM/latest/UserGuide/id_roles_create_for-user.html";

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
///
/// Contains actionable information to help users resolve errors.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Primary fix commands in order of preference.
    /// These should be copy-paste ready for the terminal.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,

    /// Link to documentation for more information.
    pub doc_url: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
            doc_url: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }

    /// Builder: adds documentation URL.
    #[must_use]
    pub fn with_doc_url(mut self, url: impl Into<String>) -> Self {
        self.doc_url = Some(url.into());
        self
    }
}

// =============================================================================
// Missing input
// =============================================================================

#[must_use]
pub fn missing_role_arn_suggestions() -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![
            "curcheck verify --role-arn arn:aws:iam::<account-id>:role/<role-name> --bucket <bucket>"
                .to_string(),
            "export CURCHECK_ROLE_ARN=arn:aws:iam::<account-id>:role/<role-name>".to_string(),
        ],
        "The billing source has no IAM role ARN, so its AWS account cannot be accessed.",
    )
    .with_doc_url(ASSUME_ROLE_DOC)]
}

#[must_use]
pub fn missing_bucket_suggestions() -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["curcheck verify --role-arn <arn> --bucket <bucket>".to_string()],
        "The billing source does not name the S3 bucket its cost reports are written to.",
    )]
}

// =============================================================================
// Account and bucket access
// =============================================================================

#[must_use]
pub fn role_unreachable_suggestions(role_arn: &str, transient: bool) -> Vec<FixSuggestion> {
    let mut suggestion = FixSuggestion::new(
        vec![format!(
            "aws sts assume-role --role-arn {role_arn} --role-session-name AccountCreationSession"
        )],
        format!(
            "Temporary credentials could not be obtained for {role_arn}. The ARN may be \
             malformed, the role's trust policy may not allow this account, or the external \
             ID may not match."
        ),
    )
    .with_doc_url(ASSUME_ROLE_DOC);

    if transient {
        suggestion = suggestion.with_prevention(
            "The token service could not be reached; retrying the verification may succeed.",
        );
    }

    vec![suggestion]
}

#[must_use]
pub fn bucket_not_found_suggestions(bucket: &str, role_arn: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("aws s3api head-bucket --bucket {bucket}")],
        format!(
            "The bucket {bucket} does not exist or the role {role_arn} is not allowed to \
             access it."
        ),
    )
    .with_prevention("Grant s3:ListBucket and s3:GetObject on the bucket to the role.")]
}

// =============================================================================
// Report configuration
// =============================================================================

#[must_use]
pub fn report_access_denied_suggestions(credential: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![
            "aws bcm-data-exports list-exports --region us-east-1".to_string(),
            "aws cur describe-report-definitions --region us-east-1".to_string(),
        ],
        format!(
            "Neither the data exports API nor the legacy report definitions API could be read \
             with {credential}."
        ),
    )
    .with_prevention(
        "Grant bcm-data-exports:ListExports, bcm-data-exports:GetExport and \
         cur:DescribeReportDefinitions to the role.",
    )]
}

#[must_use]
pub fn report_config_missing_suggestions(bucket: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["aws bcm-data-exports list-exports --region us-east-1".to_string()],
        format!("No cost and usage export is configured to deliver reports to {bucket}."),
    )
    .with_doc_url(CUR_SETUP_DOC)]
}

#[must_use]
pub fn unsupported_compression_suggestions(
    export: &str,
    compression: &str,
    allowed: &str,
) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("# Edit export {export} and select one of: {allowed}")],
        format!("Export {export} is compressed with {compression}, which cannot be ingested."),
    )
    .with_doc_url(CUR_SETUP_DOC)]
}

#[must_use]
pub fn resources_not_included_suggestions(export: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("# Edit export {export} and enable \"Include resource IDs\"")],
        format!("Export {export} does not include resource IDs, which cost attribution requires."),
    )
    .with_doc_url(CUR_SETUP_DOC)]
}

// =============================================================================
// Report files
// =============================================================================

#[must_use]
pub fn report_not_found_suggestions(key: &str, bucket: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("aws s3 ls s3://{bucket}/{key}")],
        format!("The report file {key} is listed in the manifest but is missing from {bucket}."),
    )
    .with_prevention("Do not apply lifecycle rules that expire report files before ingestion.")]
}

#[must_use]
pub fn report_file_unreachable_suggestions(key: &str, bucket: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("aws s3api head-object --bucket {bucket} --key {key}")],
        format!("The report file {key} in {bucket} could not be read with the assumed role."),
    )]
}

// =============================================================================
// Configuration
// =============================================================================

#[must_use]
pub fn config_invalid_suggestions(key: &str, value: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("# Fix '{key}' in the curcheck config file")],
        format!("The value '{value}' for '{key}' is invalid: {message}"),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let s = FixSuggestion::new(vec!["cmd".to_string()], "ctx")
            .with_prevention("tip")
            .with_doc_url("https://example.com");
        assert_eq!(s.prevention.as_deref(), Some("tip"));
        assert_eq!(s.doc_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn transient_role_failure_mentions_retry() {
        let s = role_unreachable_suggestions("arn:aws:iam::1:role/x", true);
        assert!(s[0].prevention.as_deref().unwrap().contains("retrying"));

        let s = role_unreachable_suggestions("arn:aws:iam::1:role/x", false);
        assert!(s[0].prevention.is_none());
    }

    #[test]
    fn file_suggestions_name_bucket_and_key() {
        let s = report_not_found_suggestions("2024/report.csv.gz", "cost-reports");
        assert_eq!(s[0].commands[0], "aws s3 ls s3://cost-reports/2024/report.csv.gz");
    }
}
