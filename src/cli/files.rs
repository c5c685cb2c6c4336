//! Check-files command implementation.

use crate::aws::AwsServices;
use crate::cli::args::{CheckFilesArgs, OutputFormat};
use crate::core::diagnostics::default_observer;
use crate::core::files::FileReachabilityChecker;
use crate::core::models::BillingSource;
use crate::core::report::FileCheckReport;
use crate::error::Result;
use crate::render;
use crate::storage::config::Config;

/// Execute the check-files command against AWS.
///
/// # Errors
///
/// Returns the first missing or unreachable file, or an error if the billing
/// source cannot be loaded or the output cannot be rendered.
pub async fn execute(
    args: &CheckFilesArgs,
    config: &Config,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let source = args.source.billing_source()?;
    let services = AwsServices::from_config(config, &default_observer());
    execute_with(
        &services.file_checker(),
        &source,
        &args.keys,
        format,
        pretty,
        no_color,
    )
    .await
}

/// Run `checker` on `keys`, print the result and return it.
///
/// # Errors
///
/// Returns the file check error, or an error if rendering fails.
pub async fn execute_with(
    checker: &FileReachabilityChecker,
    source: &BillingSource,
    keys: &[String],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    tracing::debug!(bucket = %source.data_source.bucket, keys = keys.len(), "Checking report files");

    let result = checker.check_files(source, keys).await;
    let report = FileCheckReport::from_result(&source.data_source.bucket, keys, &result);

    let output = render::render_file_check(&report, format, pretty, no_color)?;
    match format {
        OutputFormat::Human | OutputFormat::Md => print!("{output}"),
        OutputFormat::Json => println!("{output}"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CurcheckError;
    use crate::test_utils::{FakeObjectStore, FakeServices, TEST_BUCKET, make_test_billing_source};

    #[tokio::test]
    async fn missing_key_is_reported() {
        let mut services = FakeServices::healthy();
        services.store = FakeObjectStore::with_bucket(TEST_BUCKET).with_objects(["a.csv.gz"]);
        let keys = vec!["a.csv.gz".to_string(), "missing.csv.gz".to_string()];

        let err = execute_with(
            &services.file_checker(),
            &make_test_billing_source(),
            &keys,
            OutputFormat::Md,
            false,
            true,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CurcheckError::ReportNotFound { ref key, .. } if key == "missing.csv.gz"));
    }
}
