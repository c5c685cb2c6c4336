//! Verify command implementation.

use crate::aws::AwsServices;
use crate::cli::args::{OutputFormat, VerifyArgs};
use crate::core::diagnostics::default_observer;
use crate::core::models::BillingSource;
use crate::core::verifier::ReachabilityVerifier;
use crate::error::Result;
use crate::render;
use crate::storage::config::Config;

/// Execute the verify command against AWS.
///
/// # Errors
///
/// Returns the verification error, or an error if the billing source cannot
/// be loaded or the output cannot be rendered.
pub async fn execute(
    args: &VerifyArgs,
    config: &Config,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let mut source = args.source.billing_source()?;
    if args.storage_only {
        source.data_source.storage_only = true;
    }

    let observer = default_observer();
    let services = AwsServices::from_config(config, &observer);
    execute_with(&services.verifier(observer), &source, format, pretty, no_color).await
}

/// Run `verifier` on `source`, print the report and return the outcome.
///
/// # Errors
///
/// Returns the verification error, or an error if rendering fails.
pub async fn execute_with(
    verifier: &ReachabilityVerifier,
    source: &BillingSource,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    tracing::debug!(
        bucket = %source.data_source.bucket,
        storage_only = source.data_source.storage_only,
        "Starting verification"
    );

    let (outcome, report) = verifier
        .verify_with_report(&source.credentials, &source.data_source)
        .await;

    let output = render::render_verification(&report, format, pretty, no_color)?;
    match format {
        OutputFormat::Human | OutputFormat::Md => print!("{output}"),
        OutputFormat::Json => println!("{output}"),
    }

    outcome.into_result().map(|uses_current_export_api| {
        tracing::info!(uses_current_export_api, "Billing source verified");
    })
}
