//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::report::{FileCheckReport, VerificationReport};
use crate::error::Result;

/// Render a verification report.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn render_verification(
    report: &VerificationReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_verification(report, no_color),
        OutputFormat::Json => robot::render_verification_json(report, pretty),
        OutputFormat::Md => robot::render_verification_md(report),
    }
}

/// Render a report file check.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn render_file_check(
    report: &FileCheckReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_file_check(report, no_color),
        OutputFormat::Json => robot::render_file_check_json(report, pretty),
        OutputFormat::Md => robot::render_file_check_md(report),
    }
}
