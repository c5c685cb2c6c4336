//! Robot-mode output (JSON and Markdown).
//!
//! Provides stable, token-efficient output for scripts and agents.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::report::{CheckStatus, FileCheckReport, VerificationReport};
use crate::error::Result;

/// Schema version stamped on every JSON document.
pub const SCHEMA_VERSION: &str = "curcheck.v1";

/// Top-level JSON envelope for robot mode output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> RobotOutput<T> {
    /// Create a new robot output envelope.
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

fn to_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(output)?)
    } else {
        Ok(serde_json::to_string(output)?)
    }
}

fn message_errors(kind: Option<&String>, message: Option<&String>) -> Vec<String> {
    match (kind, message) {
        (Some(kind), Some(message)) => vec![format!("{kind}: {message}")],
        (Some(kind), None) => vec![kind.clone()],
        _ => Vec::new(),
    }
}

/// Render a verification report as JSON.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn render_verification_json(report: &VerificationReport, pretty: bool) -> Result<String> {
    let failure = report.checks.iter().find_map(|c| match &c.status {
        CheckStatus::Fail { reason, .. } => Some(reason),
        _ => None,
    });
    let output = RobotOutput::new("verify", report)
        .with_errors(message_errors(report.error_kind.as_ref(), failure));
    to_json(&output, pretty)
}

/// Render a file check as JSON.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn render_file_check_json(report: &FileCheckReport, pretty: bool) -> Result<String> {
    let output = RobotOutput::new("check-files", report).with_errors(message_errors(
        report.error_kind.as_ref(),
        report.message.as_ref(),
    ));
    to_json(&output, pretty)
}

/// Render a verification report as Markdown.
///
/// # Errors
///
/// Infallible today; kept fallible like the other renderers.
pub fn render_verification_md(report: &VerificationReport) -> Result<String> {
    let mut output = String::from("# curcheck verify\n\n");

    let _ = writeln!(output, "- role: `{}`", report.role_arn);
    let _ = writeln!(output, "- bucket: `{}`", report.bucket);
    if let Some(api) = report.export_api {
        let _ = writeln!(output, "- export_api: {api}");
    }
    let _ = writeln!(output, "- verified: {}", report.verified);
    if let Some(kind) = &report.error_kind {
        let _ = writeln!(output, "- error_kind: {kind}");
    }
    output.push('\n');

    output.push_str("| Check | Status |\n|-------|--------|\n");
    for check in &report.checks {
        let _ = writeln!(output, "| {} | {} |", check.name, format_status_md(&check.status));
    }

    Ok(output)
}

/// Render a file check as Markdown.
///
/// # Errors
///
/// Infallible today; kept fallible like the other renderers.
pub fn render_file_check_md(report: &FileCheckReport) -> Result<String> {
    let mut output = String::from("# curcheck check-files\n\n");
    let _ = writeln!(output, "- bucket: `{}`", report.bucket);
    let _ = writeln!(output, "- found: {}", report.found);
    if let Some(kind) = &report.error_kind {
        let _ = writeln!(output, "- error_kind: {kind}");
    }
    if let Some(message) = &report.message {
        let _ = writeln!(output, "- message: {message}");
    }
    output.push_str("\n## Keys\n\n");
    for key in &report.keys {
        let _ = writeln!(output, "- `{key}`");
    }
    Ok(output)
}

fn format_status_md(status: &CheckStatus) -> String {
    match status {
        CheckStatus::Pass { details: Some(d) } => format!("\u{2705} {d}"),
        CheckStatus::Pass { details: None } => "\u{2705} OK".to_string(),
        CheckStatus::Fail { reason, suggestion } => {
            let mut s = format!("\u{274C} {reason}");
            if let Some(suggestion) = suggestion {
                let _ = write!(s, " *({suggestion})*");
            }
            s
        }
        CheckStatus::Skipped { reason } => format!("\u{23ED}\u{FE0F} {reason}"),
    }
}
