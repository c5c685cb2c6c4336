//! Human-readable output rendering.

use std::fmt::Write as _;
use std::time::Instant;

use colored::Colorize;
use tracing::Level;

use crate::core::report::{CheckStatus, FileCheckReport, StageCheck, VerificationReport};
use crate::error::Result;

const RULE_WIDTH: usize = 60;

/// Render a verification report for human consumption.
///
/// # Errors
///
/// Infallible today; kept fallible like the other renderers.
pub fn render_verification(report: &VerificationReport, no_color: bool) -> Result<String> {
    let start = tracing::enabled!(Level::DEBUG).then(Instant::now);
    let mut output = String::new();

    output.push_str(&render_header("curcheck verify", no_color));
    let _ = writeln!(output, "  role:   {}", display_or_dash(&report.role_arn));
    let _ = writeln!(output, "  bucket: {}", display_or_dash(&report.bucket));
    if let Some(api) = report.export_api {
        let _ = writeln!(output, "  export: {api}");
    }
    output.push('\n');

    for check in &report.checks {
        output.push_str(&render_check_line(check, "  ", no_color));
        output.push('\n');
    }

    output.push_str(&render_summary(report, no_color));

    if let Some(start) = start {
        tracing::debug!(
            component = "verification_report",
            render_time_ms = start.elapsed().as_millis(),
            "Rendered verification report"
        );
    }

    Ok(output)
}

/// Render a file check result for human consumption.
///
/// # Errors
///
/// Infallible today; kept fallible like the other renderers.
pub fn render_file_check(report: &FileCheckReport, no_color: bool) -> Result<String> {
    let mut output = render_header("curcheck check-files", no_color);
    let _ = writeln!(output, "  bucket: {}", display_or_dash(&report.bucket));
    output.push('\n');

    if report.found {
        let line = format!(
            "  {} {} report file(s) found",
            icon(&CheckStatus::pass(), no_color),
            report.keys.len()
        );
        output.push_str(&colorize(&line, &CheckStatus::pass(), no_color));
        output.push('\n');
    } else {
        let status = CheckStatus::Fail {
            reason: report.message.clone().unwrap_or_default(),
            suggestion: None,
        };
        let line = format!(
            "  {} {}",
            icon(&status, no_color),
            report.error_kind.as_deref().unwrap_or("Failed")
        );
        output.push_str(&colorize(&line, &status, no_color));
        output.push('\n');
        if let Some(message) = &report.message {
            let _ = writeln!(output, "      {message}");
        }
    }

    Ok(output)
}

fn render_header(title: &str, no_color: bool) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    if no_color {
        format!("{title}\n{rule}\n")
    } else {
        format!("{}\n{}\n", title.cyan().bold(), rule.dimmed())
    }
}

/// Render a single check line with status icon and optional suggestion.
fn render_check_line(check: &StageCheck, indent: &str, no_color: bool) -> String {
    let mut output = colorize(
        &format!("{indent}{} {}", icon(&check.status, no_color), check.name),
        &check.status,
        no_color,
    );

    match &check.status {
        CheckStatus::Pass { details } => {
            if let Some(details) = details {
                let _ = write!(output, "  {details}");
            }
            if let Some(duration) = check.duration {
                let _ = write!(output, "  {}ms", duration.as_millis());
            }
        }
        CheckStatus::Fail { reason, suggestion } => {
            let _ = write!(output, "\n{indent}    {reason}");
            if let Some(suggestion) = suggestion {
                let arrow = if no_color { "->" } else { "\u{2192}" };
                let _ = write!(output, "\n{indent}    {arrow} {suggestion}");
            }
        }
        CheckStatus::Skipped { reason } => {
            let _ = write!(output, "  ({reason})");
        }
    }

    output
}

fn render_summary(report: &VerificationReport, no_color: bool) -> String {
    let (passed, failed, skipped) = report.summary();
    let summary = format!("Summary: {passed} passed, {failed} failed, {skipped} skipped");
    #[allow(clippy::cast_precision_loss)]
    let time_text = format!("[{:.1}s]", report.total_duration.as_millis() as f64 / 1000.0);
    let verdict = if report.verified {
        "Billing source verified"
    } else {
        "Billing source NOT verified"
    };

    let mut output = "-".repeat(RULE_WIDTH);
    output.push('\n');
    if no_color {
        let _ = writeln!(output, "{summary:<50} {time_text}");
        let _ = writeln!(output, "{verdict}");
    } else {
        let styled = if failed > 0 { summary.red() } else { summary.green() };
        let _ = writeln!(output, "{:<50} {}", styled.to_string(), time_text.dimmed());
        let verdict = if report.verified {
            verdict.green().bold()
        } else {
            verdict.red().bold()
        };
        let _ = writeln!(output, "{verdict}");
    }
    output
}

fn icon(status: &CheckStatus, no_color: bool) -> &'static str {
    match (status, no_color) {
        (CheckStatus::Pass { .. }, true) => "[OK]",
        (CheckStatus::Pass { .. }, false) => "\u{2713}",
        (CheckStatus::Fail { .. }, true) => "[!!]",
        (CheckStatus::Fail { .. }, false) => "\u{2717}",
        (CheckStatus::Skipped { .. }, true) => "[--]",
        (CheckStatus::Skipped { .. }, false) => "\u{23ED}",
    }
}

fn colorize(line: &str, status: &CheckStatus, no_color: bool) -> String {
    if no_color {
        return line.to_string();
    }
    match status {
        CheckStatus::Pass { .. } => line.green().to_string(),
        CheckStatus::Fail { .. } => line.red().to_string(),
        CheckStatus::Skipped { .. } => line.bright_black().to_string(),
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}
