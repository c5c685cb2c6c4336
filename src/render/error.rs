//! Error rendering for curcheck.
//!
//! Provides colored error rendering with fix suggestions for terminal
//! output, simple text for non-TTY environments, and structured JSON for
//! machine consumption.

use colored::Colorize;

use crate::cli::args::OutputFormat;
use crate::error::{CurcheckError, FixSuggestion};

// =============================================================================
// Public API
// =============================================================================

/// Render an error with appropriate formatting based on terminal capabilities.
#[must_use]
pub fn render_error(error: &CurcheckError, format: OutputFormat, no_color: bool) -> String {
    render_error_full(error, format, no_color, false)
}

/// Render an error with full control over all formatting options.
///
/// JSON and Markdown formats get structured JSON. Human output is colored
/// only when `no_color` is unset and stderr is a TTY.
#[must_use]
pub fn render_error_full(
    error: &CurcheckError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => return render_error_json(error, pretty),
        OutputFormat::Md => return render_error_json(error, true),
        OutputFormat::Human => {}
    }

    let use_color = crate::util::env::should_use_color(no_color) && crate::util::env::stderr_is_tty();
    if use_color {
        render_rich(error)
    } else {
        render_simple(error)
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &CurcheckError, pretty: bool) -> String {
    let envelope = ErrorEnvelope {
        error: ErrorJson::from_error(error),
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Colored Terminal Rendering
// =============================================================================

fn render_rich(error: &CurcheckError) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines = vec![
        format!(
            "{} {}",
            error.to_string().red().bold(),
            format!("[{}]", error.error_code()).dimmed()
        ),
        String::new(),
    ];

    if !suggestions.is_empty() {
        lines.push(render_suggestions_section(&suggestions));
    }

    if let Some(first) = suggestions.first() {
        if !first.context.is_empty() {
            lines.push(String::new());
            lines.push("Why this happened:".yellow().to_string());
            lines.extend(wrap_text(&first.context, 60).into_iter().map(|l| format!("  {l}")));
        }
        if let Some(prevention) = &first.prevention {
            lines.push(String::new());
            lines.push("Prevention:".green().to_string());
            lines.extend(wrap_text(prevention, 60).into_iter().map(|l| format!("  {l}")));
        }
        if let Some(doc_url) = &first.doc_url {
            lines.push(String::new());
            lines.push(format!("{}{}", "Docs: ".dimmed(), doc_url.underline()));
        }
    }

    let title = format!("-- {} ", error.category());
    let rule = "-".repeat(70usize.saturating_sub(title.len()));
    format!("{}{}\n{}\n", title.red(), rule.red(), lines.join("\n"))
}

fn render_suggestions_section(suggestions: &[FixSuggestion]) -> String {
    let mut lines = vec!["How to fix:".cyan().bold().to_string()];

    for (i, suggestion) in suggestions.iter().enumerate() {
        for (j, cmd) in suggestion.commands.iter().enumerate() {
            let prefix = if j == 0 {
                format!("  {}. ", i + 1)
            } else {
                "     Or: ".to_string()
            };
            lines.push(format!("{prefix}{}", cmd.cyan()));
        }
    }

    lines.join("\n")
}

// =============================================================================
// Simple Text Rendering
// =============================================================================

/// Render error as simple text (no ANSI codes, no Unicode).
fn render_simple(error: &CurcheckError) -> String {
    let mut lines = vec![format!("Error [{}]: {}", error.error_code(), error)];

    let fix = error
        .fix_suggestions()
        .into_iter()
        .next()
        .and_then(|s| s.commands.into_iter().find(|cmd| !cmd.starts_with('#')));
    if let Some(cmd) = fix {
        lines.push(format!("Fix: {cmd}"));
    }

    lines.join("\n")
}

// =============================================================================
// JSON Rendering
// =============================================================================

#[derive(serde::Serialize)]
struct ErrorEnvelope {
    error: ErrorJson,
}

/// JSON representation of an error for machine consumption.
#[derive(serde::Serialize)]
struct ErrorJson {
    code: String,
    kind: String,
    category: String,
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    suggestions: Vec<SuggestionJson>,
}

#[derive(serde::Serialize)]
struct SuggestionJson {
    commands: Vec<String>,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_url: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &CurcheckError) -> Self {
        Self {
            code: error.error_code().to_string(),
            kind: error.error_kind().to_string(),
            category: error.category().to_string(),
            message: error.to_string(),
            retryable: error.is_retryable(),
            bucket: error.bucket().map(String::from),
            suggestions: error
                .fix_suggestions()
                .into_iter()
                .map(|s| SuggestionJson {
                    commands: s.commands,
                    context: s.context,
                    prevention: s.prevention,
                    doc_url: s.doc_url,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Simple word wrapping.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_no_ansi_codes;

    fn not_found() -> CurcheckError {
        CurcheckError::BillingSourceNotFound {
            bucket: "cost-reports".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/Cost".to_string(),
            transient: false,
        }
    }

    #[test]
    fn simple_render_includes_error_code() {
        let output = render_simple(&CurcheckError::MissingRoleArn);
        assert!(output.contains("CURCHECK-V001"));
        assert!(output.contains("Fix: curcheck verify"));
        assert_no_ansi_codes!(&output);
    }

    #[test]
    fn json_render_has_stable_shape() {
        let output = render_error_json(&not_found(), false);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let error = &parsed["error"];
        assert_eq!(error["kind"], "BillingSourceNotFound");
        assert_eq!(error["category"], "Verification error");
        assert_eq!(error["retryable"], false);
        assert_eq!(error["bucket"], "cost-reports");
        assert!(error["code"].as_str().unwrap().starts_with("CURCHECK-V"));
        assert!(error["message"].as_str().unwrap().contains("cost-reports"));
        assert!(error["suggestions"].is_array());
    }

    #[test]
    fn json_render_omits_absent_bucket() {
        let output = render_error_json(&CurcheckError::Config("bad source".to_string()), false);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(parsed["error"].get("bucket").is_none());
        assert_eq!(parsed["error"]["kind"], "Configuration");
    }

    #[test]
    fn rich_render_includes_sections() {
        colored::control::set_override(false);
        let output = render_rich(&not_found());
        assert!(output.contains("How to fix"));
        assert!(output.contains("Why this happened"));
        assert!(output.contains("Verification error"));
    }

    #[test]
    fn render_error_full_respects_pretty() {
        let err = CurcheckError::MissingBucket;
        let compact = render_error_full(&err, OutputFormat::Json, false, false);
        assert!(!compact.contains("\n  "));
        let pretty = render_error_full(&err, OutputFormat::Json, false, true);
        assert!(pretty.contains("\n  "));
        let md = render_error(&err, OutputFormat::Md, false);
        assert!(md.contains("\n  "));
    }

    #[test]
    fn render_error_with_no_color_returns_plain() {
        let output = render_error(&CurcheckError::MissingBucket, OutputFormat::Human, true);
        assert_no_ansi_codes!(&output);
        assert!(output.starts_with("Error [CURCHECK-V002]"));
    }

    #[test]
    fn wrap_text_respects_width() {
        let wrapped = wrap_text("one two three four five six seven eight nine ten", 12);
        assert!(wrapped.iter().all(|line| line.len() <= 12));
        assert_eq!(wrap_text("", 60), vec![String::new()]);
    }
}
