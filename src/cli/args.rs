//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::models::{BillingSource, DataSourceDescriptor, DelegatedCredential};
use crate::error::{CurcheckError, Result};

/// Environment variable read by `--role-arn`.
pub const ENV_ROLE_ARN: &str = "CURCHECK_ROLE_ARN";
/// Environment variable read by `--bucket`.
pub const ENV_BUCKET: &str = "CURCHECK_BUCKET";

/// Verify that an AWS billing source is reachable and correctly configured.
#[derive(Parser, Debug)]
#[command(name = "curcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify role access, bucket reachability and report configuration
    Verify(VerifyArgs),

    /// Check that report objects exist in the billing bucket
    CheckFiles(CheckFilesArgs),
}

/// Billing source given on the command line or in a JSON file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// IAM role ARN to assume
    #[arg(long, value_name = "ARN", env = ENV_ROLE_ARN)]
    pub role_arn: Option<String>,

    /// External ID required by the role trust policy
    #[arg(long, value_name = "ID")]
    pub external_id: Option<String>,

    /// S3 bucket receiving the cost reports
    #[arg(long, value_name = "NAME", env = ENV_BUCKET)]
    pub bucket: Option<String>,

    /// Region of the bucket
    #[arg(long, value_name = "REGION")]
    pub bucket_region: Option<String>,

    /// Read the billing source from a JSON file instead of flags
    #[arg(long, value_name = "PATH")]
    pub source_file: Option<PathBuf>,
}

impl SourceArgs {
    /// Build the billing source.
    ///
    /// A source file wins over the individual flags. Missing flags become
    /// empty values so the verifier reports them as missing input.
    ///
    /// # Errors
    ///
    /// Returns an error if the source file cannot be read or parsed.
    pub fn billing_source(&self) -> Result<BillingSource> {
        if let Some(path) = &self.source_file {
            return load_source_file(path);
        }

        let mut credentials = DelegatedCredential::new(self.role_arn.clone().unwrap_or_default());
        credentials.external_id = self.external_id.clone();
        let mut data_source = DataSourceDescriptor::new(self.bucket.clone().unwrap_or_default());
        data_source.bucket_region = self.bucket_region.clone();

        Ok(BillingSource {
            credentials,
            data_source,
        })
    }
}

/// Load a billing source from a JSON file.
///
/// # Errors
///
/// Returns [`CurcheckError::Config`] if the file is missing or malformed.
pub fn load_source_file(path: &std::path::Path) -> Result<BillingSource> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CurcheckError::Config(format!("cannot read source file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CurcheckError::Config(format!("invalid source file {}: {e}", path.display()))
    })
}

/// Arguments for the `verify` command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only check role and bucket access
    #[arg(long)]
    pub storage_only: bool,
}

/// Arguments for the `check-files` command.
#[derive(Args, Debug)]
pub struct CheckFilesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Object keys to look up
    #[arg(value_name = "KEY", required = true)]
    pub keys: Vec<String>,
}

/// Output format.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}
