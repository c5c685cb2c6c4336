//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/curcheck/config.toml`
//! - macOS: `~/Library/Application Support/com.curcheck.curcheck/config.toml`
//! - Windows: `%APPDATA%/curcheck/curcheck/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `CURCHECK_FORMAT`: Output format (human, json, md)
//! - `CURCHECK_TIMEOUT`: Network timeout in seconds
//! - `CURCHECK_BILLING_REGION`: Region of the report configuration APIs
//! - `CURCHECK_NO_COLOR` or `NO_COLOR`: Disable colors (1, true, yes)
//! - `CURCHECK_VERBOSE`: Enable verbose output (1, true, yes)
//! - `CURCHECK_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `CURCHECK_CONFIG`: Override config file path

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::aws::DEFAULT_BILLING_REGION;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::broker::DEFAULT_SESSION_NAME;
use crate::core::storage::DEFAULT_STORAGE_REGION;
use crate::core::validator::DEFAULT_ALLOWED_COMPRESSIONS;
use crate::error::{CurcheckError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for output format.
pub const ENV_FORMAT: &str = "CURCHECK_FORMAT";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "CURCHECK_TIMEOUT";
/// Environment variable for the billing API region.
pub const ENV_BILLING_REGION: &str = "CURCHECK_BILLING_REGION";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "CURCHECK_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for verbose output.
pub const ENV_VERBOSE: &str = "CURCHECK_VERBOSE";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "CURCHECK_PRETTY";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "CURCHECK_CONFIG";

const MIN_TIMEOUT_SECONDS: u64 = 1;
const MAX_TIMEOUT_SECONDS: u64 = 300;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// File configuration with environment overrides applied.
    pub config: Config,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Whether verbose logging is enabled.
    pub verbose: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub format: ConfigSource,
    pub timeout: ConfigSource,
    pub billing_region: ConfigSource,
    pub no_color: ConfigSource,
    pub verbose: ConfigSource,
    pub pretty: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and config file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but is invalid
    /// - An environment override cannot be parsed
    /// - Any resolved value fails [`Config::validate`]
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let (mut config, from_file) = Self::load_config()?;
        let mut sources = ConfigSources::default();

        Self::apply_timeout(&mut config, from_file, &mut sources.timeout)?;
        Self::apply_billing_region(&mut config, from_file, &mut sources.billing_region);
        config.validate()?;

        let format = Self::resolve_format(cli, &config, &mut sources.format)?;
        let no_color = Self::resolve_no_color(cli, &config, &mut sources.no_color);
        let verbose = Self::resolve_verbose(cli, &mut sources.verbose);
        let pretty = Self::resolve_pretty(cli, &config, &mut sources.pretty);

        Ok(Self {
            config,
            format,
            no_color,
            verbose,
            pretty,
            sources,
        })
    }

    /// Load the config file, respecting `CURCHECK_CONFIG`.
    fn load_config() -> Result<(Config, bool)> {
        let path = std::env::var(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Config::config_path());
        let exists = path.exists();
        Ok((Config::load_from(&path)?, exists))
    }

    fn apply_timeout(config: &mut Config, from_file: bool, source: &mut ConfigSource) -> Result<()> {
        if let Ok(raw) = std::env::var(ENV_TIMEOUT) {
            let seconds = raw.trim().parse::<u64>().map_err(|_| CurcheckError::ConfigInvalid {
                key: ENV_TIMEOUT.to_string(),
                value: raw.clone(),
                message: "expected a whole number of seconds".to_string(),
            })?;
            *source = ConfigSource::Env;
            config.general.timeout_seconds = seconds;
        } else {
            *source = file_or_default(from_file);
        }
        Ok(())
    }

    fn apply_billing_region(config: &mut Config, from_file: bool, source: &mut ConfigSource) {
        match std::env::var(ENV_BILLING_REGION) {
            Ok(region) if !region.trim().is_empty() => {
                *source = ConfigSource::Env;
                config.aws.billing_region = region.trim().to_string();
            }
            _ => *source = file_or_default(from_file),
        }
    }

    /// Resolve output format setting.
    fn resolve_format(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // clap fills in `human` by default, so only a non-default value counts as set
        if cli.effective_format() != OutputFormat::Human {
            *source = ConfigSource::Cli;
            return Ok(cli.effective_format());
        }

        if let Ok(format_env) = std::env::var(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return parse_format(&format_env);
        }

        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return parse_format(format_str);
        }

        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn resolve_no_color(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_NO_COLOR) || std::env::var(ENV_NO_COLOR_STD).is_ok() {
            *source = ConfigSource::Env;
            return true;
        }

        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_verbose(cli: &Cli, source: &mut ConfigSource) -> bool {
        if cli.verbose {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_VERBOSE) {
            *source = ConfigSource::Env;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }
}

const fn file_or_default(from_file: bool) -> ConfigSource {
    if from_file {
        ConfigSource::ConfigFile
    } else {
        ConfigSource::Default
    }
}

/// Parse a format string into [`OutputFormat`].
fn parse_format(s: &str) -> Result<OutputFormat> {
    match s.trim().to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        "md" | "markdown" => Ok(OutputFormat::Md),
        _ => Err(CurcheckError::Config(format!(
            "Invalid format '{s}'. Valid formats: human, json, md"
        ))),
    }
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var: &str) -> bool {
    std::env::var(var)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

// =============================================================================
// File Configuration
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// AWS connection settings.
    pub aws: AwsConfig,
    /// Report configuration policy.
    pub validation: ValidationConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Timeout for every AWS call in seconds.
    pub timeout_seconds: u64,
}

/// AWS connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Session name sent with `AssumeRole`.
    pub session_name: String,
    /// Region used when a billing source has no bucket region.
    pub default_region: String,
    /// Region of the BCM Data Exports and CUR APIs.
    pub billing_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sts_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_exports_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur_endpoint: Option<String>,
}

/// Report configuration policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Compression formats the ingestion pipeline can read.
    pub allowed_compressions: Vec<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            default_region: DEFAULT_STORAGE_REGION.to_string(),
            billing_region: DEFAULT_BILLING_REGION.to_string(),
            sts_endpoint: None,
            s3_endpoint: None,
            data_exports_endpoint: None,
            cur_endpoint: None,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_compressions: DEFAULT_ALLOWED_COMPRESSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CurcheckError::Config(format!("Invalid config file: {e}")))?;

        Ok(config)
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Timeout is within 1-300 seconds
    /// - Session name and regions are non-empty
    /// - At least one compression is allowed
    /// - Endpoint overrides are `http://` or `https://` URLs
    /// - Output format is valid (human, json, md)
    ///
    /// # Errors
    ///
    /// Returns [`CurcheckError::ConfigInvalid`] naming the first bad key.
    pub fn validate(&self) -> Result<()> {
        let timeout = self.general.timeout_seconds;
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&timeout) {
            return Err(invalid(
                "general.timeout_seconds",
                timeout.to_string(),
                "Timeout must be between 1 and 300 seconds",
            ));
        }

        for (key, value) in [
            ("aws.session_name", &self.aws.session_name),
            ("aws.default_region", &self.aws.default_region),
            ("aws.billing_region", &self.aws.billing_region),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(key, value.clone(), "must not be empty"));
            }
        }

        if self
            .validation
            .allowed_compressions
            .iter()
            .all(|c| c.trim().is_empty())
        {
            return Err(invalid(
                "validation.allowed_compressions",
                format!("{:?}", self.validation.allowed_compressions),
                "at least one compression must be allowed",
            ));
        }

        for (key, endpoint) in [
            ("aws.sts_endpoint", &self.aws.sts_endpoint),
            ("aws.s3_endpoint", &self.aws.s3_endpoint),
            ("aws.data_exports_endpoint", &self.aws.data_exports_endpoint),
            ("aws.cur_endpoint", &self.aws.cur_endpoint),
        ] {
            let bad = endpoint
                .as_ref()
                .filter(|url| !(url.starts_with("http://") || url.starts_with("https://")));
            if let Some(url) = bad {
                return Err(invalid(
                    key,
                    url.clone(),
                    "endpoint must start with http:// or https://",
                ));
            }
        }

        if let Some(format) = &self.output.format {
            parse_format(format)?;
        }

        Ok(())
    }
}

fn invalid(key: &str, value: String, message: &str) -> CurcheckError {
    CurcheckError::ConfigInvalid {
        key: key.to_string(),
        value,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_config_toml;
    use clap::Parser;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_ENV: [&str; 8] = [
        ENV_FORMAT,
        ENV_TIMEOUT,
        ENV_BILLING_REGION,
        ENV_NO_COLOR,
        ENV_NO_COLOR_STD,
        ENV_VERBOSE,
        ENV_PRETTY,
        ENV_CONFIG,
    ];

    #[allow(unsafe_code)]
    fn set_env(key: &str, value: &str) {
        // SAFETY: env-mutating tests hold ENV_LOCK
        unsafe { std::env::set_var(key, value) };
    }

    #[allow(unsafe_code)]
    fn remove_env(key: &str) {
        // SAFETY: env-mutating tests hold ENV_LOCK
        unsafe { std::env::remove_var(key) };
    }

    /// Run `f` with a clean environment pointing at a missing config file.
    fn with_clean_env(f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for key in ALL_ENV {
            remove_env(key);
        }
        set_env(ENV_CONFIG, "/nonexistent/curcheck/config.toml");
        f();
        for key in ALL_ENV {
            remove_env(key);
        }
    }

    fn make_test_cli(extra: &[&str]) -> Cli {
        let mut argv = vec!["curcheck"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["verify", "--bucket", "b"]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.general.timeout_seconds, 30);
        assert_eq!(config.aws.session_name, "AccountCreationSession");
        assert_eq!(config.validation.allowed_compressions, vec!["GZIP", "PLAIN"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", make_test_config_toml()).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.general.timeout_seconds, 10);
        assert_eq!(config.aws.session_name, "CurcheckTestSession");
        assert_eq!(config.aws.default_region, "eu-west-1");
        assert_eq!(config.validation.allowed_compressions, vec!["GZIP"]);
        assert!(config.output.color);
    }

    #[test]
    fn load_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[aws]\ncur_endpoint = \"http://localhost:4566\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.aws.cur_endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.aws.billing_region, "us-east-1");
        assert_eq!(config.general.timeout_seconds, 30);
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, CurcheckError::Config(_)));
    }

    #[test]
    fn validate_timeout_bounds() {
        for timeout in [0, 301] {
            let mut config = Config::default();
            config.general.timeout_seconds = timeout;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("Timeout must be between"));
        }
    }

    #[test]
    fn validate_rejects_empty_session_name() {
        let mut config = Config::default();
        config.aws.session_name = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            CurcheckError::ConfigInvalid { ref key, .. } if key == "aws.session_name"
        ));
    }

    #[test]
    fn validate_rejects_empty_compressions() {
        let mut config = Config::default();
        config.validation.allowed_compressions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = Config::default();
        config.aws.s3_endpoint = Some("localhost:9000".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("aws.s3_endpoint"));

        config.aws.s3_endpoint = Some("http://localhost:9000".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_invalid_format() {
        let mut config = Config::default();
        config.output.format = Some("yaml".to_string());
        assert!(config.validate().is_err());
    }

    // -------------------------------------------------------------------------
    // ResolvedConfig tests
    // -------------------------------------------------------------------------

    #[test]
    fn config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI flag");
        assert_eq!(format!("{}", ConfigSource::Env), "environment variable");
        assert_eq!(format!("{}", ConfigSource::ConfigFile), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn resolved_config_default_values() {
        with_clean_env(|| {
            let resolved = ResolvedConfig::resolve(&make_test_cli(&[])).unwrap();
            assert_eq!(resolved.format, OutputFormat::Human);
            assert!(!resolved.no_color);
            assert!(!resolved.verbose);
            assert!(!resolved.pretty);
            assert_eq!(resolved.config, Config::default());
            assert_eq!(resolved.sources.timeout, ConfigSource::Default);
        });
    }

    #[test]
    fn resolved_config_cli_flags_win() {
        with_clean_env(|| {
            set_env(ENV_FORMAT, "md");
            let resolved =
                ResolvedConfig::resolve(&make_test_cli(&["--json", "--pretty", "--no-color"]))
                    .unwrap();
            assert_eq!(resolved.format, OutputFormat::Json);
            assert_eq!(resolved.sources.format, ConfigSource::Cli);
            assert!(resolved.pretty);
            assert!(resolved.no_color);
        });
    }

    #[test]
    fn resolved_config_env_overrides() {
        with_clean_env(|| {
            set_env(ENV_FORMAT, "markdown");
            set_env(ENV_TIMEOUT, "45");
            set_env(ENV_BILLING_REGION, "us-gov-west-1");
            set_env(ENV_NO_COLOR_STD, "1");

            let resolved = ResolvedConfig::resolve(&make_test_cli(&[])).unwrap();
            assert_eq!(resolved.format, OutputFormat::Md);
            assert_eq!(resolved.config.general.timeout_seconds, 45);
            assert_eq!(resolved.config.aws.billing_region, "us-gov-west-1");
            assert!(resolved.no_color);
            assert_eq!(resolved.sources.timeout, ConfigSource::Env);
            assert_eq!(resolved.sources.billing_region, ConfigSource::Env);
        });
    }

    #[test]
    fn resolved_config_rejects_bad_timeout_env() {
        with_clean_env(|| {
            set_env(ENV_TIMEOUT, "soon");
            let err = ResolvedConfig::resolve(&make_test_cli(&[])).unwrap_err();
            assert!(matches!(err, CurcheckError::ConfigInvalid { .. }));

            set_env(ENV_TIMEOUT, "900");
            assert!(ResolvedConfig::resolve(&make_test_cli(&[])).is_err());
        });
    }

    #[test]
    fn resolved_config_reads_config_file() {
        with_clean_env(|| {
            let mut file = NamedTempFile::new().unwrap();
            write!(
                file,
                "{}\n[output]\nformat = \"json\"\npretty = true\n",
                make_test_config_toml()
            )
            .unwrap();
            set_env(ENV_CONFIG, &file.path().to_string_lossy());

            let resolved = ResolvedConfig::resolve(&make_test_cli(&[])).unwrap();
            assert_eq!(resolved.format, OutputFormat::Json);
            assert_eq!(resolved.sources.format, ConfigSource::ConfigFile);
            assert!(resolved.pretty);
            assert_eq!(resolved.sources.timeout, ConfigSource::ConfigFile);
            assert_eq!(resolved.config.general.timeout_seconds, 10);
        });
    }
}
