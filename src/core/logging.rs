//! Diagnostic logging to stderr or a log file.
//!
//! Flags win over the environment: `--log-level` over `CURCHECK_LOG`,
//! `--json-output` over `CURCHECK_LOG_FORMAT`. `CURCHECK_LOG_FILE` redirects
//! output to a file. `RUST_LOG`, when set, replaces the level filter.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_LEVEL_ENV: &str = "CURCHECK_LOG";
const LOG_FORMAT_ENV: &str = "CURCHECK_LOG_FORMAT";
const LOG_FILE_ENV: &str = "CURCHECK_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-field text without timestamps.
    #[default]
    Human,
    /// One JSON object per event.
    Json,
    /// Single-line text with targets.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" | "jsonl" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Minimum level of emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" | "verbose" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Combine CLI flags with the `CURCHECK_LOG*` variables.
    ///
    /// Unparsable values fall back to the defaults. `verbose` lifts the
    /// default level to debug but never lowers an explicit one.
    #[must_use]
    pub fn resolve(level_flag: Option<&str>, json_flag: bool, verbose: bool) -> Self {
        let explicit = level_flag
            .and_then(|raw| raw.parse().ok())
            .or_else(|| env_value(LOG_LEVEL_ENV).and_then(|raw| raw.parse().ok()));
        let level = match explicit {
            Some(level) => level,
            None if verbose => LogLevel::Debug,
            None => LogLevel::default(),
        };

        let format = if json_flag {
            LogFormat::Json
        } else {
            env_value(LOG_FORMAT_ENV)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_default()
        };

        Self {
            level,
            format,
            file: env_value(LOG_FILE_ENV).map(PathBuf::from),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Install the global subscriber. Later calls are no-ops.
///
/// A log file that cannot be opened falls back to stderr.
pub fn init(settings: &LogSettings) {
    let writer = settings
        .file
        .as_ref()
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
        .map_or_else(|| BoxMakeWriter::new(std::io::stderr), BoxMakeWriter::new);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("curcheck={}", LevelFilter::from(settings.level)))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    let _ = match settings.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Compact => builder.compact().with_target(true).try_init(),
        LogFormat::Human => builder.with_target(false).without_time().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let prior: Vec<_> = vars
            .iter()
            .map(|(key, _)| (*key, std::env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            unsafe {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
        f();
        for (key, value) in prior {
            unsafe {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    const CLEAN: [(&str, Option<&str>); 3] = [
        (LOG_LEVEL_ENV, None),
        (LOG_FORMAT_ENV, None),
        (LOG_FILE_ENV, None),
    ];

    #[test]
    fn defaults_to_error_human_stderr() {
        with_env(&CLEAN, || {
            assert_eq!(LogSettings::resolve(None, false, false), LogSettings::default());
        });
    }

    #[test]
    fn flag_wins_over_env() {
        with_env(&[(LOG_LEVEL_ENV, Some("warn")), (LOG_FORMAT_ENV, Some("compact"))], || {
            let settings = LogSettings::resolve(Some("trace"), true, false);
            assert_eq!(settings.level, LogLevel::Trace);
            assert_eq!(settings.format, LogFormat::Json);

            let settings = LogSettings::resolve(None, false, false);
            assert_eq!(settings.level, LogLevel::Warn);
            assert_eq!(settings.format, LogFormat::Compact);
        });
    }

    #[test]
    fn verbose_only_lifts_the_default() {
        with_env(&CLEAN, || {
            assert_eq!(LogSettings::resolve(None, false, true).level, LogLevel::Debug);
            assert_eq!(LogSettings::resolve(Some("info"), false, true).level, LogLevel::Info);
            assert_eq!(LogSettings::resolve(Some("loud"), false, true).level, LogLevel::Debug);
        });
    }

    #[test]
    fn log_file_from_env_is_trimmed() {
        with_env(&[(LOG_FILE_ENV, Some(" /tmp/curcheck.log "))], || {
            assert_eq!(
                LogSettings::resolve(None, false, false).file,
                Some(PathBuf::from("/tmp/curcheck.log"))
            );
        });
        with_env(&[(LOG_FILE_ENV, Some("   "))], || {
            assert_eq!(LogSettings::resolve(None, false, false).file, None);
        });
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" JSONL ".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::INFO);
    }
}
