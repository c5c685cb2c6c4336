//! Test progress logging.
#![allow(dead_code)]
//!
//! ```rust,ignore
//! let log = TestLogger::new("verifies_healthy_source");
//! log.phase("setup");
//! // ...
//! log.phase("verify");
//! log.finish_ok();
//! ```
//!
//! `TEST_LOG_LEVEL` (trace, debug, info, warn, error) sets the minimum level
//! written to stderr. Default: info.

use std::env;
use std::fmt;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

fn min_level() -> LogLevel {
    static MIN_LEVEL: OnceLock<LogLevel> = OnceLock::new();
    *MIN_LEVEL.get_or_init(|| {
        env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|s| LogLevel::parse(&s))
            .unwrap_or(LogLevel::Info)
    })
}

/// Per-test logger tracking the current phase and elapsed time.
pub struct TestLogger {
    test_name: String,
    start_time: Instant,
    phase: Mutex<String>,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
            phase: Mutex::new("init".to_string()),
        };
        logger.log(LogLevel::Info, "Test starting");
        logger
    }

    pub fn phase(&self, phase: &str) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase.to_string();
        }
        self.log(LogLevel::Debug, &format!("Phase: {phase}"));
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn finish_ok(&self) {
        let duration_ms = self.start_time.elapsed().as_millis();
        self.log(
            LogLevel::Info,
            &format!("Test passed (duration: {duration_ms}ms)"),
        );
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < min_level() {
            return;
        }
        let phase = self
            .phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default();
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{ts}] [{level}] [{}:{phase}] {message}", self.test_name);
    }
}
