//! Shared helpers for curcheck integration tests.
//!
//! - `logger`: per-test progress logging with phases and durations
//! - `log_capture`: in-process capture of `tracing` events for assertions

pub mod log_capture;
pub mod logger;
