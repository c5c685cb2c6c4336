//! Diagnostic observer for absorbed outbound errors.
//!
//! Components never fail on an outbound error they are expected to absorb;
//! instead they report a [`DiagnosticEvent`] to the injected observer and
//! continue with a degraded result.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    /// Component that recorded the event (`broker`, `storage`, ...).
    pub component: &'static str,
    pub message: String,
}

impl DiagnosticEvent {
    #[must_use]
    pub fn new(severity: Severity, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            component,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, component, message)
    }

    #[must_use]
    pub fn warn(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, component, message)
    }

    #[must_use]
    pub fn error(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, component, message)
    }
}

/// Receives diagnostics from the verification components.
pub trait DiagnosticObserver: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn DiagnosticObserver>;

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiagnosticObserver for TracingObserver {
    fn record(&self, event: DiagnosticEvent) {
        let DiagnosticEvent {
            severity,
            component,
            message,
        } = event;
        match severity {
            Severity::Info => tracing::info!(component, "{message}"),
            Severity::Warn => tracing::warn!(component, "{message}"),
            Severity::Error => tracing::error!(component, "{message}"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events recorded by one component.
    #[must_use]
    pub fn events_for(&self, component: &str) -> Vec<DiagnosticEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.component == component)
            .collect()
    }

    /// Whether any event message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|e| e.message.contains(needle))
    }
}

impl DiagnosticObserver for RecordingObserver {
    fn record(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// The default observer.
#[must_use]
pub fn default_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}
