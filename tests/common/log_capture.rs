#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Captures `tracing` events emitted on the current thread.
///
/// Works with `#[tokio::test]`, whose runtime polls on the test thread.
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogCapture {
    pub fn start() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            events: events.clone(),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            events,
            _guard: guard,
        }
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn assert_logged(&self, needle: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.message.contains(needle)),
            "Expected an event containing {needle:?}. Logged: {:#?}",
            events.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
    }

    pub fn assert_field(&self, name: &str, value: &str) {
        let events = self.events();
        assert!(
            events
                .iter()
                .any(|e| e.fields.iter().any(|(k, v)| k == name && v == value)),
            "Expected field {name}={value}. Logged: {:#?}",
            events.iter().map(|e| &e.fields).collect::<Vec<_>>()
        );
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}
