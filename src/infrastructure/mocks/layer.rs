//! Event-capturing tracing layer for log assertions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// One event as seen by `MockCaptureLayer`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    /// Every non-message field, rendered with `Display` for strings and
    /// `Debug` for everything else
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    /// Rendered value of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Layer that records every event it sees. Clones share the same record.
#[derive(Clone, Default)]
pub struct MockCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl MockCaptureLayer {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All captured events, oldest first.
    pub fn get_captured(&self) -> Vec<CapturedEvent> {
        self.events().clone()
    }

    /// Number of captured events.
    pub fn count(&self) -> usize {
        self.events().len()
    }

    /// Captured events at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.events().clear();
    }
}

impl<S: Subscriber> Layer<S> for MockCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut recorder = FieldRecorder::default();
        event.record(&mut recorder);

        self.events().push(CapturedEvent {
            level: *event.metadata().level(),
            message: recorder.message,
            fields: recorder.fields,
        });
    }
}

#[derive(Default)]
struct FieldRecorder {
    message: String,
    fields: BTreeMap<String, String>,
}

impl FieldRecorder {
    fn record(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            name => {
                self.fields.insert(name.to_owned(), value);
            }
        }
    }
}

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{:?}", value));
    }
}
