//! Tracing layer that forwards session events to a channel.
//!
//! Only events from the session loop (`generation`) and the completion
//! transaction (`completion`) are forwarded. The CLI prints them as JSON
//! lines when `generate --events` is given.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Targets whose events are forwarded.
pub const SESSION_TARGETS: [&str; 2] = ["generation", "completion"];

/// One forwarded event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionEvent {
    /// "generation" or "completion"
    pub target: String,
    pub level: String,
    pub message: String,
    /// Structured fields other than the message
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

pub struct SessionEventLayer {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { sender }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for SessionEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !SESSION_TARGETS.contains(&target) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(SessionEvent {
            target: target.to_string(),
            level: event.metadata().level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}
