//! `tracing` integration
//!
//! [`PipelineLayer`] turns `tracing` events into [`LogRecord`]s and hands
//! them to a [`LoggingContext`], so code using the `tracing` macros goes
//! through the same filter, router and encoder as direct callers.
//!
//! Records from the `log` crate arrive through the `tracing-log` bridge that
//! `init_logging` installs. Their call site is read from the normalized
//! metadata, and the bridge's own `log.*` fields are dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::field::{Field as TracingField, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_log::NormalizeEvent;
use tracing_subscriber::layer::{Context, Layer};

use crate::context::LoggingContext;
use crate::core::Core;
use crate::record::{Field, LogRecord};
use crate::severity::Severity;

pub struct PipelineLayer {
    context: LoggingContext,
    write_failed: AtomicBool,
}

impl PipelineLayer {
    pub fn new(context: LoggingContext) -> Self {
        PipelineLayer {
            context,
            write_failed: AtomicBool::new(false),
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    bridged: bool,
    message: Option<String>,
    fields: Vec<Field>,
}

impl RecordVisitor {
    fn push(&mut self, field: &TracingField, value: Value) {
        if self.bridged && field.name().starts_with("log.") {
            return;
        }
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        self.push(field, Value::from(format!("{:?}", value)));
    }
}

fn source_location(metadata: &Metadata<'_>) -> String {
    match (metadata.file(), metadata.line()) {
        (Some(file), Some(line)) => format!("{}:{}", file, line),
        (Some(file), None) => file.to_string(),
        _ => metadata
            .module_path()
            .unwrap_or_else(|| metadata.target())
            .to_string(),
    }
}

pub(crate) fn event_to_record(event: &Event<'_>) -> LogRecord {
    let normalized = event.normalized_metadata();
    let metadata = normalized.as_ref().unwrap_or_else(|| event.metadata());
    let mut visitor = RecordVisitor {
        bridged: normalized.is_some(),
        ..RecordVisitor::default()
    };
    event.record(&mut visitor);

    LogRecord::new(
        Severity::from(*metadata.level()),
        visitor.message.unwrap_or_default(),
    )
    .at(source_location(metadata))
    .with_fields(visitor.fields)
}

impl<S: Subscriber> Layer<S> for PipelineLayer {
    // the threshold can change at runtime, so callsites must not be cached
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    // bridged `log` records keep their level in the callsite metadata
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.context
            .core()
            .enabled(Severity::from(*metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let record = event_to_record(event);
        if let Err(e) = self.context.emit(&record) {
            // the logger itself is broken, stderr is all that is left
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                eprintln!("cloud-log: failed to write record: {}", e);
            }
        }
    }
}
