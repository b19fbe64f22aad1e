//! Pipeline stages
//!
//! A [`Core`] decides whether a record is wanted and writes it. Stages wrap
//! one another by holding the next stage as a field; [`RoutedCore`] is the
//! innermost stage and owns the encoder and the two destinations.

use std::sync::Arc;

use crate::encoder::Encoder;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::record::{Field, LogRecord};
use crate::router::{Destination, SeverityRouter};
use crate::severity::Severity;
use crate::sink::{Sink, SinkPair};

pub trait Core: Send + Sync {
    /// Cheap pre-check on severity alone
    fn enabled(&self, severity: Severity) -> bool;

    /// Whether `write` would emit this record anywhere. Never has side effects.
    fn check(&self, record: &LogRecord) -> bool;

    /// Emit the record. Re-applies every decision made by `check`.
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// New stage with `fields` bound to every record it writes
    fn with(&self, fields: Vec<Field>) -> Self
    where
        Self: Sized;

    fn sync(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RoutedCore {
    router: SeverityRouter,
    encoder: Arc<dyn Encoder>,
    sinks: SinkPair,
    fields: Arc<Vec<Field>>,
    metrics: Option<Metrics>,
}

impl RoutedCore {
    pub fn new(router: SeverityRouter, encoder: Arc<dyn Encoder>, sinks: SinkPair) -> Self {
        RoutedCore {
            router,
            encoder,
            sinks,
            fields: Arc::new(Vec::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn sink(&self, destination: Destination) -> &dyn Sink {
        match destination {
            Destination::High => self.sinks.high.as_ref(),
            Destination::Low => self.sinks.low.as_ref(),
        }
    }
}

impl Core for RoutedCore {
    fn enabled(&self, severity: Severity) -> bool {
        self.router.route(severity).is_some()
    }

    fn check(&self, record: &LogRecord) -> bool {
        self.enabled(record.severity())
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let Some(destination) = self.router.route(record.severity()) else {
            return Ok(());
        };

        let result = self
            .encoder
            .encode(record, &self.fields)
            .and_then(|line| self.sink(destination).write_line(&line));

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(()) => metrics.record_routed(destination),
                Err(_) => metrics.write_errors_total.inc(),
            }
        }

        result
    }

    fn with(&self, fields: Vec<Field>) -> Self {
        let mut merged = Vec::with_capacity(self.fields.len() + fields.len());
        merged.extend(self.fields.iter().cloned());
        merged.extend(fields);

        RoutedCore {
            fields: Arc::new(merged),
            ..self.clone()
        }
    }

    fn sync(&self) -> Result<()> {
        self.sinks.high.flush()?;
        self.sinks.low.flush()
    }
}
