//! Explicitly constructed logging context
//!
//! A [`LoggingContext`] is built once at startup and passed to whatever needs
//! to log. Cloning is cheap; clones share the sinks, the live threshold and
//! the metrics.

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::LoggingConfig;
use crate::core::{Core, RoutedCore};
use crate::encoder::build_encoder;
use crate::error::Result;
use crate::filter::{FilterRule, RecordFilter};
use crate::layer::PipelineLayer;
use crate::metrics::Metrics;
use crate::record::{Field, LogRecord};
use crate::router::{SeverityRouter, ThresholdHandle};
use crate::severity::Severity;
use crate::sink::SinkPair;
use crate::status::{Code, severity_for, severity_for_raw};

/// Filter in front of the routed core
pub type PipelineCore = RecordFilter<RoutedCore>;

#[derive(Clone)]
pub struct LoggingContext {
    core: PipelineCore,
    threshold: ThresholdHandle,
    metrics: Metrics,
}

impl LoggingContext {
    pub fn new(config: &LoggingConfig, sinks: SinkPair, metrics: Metrics) -> Self {
        let router = SeverityRouter::new(config.level);
        let threshold = router.handle();
        let encoder = Arc::from(build_encoder(config));

        let routed = RoutedCore::new(router, encoder, sinks).with_metrics(metrics.clone());
        let core = RecordFilter::new(
            FilterRule::ctxtrace(),
            config.enable_ctxtrace_warns,
            routed,
        )
        .with_metrics(metrics.clone());

        LoggingContext {
            core,
            threshold,
            metrics,
        }
    }

    /// Context writing to stdout and stderr
    pub fn standard(config: &LoggingConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config, SinkPair::standard(), Metrics::new()?))
    }

    pub fn core(&self) -> &PipelineCore {
        &self.core
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn threshold(&self) -> Severity {
        self.threshold.get()
    }

    /// Change verbosity for this context and every clone of it
    pub fn set_threshold(&self, threshold: Severity) {
        self.threshold.set(threshold);
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        self.core.enabled(severity)
    }

    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        self.core.write(record)
    }

    /// Emit a record located at the caller
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl Into<String>) -> Result<()> {
        let record = LogRecord::new(severity, message).at(caller_location(Location::caller()));
        self.emit(&record)
    }

    pub fn with_fields(&self, fields: Vec<Field>) -> Self {
        LoggingContext {
            core: self.core.with(fields),
            threshold: self.threshold.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Log the outcome of an RPC at the severity its status code maps to
    #[track_caller]
    pub fn log_rpc(&self, full_method: &str, code: Code, elapsed: Duration) -> Result<()> {
        self.metrics.record_rpc_outcome(Some(code));
        let record = rpc_record(
            full_method,
            severity_for(code),
            Value::from(code.as_str()),
            elapsed,
        );
        self.emit(&record.at(caller_location(Location::caller())))
    }

    /// Like [`log_rpc`](Self::log_rpc) for a raw wire value
    #[track_caller]
    pub fn log_rpc_raw(&self, full_method: &str, code: i32, elapsed: Duration) -> Result<()> {
        let known = Code::from_i32(code);
        self.metrics.record_rpc_outcome(known);
        let code_value = known.map_or_else(|| Value::from(code), |c| Value::from(c.as_str()));
        let record = rpc_record(full_method, severity_for_raw(code), code_value, elapsed);
        self.emit(&record.at(caller_location(Location::caller())))
    }

    pub fn layer(&self) -> PipelineLayer {
        PipelineLayer::new(self.clone())
    }

    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }
}

fn caller_location(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}

/// Split "/package.Service/Method" into service and method
fn split_method(full_method: &str) -> (&str, &str) {
    let trimmed = full_method.trim_start_matches('/');
    match trimmed.rsplit_once('/') {
        Some((service, method)) => (service, method),
        None => ("", trimmed),
    }
}

fn rpc_record(full_method: &str, severity: Severity, code: Value, elapsed: Duration) -> LogRecord {
    let (service, method) = split_method(full_method);
    LogRecord::new(severity, "finished call")
        .with_field("grpc.service", service)
        .with_field("grpc.method", method)
        .with_field("grpc.code", code)
        .with_field("grpc.time_ms", elapsed.as_micros() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn context(config: &LoggingConfig) -> (LoggingContext, MemorySink, MemorySink) {
        let high = MemorySink::new();
        let low = MemorySink::new();
        let ctx = LoggingContext::new(
            config,
            SinkPair::new(Arc::new(high.clone()), Arc::new(low.clone())),
            Metrics::new().unwrap(),
        );
        (ctx, high, low)
    }

    #[test]
    fn splits_grpc_method_names() {
        assert_eq!(split_method("/shop.Cart/Add"), ("shop.Cart", "Add"));
        assert_eq!(split_method("Ping"), ("", "Ping"));
    }

    #[test]
    fn log_uses_caller_location() {
        let config = LoggingConfig {
            level: Severity::Info,
            ..LoggingConfig::default()
        };
        let (ctx, _high, low) = context(&config);
        ctx.log(Severity::Info, "hello").unwrap();

        let line: Value = serde_json::from_str(&low.lines()[0]).unwrap();
        let location = &line[crate::encoder::SOURCE_LOCATION_KEY];
        assert_eq!(location["file"], "src/context.rs");
        let reported: u32 = location["line"].as_str().unwrap().parse().unwrap();
        assert!(reported > 0);
    }

    #[test]
    fn rpc_outcome_severity_follows_status_code() {
        let (ctx, high, low) = context(&LoggingConfig::default());

        ctx.log_rpc("/shop.Cart/Add", Code::Ok, Duration::from_millis(3))
            .unwrap();
        assert!(high.is_empty() && low.is_empty());

        ctx.log_rpc("/shop.Cart/Add", Code::NotFound, Duration::from_millis(3))
            .unwrap();
        assert_eq!(low.len(), 1);
        let line: Value = serde_json::from_str(&low.lines()[0]).unwrap();
        assert_eq!(line["grpc.code"], "NotFound");
        assert_eq!(line["grpc.service"], "shop.Cart");
        assert_eq!(line["grpc.time_ms"], 3.0);

        ctx.log_rpc_raw("/shop.Cart/Add", 99, Duration::ZERO).unwrap();
        assert_eq!(high.len(), 1);
        let line: Value = serde_json::from_str(&high.lines()[0]).unwrap();
        assert_eq!(line["grpc.code"], 99);
    }

    #[test]
    fn threshold_changes_are_shared() {
        let (ctx, _high, low) = context(&LoggingConfig::default());
        let child = ctx.with_fields(vec![("request".to_string(), Value::from("r1"))]);

        child.log(Severity::Info, "quiet").unwrap();
        assert!(low.is_empty());

        ctx.set_threshold(Severity::Debug);
        assert_eq!(child.threshold(), Severity::Debug);
        child.log(Severity::Info, "loud").unwrap();
        assert_eq!(low.len(), 1);
        assert!(low.lines()[0].contains("\"request\":\"r1\""));
    }
}
