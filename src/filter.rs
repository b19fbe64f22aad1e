//! Noise suppression
//!
//! A [`FilterRule`] names one known noisy message. [`RecordFilter`] drops
//! matching records unless the rule is enabled and forwards everything else
//! to the stage it wraps.

use crate::core::Core;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::record::{Field, LogRecord};
use crate::severity::Severity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub severity_class: Severity,
    pub source_substring: String,
    pub message_substring: String,
}

impl FilterRule {
    pub fn new(
        severity_class: Severity,
        source_substring: impl Into<String>,
        message_substring: impl Into<String>,
    ) -> Self {
        FilterRule {
            severity_class,
            source_substring: source_substring.into(),
            message_substring: message_substring.into(),
        }
    }

    /// Warnings the trace-context propagation package emits for every
    /// request that arrives without B3 headers
    pub fn ctxtrace() -> Self {
        FilterRule::new(Severity::Warn, "ctxtrace", "b3 injection failed")
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        record.severity() == self.severity_class
            && record.source_location().contains(&self.source_substring)
            && record.message().contains(&self.message_substring)
    }
}

pub fn should_suppress(record: &LogRecord, rule: &FilterRule, enabled: bool) -> bool {
    !enabled && rule.matches(record)
}

#[derive(Clone)]
pub struct RecordFilter<N> {
    rule: FilterRule,
    enabled: bool,
    next: N,
    metrics: Option<Metrics>,
}

impl<N: Core> RecordFilter<N> {
    pub fn new(rule: FilterRule, enabled: bool, next: N) -> Self {
        RecordFilter {
            rule,
            enabled,
            next,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn rule(&self) -> &FilterRule {
        &self.rule
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn suppresses(&self, record: &LogRecord) -> bool {
        should_suppress(record, &self.rule, self.enabled)
    }
}

impl<N: Core> Core for RecordFilter<N> {
    fn enabled(&self, severity: Severity) -> bool {
        self.next.enabled(severity)
    }

    fn check(&self, record: &LogRecord) -> bool {
        !self.suppresses(record) && self.next.check(record)
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        if self.suppresses(record) {
            if let Some(metrics) = &self.metrics {
                metrics.records_suppressed_total.inc();
            }
            return Ok(());
        }
        self.next.write(record)
    }

    fn with(&self, fields: Vec<Field>) -> Self {
        RecordFilter {
            rule: self.rule.clone(),
            enabled: self.enabled,
            next: self.next.with(fields),
            metrics: self.metrics.clone(),
        }
    }

    fn sync(&self) -> Result<()> {
        self.next.sync()
    }
}
