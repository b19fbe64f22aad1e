//! Record encoders
//!
//! The encoder is picked once at startup from configuration and handed to
//! the routed core directly. [`StackdriverEncoder`] produces the JSON lines
//! Cloud Logging parses; [`ConsoleEncoder`] is the human readable variant
//! for local development.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::io::Write;

use crate::config::LoggingConfig;
use crate::error::Result;
use crate::record::{Field, LogRecord};
use crate::severity::Severity;

pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const REPORTED_ERROR_EVENT_TYPE: &str =
    "type.googleapis.com/google.devtools.clouderrorreporting.v1beta1.ReportedErrorEvent";

/// Top-level keys the Stackdriver encoder writes itself
const RESERVED_KEYS: [&str; 7] = [
    "severity",
    "timestamp",
    "message",
    SOURCE_LOCATION_KEY,
    "@type",
    "context",
    "serviceContext",
];

pub trait Encoder: Send + Sync {
    /// Encode one record without a trailing newline
    ///
    /// `bound` holds fields attached to the logger, written before the
    /// record's own fields.
    fn encode(&self, record: &LogRecord, bound: &[Field]) -> Result<Vec<u8>>;
}

/// Build the encoder selected by `config.debug`
pub fn build_encoder(config: &LoggingConfig) -> Box<dyn Encoder> {
    if config.debug {
        Box::new(ConsoleEncoder)
    } else {
        Box::new(StackdriverEncoder::new(
            config.service_name.clone(),
            config.report_all_errors,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct StackdriverEncoder {
    service_name: String,
    report_all_errors: bool,
}

impl StackdriverEncoder {
    pub fn new(service_name: impl Into<String>, report_all_errors: bool) -> Self {
        StackdriverEncoder {
            service_name: service_name.into(),
            report_all_errors,
        }
    }
}

/// Writes a JSON object entry by entry so keys keep insertion order
struct ObjectWriter {
    buf: Vec<u8>,
    first: bool,
}

impl ObjectWriter {
    fn new() -> Self {
        ObjectWriter {
            buf: vec![b'{'],
            first: true,
        }
    }

    fn entry<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<()> {
        if !self.first {
            self.buf.push(b',');
        }
        self.first = false;
        serde_json::to_writer(&mut self.buf, key)?;
        self.buf.push(b':');
        serde_json::to_writer(&mut self.buf, value)?;
        Ok(())
    }

    fn finish(mut self) -> Vec<u8> {
        self.buf.push(b'}');
        self.buf
    }
}

impl Encoder for StackdriverEncoder {
    fn encode(&self, record: &LogRecord, bound: &[Field]) -> Result<Vec<u8>> {
        let (file, line) = record.file_and_line();

        let mut obj = ObjectWriter::new();
        obj.entry("severity", record.severity().stackdriver_name())?;
        obj.entry(
            "timestamp",
            &record.timestamp().to_rfc3339_opts(SecondsFormat::Nanos, true),
        )?;
        obj.entry("message", record.message())?;
        if !file.is_empty() {
            // LogEntrySourceLocation.line is an int64, a string in proto JSON
            let mut location = json!({ "file": file });
            if let Some(line) = line {
                location["line"] = Value::from(line.to_string());
            }
            obj.entry(SOURCE_LOCATION_KEY, &location)?;
        }

        for (key, value) in bound.iter().chain(record.fields()) {
            obj.entry(&field_key(key), value)?;
        }

        if self.report_all_errors && record.severity() >= Severity::Error {
            obj.entry("@type", REPORTED_ERROR_EVENT_TYPE)?;
            if !file.is_empty() {
                let mut location = json!({ "filePath": file });
                if let Some(line) = line {
                    location["lineNumber"] = Value::from(line);
                }
                obj.entry("context", &json!({ "reportLocation": location }))?;
            }
            obj.entry("serviceContext", &json!({ "service": self.service_name }))?;
        }

        Ok(obj.finish())
    }
}

/// User keys that would shadow one written by the encoder get a `fields.` prefix
fn field_key(key: &str) -> Cow<'_, str> {
    if RESERVED_KEYS.contains(&key) {
        Cow::Owned(format!("fields.{}", key))
    } else {
        Cow::Borrowed(key)
    }
}

/// Tab separated development output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEncoder;

impl Encoder for ConsoleEncoder {
    fn encode(&self, record: &LogRecord, bound: &[Field]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(128);
        write!(
            buf,
            "{}\t{}",
            record.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
            record.severity().as_str().to_ascii_uppercase()
        )?;
        if !record.source_location().is_empty() {
            write!(buf, "\t{}", record.source_location())?;
        }
        write!(buf, "\t{}", record.message())?;

        if !bound.is_empty() || !record.fields().is_empty() {
            let mut obj = ObjectWriter::new();
            for (key, value) in bound.iter().chain(record.fields()) {
                obj.entry(key, value)?;
            }
            buf.push(b'\t');
            buf.extend_from_slice(&obj.finish());
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(severity: Severity) -> LogRecord {
        LogRecord::new(severity, "lookup failed")
            .at("src/lookup.rs:42")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .with_field("user", "alice")
    }

    #[test]
    fn stackdriver_writes_cloud_logging_keys_in_order() {
        let encoder = StackdriverEncoder::new("checkout", true);
        let bound = vec![("request_id".to_string(), Value::from("r-1"))];
        let line = encoder.encode(&record(Severity::Warn), &bound).unwrap();
        let text = String::from_utf8(line).unwrap();

        assert!(text.starts_with(r#"{"severity":"WARNING","timestamp":"2024-05-01T12:00:00"#));
        let request_id = text.find("request_id").unwrap();
        let user = text.find("user").unwrap();
        assert!(request_id < user);

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["message"], "lookup failed");
        assert_eq!(parsed[SOURCE_LOCATION_KEY]["file"], "src/lookup.rs");
        assert_eq!(parsed[SOURCE_LOCATION_KEY]["line"], "42");
        assert!(parsed.get("@type").is_none());
    }

    #[test]
    fn errors_are_reported_when_enabled() {
        let encoder = StackdriverEncoder::new("checkout", true);
        let line = encoder.encode(&record(Severity::Error), &[]).unwrap();
        let parsed: Value = serde_json::from_slice(&line).unwrap();

        assert_eq!(parsed["severity"], "ERROR");
        assert_eq!(parsed["@type"], REPORTED_ERROR_EVENT_TYPE);
        assert_eq!(parsed["serviceContext"]["service"], "checkout");
        let location = &parsed["context"]["reportLocation"];
        assert_eq!(location["filePath"], "src/lookup.rs");
        assert_eq!(location["lineNumber"], 42);
    }

    #[test]
    fn error_reports_without_location_skip_context() {
        let encoder = StackdriverEncoder::new("checkout", true);
        let record = LogRecord::new(Severity::Error, "boom");
        let line = encoder.encode(&record, &[]).unwrap();
        let parsed: Value = serde_json::from_slice(&line).unwrap();

        assert_eq!(parsed["@type"], REPORTED_ERROR_EVENT_TYPE);
        assert_eq!(parsed["serviceContext"]["service"], "checkout");
        assert!(parsed.get("context").is_none());
        assert!(parsed.get(SOURCE_LOCATION_KEY).is_none());
    }

    #[test]
    fn location_without_line_keeps_file_only() {
        let encoder = StackdriverEncoder::new("checkout", true);
        let record = LogRecord::new(Severity::Error, "boom").at("billing::invoice");
        let line = encoder.encode(&record, &[]).unwrap();
        let parsed: Value = serde_json::from_slice(&line).unwrap();

        assert_eq!(parsed[SOURCE_LOCATION_KEY], json!({ "file": "billing::invoice" }));
        assert_eq!(
            parsed["context"]["reportLocation"],
            json!({ "filePath": "billing::invoice" })
        );
    }

    #[test]
    fn user_fields_cannot_shadow_encoder_keys() {
        let encoder = StackdriverEncoder::new("checkout", true);
        let bound = vec![("message".to_string(), Value::from("bound"))];
        let record = LogRecord::new(Severity::Error, "boom")
            .with_field("severity", "DEBUG")
            .with_field("serviceContext", "spoofed")
            .with_field("user", "alice");
        let text = String::from_utf8(encoder.encode(&record, &bound).unwrap()).unwrap();

        assert_eq!(text.matches("\"severity\":").count(), 1);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["severity"], "ERROR");
        assert_eq!(parsed["message"], "boom");
        assert_eq!(parsed["serviceContext"]["service"], "checkout");
        assert_eq!(parsed["fields.severity"], "DEBUG");
        assert_eq!(parsed["fields.message"], "bound");
        assert_eq!(parsed["fields.serviceContext"], "spoofed");
        assert_eq!(parsed["user"], "alice");
    }

    #[test]
    fn errors_are_plain_when_reporting_disabled() {
        let encoder = StackdriverEncoder::new("checkout", false);
        let line = encoder.encode(&record(Severity::Fatal), &[]).unwrap();
        let parsed: Value = serde_json::from_slice(&line).unwrap();

        assert_eq!(parsed["severity"], "CRITICAL");
        assert!(parsed.get("@type").is_none());
    }

    #[test]
    fn console_output_is_tab_separated() {
        let line = ConsoleEncoder.encode(&record(Severity::Info), &[]).unwrap();
        let text = String::from_utf8(line).unwrap();
        assert_eq!(
            text,
            "2024-05-01T12:00:00.000Z\tINFO\tsrc/lookup.rs:42\tlookup failed\t{\"user\":\"alice\"}"
        );
    }

    #[test]
    fn encoder_is_chosen_by_debug_flag() {
        let mut config = LoggingConfig::default();
        config.debug = true;
        let line = build_encoder(&config)
            .encode(&record(Severity::Info), &[])
            .unwrap();
        assert!(!line.starts_with(b"{"));

        config.debug = false;
        let line = build_encoder(&config)
            .encode(&record(Severity::Info), &[])
            .unwrap();
        assert!(line.starts_with(b"{"));
    }
}
