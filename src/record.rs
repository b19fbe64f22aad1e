use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::severity::Severity;

/// A single key/value pair attached to a record or bound to a logger
pub type Field = (String, Value);

/// An immutable log record
///
/// Records are assembled with the consuming builder methods and are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    severity: Severity,
    message: String,
    source_location: String,
    timestamp: DateTime<Utc>,
    fields: Vec<Field>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            severity,
            message: message.into(),
            source_location: String::new(),
            timestamp: Utc::now(),
            fields: Vec::new(),
        }
    }

    pub fn at(mut self, source_location: impl Into<String>) -> Self {
        self.source_location = source_location.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line`, a bare file, a module path, or empty when unknown
    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    /// Source location split at its trailing `:line`
    pub fn file_and_line(&self) -> (&str, Option<u32>) {
        match self.source_location.rsplit_once(':') {
            Some((file, line)) => match line.parse() {
                Ok(line) => (file, Some(line)),
                Err(_) => (&self.source_location, None),
            },
            None => (&self.source_location, None),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_field_order() {
        let record = LogRecord::new(Severity::Info, "started")
            .at("src/main.rs")
            .with_field("b", 2)
            .with_field("a", "one");

        assert_eq!(record.source_location(), "src/main.rs");
        let keys: Vec<&str> = record.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(record.fields()[1].1, Value::from("one"));
    }

    #[test]
    fn location_splits_into_file_and_line() {
        let at = |location: &str| LogRecord::new(Severity::Info, "m").at(location);

        assert_eq!(at("src/main.rs:42").file_and_line(), ("src/main.rs", Some(42)));
        assert_eq!(at("src/main.rs").file_and_line(), ("src/main.rs", None));
        assert_eq!(at("my_crate::net").file_and_line(), ("my_crate::net", None));
        assert_eq!(at("").file_and_line(), ("", None));
    }
}
