//! Structured logging for cloud services
//!
//! Records pass through a noise filter, are routed by severity to a
//! high-priority or low-priority stream and are encoded either as
//! Stackdriver JSON or as console text. RPC outcomes are logged at a
//! severity derived from their status code.
//!
//! ```no_run
//! use cloud_log::{LoggingConfig, LoggingContext, Severity};
//!
//! let ctx = LoggingContext::standard(&LoggingConfig::default())?;
//! cloud_log::init_logging(&ctx)?;
//!
//! ctx.log(Severity::Warn, "cache miss")?;
//! tracing::error!(shard = 3, "replication lag");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod layer;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod router;
pub mod severity;
pub mod sink;
pub mod status;

pub use config::{Config, LoggingConfig, MetricsConfig, load_config};
pub use context::LoggingContext;
pub use crate::core::{Core, RoutedCore};
pub use encoder::{ConsoleEncoder, Encoder, StackdriverEncoder, build_encoder};
pub use error::LoggingError;
pub use filter::{FilterRule, RecordFilter, should_suppress};
pub use layer::PipelineLayer;
pub use logging::init_logging;
pub use metrics::Metrics;
pub use record::{Field, LogRecord};
pub use router::{Destination, SeverityRouter, ThresholdHandle, route};
pub use severity::Severity;
pub use sink::{MemorySink, Sink, SinkPair, StdStream};
pub use status::{Code, severity_for, severity_for_raw};
