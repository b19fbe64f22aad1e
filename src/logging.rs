//! Process-wide tracing installation
//!
//! Installs a [`LoggingContext`] as the global `tracing` subscriber. The
//! context stays the source of truth: callers keep their own clone and can
//! log directly or through the `tracing` macros.
//!
//! `RUST_LOG`, when set, adds per-target directives on top of the context's
//! own threshold. It can only narrow what the context accepts.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::context::LoggingContext;
use crate::error::{LoggingError, Result};

pub fn init_logging(context: &LoggingContext) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().ok();

    tracing_subscriber::registry()
        .with(context.layer().with_filter(env_filter))
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))
}
