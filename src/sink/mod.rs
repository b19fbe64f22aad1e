use std::sync::Arc;

use crate::error::Result;

pub mod memory;
pub mod stream;

pub use memory::MemorySink;
pub use stream::StdStream;

/// Byte destination for encoded records
///
/// Implementations serialize concurrent writers themselves so a single
/// line is never interleaved with another.
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &[u8]) -> Result<()>;
    fn flush(&self) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write_line(&self, line: &[u8]) -> Result<()> {
        (**self).write_line(line)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// The pair of destinations a routed core writes to
#[derive(Clone)]
pub struct SinkPair {
    pub high: Arc<dyn Sink>,
    pub low: Arc<dyn Sink>,
}

impl SinkPair {
    pub fn new(high: Arc<dyn Sink>, low: Arc<dyn Sink>) -> Self {
        SinkPair { high, low }
    }

    /// stderr for high-priority output, stdout for the rest
    pub fn standard() -> Self {
        SinkPair {
            high: Arc::new(StdStream::Stderr),
            low: Arc::new(StdStream::Stdout),
        }
    }
}
