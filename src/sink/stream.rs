use std::io::{self, Write};

use super::Sink;
use crate::error::Result;

/// Process standard streams
///
/// Each write takes the stream's own lock for the duration of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdout,
    Stderr,
}

impl Sink for StdStream {
    fn write_line(&self, line: &[u8]) -> Result<()> {
        match self {
            StdStream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
            StdStream::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(line)?;
                err.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self {
            StdStream::Stdout => io::stdout().flush()?,
            StdStream::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}
