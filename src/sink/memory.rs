use std::sync::{Arc, Mutex, MutexGuard};

use super::Sink;
use crate::error::Result;

/// In-memory sink collecting one entry per written line
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        // a panicking writer cannot leave a half-pushed line behind
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &[u8]) -> Result<()> {
        self.guard().push(String::from_utf8_lossy(line).into_owned());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
