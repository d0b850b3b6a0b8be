//! Serialized, per-bundle report output.

use std::io::{self, Stdout, Write};
use std::sync::Mutex;

/// Prefix of every report block.
pub const SEPARATOR: &str = "============ ";

/// Prefix of a sub-failure line inside a block.
pub const SUB_SEPARATOR: &str = "------------ ";

/// Writes report blocks so that two blocks never interleave.
pub struct ReportSink<W: Write + Send> {
    out: Mutex<W>,
}

impl ReportSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ReportSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write `block` and a trailing newline under a single lock.
    /// Empty blocks are dropped.
    pub fn emit(&self, block: &str) {
        if block.is_empty() {
            return;
        }
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", block).and_then(|_| out.flush()) {
            log::warn!("Failed to write report: {}", e);
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
impl ReportSink<Vec<u8>> {
    /// Everything emitted so far, for assertions.
    pub fn contents(&self) -> String {
        let out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&out).into_owned()
    }
}
