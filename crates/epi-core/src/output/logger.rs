//! Transmission Logger
//!
//! Append-only JSONL log of transmission events, one event per line.

use epi_events::TransmissionEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Buffered JSONL writer for transmission events
pub struct EventLogger {
    writer: BufWriter<File>,
    event_count: u64,
}

impl EventLogger {
    /// Create a logger writing to `path`, truncating any previous log
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            event_count: 0,
        })
    }

    /// Number of events written so far
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn log(&mut self, event: &TransmissionEvent) -> std::io::Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json)?;
        self.event_count += 1;
        Ok(())
    }

    pub fn log_batch(&mut self, events: &[TransmissionEvent]) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush transmission log");
        }
    }
}
