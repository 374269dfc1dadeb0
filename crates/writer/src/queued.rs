//! Single-queue asynchronous writer

use crate::error_handler::ErrorHandler;
use crate::lane::Lane;
use crate::traits::TextWriter;
use accesslog_core::{LogRecord, Result};
use std::sync::Arc;
use tracing::debug;

/// Puts a bounded FIFO queue and one consumer thread in front of another
/// writer.
///
/// Records from all producers are written in the order they were enqueued.
/// A full queue blocks the producer until the consumer catches up. Once the
/// queue has been shut down, records fall through to the wrapped writer on
/// the caller's thread.
pub struct QueuedWriter {
    name: String,
    capacity: usize,
    lane: Lane,
    wrapped: Arc<dyn TextWriter>,
}

impl QueuedWriter {
    pub fn new(
        capacity: usize,
        auto_flush: bool,
        wrapped: Arc<dyn TextWriter>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Result<Self> {
        let name = format!("{} queue", wrapped.name());
        let lane = Lane::spawn(
            name.clone(),
            capacity,
            auto_flush,
            Arc::clone(&wrapped),
            error_handler,
        )?;
        debug!(writer = %name, capacity, "queued access log writer started");
        Ok(Self {
            name,
            capacity,
            lane,
            wrapped,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn wrapped(&self) -> &Arc<dyn TextWriter> {
        &self.wrapped
    }

    /// Drain the queue and stop the consumer while leaving the wrapped
    /// writer open. Returns the wrapped writer so it can be used directly.
    pub fn detach(&self) -> Arc<dyn TextWriter> {
        if self.lane.close(true) {
            self.wrapped.flush();
        }
        Arc::clone(&self.wrapped)
    }
}

impl TextWriter for QueuedWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: LogRecord) {
        if let Err(record) = self.lane.send(record) {
            self.wrapped.write_record(record);
        }
    }

    fn flush(&self) {
        if !self.lane.flush() {
            self.wrapped.flush();
        }
    }

    fn shutdown(&self, flush_first: bool) {
        if self.lane.close(flush_first) {
            debug!(writer = %self.name, flush_first, "queued access log writer stopped");
        }
        self.wrapped.shutdown(flush_first);
    }
}

impl Drop for QueuedWriter {
    fn drop(&mut self) {
        if self.lane.is_open() {
            self.lane.close(true);
        }
    }
}
