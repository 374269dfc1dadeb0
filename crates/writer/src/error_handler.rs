//! Reporting of runtime writer failures

use accesslog_core::Error;
use std::path::Path;
use tracing::{error, warn};

/// Receives every error a writer cannot return to its caller.
///
/// Log calls never fail, so this is where I/O problems surface. A writer
/// keeps running after reporting; only the durability of the affected record
/// is lost.
pub trait ErrorHandler: Send + Sync {
    /// Writing `record` failed
    fn write_error(&self, writer: &str, record: &str, error: &Error);

    fn flush_error(&self, writer: &str, error: &Error);

    /// Closing the current file or opening its successor failed
    fn rotation_error(&self, writer: &str, error: &Error);

    /// Deleting a rotated file failed
    fn retention_error(&self, writer: &str, path: &Path, error: &Error);

    /// Records left in a queue when the writer was shut down without flushing
    fn records_discarded(&self, writer: &str, count: usize);
}

/// Default handler reporting through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn write_error(&self, writer: &str, record: &str, error: &Error) {
        error!(writer, %error, record, "failed to write access log record");
    }

    fn flush_error(&self, writer: &str, error: &Error) {
        error!(writer, %error, "failed to flush access log");
    }

    fn rotation_error(&self, writer: &str, error: &Error) {
        error!(writer, %error, "failed to rotate access log");
    }

    fn retention_error(&self, writer: &str, path: &Path, error: &Error) {
        warn!(writer, path = %path.display(), %error, "failed to delete rotated access log");
    }

    fn records_discarded(&self, writer: &str, count: usize) {
        warn!(writer, count, "queued access log records discarded at shutdown");
    }
}
