//! The writer capability shared by every strategy

use accesslog_core::LogRecord;

/// A sink for formatted access log records.
///
/// None of these calls fail from the caller's point of view. Problems are
/// handed to the writer's [`crate::ErrorHandler`] and the writer stays usable
/// for later records.
pub trait TextWriter: Send + Sync {
    /// Identity used in thread names and error reports
    fn name(&self) -> &str;

    /// Write one record. May block: the direct strategy for the duration of
    /// the file write, the queued strategies while their queue is full.
    fn write_record(&self, record: LogRecord);

    /// Push everything accepted so far down to the operating system
    fn flush(&self);

    /// Stop the writer. With `flush_first` every accepted record is written
    /// and flushed before this returns; otherwise queued records may be
    /// discarded (and reported). Calling it again is a no-op.
    fn shutdown(&self, flush_first: bool);
}
