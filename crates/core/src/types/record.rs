//! The formatted unit of work handed to writers

use std::fmt::{self, Display};

/// One formatted access log line.
///
/// Produced once per event and phase by the formatter and never mutated
/// afterwards; ownership moves into the writer at enqueue time. The
/// connection id travels with the line so that lane-striped writers can keep
/// every record of one connection on the same consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    connection_id: i64,
    line: String,
}

impl LogRecord {
    pub fn new(connection_id: i64, line: impl Into<String>) -> Self {
        Self {
            connection_id,
            line: line.into(),
        }
    }

    pub fn connection_id(&self) -> i64 {
        self.connection_id
    }

    /// The text without a trailing newline
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn into_line(self) -> String {
        self.line
    }

    /// Bytes this record occupies on disk, newline included
    pub fn encoded_len(&self) -> usize {
        self.line.len() + 1
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
