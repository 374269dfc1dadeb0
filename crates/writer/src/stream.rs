//! Writer over an arbitrary byte stream

use crate::error_handler::{ErrorHandler, TracingErrorHandler};
use crate::traits::TextWriter;
use accesslog_core::{Error, LogRecord};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Writes records to any `Write` implementation, typically stdout while
/// the server starts and no log file is configured yet.
pub struct StreamWriter {
    name: String,
    out: Mutex<Option<Box<dyn Write + Send>>>,
    auto_flush: bool,
    error_handler: Arc<dyn ErrorHandler>,
}

impl StreamWriter {
    pub fn new(name: impl Into<String>, out: Box<dyn Write + Send>, auto_flush: bool) -> Self {
        Self {
            name: name.into(),
            out: Mutex::new(Some(out)),
            auto_flush,
            error_handler: Arc::new(TracingErrorHandler),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", Box::new(io::stdout()), true)
    }

    #[must_use]
    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    fn io_error(&self, operation: &str, e: io::Error) -> Error {
        Error::file_system(format!("<{}>", self.name), operation, e)
    }
}

impl TextWriter for StreamWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: LogRecord) {
        let result = match self.out.lock().as_mut() {
            Some(stream) => writeln!(stream, "{}", record.line())
                .and_then(|()| if self.auto_flush { stream.flush() } else { Ok(()) })
                .map_err(|e| self.io_error("write to", e)),
            None => Err(Error::writer_closed(&self.name)),
        };
        if let Err(e) = result {
            self.error_handler.write_error(&self.name, record.line(), &e);
        }
    }

    fn flush(&self) {
        let result = match self.out.lock().as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.error_handler
                .flush_error(&self.name, &self.io_error("flush", e));
        }
    }

    fn shutdown(&self, flush_first: bool) {
        let Some(mut stream) = self.out.lock().take() else {
            return;
        };
        if flush_first {
            if let Err(e) = stream.flush() {
                self.error_handler
                    .flush_error(&self.name, &self.io_error("flush", e));
            }
        }
    }
}
