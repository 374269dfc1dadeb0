//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::InvalidPermission { mode, message } => {
                write!(f, "invalid log file permissions '{mode}': {message}")
            }
            Error::UnknownPolicy { kind, name } => {
                write!(f, "unknown {kind} policy '{name}'")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "failed to {} '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::WriterClosed { writer } => {
                write!(f, "writer '{writer}' has been shut down")
            }
            Error::Lifecycle { message } => {
                write!(f, "publisher lifecycle error: {message}")
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
        }
    }
}
