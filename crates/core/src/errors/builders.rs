//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid permission error
    #[must_use]
    pub fn invalid_permission(mode: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPermission {
            mode: mode.into(),
            message: message.into(),
        }
    }

    /// Create an unknown rotation policy error
    #[must_use]
    pub fn unknown_rotation_policy(name: impl Into<String>) -> Self {
        Error::UnknownPolicy {
            kind: "rotation",
            name: name.into(),
        }
    }

    /// Create an unknown retention policy error
    #[must_use]
    pub fn unknown_retention_policy(name: impl Into<String>) -> Self {
        Error::UnknownPolicy {
            kind: "retention",
            name: name.into(),
        }
    }

    /// Create a file system error
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a writer closed error
    #[must_use]
    pub fn writer_closed(writer: impl Into<String>) -> Self {
        Error::WriterClosed {
            writer: writer.into(),
        }
    }

    /// Create a lifecycle error
    #[must_use]
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Error::Lifecycle {
            message: message.into(),
        }
    }
}
