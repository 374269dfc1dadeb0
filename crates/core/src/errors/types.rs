//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for access log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for access log operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    Configuration { message: String },

    /// A file permission string that cannot be decoded or is not usable
    InvalidPermission { mode: String, message: String },

    /// A rotation or retention policy name that the registry does not know
    UnknownPolicy { kind: &'static str, name: String },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A write or flush against a writer that has been shut down
    WriterClosed { writer: String },

    /// Publisher lifecycle violations (initialising twice, using a closed publisher)
    Lifecycle { message: String },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether this error belongs to the configuration taxonomy: it is reported
    /// synchronously from initialisation or reconfiguration and must leave the
    /// previous state untouched.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::InvalidPermission { .. }
                | Error::UnknownPolicy { .. }
                | Error::Json { .. }
        )
    }
}
