//! Extension traits for attaching context to failures

use super::types::{Error, Result};
use std::path::Path;

/// Reclassify any failure as a configuration error
pub trait ResultExt<T> {
    /// Prefix the failure with a lazily built message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            Error::Configuration { message } => Error::configuration(format!("{}: {message}", f())),
            other => Error::configuration(format!("{}: {other}", f())),
        })
    }
}

/// Attach the file and the attempted operation to an I/O failure
pub trait IoResultExt<T> {
    fn for_path(self, path: impl AsRef<Path>, operation: &str) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn for_path(self, path: impl AsRef<Path>, operation: &str) -> Result<T> {
        self.map_err(|e| Error::file_system(path.as_ref(), operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_for_path_keeps_the_io_source() {
        let failed: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = failed.for_path("/var/log/access", "open").unwrap_err();
        assert_eq!(err.to_string(), "failed to open '/var/log/access': denied");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_with_context_does_not_nest_configuration_prefixes() {
        let failed: Result<()> = Err(Error::configuration("bad mode"));
        let err = failed.with_context(|| "loading access.json".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: loading access.json: bad mode");
    }
}
