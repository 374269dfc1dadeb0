//! Conversions from foreign error types

use super::types::Error;
use serde_json::error::Category;
use std::path::PathBuf;

/// I/O failures reaching `?` without a path. Call sites that know the file
/// use [`IoResultExt::for_path`](super::IoResultExt::for_path) instead.
impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::file_system(PathBuf::new(), "access", source)
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        let message = match source.classify() {
            Category::Syntax | Category::Eof => format!(
                "malformed JSON at line {} column {}",
                source.line(),
                source.column()
            ),
            Category::Data => format!("unexpected value: {source}"),
            Category::Io => source.to_string(),
        };
        Error::Json { message, source }
    }
}
