//! Loading access logger configuration from JSON

use crate::config::AccessLogConfig;
use accesslog_core::{IoResultExt, Result, ResultExt};
use std::path::Path;
use tracing::debug;

/// Load an [`AccessLogConfig`] from a JSON file on disk.
///
/// Missing fields take their defaults. The result is not validated; run
/// [`crate::is_configuration_acceptable`] before handing it to a publisher.
pub fn load_config(path: impl AsRef<Path>) -> Result<AccessLogConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).for_path(path, "read configuration file")?;

    debug!(path = %path.display(), "loading access log configuration");

    load_config_from_str(&contents)
        .with_context(|| format!("failed to parse configuration file {}", path.display()))
}

/// Parse an [`AccessLogConfig`] from a JSON string.
///
/// This is the primary entry point used in tests.
pub fn load_config_from_str(json: &str) -> Result<AccessLogConfig> {
    Ok(serde_json::from_str(json)?)
}
