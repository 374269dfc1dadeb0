//! Acceptance checks run before a configuration is applied

use crate::config::{AccessLogConfig, FilteringPolicy, MAX_QUEUE_SIZE};
use accesslog_core::FilePermission;

/// Check whether `config` may be applied.
///
/// Returns `(true, [])` when acceptable, otherwise `false` together with
/// every reason found. Nothing here touches the file system or any shared
/// state.
pub fn is_configuration_acceptable(config: &AccessLogConfig) -> (bool, Vec<String>) {
    let mut reasons = Vec::new();

    match FilePermission::decode_unix_mode(&config.log_file_permissions) {
        Ok(permission) if !permission.is_owner_writable() => {
            reasons.push(format!(
                "the log file permissions '{}' do not allow the owner to write the log file",
                config.log_file_permissions
            ));
        }
        Ok(_) => {}
        Err(e) => reasons.push(e.to_string()),
    }

    if config.log_file.as_os_str().is_empty() {
        reasons.push("the log file path must not be empty".to_string());
    }

    if config.buffer_size == 0 {
        reasons.push("the buffer size must be greater than zero".to_string());
    }

    if config.queue_size > MAX_QUEUE_SIZE {
        reasons.push(format!(
            "the queue size {} exceeds the maximum of {MAX_QUEUE_SIZE}",
            config.queue_size
        ));
    }

    if config.time_interval_ms == 0 {
        reasons.push("the rotation check interval must be greater than zero".to_string());
    }

    if config.filtering_policy != FilteringPolicy::NoFiltering {
        if config.criteria.is_empty() {
            reasons.push(format!(
                "the {:?} filtering policy requires at least one criteria set",
                config.filtering_policy
            ));
        }
        for (index, criteria) in config.criteria.iter().enumerate() {
            if criteria.is_empty() {
                reasons.push(format!("criteria set {index} does not contain any criteria"));
            }
        }
    }

    (reasons.is_empty(), reasons)
}
