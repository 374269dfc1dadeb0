//! The access logger configuration snapshot
//!
//! An `AccessLogConfig` is never mutated once handed to the publisher. A
//! change always arrives as a complete new snapshot that replaces the old one.

use accesslog_core::{FilePermission, OpKind, Result, ResultCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default active log file
pub const DEFAULT_LOG_FILE: &str = "logs/access";
/// Default permission bits for created log files
pub const DEFAULT_LOG_FILE_PERMISSIONS: &str = "640";
/// Default write buffer (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
/// Default period of the rotation/retention check thread
pub const DEFAULT_TIME_INTERVAL_MS: u64 = 5000;
/// Default capacity of the queued asynchronous writer
pub const DEFAULT_QUEUE_SIZE: usize = 5000;
/// Largest accepted queue capacity; the queue reserves every slot up front
pub const MAX_QUEUE_SIZE: usize = 1_000_000;

/// How the criteria sets are combined beneath the root filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilteringPolicy {
    /// Log everything the suppression flags let through
    #[default]
    NoFiltering,
    /// Log only what matches at least one criteria set
    Inclusive,
    /// Log everything except what matches at least one criteria set
    Exclusive,
}

/// One set of criteria; every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaConfig {
    /// Operation types, empty means any
    pub record_types: Vec<OpKind>,
    /// Connection ids, empty means any
    pub connection_ids: Vec<i64>,
    /// Case-insensitive DN suffixes of the operation target
    pub target_dn_suffixes: Vec<String>,
    /// Response result codes
    pub result_codes: Vec<ResultCode>,
    /// Response etime strictly greater than this value
    pub etime_greater_than: Option<i64>,
    /// Response etime strictly less than this value
    pub etime_less_than: Option<i64>,
    /// Search responses that returned more than this many entries
    pub search_nentries_greater_than: Option<u64>,
}

impl CriteriaConfig {
    pub fn is_empty(&self) -> bool {
        self.record_types.is_empty()
            && self.connection_ids.is_empty()
            && self.target_dn_suffixes.is_empty()
            && self.result_codes.is_empty()
            && self.etime_greater_than.is_none()
            && self.etime_less_than.is_none()
            && self.search_nentries_greater_than.is_none()
    }
}

/// Configuration of a file-based access log publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Identity used in writer thread names and messages
    pub name: String,
    /// Whether the embedding server should build this publisher at all
    pub enabled: bool,
    /// Active log file path
    pub log_file: PathBuf,
    /// Three-digit octal mode applied to created files
    pub log_file_permissions: String,
    /// Append to an existing file instead of truncating it
    pub append: bool,
    /// Flush after each record (synchronous) or each drained batch (asynchronous)
    pub auto_flush: bool,
    /// Write buffer size in bytes
    pub buffer_size: usize,
    /// Period of the rotation/retention check thread in milliseconds
    pub time_interval_ms: u64,
    /// Hand records to a background writer
    pub asynchronous: bool,
    /// 0 selects the parallel writer, a positive value the queued writer with that capacity
    pub queue_size: usize,
    /// Rotation policy names resolved through the policy registry
    pub rotation_policies: Vec<String>,
    /// Retention policy names resolved through the policy registry
    pub retention_policies: Vec<String>,
    pub suppress_internal_operations: bool,
    pub suppress_synchronization_operations: bool,
    pub filtering_policy: FilteringPolicy,
    pub criteria: Vec<CriteriaConfig>,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            name: "File-Based Access Logger".to_string(),
            enabled: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_file_permissions: DEFAULT_LOG_FILE_PERMISSIONS.to_string(),
            append: true,
            auto_flush: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            time_interval_ms: DEFAULT_TIME_INTERVAL_MS,
            asynchronous: true,
            queue_size: DEFAULT_QUEUE_SIZE,
            rotation_policies: Vec::new(),
            retention_policies: Vec::new(),
            suppress_internal_operations: true,
            suppress_synchronization_operations: false,
            filtering_policy: FilteringPolicy::NoFiltering,
            criteria: Vec::new(),
        }
    }
}

impl AccessLogConfig {
    /// Create a configuration for the given log file with default values
    pub fn new<P: AsRef<Path>>(log_file: P) -> Self {
        Self {
            log_file: log_file.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_permissions(mut self, mode: impl Into<String>) -> Self {
        self.log_file_permissions = mode.into();
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_time_interval(mut self, interval: Duration) -> Self {
        self.time_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Select the asynchronous mode and queue capacity in one step
    pub fn with_asynchronous(mut self, asynchronous: bool, queue_size: usize) -> Self {
        self.asynchronous = asynchronous;
        self.queue_size = queue_size;
        self
    }

    pub fn with_rotation_policy(mut self, name: impl Into<String>) -> Self {
        self.rotation_policies.push(name.into());
        self
    }

    pub fn with_retention_policy(mut self, name: impl Into<String>) -> Self {
        self.retention_policies.push(name.into());
        self
    }

    pub fn with_suppression(mut self, internal: bool, synchronization: bool) -> Self {
        self.suppress_internal_operations = internal;
        self.suppress_synchronization_operations = synchronization;
        self
    }

    pub fn with_filtering(mut self, policy: FilteringPolicy, criteria: Vec<CriteriaConfig>) -> Self {
        self.filtering_policy = policy;
        self.criteria = criteria;
        self
    }

    /// Decode the configured permission string
    pub fn permission(&self) -> Result<FilePermission> {
        FilePermission::decode_unix_mode(&self.log_file_permissions)
    }

    pub fn time_interval(&self) -> Duration {
        Duration::from_millis(self.time_interval_ms)
    }

    /// The file writer flushes per record only when no asynchronous layer
    /// batches on top of it.
    pub fn file_writer_auto_flush(&self) -> bool {
        self.auto_flush && !self.asynchronous
    }
}
