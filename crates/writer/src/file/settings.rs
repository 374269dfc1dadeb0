use crate::naming::TimestampNaming;
use crate::policy::{RetentionPolicy, RotationPolicy};
use accesslog_core::FilePermission;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything the file writer needs, resolved from configuration
#[derive(Debug, Clone)]
pub struct FileWriterSettings {
    pub naming: TimestampNaming,
    pub permission: FilePermission,
    pub append: bool,
    pub auto_flush: bool,
    pub buffer_size: usize,
    /// How often the background thread checks rotation and retention
    pub check_interval: Duration,
    pub rotation_policies: Vec<Arc<dyn RotationPolicy>>,
    pub retention_policies: Vec<Arc<dyn RetentionPolicy>>,
}

impl FileWriterSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            naming: TimestampNaming::new(path),
            permission: FilePermission::default(),
            append: true,
            auto_flush: true,
            buffer_size: 64 * 1024,
            check_interval: Duration::from_secs(5),
            rotation_policies: Vec::new(),
            retention_policies: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.naming.active_path()
    }

    #[must_use]
    pub fn with_permission(mut self, permission: FilePermission) -> Self {
        self.permission = permission;
        self
    }

    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    #[must_use]
    pub fn with_rotation_policy(mut self, policy: Arc<dyn RotationPolicy>) -> Self {
        self.rotation_policies.push(policy);
        self
    }

    #[must_use]
    pub fn with_retention_policy(mut self, policy: Arc<dyn RetentionPolicy>) -> Self {
        self.retention_policies.push(policy);
        self
    }
}
