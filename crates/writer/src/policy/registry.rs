use super::retention::{FileCountRetention, RetentionPolicy, TotalSizeRetention};
use super::rotation::{FixedTimeRotation, RotationPolicy, SizeLimitRotation, TimeLimitRotation};
use accesslog_core::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Named rotation and retention policies, shared by every logger in the
/// process. Configuration refers to policies by these names.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    rotation: DashMap<String, Arc<dyn RotationPolicy>>,
    retention: DashMap<String, Arc<dyn RetentionPolicy>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the stock policies a fresh server ships with
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_rotation(
            "Size Limit Rotation Policy",
            SizeLimitRotation {
                max_bytes: 100 * 1024 * 1024,
            },
        );
        registry.register_rotation(
            "24 Hours Time Limit Rotation Policy",
            TimeLimitRotation {
                max_age: Duration::from_secs(24 * 60 * 60),
            },
        );
        registry.register_rotation(
            "7 Days Time Limit Rotation Policy",
            TimeLimitRotation {
                max_age: Duration::from_secs(7 * 24 * 60 * 60),
            },
        );
        registry.register_rotation("Fixed Time Rotation Policy", FixedTimeRotation::midnight());
        registry.register_retention("File Count Retention Policy", FileCountRetention { keep: 10 });
        registry.register_retention(
            "Size Limit Retention Policy",
            TotalSizeRetention {
                max_bytes: 500 * 1024 * 1024,
            },
        );
        registry
    }

    /// Register or replace a rotation policy
    pub fn register_rotation(&self, name: impl Into<String>, policy: impl RotationPolicy + 'static) {
        self.rotation.insert(name.into(), Arc::new(policy));
    }

    /// Register or replace a retention policy
    pub fn register_retention(
        &self,
        name: impl Into<String>,
        policy: impl RetentionPolicy + 'static,
    ) {
        self.retention.insert(name.into(), Arc::new(policy));
    }

    pub fn remove_rotation(&self, name: &str) -> bool {
        self.rotation.remove(name).is_some()
    }

    pub fn remove_retention(&self, name: &str) -> bool {
        self.retention.remove(name).is_some()
    }

    /// Look up every named rotation policy, failing on the first unknown name
    pub fn resolve_rotation(&self, names: &[String]) -> Result<Vec<Arc<dyn RotationPolicy>>> {
        names
            .iter()
            .map(|name| {
                self.rotation
                    .get(name)
                    .map(|p| Arc::clone(p.value()))
                    .ok_or_else(|| Error::unknown_rotation_policy(name.as_str()))
            })
            .collect()
    }

    /// Look up every named retention policy, failing on the first unknown name
    pub fn resolve_retention(&self, names: &[String]) -> Result<Vec<Arc<dyn RetentionPolicy>>> {
        names
            .iter()
            .map(|name| {
                self.retention
                    .get(name)
                    .map(|p| Arc::clone(p.value()))
                    .ok_or_else(|| Error::unknown_retention_policy(name.as_str()))
            })
            .collect()
    }
}
