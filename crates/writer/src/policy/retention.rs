use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// A rotated log file considered for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Decides which rotated files to delete. `files` is ordered newest first.
pub trait RetentionPolicy: Send + Sync + fmt::Debug {
    fn files_to_delete(&self, files: &[RotatedFile], now: SystemTime) -> Vec<PathBuf>;
}

/// Keep at most `keep` rotated files
#[derive(Debug, Clone, Copy)]
pub struct FileCountRetention {
    pub keep: usize,
}

impl RetentionPolicy for FileCountRetention {
    fn files_to_delete(&self, files: &[RotatedFile], _now: SystemTime) -> Vec<PathBuf> {
        files.iter().skip(self.keep).map(|f| f.path.clone()).collect()
    }
}

/// Keep the newest rotated files whose combined size fits in `max_bytes`
#[derive(Debug, Clone, Copy)]
pub struct TotalSizeRetention {
    pub max_bytes: u64,
}

impl RetentionPolicy for TotalSizeRetention {
    fn files_to_delete(&self, files: &[RotatedFile], _now: SystemTime) -> Vec<PathBuf> {
        let mut total = 0u64;
        files
            .iter()
            .filter(|f| {
                total = total.saturating_add(f.size);
                total > self.max_bytes
            })
            .map(|f| f.path.clone())
            .collect()
    }
}

/// Delete rotated files last modified more than `max_age` ago
#[derive(Debug, Clone, Copy)]
pub struct MaxAgeRetention {
    pub max_age: Duration,
}

impl RetentionPolicy for MaxAgeRetention {
    fn files_to_delete(&self, files: &[RotatedFile], now: SystemTime) -> Vec<PathBuf> {
        files
            .iter()
            .filter(|f| {
                now.duration_since(f.modified)
                    .is_ok_and(|age| age > self.max_age)
            })
            .map(|f| f.path.clone())
            .collect()
    }
}
