//! Names of the active and rotated log files

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::policy::RotatedFile;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_DIGITS: usize = 14;

/// Rotated files are named `<active>.<yyyyMMddHHmmss>Z` in UTC. When two
/// rotations land in the same second the later one gets a `.N` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampNaming {
    active: PathBuf,
}

impl TimestampNaming {
    pub fn new(active: impl Into<PathBuf>) -> Self {
        Self {
            active: active.into(),
        }
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    /// The name the active file should be renamed to when rotated at `now`
    pub fn next_rotated_path(&self, now: DateTime<Utc>) -> PathBuf {
        let base = format!("{}.{}Z", self.active.display(), now.format(TIMESTAMP_FORMAT));
        let candidate = PathBuf::from(&base);
        if !candidate.exists() {
            return candidate;
        }
        (1u32..)
            .map(|n| PathBuf::from(format!("{base}.{n}")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }

    /// Previously rotated files of this log, newest first
    pub fn rotated_files(&self) -> std::io::Result<Vec<RotatedFile>> {
        let Some(file_name) = self.active.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let dir = match self.active.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!("{file_name}.");

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(suffix) = name.strip_prefix(&prefix) else {
                continue;
            };
            if !is_rotation_suffix(suffix) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            files.push(RotatedFile {
                path: entry.path(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        files.sort_by(|a, b| rotation_key(&b.path).cmp(&rotation_key(&a.path)));
        Ok(files)
    }
}

/// `yyyyMMddHHmmssZ` optionally followed by `.N`
fn is_rotation_suffix(suffix: &str) -> bool {
    let (Some(stamp), Some(rest)) = (suffix.get(..TIMESTAMP_DIGITS), suffix.get(TIMESTAMP_DIGITS..))
    else {
        return false;
    };
    if !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match rest.strip_prefix('Z') {
        Some("") => true,
        Some(counter) => counter
            .strip_prefix('.')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// Sort key: timestamp then collision counter
fn rotation_key(path: &Path) -> (String, u32) {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match name.rsplit_once('Z') {
        Some((head, tail)) => {
            let counter = tail
                .strip_prefix('.')
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            (head.to_string(), counter)
        }
        None => (name.to_string(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_rotated_name_format() {
        let naming = TimestampNaming::new("/var/log/ds/access");
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
        assert_eq!(
            naming.next_rotated_path(at),
            PathBuf::from("/var/log/ds/access.20261018090507Z")
        );
    }

    #[test]
    fn test_collision_gets_counter() {
        let dir = TempDir::new().unwrap();
        let naming = TimestampNaming::new(dir.path().join("access"));
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let first = naming.next_rotated_path(at);
        fs::write(&first, "x").unwrap();
        let second = naming.next_rotated_path(at);
        assert_eq!(second.file_name().unwrap(), "access.20260102030405Z.1");
    }

    #[test]
    fn test_suffix_recognition() {
        assert!(is_rotation_suffix("20260102030405Z"));
        assert!(is_rotation_suffix("20260102030405Z.12"));
        assert!(!is_rotation_suffix("20260102030405"));
        assert!(!is_rotation_suffix("json"));
        assert!(!is_rotation_suffix("20260102030405Z."));
        assert!(!is_rotation_suffix("2026010203040xZ"));
    }

    #[test]
    fn test_lists_only_rotated_files_newest_first() {
        let dir = TempDir::new().unwrap();
        let naming = TimestampNaming::new(dir.path().join("access"));
        for name in [
            "access",
            "access.json",
            "access.20260101000000Z",
            "access.20260301000000Z",
            "access.20260301000000Z.1",
            "errors.20260501000000Z",
        ] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let names: Vec<_> = naming
            .rotated_files()
            .unwrap()
            .into_iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "access.20260301000000Z.1",
                "access.20260301000000Z",
                "access.20260101000000Z",
            ]
        );
    }
}
