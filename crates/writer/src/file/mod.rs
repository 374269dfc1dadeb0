//! Rotating file writer
//!
//! Owns the active log file. All writes, rotations and retention passes run
//! under one lock, so a rotation never interleaves with a record. A
//! background thread wakes every `check_interval` to rotate on time-based
//! policies, prune old files and flush buffered output.

mod active;
mod settings;

pub use settings::FileWriterSettings;

use crate::error_handler::ErrorHandler;
use crate::traits::TextWriter;
use accesslog_core::{Error, LogRecord, Result};
use active::ActiveFile;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

struct Checker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct RotatingFileWriter {
    name: String,
    file: Arc<Mutex<ActiveFile>>,
    error_handler: Arc<dyn ErrorHandler>,
    checker: Mutex<Option<Checker>>,
}

impl RotatingFileWriter {
    /// Open the log file and start the background checker
    pub fn open(
        name: impl Into<String>,
        settings: FileWriterSettings,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Result<Self> {
        let name = name.into();
        let path = settings.path().to_path_buf();
        let file = Arc::new(Mutex::new(ActiveFile::open(settings)?));
        let checker = spawn_checker(&name, Arc::clone(&file), Arc::clone(&error_handler))?;
        debug!(writer = %name, path = %path.display(), "access log file opened");

        Ok(Self {
            name,
            file,
            error_handler,
            checker: Mutex::new(Some(checker)),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.file.lock().settings.path().to_path_buf()
    }

    /// Bytes in the active file
    pub fn current_size(&self) -> u64 {
        self.file.lock().size()
    }

    /// Records written since the writer was opened
    pub fn records_written(&self) -> u64 {
        self.file.lock().records_written
    }

    pub fn rotation_count(&self) -> u64 {
        self.file.lock().rotations
    }

    /// Rotate now regardless of policy, then apply retention
    pub fn rotate_now(&self) -> Result<PathBuf> {
        let mut file = self.file.lock();
        if file.is_closed() {
            return Err(Error::writer_closed(&self.name));
        }
        let rotated = file.rotate()?;
        file.apply_retention(&self.name, self.error_handler.as_ref());
        Ok(rotated)
    }

    /// Apply new settings in place. Records keep flowing to the old file
    /// until the new one is open; on error the writer is unchanged.
    pub fn reconfigure(&self, settings: FileWriterSettings) -> Result<()> {
        let mut file = self.file.lock();
        if file.is_closed() {
            return Err(Error::writer_closed(&self.name));
        }
        file.reconfigure(settings, &self.name, self.error_handler.as_ref())
    }

    fn stop_checker(&self) {
        let Some(checker) = self.checker.lock().take() else {
            return;
        };
        let _ = checker.stop.send(());
        if checker.handle.join().is_err() {
            warn!(writer = %self.name, "access log checker thread panicked");
        }
    }
}

impl TextWriter for RotatingFileWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: LogRecord) {
        let result = self
            .file
            .lock()
            .write(&record, &self.name, self.error_handler.as_ref());
        if let Err(e) = result {
            self.error_handler.write_error(&self.name, record.line(), &e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.file.lock().flush() {
            self.error_handler.flush_error(&self.name, &e);
        }
    }

    fn shutdown(&self, flush_first: bool) {
        self.stop_checker();
        if let Err(e) = self.file.lock().close(flush_first) {
            self.error_handler.flush_error(&self.name, &e);
        }
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        self.stop_checker();
    }
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("name", &self.name)
            .field("path", &self.path())
            .finish()
    }
}

fn spawn_checker(
    name: &str,
    file: Arc<Mutex<ActiveFile>>,
    error_handler: Arc<dyn ErrorHandler>,
) -> Result<Checker> {
    let (stop, stopped) = channel::bounded::<()>(1);
    let thread_name = format!("{name} checker");
    let writer = name.to_string();

    let handle = thread::Builder::new()
        .name(thread_name)
        .spawn(move || loop {
            let interval = file.lock().settings.check_interval;
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    file.lock().check(&writer, error_handler.as_ref());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })
        .map_err(|e| Error::lifecycle(format!("failed to start checker thread for {name}: {e}")))?;

    Ok(Checker { stop, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FileCountRetention, SizeLimitRotation};
    use crate::TracingErrorHandler;
    use accesslog_core::FilePermission;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn writer(settings: FileWriterSettings) -> RotatingFileWriter {
        RotatingFileWriter::open("test", settings, Arc::new(TracingErrorHandler)).unwrap()
    }

    fn lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_writes_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("access");
        let w = writer(FileWriterSettings::new(&path));
        for i in 0..3 {
            w.write_record(LogRecord::new(1, format!("line {i}")));
        }
        w.shutdown(true);
        assert_eq!(lines(&path), vec!["line 0", "line 1", "line 2"]);
        assert_eq!(w.records_written(), 3);
    }

    #[test]
    fn test_append_and_truncate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        fs::write(&path, "old\n").unwrap();

        let w = writer(FileWriterSettings::new(&path).with_append(true));
        w.write_record(LogRecord::new(1, "new"));
        w.shutdown(true);
        assert_eq!(lines(&path), vec!["old", "new"]);

        let w = writer(FileWriterSettings::new(&path).with_append(false));
        w.write_record(LogRecord::new(1, "fresh"));
        w.shutdown(true);
        assert_eq!(lines(&path), vec!["fresh"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        let permission = FilePermission::decode_unix_mode("600").unwrap();
        let w = writer(FileWriterSettings::new(&path).with_permission(permission));
        w.shutdown(true);
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_size_rotation_with_retention() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        let settings = FileWriterSettings::new(&path)
            .with_rotation_policy(Arc::new(SizeLimitRotation { max_bytes: 20 }))
            .with_retention_policy(Arc::new(FileCountRetention { keep: 2 }));
        let w = writer(settings);

        // each record is 10 bytes with its newline
        for i in 0..12 {
            w.write_record(LogRecord::new(1, format!("record {i:02}")));
        }
        w.shutdown(true);

        let rotated = crate::TimestampNaming::new(&path).rotated_files().unwrap();
        assert!(w.rotation_count() >= 3);
        assert!(rotated.len() <= 2, "{rotated:?}");
        assert_eq!(lines(&path).last().unwrap(), "record 11");
    }

    #[test]
    fn test_rotate_now() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        let w = writer(FileWriterSettings::new(&path));
        w.write_record(LogRecord::new(1, "before"));
        let rotated = w.rotate_now().unwrap();
        w.write_record(LogRecord::new(1, "after"));
        w.shutdown(true);

        assert_eq!(lines(&rotated), vec!["before"]);
        assert_eq!(lines(&path), vec!["after"]);
        assert_eq!(w.current_size(), 6);
    }

    #[test]
    fn test_reconfigure_moves_to_new_path() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a");
        let second = dir.path().join("b");
        let w = writer(FileWriterSettings::new(&first));
        w.write_record(LogRecord::new(1, "one"));
        w.reconfigure(FileWriterSettings::new(&second)).unwrap();
        w.write_record(LogRecord::new(1, "two"));
        w.shutdown(true);

        assert_eq!(lines(&first), vec!["one"]);
        assert_eq!(lines(&second), vec!["two"]);
        assert_eq!(w.path(), second);
    }

    #[cfg(unix)]
    #[test]
    fn test_reconfigure_failure_keeps_old_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let w = writer(FileWriterSettings::new(&path));
        let err = w
            .reconfigure(FileWriterSettings::new(blocker.join("access")))
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }), "{err:?}");

        w.write_record(LogRecord::new(1, "still here"));
        w.shutdown(true);
        assert_eq!(lines(&path), vec!["still here"]);
    }

    #[test]
    fn test_checker_flushes_buffered_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access");
        let settings = FileWriterSettings::new(&path)
            .with_auto_flush(false)
            .with_check_interval(Duration::from_millis(20));
        let w = writer(settings);
        w.write_record(LogRecord::new(1, "buffered"));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while fs::read_to_string(&path).unwrap().is_empty() {
            assert!(std::time::Instant::now() < deadline, "checker never flushed");
            thread::sleep(Duration::from_millis(10));
        }
        w.shutdown(true);
        assert_eq!(lines(&path), vec!["buffered"]);
    }

    #[derive(Default)]
    struct Collect {
        writes: Mutex<Vec<(String, String)>>,
        flushes: Mutex<Vec<String>>,
        rotations: Mutex<Vec<String>>,
    }

    impl ErrorHandler for Collect {
        fn write_error(&self, _: &str, record: &str, error: &Error) {
            self.writes.lock().push((record.to_string(), error.to_string()));
        }
        fn flush_error(&self, _: &str, error: &Error) {
            self.flushes.lock().push(error.to_string());
        }
        fn rotation_error(&self, _: &str, error: &Error) {
            self.rotations.lock().push(error.to_string());
        }
        fn retention_error(&self, _: &str, _: &std::path::Path, _: &Error) {}
        fn records_discarded(&self, _: &str, _: usize) {}
    }

    #[test]
    fn test_write_after_shutdown_is_reported() {
        let dir = TempDir::new().unwrap();
        let handler = Arc::new(Collect::default());
        let w = RotatingFileWriter::open(
            "test",
            FileWriterSettings::new(dir.path().join("access")),
            handler.clone(),
        )
        .unwrap();
        w.shutdown(true);
        w.shutdown(true);
        w.write_record(LogRecord::new(1, "late"));

        let writes = handler.writes.lock();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "late");
        assert!(writes[0].1.contains("shut down"), "{}", writes[0].1);
    }

    #[cfg(unix)]
    #[test]
    fn test_recovers_after_failed_rotation() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let path = logs.join("access");
        let handler = Arc::new(Collect::default());
        let settings = FileWriterSettings::new(&path)
            .with_rotation_policy(Arc::new(SizeLimitRotation { max_bytes: 1 }))
            .with_check_interval(Duration::from_secs(3600));
        let w = RotatingFileWriter::open("test", settings, handler.clone()).unwrap();
        w.write_record(LogRecord::new(1, "first"));

        // neither rename nor reopen can succeed while the directory is a file
        fs::remove_dir_all(&logs).unwrap();
        fs::write(&logs, "in the way").unwrap();
        w.write_record(LogRecord::new(1, "blocked"));
        assert_eq!(handler.rotations.lock().len(), 1);
        {
            let writes = handler.writes.lock();
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].0, "blocked");
            assert!(!writes[0].1.contains("shut down"), "{}", writes[0].1);
        }

        fs::remove_file(&logs).unwrap();
        w.write_record(LogRecord::new(1, "recovered"));
        w.shutdown(true);

        assert_eq!(handler.writes.lock().len(), 1);
        assert_eq!(lines(&path), vec!["recovered"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_reconfigure_reports_lost_tail_of_old_file() {
        let full = std::path::Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let handler = Arc::new(Collect::default());
        // 666 is the mode /dev/full already has
        let settings = FileWriterSettings::new(full)
            .with_permission(FilePermission::decode_unix_mode("666").unwrap())
            .with_auto_flush(false)
            .with_check_interval(Duration::from_secs(3600));
        let Ok(w) = RotatingFileWriter::open("test", settings, handler.clone()) else {
            // not allowed to touch the device here
            return;
        };
        w.write_record(LogRecord::new(1, "buffered"));
        assert!(handler.writes.lock().is_empty());

        let next = dir.path().join("access");
        w.reconfigure(FileWriterSettings::new(&next)).unwrap();
        let flushes = handler.flushes.lock().clone();
        assert_eq!(flushes.len(), 1, "{flushes:?}");
        assert!(flushes[0].contains("flush"), "{flushes:?}");

        w.write_record(LogRecord::new(1, "moved"));
        w.shutdown(true);
        assert_eq!(lines(&next), vec!["moved"]);
    }
}
