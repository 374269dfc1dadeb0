//! The open log file and the operations performed under the writer's lock

use super::settings::FileWriterSettings;
use crate::error_handler::ErrorHandler;
use crate::policy::ActiveFileState;
use accesslog_core::{Error, IoResultExt, LogRecord, Result};
use chrono::{DateTime, Local, Utc};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

pub(super) struct ActiveFile {
    pub(super) settings: FileWriterSettings,
    /// `None` after shutdown, or after a rotation could not reopen the file
    out: Option<BufWriter<File>>,
    shut_down: bool,
    size: u64,
    opened_at: DateTime<Local>,
    pub(super) records_written: u64,
    pub(super) rotations: u64,
}

impl ActiveFile {
    pub(super) fn open(settings: FileWriterSettings) -> Result<Self> {
        let (out, size) = open_file(&settings, settings.append)?;
        Ok(Self {
            settings,
            out: Some(out),
            shut_down: false,
            size,
            opened_at: Local::now(),
            records_written: 0,
            rotations: 0,
        })
    }

    pub(super) fn is_closed(&self) -> bool {
        self.shut_down
    }

    pub(super) fn size(&self) -> u64 {
        self.size
    }

    pub(super) fn write(&mut self, record: &LogRecord, name: &str, handler: &dyn ErrorHandler) -> Result<()> {
        if self.shut_down {
            return Err(Error::writer_closed(name));
        }
        if self.out.is_some() && self.should_rotate(Local::now()) {
            self.rotate_and_clean(name, handler);
        }

        let path = self.settings.path().to_path_buf();
        let auto_flush = self.settings.auto_flush;
        let out = self.output()?;
        out.write_all(record.line().as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .for_path(&path, "write to")?;
        let flushed = if auto_flush {
            out.flush().for_path(&path, "flush")
        } else {
            Ok(())
        };
        self.size += record.encoded_len() as u64;
        self.records_written += 1;
        flushed
    }

    /// The open file, reopening the active path in append mode if a
    /// previous rotation left the writer without one
    fn output(&mut self) -> Result<&mut BufWriter<File>> {
        let out = match self.out.take() {
            Some(out) => out,
            None => {
                let (out, size) = open_file(&self.settings, true)?;
                self.size = size;
                self.opened_at = Local::now();
                debug!(path = %self.settings.path().display(), "access log file reopened");
                out
            }
        };
        Ok(self.out.insert(out))
    }

    pub(super) fn flush(&mut self) -> Result<()> {
        match self.out.as_mut() {
            Some(out) => out.flush().for_path(self.settings.path(), "flush"),
            None => Ok(()),
        }
    }

    /// Flush (if asked) and drop the file handle
    pub(super) fn close(&mut self, flush_first: bool) -> Result<()> {
        self.shut_down = true;
        let Some(mut out) = self.out.take() else {
            return Ok(());
        };
        if flush_first {
            out.flush().for_path(self.settings.path(), "flush")?;
        }
        Ok(())
    }

    fn should_rotate(&self, now: DateTime<Local>) -> bool {
        if self.settings.rotation_policies.is_empty() {
            return false;
        }
        let state = ActiveFileState {
            size: self.size,
            opened_at: self.opened_at,
            now,
        };
        self.settings
            .rotation_policies
            .iter()
            .any(|policy| policy.should_rotate(&state))
    }

    /// Periodic work: rotate if due, apply retention, push buffered bytes out
    pub(super) fn check(&mut self, name: &str, handler: &dyn ErrorHandler) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.output() {
            handler.rotation_error(name, &e);
            return;
        }
        if self.should_rotate(Local::now()) {
            self.rotate_and_clean(name, handler);
        } else {
            self.apply_retention(name, handler);
        }
        if let Err(e) = self.flush() {
            handler.flush_error(name, &e);
        }
    }

    pub(super) fn rotate_and_clean(&mut self, name: &str, handler: &dyn ErrorHandler) {
        match self.rotate() {
            Ok(rotated) => {
                info!(writer = name, rotated = %rotated.display(), "access log rotated");
                self.apply_retention(name, handler);
            }
            Err(e) => handler.rotation_error(name, &e),
        }
    }

    /// Rename the active file out of the way and start a fresh one.
    ///
    /// The writer keeps a usable file even when the rename fails.
    pub(super) fn rotate(&mut self) -> Result<PathBuf> {
        let active = self.settings.path().to_path_buf();
        let mut out = match self.out.take() {
            Some(out) => out,
            None => open_file(&self.settings, true)?.0,
        };
        if let Err(e) = out.flush() {
            self.out = Some(out);
            return Err(Error::file_system(&active, "flush before rotating", e));
        }
        drop(out);

        let target = self.settings.naming.next_rotated_path(Utc::now());
        let renamed = match fs::rename(&active, &target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::file_system(&active, "rename", e)),
        };

        // a failed rename continues the old file; a failed reopen is
        // retried by the next write or check
        let reopened = self.output().map(|_| ());
        renamed?;
        self.rotations += 1;
        reopened?;
        Ok(target)
    }

    /// Delete whatever the retention policies select. Returns how many
    /// files were removed.
    pub(super) fn apply_retention(&self, name: &str, handler: &dyn ErrorHandler) -> usize {
        if self.settings.retention_policies.is_empty() {
            return 0;
        }
        let files = match self.settings.naming.rotated_files() {
            Ok(files) => files,
            Err(e) => {
                let dir = self.settings.path().parent().unwrap_or(Path::new("."));
                handler.retention_error(name, dir, &Error::file_system(dir, "list", e));
                return 0;
            }
        };
        let now = SystemTime::now();
        let doomed: BTreeSet<PathBuf> = self
            .settings
            .retention_policies
            .iter()
            .flat_map(|policy| policy.files_to_delete(&files, now))
            .collect();

        let mut deleted = 0;
        for path in doomed {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(writer = name, path = %path.display(), "rotated access log deleted");
                    deleted += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => handler.retention_error(name, &path, &Error::file_system(&path, "delete", e)),
            }
        }
        deleted
    }

    /// Move to new settings. Nothing changes if the new file cannot be
    /// opened or the new permissions cannot be applied.
    pub(super) fn reconfigure(
        &mut self,
        settings: FileWriterSettings,
        name: &str,
        handler: &dyn ErrorHandler,
    ) -> Result<()> {
        if settings.path() != self.settings.path() {
            let (out, size) = open_file(&settings, settings.append)?;
            if let Some(mut old) = self.out.replace(out) {
                if let Err(e) = old.flush().for_path(self.settings.path(), "flush") {
                    handler.flush_error(name, &e);
                }
            }
            self.size = size;
            self.opened_at = Local::now();
        } else {
            if settings.permission != self.settings.permission {
                settings.permission.apply(settings.path())?;
            }
            if settings.buffer_size != self.settings.buffer_size {
                self.resize_buffer(settings.buffer_size)?;
            }
        }
        self.settings = settings;
        Ok(())
    }

    fn resize_buffer(&mut self, capacity: usize) -> Result<()> {
        let Some(out) = self.out.take() else {
            return Ok(());
        };
        match out.into_inner() {
            Ok(file) => {
                self.out = Some(BufWriter::with_capacity(capacity, file));
                Ok(())
            }
            Err(e) => {
                let source = io::Error::new(e.error().kind(), e.error().to_string());
                self.out = Some(e.into_inner());
                Err(Error::file_system(self.settings.path(), "flush", source))
            }
        }
    }
}

/// Open (creating parents) and apply permissions. Returns the writer and the
/// size the file starts at.
fn open_file(settings: &FileWriterSettings, append: bool) -> Result<(BufWriter<File>, u64)> {
    let path = settings.path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).for_path(parent, "create directory")?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let file = options.open(path).for_path(path, "open")?;
    settings.permission.apply(path)?;

    let size = if append {
        file.metadata().for_path(path, "read metadata of")?.len()
    } else {
        0
    };
    Ok((BufWriter::with_capacity(settings.buffer_size, file), size))
}
