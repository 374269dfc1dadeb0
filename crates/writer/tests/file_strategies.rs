//! End-to-end tests of the asynchronous strategies over a real file

use accesslog_core::LogRecord;
use accesslog_writer::policy::{FileCountRetention, SizeLimitRotation};
use accesslog_writer::{
    FileWriterSettings, ParallelWriter, QueuedWriter, RotatingFileWriter, TextWriter,
    TimestampNaming, TracingErrorHandler,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn file_writer(settings: FileWriterSettings) -> Arc<RotatingFileWriter> {
    Arc::new(RotatingFileWriter::open("access", settings, Arc::new(TracingErrorHandler)).unwrap())
}

fn all_lines(dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let text = fs::read_to_string(entry.unwrap().path()).unwrap();
        lines.extend(text.lines().map(str::to_string));
    }
    lines
}

fn hammer(writer: &Arc<dyn TextWriter>, threads: i64, per_thread: usize) {
    let barrier = Arc::new(Barrier::new(threads as usize));
    let handles: Vec<_> = (0..threads)
        .map(|conn| {
            let writer = Arc::clone(writer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..per_thread {
                    writer.write_record(LogRecord::new(conn, format!("conn={conn} seq={seq}")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn queued_writer_loses_nothing_under_contention() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access");
    let file = file_writer(FileWriterSettings::new(&path).with_auto_flush(false));
    let writer: Arc<dyn TextWriter> = Arc::new(
        QueuedWriter::new(16, true, file as Arc<dyn TextWriter>, Arc::new(TracingErrorHandler))
            .unwrap(),
    );

    hammer(&writer, 8, 250);
    writer.shutdown(true);

    let lines = all_lines(dir.path());
    assert_eq!(lines.len(), 2000);
    assert_eq!(lines.iter().collect::<HashSet<_>>().len(), 2000);
}

#[test]
fn parallel_writer_with_rotation_keeps_every_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access");
    let settings = FileWriterSettings::new(&path)
        .with_rotation_policy(Arc::new(SizeLimitRotation { max_bytes: 4096 }));
    let file = file_writer(settings);
    let writer: Arc<dyn TextWriter> = Arc::new(
        ParallelWriter::with_lanes(
            4,
            64,
            false,
            Arc::clone(&file) as Arc<dyn TextWriter>,
            Arc::new(TracingErrorHandler),
        )
        .unwrap(),
    );

    hammer(&writer, 6, 300);
    writer.shutdown(true);

    assert!(file.rotation_count() > 0);
    let lines = all_lines(dir.path());
    assert_eq!(lines.len(), 1800);

    // per-connection order survives striping, even across rotated files
    let rotated = TimestampNaming::new(&path).rotated_files().unwrap();
    let mut ordered = Vec::new();
    for f in rotated.iter().rev() {
        ordered.extend(
            fs::read_to_string(&f.path)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        );
    }
    ordered.extend(fs::read_to_string(&path).unwrap().lines().map(str::to_string));
    for conn in 0..6 {
        let prefix = format!("conn={conn} ");
        let seqs: Vec<usize> = ordered
            .iter()
            .filter(|l| l.starts_with(&prefix))
            .map(|l| l.rsplit('=').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(seqs, (0..300).collect::<Vec<_>>());
    }
}

#[test]
fn retention_prunes_after_rotation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access");
    let settings = FileWriterSettings::new(&path)
        .with_rotation_policy(Arc::new(SizeLimitRotation { max_bytes: 1 }))
        .with_retention_policy(Arc::new(FileCountRetention { keep: 3 }));
    let file = file_writer(settings);

    for i in 0..10 {
        file.write_record(LogRecord::new(1, format!("r{i}")));
    }
    file.shutdown(true);

    let rotated = TimestampNaming::new(&path).rotated_files().unwrap();
    assert_eq!(rotated.len(), 3);
    assert_eq!(fs::read_to_string(&path).unwrap(), "r9\n");
    let newest = fs::read_to_string(&rotated[0].path).unwrap();
    assert_eq!(newest, "r8\n");
}
