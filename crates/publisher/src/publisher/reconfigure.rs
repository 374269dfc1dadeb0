//! Building writers from configuration and deciding how to move between them

use super::state::ActiveWriter;
use accesslog_config::AccessLogConfig;
use accesslog_core::Result;
use accesslog_writer::{
    ErrorHandler, FileWriterSettings, ParallelWriter, PolicyRegistry, QueuedWriter,
    RotatingFileWriter, TextWriter,
};
use std::sync::Arc;

/// Resolve everything the file writer needs. Fails on a bad permission
/// string or an unknown policy name.
pub(crate) fn file_settings(
    config: &AccessLogConfig,
    policies: &PolicyRegistry,
) -> Result<FileWriterSettings> {
    let mut settings = FileWriterSettings::new(&config.log_file)
        .with_permission(config.permission()?)
        .with_append(config.append)
        .with_auto_flush(config.file_writer_auto_flush())
        .with_buffer_size(config.buffer_size)
        .with_check_interval(config.time_interval());
    settings.rotation_policies = policies.resolve_rotation(&config.rotation_policies)?;
    settings.retention_policies = policies.resolve_retention(&config.retention_policies)?;
    Ok(settings)
}

/// Wrap `file` in the strategy `config` asks for: direct when synchronous,
/// queued for a positive queue size, parallel otherwise
pub(crate) fn wrap(
    config: &AccessLogConfig,
    file: Arc<RotatingFileWriter>,
    error_handler: &Arc<dyn ErrorHandler>,
) -> Result<ActiveWriter> {
    if !config.asynchronous {
        return Ok(ActiveWriter::Direct(file));
    }
    let inner = Arc::clone(&file) as Arc<dyn TextWriter>;
    if config.queue_size > 0 {
        let queue = QueuedWriter::new(
            config.queue_size,
            config.auto_flush,
            inner,
            Arc::clone(error_handler),
        )?;
        Ok(ActiveWriter::Queued {
            queue: Arc::new(queue),
            file,
        })
    } else {
        let lanes = ParallelWriter::new(config.auto_flush, inner, Arc::clone(error_handler))?;
        Ok(ActiveWriter::Parallel {
            lanes: Arc::new(lanes),
            file,
        })
    }
}

/// What happens to the writer strategy on a configuration change
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Same strategy and queue size; only the file writer is reconfigured
    Keep,
    /// Wrap the file writer in a new strategy, draining the old one
    Replace,
    /// Asynchronous before and after but with a different queue size. The
    /// queue is rebuilt and the change reported as needing attention.
    Resize { from: usize, to: usize },
}

pub(crate) fn plan(current: &ActiveWriter, config: &AccessLogConfig) -> Transition {
    let wanted = config.asynchronous.then_some(config.queue_size);
    match (current.async_queue_size(), wanted) {
        (None, None) => Transition::Keep,
        (Some(from), Some(to)) if from == to => Transition::Keep,
        (Some(from), Some(to)) => Transition::Resize { from, to },
        _ => Transition::Replace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesslog_writer::TracingErrorHandler;
    use tempfile::TempDir;

    fn file(dir: &TempDir) -> Arc<RotatingFileWriter> {
        let settings = FileWriterSettings::new(dir.path().join("access"));
        Arc::new(RotatingFileWriter::open("t", settings, Arc::new(TracingErrorHandler)).unwrap())
    }

    #[test]
    fn test_plan_table() {
        let dir = TempDir::new().unwrap();
        let handler: Arc<dyn ErrorHandler> = Arc::new(TracingErrorHandler);
        let base = AccessLogConfig::new(dir.path().join("access"));

        let direct = wrap(&base.clone().with_asynchronous(false, 0), file(&dir), &handler).unwrap();
        let queued = wrap(&base.clone().with_asynchronous(true, 10), file(&dir), &handler).unwrap();
        let parallel = wrap(&base.clone().with_asynchronous(true, 0), file(&dir), &handler).unwrap();
        assert_eq!(direct.strategy(), "direct");
        assert_eq!(queued.strategy(), "queued");
        assert_eq!(parallel.strategy(), "parallel");

        let sync = base.clone().with_asynchronous(false, 10);
        assert_eq!(plan(&direct, &sync), Transition::Keep);
        assert_eq!(plan(&queued, &sync), Transition::Replace);
        assert_eq!(plan(&direct, &base.clone().with_asynchronous(true, 10)), Transition::Replace);
        assert_eq!(plan(&queued, &base.clone().with_asynchronous(true, 10)), Transition::Keep);
        assert_eq!(
            plan(&queued, &base.clone().with_asynchronous(true, 20)),
            Transition::Resize { from: 10, to: 20 }
        );
        assert_eq!(
            plan(&parallel, &base.clone().with_asynchronous(true, 5)),
            Transition::Resize { from: 0, to: 5 }
        );

        for writer in [direct, queued, parallel] {
            writer.writer().shutdown(true);
        }
    }

    #[test]
    fn test_file_settings_rejects_unknown_policy() {
        let config = AccessLogConfig::default().with_rotation_policy("Every Tuesday");
        let err = file_settings(&config, &PolicyRegistry::with_defaults()).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
