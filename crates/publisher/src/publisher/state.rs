//! The snapshot that log calls read

use crate::filter::{Filter, SuppressionPolicy};
use accesslog_config::AccessLogConfig;
use accesslog_writer::{ParallelWriter, QueuedWriter, RotatingFileWriter, TextWriter};
use std::sync::Arc;

/// Writer strategy currently in use, keeping the file writer reachable for
/// reconfiguration
#[derive(Clone)]
pub(crate) enum ActiveWriter {
    Direct(Arc<RotatingFileWriter>),
    Queued {
        queue: Arc<QueuedWriter>,
        file: Arc<RotatingFileWriter>,
    },
    Parallel {
        lanes: Arc<ParallelWriter>,
        file: Arc<RotatingFileWriter>,
    },
    /// Supplied by the embedder, e.g. for the startup logger
    Injected(Arc<dyn TextWriter>),
}

impl ActiveWriter {
    pub(crate) fn writer(&self) -> &dyn TextWriter {
        match self {
            ActiveWriter::Direct(file) => file.as_ref(),
            ActiveWriter::Queued { queue, .. } => queue.as_ref(),
            ActiveWriter::Parallel { lanes, .. } => lanes.as_ref(),
            ActiveWriter::Injected(writer) => writer.as_ref(),
        }
    }

    pub(crate) fn file(&self) -> Option<&Arc<RotatingFileWriter>> {
        match self {
            ActiveWriter::Direct(file)
            | ActiveWriter::Queued { file, .. }
            | ActiveWriter::Parallel { file, .. } => Some(file),
            ActiveWriter::Injected(_) => None,
        }
    }

    /// Queue capacity for the queued strategy, 0 for parallel, `None` when
    /// synchronous
    pub(crate) fn async_queue_size(&self) -> Option<usize> {
        match self {
            ActiveWriter::Queued { queue, .. } => Some(queue.capacity()),
            ActiveWriter::Parallel { .. } => Some(0),
            ActiveWriter::Direct(_) | ActiveWriter::Injected(_) => None,
        }
    }

    /// Stop the asynchronous layer (if any) after draining it, leaving the
    /// file writer open
    pub(crate) fn detach_async(&self) {
        match self {
            ActiveWriter::Queued { queue, .. } => {
                queue.detach();
            }
            ActiveWriter::Parallel { lanes, .. } => {
                lanes.detach();
            }
            ActiveWriter::Direct(_) | ActiveWriter::Injected(_) => {}
        }
    }

    pub(crate) fn strategy(&self) -> &'static str {
        match self {
            ActiveWriter::Direct(_) => "direct",
            ActiveWriter::Queued { .. } => "queued",
            ActiveWriter::Parallel { .. } => "parallel",
            ActiveWriter::Injected(_) => "injected",
        }
    }
}

/// Everything a log call needs, replaced as a whole on reconfiguration
pub(crate) struct PublisherState {
    /// `None` for the startup publisher
    pub(crate) config: Option<Arc<AccessLogConfig>>,
    pub(crate) filter: Filter,
    pub(crate) suppression: SuppressionPolicy,
    pub(crate) writer: ActiveWriter,
}
