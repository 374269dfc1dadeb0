//! Multi-lane asynchronous writer

use crate::error_handler::ErrorHandler;
use crate::lane::Lane;
use crate::traits::TextWriter;
use accesslog_core::{LogRecord, Result};
use std::sync::Arc;
use tracing::debug;

/// Queue capacity of each lane
pub const DEFAULT_LANE_CAPACITY: usize = 1024;

const MIN_LANES: usize = 2;
const MAX_LANES: usize = 8;

/// Several bounded queues, each drained by its own thread, in front of one
/// writer.
///
/// A record's lane is chosen by its connection id, so records of one
/// connection keep their order while different connections are written
/// concurrently. There is no ordering across lanes.
pub struct ParallelWriter {
    name: String,
    lanes: Vec<Lane>,
    wrapped: Arc<dyn TextWriter>,
}

impl ParallelWriter {
    /// One lane per available CPU, between 2 and 8
    pub fn new(
        auto_flush: bool,
        wrapped: Arc<dyn TextWriter>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Result<Self> {
        let lanes = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_LANES)
            .clamp(MIN_LANES, MAX_LANES);
        Self::with_lanes(lanes, DEFAULT_LANE_CAPACITY, auto_flush, wrapped, error_handler)
    }

    pub fn with_lanes(
        lane_count: usize,
        capacity: usize,
        auto_flush: bool,
        wrapped: Arc<dyn TextWriter>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Result<Self> {
        let name = format!("{} parallel", wrapped.name());
        let mut lanes = Vec::with_capacity(lane_count.max(1));
        for index in 0..lane_count.max(1) {
            let lane = Lane::spawn(
                format!("{name} {index}"),
                capacity,
                auto_flush,
                Arc::clone(&wrapped),
                Arc::clone(&error_handler),
            );
            match lane {
                Ok(lane) => lanes.push(lane),
                Err(e) => {
                    for started in &lanes {
                        started.close(true);
                    }
                    return Err(e);
                }
            }
        }
        debug!(writer = %name, lanes = lanes.len(), capacity, "parallel access log writer started");
        Ok(Self {
            name,
            lanes,
            wrapped,
        })
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn wrapped(&self) -> &Arc<dyn TextWriter> {
        &self.wrapped
    }

    fn lane_for(&self, connection_id: i64) -> &Lane {
        let index = (connection_id.unsigned_abs() % self.lanes.len() as u64) as usize;
        &self.lanes[index]
    }

    fn close_lanes(&self, drain: bool) -> bool {
        // close every lane even if an earlier one was already closed
        self.lanes
            .iter()
            .fold(false, |closed, lane| lane.close(drain) || closed)
    }

    /// Drain every lane and stop the consumers, leaving the wrapped writer
    /// open. Returns the wrapped writer.
    pub fn detach(&self) -> Arc<dyn TextWriter> {
        if self.close_lanes(true) {
            self.wrapped.flush();
        }
        Arc::clone(&self.wrapped)
    }
}

impl TextWriter for ParallelWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_record(&self, record: LogRecord) {
        if let Err(record) = self.lane_for(record.connection_id()).send(record) {
            self.wrapped.write_record(record);
        }
    }

    fn flush(&self) {
        let mut all_open = true;
        for lane in &self.lanes {
            all_open &= lane.flush();
        }
        if !all_open {
            self.wrapped.flush();
        }
    }

    fn shutdown(&self, flush_first: bool) {
        if self.close_lanes(flush_first) {
            debug!(writer = %self.name, flush_first, "parallel access log writer stopped");
        }
        self.wrapped.shutdown(flush_first);
    }
}

impl Drop for ParallelWriter {
    fn drop(&mut self) {
        self.close_lanes(true);
    }
}
