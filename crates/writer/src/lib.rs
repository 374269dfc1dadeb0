//! Writers for the access log
//!
//! Every writer implements [`TextWriter`]. The [`RotatingFileWriter`] owns
//! the file on disk and is the only component that runs rotation and
//! retention policies. [`QueuedWriter`] and [`ParallelWriter`] decouple
//! producers from disk latency with bounded queues in front of it, and
//! [`StreamWriter`] serves the startup logger before any file is configured.
//!
//! ## Strategies
//!
//! - Direct: the caller's thread writes through the file writer's lock.
//! - Queued: one bounded queue and one consumer thread, FIFO across all
//!   producers. A full queue blocks the producer.
//! - Parallel: several bounded queues, each with a consumer thread. Records
//!   are striped by connection id, so one connection always uses one lane.

mod error_handler;
mod file;
mod lane;
mod naming;
mod parallel;
pub mod policy;
mod queued;
mod stream;
mod traits;

pub use error_handler::{ErrorHandler, TracingErrorHandler};
pub use file::{FileWriterSettings, RotatingFileWriter};
pub use naming::TimestampNaming;
pub use parallel::{ParallelWriter, DEFAULT_LANE_CAPACITY};
pub use policy::{PolicyRegistry, RetentionPolicy, RotationPolicy};
pub use queued::QueuedWriter;
pub use stream::StreamWriter;
pub use traits::TextWriter;
