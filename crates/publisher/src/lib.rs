//! Directory server access log publisher
//!
//! Decides which operations are logged ([`filter`]), renders them as text
//! records ([`format`]) and hands them to a writer strategy from
//! `accesslog-writer`. The [`AccessLogPublisher`] ties these together and
//! swaps filter and writer atomically when its configuration changes.
//!
//! ```no_run
//! use accesslog_config::{AccessLogConfig, ChangeNotifier};
//! use accesslog_publisher::AccessLogPublisher;
//! use accesslog_writer::{PolicyRegistry, TracingErrorHandler};
//! use std::sync::Arc;
//!
//! # fn main() -> accesslog_core::Result<()> {
//! let notifier = Arc::new(ChangeNotifier::new());
//! let publisher = Arc::new(AccessLogPublisher::new(
//!     Arc::new(TracingErrorHandler),
//!     Arc::new(PolicyRegistry::with_defaults()),
//! ));
//! publisher.initialize(&AccessLogConfig::new("/var/log/ds/access"), &notifier)?;
//! // ... log_request / log_response from worker threads ...
//! publisher.close();
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod format;
mod publisher;

pub use filter::{Category, CriteriaFilter, Filter, LogFilter, SuppressionPolicy};
pub use publisher::{AccessLogPublisher, PublisherPhase};
