//! The access log publisher
//!
//! Operation-processing threads call the `log_*` methods concurrently. Each
//! call loads the current [`state::PublisherState`] once and uses its filter
//! and writer for the whole call, so a reconfiguration running at the same
//! time is observed either entirely or not at all. Reconfiguration builds a
//! complete new state and installs it with a single store.
//!
//! Lifecycle: `Uninitialized -> Active -> Closed`. Lifecycle transitions and
//! configuration changes are serialized by one mutex; log calls never take it.

mod reconfigure;
mod state;

use crate::filter::{Category, Filter, SuppressionPolicy};
use crate::format;
use accesslog_config::{
    is_configuration_acceptable, AccessLogConfig, ChangeNotifier, ChangeResult,
    ConfigChangeListener, ListenerId,
};
use accesslog_core::{ClientConnection, DisconnectReason, Error, Operation, Result};
use accesslog_writer::{
    ErrorHandler, PolicyRegistry, RotatingFileWriter, TextWriter, TracingErrorHandler,
};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use reconfigure::Transition;
use state::{ActiveWriter, PublisherState};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherPhase {
    Uninitialized,
    Active,
    Closed,
}

struct Lifecycle {
    phase: PublisherPhase,
    registration: Option<(Weak<ChangeNotifier>, ListenerId)>,
    /// Embedder-supplied filter required in addition to the configured one
    sub_filter: Option<Filter>,
}

pub struct AccessLogPublisher {
    state: ArcSwapOption<PublisherState>,
    lifecycle: Mutex<Lifecycle>,
    error_handler: Arc<dyn ErrorHandler>,
    policies: Arc<PolicyRegistry>,
}

impl AccessLogPublisher {
    /// An uninitialized publisher. Log calls are ignored until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new(error_handler: Arc<dyn ErrorHandler>, policies: Arc<PolicyRegistry>) -> Self {
        Self {
            state: ArcSwapOption::empty(),
            lifecycle: Mutex::new(Lifecycle {
                phase: PublisherPhase::Uninitialized,
                registration: None,
                sub_filter: None,
            }),
            error_handler,
            policies,
        }
    }

    /// A publisher that is active immediately, writing every record to
    /// `writer`. Used before the configuration subsystem is available; it
    /// has no configuration and never registers for changes.
    pub fn startup(writer: Arc<dyn TextWriter>, suppress_internal: bool) -> Self {
        let publisher = Self::new(
            Arc::new(TracingErrorHandler),
            Arc::new(PolicyRegistry::new()),
        );
        let suppression = SuppressionPolicy::new(suppress_internal, false);
        publisher.state.store(Some(Arc::new(PublisherState {
            config: None,
            filter: Filter::root(suppression, Filter::always()),
            suppression,
            writer: ActiveWriter::Injected(writer),
        })));
        publisher.lifecycle.lock().phase = PublisherPhase::Active;
        publisher
    }

    pub fn phase(&self) -> PublisherPhase {
        self.lifecycle.lock().phase
    }

    /// The configuration currently in effect
    pub fn current_config(&self) -> Option<Arc<AccessLogConfig>> {
        self.state.load().as_ref().and_then(|s| s.config.clone())
    }

    /// Open the log file, build the writer strategy and filter, and register
    /// for configuration changes. Any failure leaves the publisher
    /// uninitialized.
    pub fn initialize(
        self: &Arc<Self>,
        config: &AccessLogConfig,
        notifier: &Arc<ChangeNotifier>,
    ) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.phase != PublisherPhase::Uninitialized {
            return Err(Error::lifecycle(format!(
                "cannot initialize a publisher that is {:?}",
                lifecycle.phase
            )));
        }
        let (acceptable, reasons) = self.check(config);
        if !acceptable {
            return Err(Error::configuration(reasons.join("; ")));
        }

        let settings = reconfigure::file_settings(config, &self.policies)?;
        let file = Arc::new(RotatingFileWriter::open(
            config.name.as_str(),
            settings,
            Arc::clone(&self.error_handler),
        )?);
        let writer = match reconfigure::wrap(config, Arc::clone(&file), &self.error_handler) {
            Ok(writer) => writer,
            Err(e) => {
                file.shutdown(true);
                return Err(e);
            }
        };
        let filter = Filter::from_config(config, lifecycle.sub_filter.as_ref());
        let strategy = writer.strategy();
        self.state.store(Some(Arc::new(PublisherState {
            config: Some(Arc::new(config.clone())),
            suppression: SuppressionPolicy::from_config(config),
            filter,
            writer,
        })));

        let listener: Weak<dyn ConfigChangeListener> = Arc::downgrade(self) as _;
        let id = notifier.register(listener);
        lifecycle.registration = Some((Arc::downgrade(notifier), id));
        lifecycle.phase = PublisherPhase::Active;
        info!(
            logger = %config.name,
            path = %config.log_file.display(),
            strategy,
            "access log publisher initialized"
        );
        Ok(())
    }

    /// Validation used both before initialization and before every change
    fn check(&self, config: &AccessLogConfig) -> (bool, Vec<String>) {
        let (_, mut reasons) = is_configuration_acceptable(config);
        if let Err(e) = self.policies.resolve_rotation(&config.rotation_policies) {
            reasons.push(e.to_string());
        }
        if let Err(e) = self.policies.resolve_retention(&config.retention_policies) {
            reasons.push(e.to_string());
        }
        (reasons.is_empty(), reasons)
    }

    /// Whether `config` could be applied right now
    pub fn is_configuration_change_acceptable(&self, config: &AccessLogConfig) -> (bool, Vec<String>) {
        self.check(config)
    }

    /// Move to `config` without losing records. On failure the previous
    /// configuration stays in effect.
    pub fn apply_configuration_change(&self, config: &AccessLogConfig) -> ChangeResult {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.phase != PublisherPhase::Active {
            return ChangeResult::failure(format!(
                "cannot reconfigure a publisher that is {:?}",
                lifecycle.phase
            ));
        }
        let (acceptable, reasons) = self.check(config);
        if !acceptable {
            let mut rejected = ChangeResult::failure("access log configuration rejected");
            rejected.messages.extend(reasons);
            return rejected;
        }
        let Some(current) = self.state.load_full() else {
            return ChangeResult::failure("publisher has no active state");
        };
        let Some(file) = current.writer.file().cloned() else {
            return ChangeResult::failure("the startup access logger cannot be reconfigured");
        };

        match self.swap_to(config, &current, file, lifecycle.sub_filter.as_ref()) {
            Ok(result) => result,
            Err(e) => {
                warn!(logger = %config.name, error = %e, "access log reconfiguration failed");
                ChangeResult::failure(e.to_string())
            }
        }
    }

    fn swap_to(
        &self,
        config: &AccessLogConfig,
        current: &PublisherState,
        file: Arc<RotatingFileWriter>,
        sub_filter: Option<&Filter>,
    ) -> Result<ChangeResult> {
        let settings = reconfigure::file_settings(config, &self.policies)?;
        let mut result = ChangeResult::success();

        let transition = reconfigure::plan(&current.writer, config);
        let writer = match transition {
            Transition::Keep => current.writer.clone(),
            Transition::Replace => reconfigure::wrap(config, Arc::clone(&file), &self.error_handler)?,
            Transition::Resize { from, to } => {
                result.admin_action_required = true;
                result.messages.push(format!(
                    "access log queue size changed from {from} to {to}; the queue was drained and rebuilt"
                ));
                reconfigure::wrap(config, Arc::clone(&file), &self.error_handler)?
            }
        };

        if let Err(e) = file.reconfigure(settings) {
            if transition != Transition::Keep {
                // nothing has been routed to the new strategy yet
                writer.detach_async();
            }
            return Err(e);
        }

        let strategy = writer.strategy();
        self.state.store(Some(Arc::new(PublisherState {
            config: Some(Arc::new(config.clone())),
            filter: Filter::from_config(config, sub_filter),
            suppression: SuppressionPolicy::from_config(config),
            writer,
        })));
        if transition != Transition::Keep {
            current.writer.detach_async();
        }

        info!(
            logger = %config.name,
            strategy,
            admin_action_required = result.admin_action_required,
            "access log configuration applied"
        );
        Ok(result)
    }

    /// Require `filter` in addition to the configured criteria
    pub fn set_sub_filter(&self, filter: Filter) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sub_filter = Some(filter);
        let Some(current) = self.state.load_full() else {
            return;
        };
        let filter = match &current.config {
            Some(config) => Filter::from_config(config, lifecycle.sub_filter.as_ref()),
            None => Filter::root(
                current.suppression,
                lifecycle.sub_filter.clone().unwrap_or_else(Filter::always),
            ),
        };
        self.state.store(Some(Arc::new(PublisherState {
            config: current.config.clone(),
            filter,
            suppression: current.suppression,
            writer: current.writer.clone(),
        })));
    }

    /// Write out everything accepted so far
    pub fn flush(&self) {
        if let Some(state) = self.state.load_full() {
            state.writer.writer().flush();
        }
    }

    /// Drain and close the writer and stop listening for configuration
    /// changes. Calling it again does nothing.
    pub fn close(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.phase {
            PublisherPhase::Closed => return,
            PublisherPhase::Uninitialized => {
                lifecycle.phase = PublisherPhase::Closed;
                return;
            }
            PublisherPhase::Active => {}
        }
        if let Some((notifier, id)) = lifecycle.registration.take() {
            if let Some(notifier) = notifier.upgrade() {
                notifier.deregister(id);
            }
        }
        if let Some(state) = self.state.load_full() {
            state.writer.writer().shutdown(true);
        }
        lifecycle.phase = PublisherPhase::Closed;
        debug!("access log publisher closed");
    }

    pub fn log_connect(&self, connection: &ClientConnection) {
        let Some(state) = self.state.load_full() else {
            return;
        };
        if state.suppression.suppresses(connection.connection_id, false) {
            return;
        }
        state
            .writer
            .writer()
            .write_record(format::connect_record(connection, &format::now()));
    }

    pub fn log_disconnect(
        &self,
        connection: &ClientConnection,
        reason: DisconnectReason,
        message: Option<&str>,
    ) {
        let Some(state) = self.state.load_full() else {
            return;
        };
        if state.suppression.suppresses(connection.connection_id, false) {
            return;
        }
        state.writer.writer().write_record(format::disconnect_record(
            connection,
            reason,
            message,
            &format::now(),
        ));
    }

    /// Log the arrival of an operation
    pub fn log_request(&self, operation: &Operation) {
        let Some(state) = self.state.load_full() else {
            return;
        };
        if !state.filter.is_loggable(operation, Category::Request) {
            return;
        }
        state
            .writer
            .writer()
            .write_record(format::request_record(operation, &format::now()));
    }

    /// Log the completion of an operation
    pub fn log_response(&self, operation: &Operation) {
        let Some(state) = self.state.load_full() else {
            return;
        };
        if !state.filter.is_loggable(operation, Category::Response) {
            return;
        }
        if let Some(record) = format::response_record(operation, &format::now()) {
            state.writer.writer().write_record(record);
        }
    }
}

impl ConfigChangeListener for AccessLogPublisher {
    fn is_configuration_change_acceptable(&self, config: &AccessLogConfig) -> (bool, Vec<String>) {
        AccessLogPublisher::is_configuration_change_acceptable(self, config)
    }

    fn apply_configuration_change(&self, config: &AccessLogConfig) -> ChangeResult {
        AccessLogPublisher::apply_configuration_change(self, config)
    }
}

impl std::fmt::Debug for AccessLogPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.load();
        f.debug_struct("AccessLogPublisher")
            .field("phase", &self.phase())
            .field(
                "strategy",
                &state.as_ref().map(|s| s.writer.strategy()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesslog_core::{LogRecord, OperationKind};

    #[derive(Default)]
    struct Memory(Mutex<Vec<String>>, Mutex<bool>);

    impl TextWriter for Memory {
        fn name(&self) -> &str {
            "memory"
        }
        fn write_record(&self, record: LogRecord) {
            self.0.lock().push(record.into_line());
        }
        fn flush(&self) {}
        fn shutdown(&self, _: bool) {
            *self.1.lock() = true;
        }
    }

    fn delete(conn: i64) -> Operation {
        Operation::new(conn, 1, 2, OperationKind::Delete { entry_dn: "cn=x".into() })
    }

    #[test]
    fn test_uninitialized_ignores_log_calls() {
        let publisher =
            AccessLogPublisher::new(Arc::new(TracingErrorHandler), Arc::new(PolicyRegistry::new()));
        publisher.log_request(&delete(1));
        assert_eq!(publisher.phase(), PublisherPhase::Uninitialized);
        assert!(publisher.current_config().is_none());
        publisher.close();
        assert_eq!(publisher.phase(), PublisherPhase::Closed);
    }

    #[test]
    fn test_startup_publisher() {
        let memory = Arc::new(Memory::default());
        let publisher = AccessLogPublisher::startup(memory.clone(), true);
        assert_eq!(publisher.phase(), PublisherPhase::Active);

        publisher.log_request(&delete(1));
        publisher.log_response(&delete(1));
        publisher.log_request(&delete(-1));
        publisher.log_connect(&ClientConnection::new(-1, "internal", "internal", "internal"));

        let lines = memory.0.lock().clone();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("DELETE REQUEST conn=1"));
        assert!(lines[1].contains("DELETE RESPONSE conn=1"));

        let change = publisher.apply_configuration_change(&AccessLogConfig::default());
        assert!(!change.is_success());

        publisher.close();
        publisher.close();
        assert!(*memory.1.lock());
    }

    #[test]
    fn test_sub_filter_on_startup_publisher() {
        let memory = Arc::new(Memory::default());
        let publisher = AccessLogPublisher::startup(memory.clone(), false);
        publisher.set_sub_filter(Filter::never());
        publisher.log_request(&delete(1));
        assert!(memory.0.lock().is_empty());
        publisher.set_sub_filter(Filter::always());
        publisher.log_request(&delete(-5));
        assert_eq!(memory.0.lock().len(), 1);
    }
}
