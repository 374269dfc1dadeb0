//! Change notification between the configuration framework and listeners
//!
//! The framework publishes a complete new snapshot. Every live listener first
//! gets the chance to reject it; only when all accept is the change applied,
//! so a rejected change never reaches any listener's state.

use crate::config::AccessLogConfig;
use accesslog_core::ResultCode;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;
use tracing::debug;

/// Outcome of applying a configuration change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResult {
    pub result_code: ResultCode,
    /// The change was accepted but parts of it only take full effect after
    /// an administrative action such as a restart
    pub admin_action_required: bool,
    pub messages: Vec<String>,
}

impl ChangeResult {
    pub fn success() -> Self {
        Self {
            result_code: ResultCode::SUCCESS,
            admin_action_required: false,
            messages: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result_code: ResultCode::OTHER,
            admin_action_required: false,
            messages: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code.is_success()
    }
}

impl Default for ChangeResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Receives validated configuration changes
pub trait ConfigChangeListener: Send + Sync {
    /// Decide whether `config` may be applied, with the reasons when not
    fn is_configuration_change_acceptable(&self, config: &AccessLogConfig) -> (bool, Vec<String>);

    /// Apply an accepted configuration
    fn apply_configuration_change(&self, config: &AccessLogConfig) -> ChangeResult;
}

/// Handle returned by [`ChangeNotifier::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of listeners for one configuration entry.
///
/// Listeners are held weakly so a dropped publisher never lingers here.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RwLock<Vec<(ListenerId, Weak<dyn ConfigChangeListener>)>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Weak<dyn ConfigChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        debug!(listener = id.0, "configuration change listener registered");
        id
    }

    /// Remove a registration. Unknown or already removed ids are ignored;
    /// returns whether something was removed.
    pub fn deregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    /// Number of registrations whose listener is still alive
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|(_, l)| l.strong_count() > 0)
            .count()
    }

    /// Offer `config` to every live listener.
    ///
    /// Returns the rejection reasons if any listener refuses, otherwise the
    /// result of applying the change to each listener in registration order.
    pub fn publish(&self, config: &AccessLogConfig) -> Result<Vec<ChangeResult>, Vec<String>> {
        let live: Vec<_> = {
            let mut listeners = self.listeners.write();
            listeners.retain(|(_, l)| l.strong_count() > 0);
            listeners.iter().filter_map(|(_, l)| l.upgrade()).collect()
        };

        let mut reasons = Vec::new();
        for listener in &live {
            let (acceptable, mut why) = listener.is_configuration_change_acceptable(config);
            if !acceptable {
                reasons.append(&mut why);
            }
        }
        if !reasons.is_empty() {
            debug!(count = reasons.len(), "configuration change rejected");
            return Err(reasons);
        }

        Ok(live
            .iter()
            .map(|listener| listener.apply_configuration_change(config))
            .collect())
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
