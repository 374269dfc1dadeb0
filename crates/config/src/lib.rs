//! Configuration handling for the file-based access logger
//!
//! This crate defines the immutable configuration snapshot consumed by the
//! publisher, loads it from JSON, validates it, and carries change
//! notifications from the configuration framework to registered listeners.

pub mod change;
pub mod config;
pub mod loader;
pub mod validation;

#[cfg(test)]
mod config_tests;

pub use change::{ChangeNotifier, ChangeResult, ConfigChangeListener, ListenerId};
pub use config::{AccessLogConfig, CriteriaConfig, FilteringPolicy};
pub use loader::{load_config, load_config_from_str};
pub use validation::is_configuration_acceptable;
