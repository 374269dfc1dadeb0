//! Deciding whether an operation is worth a record
//!
//! A filter tree is immutable once built. The publisher always installs a
//! [`Filter::Root`] on top: it applies the global suppression policy for
//! internal and synchronization operations first and only then asks the
//! sub-filter. Requests and responses are evaluated independently.

mod criteria;

pub use criteria::CriteriaFilter;

use accesslog_config::{AccessLogConfig, FilteringPolicy};
use accesslog_core::Operation;
use std::fmt;
use std::sync::Arc;

/// Which half of an operation a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Request,
    Response,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Request => "REQUEST",
            Category::Response => "RESPONSE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pluggable predicate over operations
pub trait LogFilter: Send + Sync + fmt::Debug {
    fn is_request_loggable(&self, operation: &Operation) -> bool;

    fn is_response_loggable(&self, operation: &Operation) -> bool;
}

/// Global suppression knobs for operations without a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuppressionPolicy {
    pub suppress_internal: bool,
    pub suppress_synchronization: bool,
}

impl SuppressionPolicy {
    pub fn new(suppress_internal: bool, suppress_synchronization: bool) -> Self {
        Self {
            suppress_internal,
            suppress_synchronization,
        }
    }

    pub fn from_config(config: &AccessLogConfig) -> Self {
        Self::new(
            config.suppress_internal_operations,
            config.suppress_synchronization_operations,
        )
    }

    /// Client connections (id >= 0) are never suppressed. Internal ones are
    /// logged only when the flag for their origin is off.
    pub fn suppresses(&self, connection_id: i64, synchronization: bool) -> bool {
        if connection_id >= 0 {
            return false;
        }
        if synchronization {
            self.suppress_synchronization
        } else {
            self.suppress_internal
        }
    }
}

/// Composable filter tree
#[derive(Debug, Clone)]
pub enum Filter {
    /// True when every child is; true for no children
    And(Vec<Filter>),
    /// True when any child is; false for no children
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Root {
        suppression: SuppressionPolicy,
        child: Box<Filter>,
    },
    Criteria(CriteriaFilter),
    Custom(Arc<dyn LogFilter>),
}

impl Filter {
    /// Accepts everything
    pub fn always() -> Self {
        Filter::And(Vec::new())
    }

    /// Accepts nothing
    pub fn never() -> Self {
        Filter::Or(Vec::new())
    }

    pub fn root(suppression: SuppressionPolicy, child: Filter) -> Self {
        Filter::Root {
            suppression,
            child: Box::new(child),
        }
    }

    pub fn custom(filter: impl LogFilter + 'static) -> Self {
        Filter::Custom(Arc::new(filter))
    }

    /// The sub-filter selected by the configured filtering policy
    pub fn from_criteria(policy: FilteringPolicy, criteria: &[accesslog_config::CriteriaConfig]) -> Self {
        let any = || Filter::Or(criteria.iter().map(|c| Filter::Criteria(c.into())).collect());
        match policy {
            FilteringPolicy::NoFiltering => Filter::always(),
            FilteringPolicy::Inclusive => any(),
            FilteringPolicy::Exclusive => Filter::Not(Box::new(any())),
        }
    }

    /// The full tree for a configuration, with `extra` (if any) required in
    /// addition to the configured criteria
    pub fn from_config(config: &AccessLogConfig, extra: Option<&Filter>) -> Self {
        let configured = Filter::from_criteria(config.filtering_policy, &config.criteria);
        let child = match extra {
            Some(extra) => Filter::And(vec![configured, extra.clone()]),
            None => configured,
        };
        Filter::root(SuppressionPolicy::from_config(config), child)
    }

    pub fn suppression(&self) -> Option<SuppressionPolicy> {
        match self {
            Filter::Root { suppression, .. } => Some(*suppression),
            _ => None,
        }
    }

    pub fn is_loggable(&self, operation: &Operation, category: Category) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|c| c.is_loggable(operation, category)),
            Filter::Or(children) => children.iter().any(|c| c.is_loggable(operation, category)),
            Filter::Not(child) => !child.is_loggable(operation, category),
            Filter::Root { suppression, child } => {
                !suppression.suppresses(
                    operation.connection_id(),
                    operation.is_synchronization_operation(),
                ) && child.is_loggable(operation, category)
            }
            Filter::Criteria(criteria) => criteria.matches(operation, category),
            Filter::Custom(custom) => match category {
                Category::Request => custom.is_request_loggable(operation),
                Category::Response => custom.is_response_loggable(operation),
            },
        }
    }
}

impl LogFilter for Filter {
    fn is_request_loggable(&self, operation: &Operation) -> bool {
        self.is_loggable(operation, Category::Request)
    }

    fn is_response_loggable(&self, operation: &Operation) -> bool {
        self.is_loggable(operation, Category::Response)
    }
}
