//! Extra diagnostic fields attached to an operation by server components

use std::fmt::{self, Display};

/// A single `key`, `key=value` or `key="value"` item appended to a response
/// record after the diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalLogItem {
    key: String,
    value: Option<String>,
    quoted: bool,
}

impl AdditionalLogItem {
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            quoted: false,
        }
    }

    pub fn unquoted(key: impl Into<String>, value: impl Display) -> Self {
        Self {
            key: key.into(),
            value: Some(value.to_string()),
            quoted: false,
        }
    }

    pub fn quoted(key: impl Into<String>, value: impl Display) -> Self {
        Self {
            key: key.into(),
            value: Some(value.to_string()),
            quoted: true,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl Display for AdditionalLogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.quoted) {
            (None, _) => f.write_str(&self.key),
            (Some(value), false) => write!(f, "{}={}", self.key, value),
            (Some(value), true) => write!(f, "{}=\"{}\"", self.key, value),
        }
    }
}
