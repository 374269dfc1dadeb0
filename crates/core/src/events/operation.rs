//! Protocol operations as seen by the access logger

use super::items::AdditionalLogItem;
use crate::types::ResultCode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Processing time sentinel meaning "no nanosecond timer available"
pub const NO_NANO_TIME: i64 = -1;

/// Fieldless discriminant of [`OperationKind`], used by criteria filters and
/// as the record's operation type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Abandon,
    Add,
    Bind,
    Compare,
    Delete,
    Extended,
    Modify,
    ModifyDn,
    Search,
    Unbind,
}

impl OpKind {
    /// Token written in the record header
    pub fn token(self) -> &'static str {
        match self {
            OpKind::Abandon => "ABANDON",
            OpKind::Add => "ADD",
            OpKind::Bind => "BIND",
            OpKind::Compare => "COMPARE",
            OpKind::Delete => "DELETE",
            OpKind::Extended => "EXTENDED",
            OpKind::Modify => "MODIFY",
            OpKind::ModifyDn => "MODIFYDN",
            OpKind::Search => "SEARCH",
            OpKind::Unbind => "UNBIND",
        }
    }
}

impl Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Search scope as rendered in `scope=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchScope {
    BaseObject,
    SingleLevel,
    WholeSubtree,
    SubordinateSubtree,
}

impl Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SearchScope::BaseObject => "baseObject",
            SearchScope::SingleLevel => "singleLevel",
            SearchScope::WholeSubtree => "wholeSubtree",
            SearchScope::SubordinateSubtree => "subordinateSubtree",
        };
        f.write_str(text)
    }
}

/// How a bind request authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindAuth {
    Simple,
    Sasl { mechanism: String },
    Other(String),
}

/// Reason a bind was refused, as reported by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub id: i32,
    pub reason: String,
}

/// Identities established by a successful bind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationInfo {
    pub authentication_dn: Option<String>,
    pub authorization_dn: Option<String>,
}

/// Operation-specific payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Abandon {
        id_to_abandon: i32,
    },
    Add {
        entry_dn: String,
    },
    Bind {
        protocol_version: Option<String>,
        auth: BindAuth,
        bind_dn: String,
        auth_failure: Option<AuthFailure>,
        authentication_info: Option<AuthenticationInfo>,
    },
    Compare {
        entry_dn: String,
        attribute: String,
    },
    Delete {
        entry_dn: String,
    },
    Extended {
        request_oid: String,
        request_name: Option<String>,
        response_oid: Option<String>,
        response_name: Option<String>,
    },
    Modify {
        entry_dn: String,
    },
    ModifyDn {
        entry_dn: String,
        new_rdn: String,
        delete_old_rdn: bool,
        new_superior: Option<String>,
    },
    Search {
        base_dn: String,
        scope: SearchScope,
        filter: String,
        attributes: Vec<String>,
        entries_sent: u64,
    },
    Unbind,
}

impl OperationKind {
    pub fn op_kind(&self) -> OpKind {
        match self {
            OperationKind::Abandon { .. } => OpKind::Abandon,
            OperationKind::Add { .. } => OpKind::Add,
            OperationKind::Bind { .. } => OpKind::Bind,
            OperationKind::Compare { .. } => OpKind::Compare,
            OperationKind::Delete { .. } => OpKind::Delete,
            OperationKind::Extended { .. } => OpKind::Extended,
            OperationKind::Modify { .. } => OpKind::Modify,
            OperationKind::ModifyDn { .. } => OpKind::ModifyDn,
            OperationKind::Search { .. } => OpKind::Search,
            OperationKind::Unbind => OpKind::Unbind,
        }
    }
}

/// A read-only view of one protocol operation.
///
/// Built by the operation-processing side with [`Operation::new`] and the
/// `with_*` setters; the logging pipeline only uses the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    connection_id: i64,
    operation_id: i64,
    message_id: i32,
    synchronization: bool,
    result_code: ResultCode,
    processing_time_ms: i64,
    processing_nano_time: i64,
    error_message: String,
    proxied_authorization_dn: Option<String>,
    additional_log_items: Vec<AdditionalLogItem>,
    kind: OperationKind,
}

impl Operation {
    pub fn new(connection_id: i64, operation_id: i64, message_id: i32, kind: OperationKind) -> Self {
        Self {
            connection_id,
            operation_id,
            message_id,
            synchronization: false,
            result_code: ResultCode::SUCCESS,
            processing_time_ms: 0,
            processing_nano_time: NO_NANO_TIME,
            error_message: String::new(),
            proxied_authorization_dn: None,
            additional_log_items: Vec::new(),
            kind,
        }
    }

    #[must_use]
    pub fn with_synchronization(mut self, synchronization: bool) -> Self {
        self.synchronization = synchronization;
        self
    }

    #[must_use]
    pub fn with_result_code(mut self, result_code: ResultCode) -> Self {
        self.result_code = result_code;
        self
    }

    #[must_use]
    pub fn with_processing_time(mut self, millis: i64) -> Self {
        self.processing_time_ms = millis;
        self
    }

    #[must_use]
    pub fn with_processing_nano_time(mut self, nanos: i64) -> Self {
        self.processing_nano_time = nanos;
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    #[must_use]
    pub fn with_proxied_authorization_dn(mut self, dn: impl Into<String>) -> Self {
        self.proxied_authorization_dn = Some(dn.into());
        self
    }

    #[must_use]
    pub fn with_additional_log_item(mut self, item: AdditionalLogItem) -> Self {
        self.additional_log_items.push(item);
        self
    }

    /// Negative for operations generated inside the server
    pub fn connection_id(&self) -> i64 {
        self.connection_id
    }

    pub fn operation_id(&self) -> i64 {
        self.operation_id
    }

    pub fn message_id(&self) -> i32 {
        self.message_id
    }

    pub fn is_internal(&self) -> bool {
        self.connection_id < 0
    }

    /// Whether replication, rather than an external client, produced this operation
    pub fn is_synchronization_operation(&self) -> bool {
        self.synchronization
    }

    pub fn result_code(&self) -> ResultCode {
        self.result_code
    }

    pub fn processing_time(&self) -> i64 {
        self.processing_time_ms
    }

    /// Nanosecond processing time, [`NO_NANO_TIME`] when unavailable
    pub fn processing_nano_time(&self) -> i64 {
        self.processing_nano_time
    }

    /// Elapsed time written as `etime=`: the nanosecond timer when it has a
    /// value, the millisecond timer otherwise.
    pub fn elapsed_time(&self) -> i64 {
        if self.processing_nano_time <= NO_NANO_TIME {
            self.processing_time_ms
        } else {
            self.processing_nano_time
        }
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn proxied_authorization_dn(&self) -> Option<&str> {
        self.proxied_authorization_dn.as_deref()
    }

    pub fn additional_log_items(&self) -> &[AdditionalLogItem] {
        &self.additional_log_items
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn op_kind(&self) -> OpKind {
        self.kind.op_kind()
    }

    /// The DN the operation targets, when it has one
    pub fn target_dn(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Add { entry_dn }
            | OperationKind::Compare { entry_dn, .. }
            | OperationKind::Delete { entry_dn }
            | OperationKind::Modify { entry_dn }
            | OperationKind::ModifyDn { entry_dn, .. } => Some(entry_dn),
            OperationKind::Bind { bind_dn, .. } => Some(bind_dn),
            OperationKind::Search { base_dn, .. } => Some(base_dn),
            OperationKind::Abandon { .. }
            | OperationKind::Extended { .. }
            | OperationKind::Unbind => None,
        }
    }

    /// Entries returned so far, for search operations
    pub fn entries_sent(&self) -> Option<u64> {
        match &self.kind {
            OperationKind::Search { entries_sent, .. } => Some(*entries_sent),
            _ => None,
        }
    }
}
