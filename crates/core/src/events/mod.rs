//! Events observed by the access logger
//!
//! These are read-only views created by the operation-processing side of the
//! server. The logging pipeline only reads them during the call that produces
//! a record and never keeps them afterwards.

mod connection;
mod items;
mod operation;

pub use connection::{ClientConnection, DisconnectReason};
pub use items::AdditionalLogItem;
pub use operation::{
    AuthFailure, AuthenticationInfo, BindAuth, OpKind, Operation, OperationKind, SearchScope,
};
