//! Core domain types and errors for the directory server access log.
//!
//! This crate holds the vocabulary shared by every other crate in the
//! workspace: the read-only view of a protocol operation that the logging
//! pipeline observes, the formatted record that travels to a writer, and the
//! error type used for configuration and I/O failures.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias.
//! - **`events`**: operations, client connections, disconnect reasons and
//!   additional log items as seen by the access logger.
//! - **`types`**: small value types such as `ResultCode`, `LogRecord` and
//!   `FilePermission`.

pub mod errors;
pub mod events;
pub mod types;

pub use self::{
    errors::{Error, IoResultExt, Result, ResultExt},
    events::{
        AdditionalLogItem, AuthFailure, AuthenticationInfo, BindAuth, ClientConnection,
        DisconnectReason, OpKind, Operation, OperationKind, SearchScope,
    },
    types::{FilePermission, LogRecord, ResultCode},
};
