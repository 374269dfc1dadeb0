//! Turning events into access log lines
//!
//! Every operation record starts with
//! `[timestamp] OPTYPE CATEGORY conn=<id> op=<opId> msgID=<msgId>` followed
//! by space-separated fields; free text is double-quoted. This layout is read
//! by downstream log parsers and must stay stable.

use crate::filter::Category;
use accesslog_core::{
    BindAuth, ClientConnection, DisconnectReason, LogRecord, Operation, OperationKind,
    ResultCode,
};
use chrono::{DateTime, FixedOffset, Local};
use std::fmt::{Display, Write as _};

pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Rendered for a search without an explicit attribute list
const ALL_ATTRIBUTES: &str = "ALL";

pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

struct Line(String);

// Writing into a String cannot fail, so the fmt::Results below are ignored.
impl Line {
    fn new(at: &DateTime<FixedOffset>) -> Self {
        let mut line = String::with_capacity(160);
        let _ = write!(line, "[{}]", at.format(TIMESTAMP_FORMAT));
        Line(line)
    }

    fn word(&mut self, word: impl Display) -> &mut Self {
        let _ = write!(self.0, " {word}");
        self
    }

    fn field(&mut self, key: &str, value: impl Display) -> &mut Self {
        let _ = write!(self.0, " {key}={value}");
        self
    }

    fn quoted(&mut self, key: &str, value: impl Display) -> &mut Self {
        let _ = write!(self.0, " {key}=\"{value}\"");
        self
    }

    fn finish(self, connection_id: i64) -> LogRecord {
        LogRecord::new(connection_id, self.0)
    }
}

fn header(operation: &Operation, category: Category, at: &DateTime<FixedOffset>) -> Line {
    let mut line = Line::new(at);
    line.word(operation.op_kind().token())
        .word(category)
        .field("conn", operation.connection_id())
        .field("op", operation.operation_id())
        .field("msgID", operation.message_id());
    line
}

fn attribute_list(attributes: &[String]) -> String {
    if attributes.is_empty() {
        ALL_ATTRIBUTES.to_string()
    } else {
        attributes.join(",")
    }
}

/// The record written when an operation arrives
pub fn request_record(operation: &Operation, at: &DateTime<FixedOffset>) -> LogRecord {
    let mut line = header(operation, Category::Request, at);

    match operation.kind() {
        OperationKind::Abandon { id_to_abandon } => {
            line.field("idToAbandon", id_to_abandon);
        }
        OperationKind::Add { entry_dn }
        | OperationKind::Delete { entry_dn }
        | OperationKind::Modify { entry_dn } => {
            line.quoted("dn", entry_dn);
        }
        OperationKind::Bind {
            protocol_version,
            auth,
            bind_dn,
            ..
        } => {
            if let Some(version) = protocol_version {
                line.field("version", version);
            }
            match auth {
                BindAuth::Simple => {
                    line.field("type", "SIMPLE");
                }
                BindAuth::Sasl { mechanism } => {
                    line.field("type", "SASL").field("mechanism", mechanism);
                }
                BindAuth::Other(name) => {
                    line.field("type", name);
                }
            }
            line.quoted("dn", bind_dn);
        }
        OperationKind::Compare {
            entry_dn,
            attribute,
        } => {
            line.quoted("dn", entry_dn).field("attr", attribute);
        }
        OperationKind::Extended {
            request_oid,
            request_name,
            ..
        } => {
            if let Some(name) = request_name {
                line.quoted("name", name);
            }
            line.quoted("oid", request_oid);
        }
        OperationKind::ModifyDn {
            entry_dn,
            new_rdn,
            delete_old_rdn,
            new_superior,
        } => {
            line.quoted("dn", entry_dn)
                .quoted("newRDN", new_rdn)
                .field("deleteOldRDN", delete_old_rdn);
            if let Some(superior) = new_superior {
                line.quoted("newSuperior", superior);
            }
        }
        OperationKind::Search {
            base_dn,
            scope,
            filter,
            attributes,
            ..
        } => {
            line.quoted("base", base_dn)
                .field("scope", scope)
                .quoted("filter", filter)
                .quoted("attrs", attribute_list(attributes));
        }
        OperationKind::Unbind => {}
    }

    if operation.is_synchronization_operation() {
        line.field("type", "synchronization");
    }
    line.finish(operation.connection_id())
}

/// The record written when an operation completes. Unbind has none.
pub fn response_record(operation: &Operation, at: &DateTime<FixedOffset>) -> Option<LogRecord> {
    if matches!(operation.kind(), OperationKind::Unbind) {
        return None;
    }
    let mut line = header(operation, Category::Response, at);

    if let OperationKind::Extended {
        response_oid,
        response_name,
        ..
    } = operation.kind()
    {
        if let Some(name) = response_name {
            line.quoted("name", name);
        }
        if let Some(oid) = response_oid {
            line.quoted("oid", oid);
        }
    }

    line.field("result", operation.result_code());
    if !operation.error_message().is_empty() {
        line.quoted("message", operation.error_message());
    }

    match operation.kind() {
        OperationKind::Search {
            attributes,
            entries_sent,
            ..
        } => {
            line.field("nentries", entries_sent)
                .quoted("attrs", attribute_list(attributes));
        }
        OperationKind::Bind {
            auth_failure: Some(failure),
            ..
        } => {
            line.field("authFailureID", failure.id)
                .quoted("authFailureReason", &failure.reason);
        }
        _ => {}
    }

    for item in operation.additional_log_items() {
        line.word(item);
    }

    let bound = match operation.kind() {
        OperationKind::Bind {
            authentication_info: Some(info),
            ..
        } if operation.result_code() == ResultCode::SUCCESS => Some(info),
        _ => None,
    };
    match bound {
        Some(info) => match &info.authentication_dn {
            Some(authn) => {
                line.quoted("authDN", authn);
                let authz = info.authorization_dn.as_deref();
                if !authz.is_some_and(|authz| authz.eq_ignore_ascii_case(authn)) {
                    // an absent authorization identity still differs
                    line.quoted("authzDN", authz.unwrap_or_default());
                }
            }
            None => {
                line.quoted("authDN", "");
            }
        },
        None => {
            if let Some(proxied) = operation.proxied_authorization_dn() {
                line.quoted("authzDN", proxied);
            }
        }
    }

    line.field("etime", operation.elapsed_time());
    Some(line.finish(operation.connection_id()))
}

pub fn connect_record(connection: &ClientConnection, at: &DateTime<FixedOffset>) -> LogRecord {
    let mut line = Line::new(at);
    line.word("CONNECT")
        .field("conn", connection.connection_id)
        .field("from", &connection.client_host_port)
        .field("to", &connection.server_host_port)
        .field("protocol", &connection.protocol);
    line.finish(connection.connection_id)
}

pub fn disconnect_record(
    connection: &ClientConnection,
    reason: DisconnectReason,
    message: Option<&str>,
    at: &DateTime<FixedOffset>,
) -> LogRecord {
    let mut line = Line::new(at);
    line.word("DISCONNECT")
        .field("conn", connection.connection_id)
        .quoted("reason", reason);
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        line.quoted("msg", message);
    }
    line.finish(connection.connection_id)
}
