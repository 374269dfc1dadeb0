//! Client connection lifecycle events

use std::fmt::{self, Display};

/// The connection a lifecycle event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConnection {
    /// Negative for internal connections
    pub connection_id: i64,
    pub client_host_port: String,
    pub server_host_port: String,
    pub protocol: String,
}

impl ClientConnection {
    pub fn new(
        connection_id: i64,
        client_host_port: impl Into<String>,
        server_host_port: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            client_host_port: client_host_port.into(),
            server_host_port: server_host_port.into(),
            protocol: protocol.into(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.connection_id < 0
    }
}

/// Why a connection was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    Unbind,
    ClientDisconnect,
    ProtocolError,
    ServerShutdown,
    AdminDisconnect,
    SecurityProblem,
    MaxRequestSizeExceeded,
    AdminLimitExceeded,
    IdleTimeLimitExceeded,
    IoTimeout,
    ConnectionRejected,
    IoError,
    Other,
}

impl Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DisconnectReason::Unbind => "Client Unbind",
            DisconnectReason::ClientDisconnect => "Client Disconnect",
            DisconnectReason::ProtocolError => "Protocol Error",
            DisconnectReason::ServerShutdown => "Server Shutdown",
            DisconnectReason::AdminDisconnect => "Administrative Termination",
            DisconnectReason::SecurityProblem => "Security Problem",
            DisconnectReason::MaxRequestSizeExceeded => "Maximum Request Size Exceeded",
            DisconnectReason::AdminLimitExceeded => "Administrative Limit Exceeded",
            DisconnectReason::IdleTimeLimitExceeded => "Idle Time Limit Exceeded",
            DisconnectReason::IoTimeout => "I/O Timeout",
            DisconnectReason::ConnectionRejected => "Connection Rejected",
            DisconnectReason::IoError => "I/O Error",
            DisconnectReason::Other => "Other",
        };
        f.write_str(text)
    }
}
