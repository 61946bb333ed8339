//! Connection status model.

use std::fmt;

use crate::session::SessionId;

/// Externally observable state of the connection manager.
///
/// Exactly one of these values is the manager's current status at any
/// instant; transitions are driven by `connect`/`disconnect` calls and by
/// tunnel lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection exists or a previous one has been torn down
    NotConnected,

    /// A connection attempt is in flight or the tunnel is re-establishing
    Connecting,

    /// The tunnel for the given session is up
    Connected {
        /// Identifier of the live session
        session: SessionId,
    },

    /// A disconnect is being carried out
    Disconnecting,

    /// The last connection attempt or session failed
    Error {
        /// Description of the failure
        cause: String,
    },
}

impl ConnectionStatus {
    /// Whether a new connection attempt may start from this status.
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::NotConnected | ConnectionStatus::Error { .. }
        )
    }

    /// Identifier of the live session, if connected.
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            ConnectionStatus::Connected { session } => Some(session),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::NotConnected => write!(f, "not connected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected { session } => write!(f, "connected (session {})", session),
            ConnectionStatus::Disconnecting => write!(f, "disconnecting"),
            ConnectionStatus::Error { cause } => write!(f, "error: {}", cause),
        }
    }
}
