//! Session negotiation.
//!
//! A session is the outcome of negotiating with a provider over an
//! established dialog: an identifier plus the transport configuration the
//! tunnel client needs. The wire protocol of the negotiation is behind the
//! [`SessionNegotiator`] trait.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::dialog::{Dialog, DialogError};
use crate::discovery::ProposalId;

/// Identifier of a negotiated session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

/// A negotiated session, scoped to one connection attempt.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier assigned by the provider
    pub id: SessionId,

    /// Opaque transport configuration for the tunnel client
    pub transport_config: String,
}

/// Errors from session negotiation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The provider rejected the session request
    #[error("session request rejected: {0}")]
    Rejected(String),

    /// The negotiation exchange failed at the transport level
    #[error("negotiation transport error: {0}")]
    Transport(String),

    /// Negotiation exceeded its time budget
    #[error("session negotiation timed out")]
    Timeout,
}

impl From<DialogError> for NegotiationError {
    fn from(e: DialogError) -> Self {
        NegotiationError::Transport(e.to_string())
    }
}

/// Negotiates sessions with providers over a dialog.
#[async_trait]
pub trait SessionNegotiator: Send + Sync {
    /// Request creation of a session for the given proposal.
    async fn request_session(
        &self,
        dialog: &mut dyn Dialog,
        proposal: ProposalId,
    ) -> Result<Session, NegotiationError>;
}
