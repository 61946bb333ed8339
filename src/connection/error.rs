//! Error types for the connection manager.

use std::fmt;

use thiserror::Error;

use crate::dialog::DialogError;
use crate::discovery::DiscoveryError;
use crate::session::{NegotiationError, SessionId};
use crate::tunnel::TunnelError;

/// Errors surfaced by the connection manager.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A required identity was empty
    #[error("identity must not be empty: {0}")]
    InvalidIdentity(&'static str),

    /// Proposal lookup failed or returned nothing usable
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Dialog establishment failed
    #[error(transparent)]
    Dialog(#[from] DialogError),

    /// Session negotiation failed
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// The tunnel client could not be created or started
    #[error(transparent)]
    TunnelStart(#[from] TunnelError),

    /// A connection attempt is already in flight
    #[error("connection attempt already in progress")]
    AlreadyInProgress,

    /// A session is already connected
    #[error("already connected to session {0}")]
    AlreadyConnected(SessionId),

    /// Teardown left failures behind
    #[error(transparent)]
    Teardown(#[from] TeardownError),
}

/// Aggregated failures from stopping the tunnel and closing the dialog.
///
/// Both releases are always attempted; this error carries whichever of them
/// failed. Status still settles to `NotConnected` when it is returned.
#[derive(Debug)]
pub struct TeardownError {
    /// Failure from stopping the tunnel client, if any
    pub tunnel: Option<TunnelError>,

    /// Failure from closing the dialog, if any
    pub dialog: Option<DialogError>,
}

impl TeardownError {
    /// Build a teardown error if either release failed.
    pub fn from_failures(
        tunnel: Option<TunnelError>,
        dialog: Option<DialogError>,
    ) -> Option<Self> {
        if tunnel.is_some() || dialog.is_some() {
            Some(TeardownError { tunnel, dialog })
        } else {
            None
        }
    }
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "teardown failed")?;
        if let Some(e) = &self.tunnel {
            write!(f, "; tunnel stop: {}", e)?;
        }
        if let Some(e) = &self.dialog {
            write!(f, "; dialog close: {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for TeardownError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_from_failures() {
        assert!(TeardownError::from_failures(None, None).is_none());

        let err = TeardownError::from_failures(
            Some(TunnelError::Stop("no pid".to_string())),
            Some(DialogError::Close("broken pipe".to_string())),
        )
        .unwrap();
        let rendered = err.to_string();
        assert!(rendered.contains("tunnel stop"));
        assert!(rendered.contains("dialog close"));
    }

    #[test]
    fn test_stage_errors_convert() {
        let err: ConnectionError = DiscoveryError::NoProposals.into();
        assert!(matches!(
            err,
            ConnectionError::Discovery(DiscoveryError::NoProposals)
        ));
        assert_eq!(err.to_string(), "provider has no service proposals");
    }
}
