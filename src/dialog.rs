//! Peer-to-peer dialog channel.
//!
//! A dialog is the bidirectional messaging channel to one provider, bound to
//! one consumer identity and one contact endpoint. Session negotiation runs
//! over it. The connection manager owns the dialog exclusively from creation
//! until close; `close` consumes the handle so a closed dialog cannot be
//! touched again.

use async_trait::async_trait;
use thiserror::Error;

use crate::discovery::Contact;
use crate::identity::Identity;

/// Errors from dialog establishment and use.
#[derive(Debug, Error)]
pub enum DialogError {
    /// The peer was unreachable or rejected the dialog
    #[error("dialog connect error: {0}")]
    Connect(String),

    /// Sending a message over the dialog failed
    #[error("dialog send error: {0}")]
    Send(String),

    /// Receiving a message over the dialog failed
    #[error("dialog receive error: {0}")]
    Receive(String),

    /// Closing the dialog failed
    #[error("dialog close error: {0}")]
    Close(String),

    /// Dialog establishment exceeded its time budget
    #[error("dialog establishment timed out")]
    Timeout,
}

/// An established dialog with a provider.
#[async_trait]
pub trait Dialog: Send {
    /// Send an opaque message to the peer.
    async fn send(&mut self, payload: &[u8]) -> Result<(), DialogError>;

    /// Receive the next opaque message from the peer.
    async fn receive(&mut self) -> Result<Vec<u8>, DialogError>;

    /// Close the dialog.
    ///
    /// Consumes the handle; a closed dialog cannot be reused.
    async fn close(self: Box<Self>) -> Result<(), DialogError>;
}

/// Establishes dialogs on behalf of one consumer identity.
#[async_trait]
pub trait DialogEstablisher: Send + Sync {
    /// Create a dialog with the given provider via the given contact.
    async fn create_dialog(
        &self,
        provider: &Identity,
        contact: &Contact,
    ) -> Result<Box<dyn Dialog>, DialogError>;
}

/// Produces a [`DialogEstablisher`] bound to a consumer identity.
pub trait DialogEstablisherFactory: Send + Sync {
    /// Build an establisher that signs and identifies as `consumer`.
    fn for_identity(&self, consumer: &Identity) -> Box<dyn DialogEstablisher>;
}
