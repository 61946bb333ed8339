//! Tunnel client handle and lifecycle events.
//!
//! The tunnel client wraps the data-plane process for one session. It is
//! started and stopped by the connection manager and reports its lifecycle
//! asynchronously through an event channel registered at creation time.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::identity::Identity;
use crate::session::Session;

/// Lifecycle event reported by a running tunnel client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelEvent {
    /// The tunnel established its data-plane connection
    Connected,

    /// The tunnel lost its connection and is re-establishing it
    Reconnecting,

    /// The tunnel process exited cleanly
    Exited,

    /// The tunnel process failed and will not recover
    Failed {
        /// Description of the failure
        cause: String,
    },
}

/// Sender half of the tunnel lifecycle event channel.
pub type TunnelEventSender = mpsc::UnboundedSender<TunnelEvent>;

/// Receiver half of the tunnel lifecycle event channel.
pub type TunnelEventReceiver = mpsc::UnboundedReceiver<TunnelEvent>;

/// Errors from tunnel client creation and control.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The tunnel client could not be constructed
    #[error("tunnel create error: {0}")]
    Create(String),

    /// The tunnel process failed to start
    #[error("tunnel start error: {0}")]
    Start(String),

    /// The tunnel process failed to stop
    #[error("tunnel stop error: {0}")]
    Stop(String),

    /// Tunnel start exceeded its time budget
    #[error("tunnel start timed out")]
    Timeout,
}

/// Handle to a runnable tunnel process.
#[async_trait]
pub trait TunnelClient: Send {
    /// Start the tunnel process.
    ///
    /// Returns once the start has been issued; the transition to a live
    /// data-plane connection is reported later as [`TunnelEvent::Connected`].
    async fn start(&mut self) -> Result<(), TunnelError>;

    /// Stop the tunnel process.
    ///
    /// Consumes the handle; a stopped tunnel cannot be reused.
    async fn stop(self: Box<Self>) -> Result<(), TunnelError>;
}

/// Creates tunnel clients bound to a negotiated session.
pub trait TunnelClientFactory: Send + Sync {
    /// Build a tunnel client for the session.
    ///
    /// Lifecycle events of the returned client are delivered through
    /// `events` from the tunnel subsystem's own execution context.
    fn create(
        &self,
        session: &Session,
        consumer: &Identity,
        events: TunnelEventSender,
    ) -> Result<Box<dyn TunnelClient>, TunnelError>;
}
