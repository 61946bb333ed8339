//! Client-side connection control plane for the Peerlink peer-to-peer VPN
//! node.
//!
//! Given a consumer identity and a chosen provider identity, the
//! [`ConnectionManager`] discovers a service proposal, establishes a dialog
//! with the provider, negotiates a session over that dialog, and drives the
//! tunnel process through its lifecycle, exposing one coherent
//! [`ConnectionStatus`] to callers.
//!
//! Proposal discovery, the dialog transport, the session-negotiation wire
//! protocol, the tunnel process and identity storage are collaborators
//! behind traits in their respective modules; this crate implements the
//! state machine that ties them together.

pub mod config;
pub mod connection;
pub mod dialog;
pub mod discovery;
pub mod identity;
pub mod logging;
pub mod session;
pub mod stats;
pub mod tunnel;

// Re-export the core surface for convenience
pub use connection::{ConnectConfig, ConnectionError, ConnectionManager, ConnectionStatus};
pub use identity::Identity;
