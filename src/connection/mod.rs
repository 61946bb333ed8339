//! Connection lifecycle management.
//!
//! This module owns the client's connection state machine: the status model,
//! the error taxonomy, the per-stage time budgets, and the manager that
//! drives a connection attempt from proposal discovery to a running tunnel.

pub mod config;
pub mod error;
pub mod manager;
pub mod status;

pub use config::ConnectConfig;
pub use error::{ConnectionError, TeardownError};
pub use manager::ConnectionManager;
pub use status::ConnectionStatus;
