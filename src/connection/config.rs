//! Time budgets for the stages of a connection attempt.

use std::time::Duration;

/// Per-stage timeouts applied during `connect`.
///
/// Each blocking stage (proposal lookup, dialog establishment, session
/// negotiation, tunnel start) is bounded by its own budget; exceeding it is
/// treated as a failure of that stage and rolls the attempt back.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Budget for proposal lookup
    pub proposal_timeout: Duration,

    /// Budget for dialog establishment
    pub dialog_timeout: Duration,

    /// Budget for session negotiation
    pub negotiation_timeout: Duration,

    /// Budget for issuing tunnel start
    pub tunnel_start_timeout: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        ConnectConfig {
            proposal_timeout: Duration::from_secs(30),
            dialog_timeout: Duration::from_secs(30),
            negotiation_timeout: Duration::from_secs(30),
            tunnel_start_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectConfig {
    /// Create a configuration with default budgets.
    pub fn new() -> Self {
        ConnectConfig::default()
    }

    /// Set the proposal lookup budget.
    pub fn with_proposal_timeout(mut self, timeout: Duration) -> Self {
        self.proposal_timeout = timeout;
        self
    }

    /// Set the dialog establishment budget.
    pub fn with_dialog_timeout(mut self, timeout: Duration) -> Self {
        self.dialog_timeout = timeout;
        self
    }

    /// Set the session negotiation budget.
    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = timeout;
        self
    }

    /// Set the tunnel start budget.
    pub fn with_tunnel_start_timeout(mut self, timeout: Duration) -> Self {
        self.tunnel_start_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_override_defaults() {
        let config = ConnectConfig::new()
            .with_proposal_timeout(Duration::from_millis(50))
            .with_negotiation_timeout(Duration::from_secs(5));

        assert_eq!(config.proposal_timeout, Duration::from_millis(50));
        assert_eq!(config.negotiation_timeout, Duration::from_secs(5));
        assert_eq!(config.dialog_timeout, Duration::from_secs(30));
        assert_eq!(config.tunnel_start_timeout, Duration::from_secs(30));
    }
}
