//! Service proposal discovery.
//!
//! Providers publish proposals describing the service they offer and how to
//! reach them. The connection manager only consumes proposals; fetching them
//! from the discovery service is behind the [`ProposalSource`] trait.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::Identity;

/// Identifier of a published proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contact endpoint through which a provider can be dialed.
///
/// The address format is transport-specific and opaque to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Transport scheme of the endpoint (e.g. a broker protocol name)
    pub transport: String,

    /// Transport-specific address
    pub address: String,
}

/// A service offer published by a provider.
///
/// Immutable once fetched. A valid proposal carries at least one contact.
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Identifier of the proposal
    pub id: ProposalId,

    /// Identity of the provider publishing the offer
    pub provider: Identity,

    /// Ordered contact endpoints for dialing the provider
    pub contacts: Vec<Contact>,
}

impl Proposal {
    /// First contact endpoint of the proposal, if any.
    pub fn first_contact(&self) -> Option<&Contact> {
        self.contacts.first()
    }
}

/// Errors from proposal discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The provider has published no proposals
    #[error("provider has no service proposals")]
    NoProposals,

    /// The selected proposal carries no contact endpoint
    #[error("proposal {0} has no contact endpoints")]
    NoContact(ProposalId),

    /// The provider is unknown to the discovery service
    #[error("provider not found: {0}")]
    NotFound(String),

    /// The discovery service could not be reached
    #[error("discovery transport error: {0}")]
    Transport(String),

    /// Proposal lookup exceeded its time budget
    #[error("proposal lookup timed out")]
    Timeout,
}

/// Source of service proposals, typically a discovery service client.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Fetch the proposals currently published by the given provider.
    async fn find_proposals(&self, provider: &Identity) -> Result<Vec<Proposal>, DiscoveryError>;
}

/// Select the proposal to connect with from a fetched list.
///
/// Picks the first entry so the choice is stable and reproducible. No
/// ranking signal is available at this layer; a scored selection would live
/// in a policy layer above the connection manager.
pub fn select_proposal(proposals: &[Proposal]) -> Result<&Proposal, DiscoveryError> {
    proposals.first().ok_or(DiscoveryError::NoProposals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(id: u64) -> Proposal {
        Proposal {
            id: ProposalId(id),
            provider: Identity::from("0xprovider"),
            contacts: vec![Contact {
                transport: "broker".to_string(),
                address: format!("broker://host-{}:4222", id),
            }],
        }
    }

    #[test]
    fn test_select_picks_first_proposal() {
        let proposals = vec![proposal(1), proposal(2), proposal(3)];
        let selected = select_proposal(&proposals).unwrap();
        assert_eq!(selected.id, ProposalId(1));
    }

    #[test]
    fn test_select_fails_on_empty_list() {
        let selected = select_proposal(&[]);
        assert!(matches!(selected, Err(DiscoveryError::NoProposals)));
    }

    #[test]
    fn test_first_contact() {
        let p = proposal(7);
        assert_eq!(p.first_contact(), Some(&p.contacts[0]));

        let empty = Proposal {
            contacts: Vec::new(),
            ..proposal(8)
        };
        assert!(empty.first_contact().is_none());
    }
}
