//! The connection manager.
//!
//! Sequences proposal discovery, dialog establishment, session negotiation
//! and tunnel startup into one connection attempt, reconciles asynchronous
//! tunnel lifecycle events with caller-issued `connect`/`disconnect` calls,
//! and keeps status, resource ownership and teardown consistent under
//! concurrent use and partial failure.
//!
//! All mutation of the held dialog/tunnel handles is serialized behind one
//! `tokio::sync::Mutex`; tunnel events are delivered into the same lock by a
//! bridge task consuming the tunnel's event channel. The published status
//! lives in a separate `std::sync::Mutex` that is written only while the
//! main lock is held and can be read lock-free of it at any time.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::config::ConnectConfig;
use crate::connection::error::{ConnectionError, TeardownError};
use crate::connection::status::ConnectionStatus;
use crate::dialog::{Dialog, DialogError, DialogEstablisherFactory};
use crate::discovery::{select_proposal, Contact, DiscoveryError, Proposal, ProposalSource};
use crate::identity::Identity;
use crate::session::{NegotiationError, SessionId, SessionNegotiator};
use crate::stats::StatsKeeper;
use crate::tunnel::{
    TunnelClient, TunnelClientFactory, TunnelError, TunnelEvent, TunnelEventReceiver,
};

/// Resources owned by the current connection attempt.
///
/// Guarded by the manager's main lock. The generation counter ties each
/// bridge task to the attempt that spawned it, so events from a torn-down
/// attempt can never touch a newer one.
struct Inner {
    dialog: Option<Box<dyn Dialog>>,
    tunnel: Option<Box<dyn TunnelClient>>,
    session: Option<SessionId>,
    session_started: bool,
    bridge: Option<JoinHandle<()>>,
    generation: u64,
}

impl Inner {
    fn new() -> Self {
        Inner {
            dialog: None,
            tunnel: None,
            session: None,
            session_started: false,
            bridge: None,
            generation: 0,
        }
    }
}

/// Client-side connection manager for one consumer node.
pub struct ConnectionManager {
    proposals: Arc<dyn ProposalSource>,
    dialog_factory: Arc<dyn DialogEstablisherFactory>,
    negotiator: Arc<dyn SessionNegotiator>,
    tunnel_factory: Arc<dyn TunnelClientFactory>,
    stats: Arc<dyn StatsKeeper>,
    config: ConnectConfig,
    status: Arc<StdMutex<ConnectionStatus>>,
    inner: Arc<Mutex<Inner>>,
}

impl ConnectionManager {
    /// Create a manager over the given collaborators.
    pub fn new(
        proposals: Arc<dyn ProposalSource>,
        dialog_factory: Arc<dyn DialogEstablisherFactory>,
        negotiator: Arc<dyn SessionNegotiator>,
        tunnel_factory: Arc<dyn TunnelClientFactory>,
        stats: Arc<dyn StatsKeeper>,
    ) -> Self {
        ConnectionManager {
            proposals,
            dialog_factory,
            negotiator,
            tunnel_factory,
            stats,
            config: ConnectConfig::default(),
            status: Arc::new(StdMutex::new(ConnectionStatus::NotConnected)),
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    /// Replace the per-stage time budgets.
    pub fn with_config(mut self, config: ConnectConfig) -> Self {
        self.config = config;
        self
    }

    /// Current status snapshot.
    ///
    /// Safe to call concurrently with `connect`, `disconnect` and tunnel
    /// event delivery.
    pub fn status(&self) -> ConnectionStatus {
        self.status.lock().unwrap().clone()
    }

    /// Connect `consumer` to the service offered by `provider`.
    ///
    /// Runs the four-stage acquisition sequence and returns once tunnel
    /// start has been issued, leaving status at `Connecting`; the transition
    /// to `Connected` happens later through the tunnel's event channel. On
    /// any stage failure every resource acquired by this attempt is released
    /// before returning and status settles at `Error`.
    ///
    /// Fails fast with [`ConnectionError::AlreadyInProgress`] (or
    /// [`ConnectionError::AlreadyConnected`]) unless status is
    /// `NotConnected` or `Error`.
    pub async fn connect(
        &self,
        consumer: &Identity,
        provider: &Identity,
    ) -> Result<(), ConnectionError> {
        if consumer.is_empty() {
            return Err(ConnectionError::InvalidIdentity("consumer"));
        }
        if provider.is_empty() {
            return Err(ConnectionError::InvalidIdentity("provider"));
        }

        let mut inner = self.inner.lock().await;

        match self.status() {
            ConnectionStatus::Connected { session } => {
                return Err(ConnectionError::AlreadyConnected(session));
            }
            status if !status.is_idle() => {
                return Err(ConnectionError::AlreadyInProgress);
            }
            _ => {}
        }

        let attempt = Uuid::new_v4();
        info!(
            attempt = %attempt,
            consumer = %consumer,
            provider = %provider,
            "starting connection attempt"
        );
        self.publish_status(ConnectionStatus::Connecting);

        let (proposal, contact) = match self.lookup_proposal(provider).await {
            Ok(found) => found,
            Err(e) => return Err(self.fail(e.into())),
        };
        debug!(attempt = %attempt, proposal = %proposal.id, contact = %contact.address, "proposal selected");

        let establisher = self.dialog_factory.for_identity(consumer);
        let mut dialog = match timeout(
            self.config.dialog_timeout,
            establisher.create_dialog(provider, &contact),
        )
        .await
        {
            Ok(Ok(dialog)) => dialog,
            Ok(Err(e)) => return Err(self.fail(e.into())),
            Err(_) => return Err(self.fail(DialogError::Timeout.into())),
        };
        debug!(attempt = %attempt, "dialog established");

        let session = match timeout(
            self.config.negotiation_timeout,
            self.negotiator.request_session(dialog.as_mut(), proposal.id),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                Self::release_dialog(dialog).await;
                return Err(self.fail(e.into()));
            }
            Err(_) => {
                Self::release_dialog(dialog).await;
                return Err(self.fail(NegotiationError::Timeout.into()));
            }
        };
        debug!(attempt = %attempt, session = %session.id, "session negotiated");

        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tunnel = match self.tunnel_factory.create(&session, consumer, event_tx) {
            Ok(tunnel) => tunnel,
            Err(e) => {
                Self::release_dialog(dialog).await;
                return Err(self.fail(e.into()));
            }
        };

        match timeout(self.config.tunnel_start_timeout, tunnel.start()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                drop(tunnel);
                Self::release_dialog(dialog).await;
                return Err(self.fail(e.into()));
            }
            Err(_) => {
                drop(tunnel);
                Self::release_dialog(dialog).await;
                return Err(self.fail(TunnelError::Timeout.into()));
            }
        }

        inner.generation += 1;
        inner.dialog = Some(dialog);
        inner.tunnel = Some(tunnel);
        inner.session = Some(session.id.clone());
        inner.session_started = false;
        inner.bridge = Some(self.spawn_bridge(inner.generation, session.id.clone(), event_rx));

        info!(attempt = %attempt, session = %session.id, "tunnel started, waiting for data-plane");
        Ok(())
    }

    /// Tear down whatever the manager currently holds.
    ///
    /// Callable from any state. Tunnel stop and dialog close are both
    /// attempted unconditionally; their failures are aggregated into
    /// [`TeardownError`]. Status settles to `NotConnected` either way.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        let mut inner = self.inner.lock().await;
        self.publish_status(ConnectionStatus::Disconnecting);

        // Invalidate any live bridge so stale events cannot touch state.
        inner.generation += 1;
        if let Some(bridge) = inner.bridge.take() {
            bridge.abort();
        }

        let tunnel_failure = match inner.tunnel.take() {
            Some(tunnel) => {
                debug!("stopping tunnel client");
                tunnel.stop().await.err()
            }
            None => None,
        };
        let dialog_failure = match inner.dialog.take() {
            Some(dialog) => {
                debug!("closing dialog");
                dialog.close().await.err()
            }
            None => None,
        };

        if inner.session_started {
            self.stats.mark_session_end();
            inner.session_started = false;
        }
        inner.session = None;

        self.publish_status(ConnectionStatus::NotConnected);
        info!("disconnected");

        match TeardownError::from_failures(tunnel_failure, dialog_failure) {
            Some(e) => {
                warn!(error = %e, "teardown completed with failures");
                Err(e.into())
            }
            None => Ok(()),
        }
    }

    async fn lookup_proposal(
        &self,
        provider: &Identity,
    ) -> Result<(Proposal, Contact), DiscoveryError> {
        let proposals = timeout(
            self.config.proposal_timeout,
            self.proposals.find_proposals(provider),
        )
        .await
        .map_err(|_| DiscoveryError::Timeout)??;

        let proposal = select_proposal(&proposals)?.clone();
        let contact = proposal
            .first_contact()
            .cloned()
            .ok_or(DiscoveryError::NoContact(proposal.id))?;
        Ok((proposal, contact))
    }

    /// Consume and drive the tunnel's event channel, applying transitions
    /// under the same lock as caller commands.
    fn spawn_bridge(
        &self,
        generation: u64,
        session: SessionId,
        mut events: TunnelEventReceiver,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let status = Arc::clone(&self.status);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let mut inner = inner.lock().await;
                if inner.generation != generation {
                    debug!(?event, "dropping tunnel event from superseded attempt");
                    break;
                }

                match event {
                    TunnelEvent::Connected => {
                        let connecting =
                            matches!(*status.lock().unwrap(), ConnectionStatus::Connecting);
                        if connecting {
                            if !inner.session_started {
                                stats.mark_session_start();
                                inner.session_started = true;
                            }
                            *status.lock().unwrap() = ConnectionStatus::Connected {
                                session: session.clone(),
                            };
                            info!(session = %session, "tunnel connected");
                        }
                    }
                    TunnelEvent::Reconnecting => {
                        let mut current = status.lock().unwrap();
                        if matches!(*current, ConnectionStatus::Connected { .. }) {
                            *current = ConnectionStatus::Connecting;
                            info!(session = %session, "tunnel reconnecting");
                        }
                    }
                    TunnelEvent::Exited => {
                        Self::release_attempt(&mut inner, stats.as_ref()).await;
                        *status.lock().unwrap() = ConnectionStatus::NotConnected;
                        info!(session = %session, "tunnel exited");
                        break;
                    }
                    TunnelEvent::Failed { cause } => {
                        Self::release_attempt(&mut inner, stats.as_ref()).await;
                        warn!(session = %session, cause = %cause, "tunnel failed");
                        *status.lock().unwrap() = ConnectionStatus::Error { cause };
                        break;
                    }
                }
            }
        })
    }

    /// Release everything a finished attempt still holds.
    ///
    /// The tunnel handle is discarded without a stop call since the process
    /// already reported itself gone.
    async fn release_attempt(inner: &mut Inner, stats: &dyn StatsKeeper) {
        if let Some(tunnel) = inner.tunnel.take() {
            drop(tunnel);
        }
        if let Some(dialog) = inner.dialog.take() {
            if let Err(e) = dialog.close().await {
                warn!(error = %e, "failed to close dialog after tunnel exit");
            }
        }
        if inner.session_started {
            stats.mark_session_end();
            inner.session_started = false;
        }
        inner.session = None;
        inner.bridge = None;
    }

    /// Close a dialog acquired by a failing attempt.
    async fn release_dialog(dialog: Box<dyn Dialog>) {
        if let Err(e) = dialog.close().await {
            warn!(error = %e, "failed to close dialog during rollback");
        }
    }

    /// Record a stage failure and surface it to the caller.
    fn fail(&self, error: ConnectionError) -> ConnectionError {
        warn!(error = %error, "connection attempt failed");
        self.publish_status(ConnectionStatus::Error {
            cause: error.to_string(),
        });
        error
    }

    fn publish_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogEstablisher;
    use crate::session::Session;
    use crate::tunnel::TunnelEventSender;
    use async_trait::async_trait;

    struct NoProposalSource;

    #[async_trait]
    impl ProposalSource for NoProposalSource {
        async fn find_proposals(
            &self,
            _provider: &Identity,
        ) -> Result<Vec<Proposal>, DiscoveryError> {
            Ok(Vec::new())
        }
    }

    struct UnusedDialogFactory;

    impl DialogEstablisherFactory for UnusedDialogFactory {
        fn for_identity(&self, _consumer: &Identity) -> Box<dyn DialogEstablisher> {
            unreachable!("dialog must not be created in these tests")
        }
    }

    struct UnusedNegotiator;

    #[async_trait]
    impl SessionNegotiator for UnusedNegotiator {
        async fn request_session(
            &self,
            _dialog: &mut dyn Dialog,
            _proposal: crate::discovery::ProposalId,
        ) -> Result<Session, NegotiationError> {
            unreachable!("negotiation must not run in these tests")
        }
    }

    struct UnusedTunnelFactory;

    impl TunnelClientFactory for UnusedTunnelFactory {
        fn create(
            &self,
            _session: &Session,
            _consumer: &Identity,
            _events: TunnelEventSender,
        ) -> Result<Box<dyn TunnelClient>, TunnelError> {
            unreachable!("tunnel must not be created in these tests")
        }
    }

    struct NoopStats;

    impl StatsKeeper for NoopStats {
        fn mark_session_start(&self) {}
        fn mark_session_end(&self) {}
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(
            Arc::new(NoProposalSource),
            Arc::new(UnusedDialogFactory),
            Arc::new(UnusedNegotiator),
            Arc::new(UnusedTunnelFactory),
            Arc::new(NoopStats),
        )
    }

    #[tokio::test]
    async fn test_initial_status_is_not_connected() {
        assert_eq!(manager().status(), ConnectionStatus::NotConnected);
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_identities() {
        let manager = manager();
        let err = manager
            .connect(&Identity::from(""), &Identity::from("0xprovider"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidIdentity("consumer")));

        let err = manager
            .connect(&Identity::from("0xconsumer"), &Identity::from(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidIdentity("provider")));

        // Validation failures never leave Connecting or Error behind.
        assert_eq!(manager.status(), ConnectionStatus::NotConnected);
    }
}
