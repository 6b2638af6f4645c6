//! [`LeaderElection`] — the bully-style election state machine (§4.8).

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use csp_transport::{HubEvent, HubTransport};
use tracing::{debug, info, warn};

use crate::error::ElectionError;
use crate::message::{
    ClientElectionMessage, ClientElectionMessageType, CLIENT_ELECTION_CHANNEL,
};
use crate::proxy::ClientProxy;

/// How long a client waits for `ElectionResponse`s (or an eventual
/// `ElectionLeader`) before assuming no higher peer is alive and declaring
/// itself leader. Matches the original engine's `DefaultElectionTimeOut`.
pub const DEFAULT_ELECTION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default interval between `LeaderHeartbeat`s. A non-leader that sees
/// nothing for 3× this considers the leader lost.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionState {
    Idle,
    Requested,
    Electing,
    Leader,
}

/// Runs the bully election protocol over a [`HubTransport`] and tracks
/// script-run authority.
///
/// One instance per client, shared with `csp_realtime::OnlineRealtimeEngine`
/// so entity mutation can ask [`LeaderElection::may_run_script_locally`].
pub struct LeaderElection<T: HubTransport> {
    transport: T,
    local_client_id: u64,
    enabled: bool,
    state: ElectionState,
    clients: BTreeMap<u64, ClientProxy>,
    current_leader: Option<u64>,
    pending_responses: HashSet<u64>,
    lost_votes: HashSet<u64>,
    election_start: Option<Instant>,
    last_heartbeat_sent: Option<Instant>,
    last_heartbeat_seen: Option<Instant>,
    next_event_id: u64,
    heartbeat_interval: Duration,
    election_timeout: Duration,
}

impl<T: HubTransport> LeaderElection<T> {
    #[must_use]
    pub fn new(transport: T, local_client_id: u64, enabled: bool) -> Self {
        Self {
            transport,
            local_client_id,
            enabled,
            state: ElectionState::Idle,
            clients: BTreeMap::new(),
            current_leader: None,
            pending_responses: HashSet::new(),
            lost_votes: HashSet::new(),
            election_start: None,
            last_heartbeat_sent: None,
            last_heartbeat_seen: None,
            next_event_id: 0,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            election_timeout: DEFAULT_ELECTION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn state(&self) -> ElectionState {
        self.state
    }

    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.state == ElectionState::Leader
    }

    #[must_use]
    pub fn current_leader(&self) -> Option<u64> {
        self.current_leader
    }

    /// `true` if the local client is allowed to run the script attached to
    /// an entity it owns `entity_owner_id`.
    ///
    /// With election disabled, script ownership follows entity ownership
    /// directly; otherwise only the elected leader may run scripts.
    #[must_use]
    pub fn may_run_script_locally(&self, entity_owner_id: u64) -> bool {
        if !self.enabled {
            entity_owner_id == self.local_client_id
        } else {
            self.is_leader()
        }
    }

    fn next_event_id(&mut self) -> u64 {
        self.next_event_id += 1;
        self.next_event_id
    }

    fn known_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.clients.keys().copied().chain(std::iter::once(self.local_client_id))
    }

    fn is_local_highest(&self) -> bool {
        self.known_ids().all(|id| id <= self.local_client_id)
    }

    /// Every known peer other than the local client, for messages the
    /// protocol addresses to "everyone" (leader declaration, heartbeat,
    /// leader-lost vote) — sent as one point-to-point message per peer.
    fn peer_ids(&self) -> Vec<u64> {
        self.clients.keys().copied().filter(|&id| id != self.local_client_id).collect()
    }

    async fn send(
        &self,
        message_type: ClientElectionMessageType,
        client_id: u64,
        event_id: u64,
        target_client_id: u64,
    ) -> Result<(), ElectionError> {
        let payload = serde_json::to_vec(&ClientElectionMessage {
            message_type,
            client_id,
            event_id,
        })?;
        self.transport
            .send_network_event(CLIENT_ELECTION_CHANNEL, payload, target_client_id)
            .await?;
        Ok(())
    }

    /// Register a new client (self or peer) joining the space, in
    /// `join_order` (lower joins earlier).
    ///
    /// If this is the only known client, it becomes leader immediately. If
    /// it is the local client joining a space with existing avatars, the
    /// earliest-joined becomes the (unelected) initial leader.
    pub fn on_client_joined(&mut self, client_id: u64, join_order: u64) {
        self.clients.insert(client_id, ClientProxy::new(client_id, join_order));

        if client_id == self.local_client_id {
            if self.clients.len() == 1 {
                info!(client_id, "sole avatar in space, becoming leader immediately");
                self.state = ElectionState::Leader;
                self.current_leader = Some(self.local_client_id);
            } else {
                let earliest = self
                    .clients
                    .values()
                    .min_by_key(|c| c.join_order())
                    .map(ClientProxy::id)
                    .unwrap_or(self.local_client_id);
                info!(earliest, "joining space with existing avatars, adopting initial leader");
                self.current_leader = Some(earliest);
                self.state = ElectionState::Idle;
            }
        }
    }

    /// A peer's avatar was removed. If it was the leader, trigger a new
    /// election.
    pub fn on_client_removed(&mut self, client_id: u64) -> bool {
        self.clients.remove(&client_id);
        self.pending_responses.remove(&client_id);
        if self.current_leader == Some(client_id) {
            warn!(client_id, "leader disconnected, election required");
            self.current_leader = None;
            true
        } else {
            false
        }
    }

    /// Start (or restart) an election.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Transport`] if broadcasting fails.
    pub async fn start_election(&mut self) -> Result<(), ElectionError> {
        self.election_start = Some(Instant::now());
        self.pending_responses.clear();

        if self.is_local_highest() {
            self.declare_self_leader().await?;
            return Ok(());
        }

        self.state = ElectionState::Electing;
        let higher: Vec<u64> = self.clients.keys().copied().filter(|&id| id > self.local_client_id).collect();
        for peer in higher {
            self.pending_responses.insert(peer);
            let event_id = self.next_event_id();
            self.send(ClientElectionMessageType::Election, self.local_client_id, event_id, peer).await?;
        }
        debug!(pending = self.pending_responses.len(), "election started, awaiting responses");
        Ok(())
    }

    async fn declare_self_leader(&mut self) -> Result<(), ElectionError> {
        info!(client_id = self.local_client_id, "declaring self leader");
        self.state = ElectionState::Leader;
        self.current_leader = Some(self.local_client_id);
        self.lost_votes.clear();
        for peer in self.peer_ids() {
            let event_id = self.next_event_id();
            self.send(ClientElectionMessageType::ElectionLeader, self.local_client_id, event_id, peer).await?;
        }
        Ok(())
    }

    /// Process an inbound [`ClientElectionMessage`].
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Transport`] if a reply cannot be sent.
    pub async fn handle_message(&mut self, message: ClientElectionMessage) -> Result<(), ElectionError> {
        match message.message_type {
            ClientElectionMessageType::Election => {
                // Only a higher-id peer answers an `Election` challenge —
                // a lower-id receiver (possible under at-least-once/stray
                // delivery) has nothing to contribute and must not re-elect.
                if self.local_client_id > message.client_id {
                    let event_id = self.next_event_id();
                    self.send(
                        ClientElectionMessageType::ElectionResponse,
                        self.local_client_id,
                        event_id,
                        message.client_id,
                    )
                    .await?;
                    if self.state != ElectionState::Electing {
                        Box::pin(self.start_election()).await?;
                    }
                }
            }
            ClientElectionMessageType::ElectionResponse => {
                self.pending_responses.remove(&message.client_id);
            }
            ClientElectionMessageType::ElectionLeader => {
                self.state = ElectionState::Idle;
                self.current_leader = Some(message.client_id);
                self.pending_responses.clear();
                self.lost_votes.clear();
                self.last_heartbeat_seen = Some(Instant::now());
            }
            ClientElectionMessageType::ElectionNotifyLeader => {
                if self.current_leader.is_some() && self.current_leader != Some(message.client_id) {
                    warn!(
                        expected = ?self.current_leader,
                        notified = message.client_id,
                        "leader notification disagrees with local state, re-electing"
                    );
                    Box::pin(self.start_election()).await?;
                } else {
                    self.current_leader = Some(message.client_id);
                }
            }
            ClientElectionMessageType::LeaderHeartbeat => {
                self.last_heartbeat_seen = Some(Instant::now());
                self.lost_votes.clear();
            }
            ClientElectionMessageType::LeaderLost => {
                self.lost_votes.insert(message.client_id);
                let quorum = (self.clients.len() / 2) + 1;
                if self.lost_votes.len() >= quorum {
                    info!("majority reported leader lost, re-electing");
                    self.lost_votes.clear();
                    Box::pin(self.start_election()).await?;
                }
            }
        }
        Ok(())
    }

    /// Decode and dispatch any election-channel [`HubEvent`]. Returns
    /// `false` for events this crate doesn't own (the caller should route
    /// those elsewhere).
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::MalformedMessage`] if the channel payload
    /// doesn't decode.
    pub async fn handle_hub_event(&mut self, event: &HubEvent) -> Result<bool, ElectionError> {
        let HubEvent::NetworkEvent { channel, payload, .. } = event else {
            return Ok(false);
        };
        if channel != CLIENT_ELECTION_CHANNEL {
            return Ok(false);
        }
        let message: ClientElectionMessage = serde_json::from_slice(payload)?;
        self.handle_message(message).await?;
        Ok(true)
    }

    /// Periodic housekeeping: send heartbeats as leader, detect a silent
    /// leader, and time out a stalled election. Call once per engine tick.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Transport`] if sending a protocol message
    /// fails.
    pub async fn tick(&mut self) -> Result<(), ElectionError> {
        let now = Instant::now();

        if self.state == ElectionState::Leader {
            let due = self.last_heartbeat_sent.map_or(true, |t| now.duration_since(t) >= self.heartbeat_interval);
            if due {
                self.last_heartbeat_sent = Some(now);
                for peer in self.peer_ids() {
                    let event_id = self.next_event_id();
                    self.send(ClientElectionMessageType::LeaderHeartbeat, self.local_client_id, event_id, peer).await?;
                }
            }
            return Ok(());
        }

        if self.state == ElectionState::Electing {
            if let Some(start) = self.election_start {
                if now.duration_since(start) >= self.election_timeout && !self.pending_responses.is_empty() {
                    warn!("election timed out with no response from higher peers, declaring self leader");
                    self.declare_self_leader().await?;
                }
            }
            return Ok(());
        }

        if let Some(leader) = self.current_leader {
            if leader != self.local_client_id {
                let silent = self.last_heartbeat_seen.map_or(false, |t| now.duration_since(t) >= self.heartbeat_interval * 3);
                if silent {
                    for peer in self.peer_ids() {
                        let event_id = self.next_event_id();
                        self.send(ClientElectionMessageType::LeaderLost, self.local_client_id, event_id, peer).await?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_transport::MockHubTransport;

    fn new_election(local_id: u64) -> LeaderElection<MockHubTransport> {
        LeaderElection::new(MockHubTransport::new(), local_id, true)
    }

    #[test]
    fn test_sole_avatar_becomes_leader_immediately() {
        let mut election = new_election(1);
        election.on_client_joined(1, 0);
        assert!(election.is_leader());
        assert_eq!(election.current_leader(), Some(1));
    }

    #[test]
    fn test_joining_existing_space_adopts_earliest_as_initial_leader() {
        let mut election = new_election(5);
        election.on_client_joined(2, 0);
        election.on_client_joined(9, 1);
        election.on_client_joined(5, 2);
        assert!(!election.is_leader());
        assert_eq!(election.current_leader(), Some(2));
    }

    #[tokio::test]
    async fn test_highest_id_declares_self_leader_on_election() {
        let mut election = new_election(9);
        election.on_client_joined(2, 0);
        election.on_client_joined(9, 1);
        election.start_election().await.unwrap();
        assert!(election.is_leader());
    }

    #[tokio::test]
    async fn test_lower_id_waits_for_higher_peers() {
        let mut election = new_election(2);
        election.on_client_joined(2, 0);
        election.on_client_joined(9, 1);
        election.start_election().await.unwrap();
        assert_eq!(election.state(), ElectionState::Electing);
        assert!(!election.is_leader());
    }

    #[tokio::test]
    async fn test_election_leader_message_resolves_electing_state() {
        let mut election = new_election(2);
        election.on_client_joined(2, 0);
        election.on_client_joined(9, 1);
        election.start_election().await.unwrap();

        election
            .handle_message(ClientElectionMessage {
                message_type: ClientElectionMessageType::ElectionLeader,
                client_id: 9,
                event_id: 1,
            })
            .await
            .unwrap();

        assert_eq!(election.current_leader(), Some(9));
        assert!(!election.is_leader());
    }

    #[tokio::test]
    async fn test_leader_removed_triggers_reelection_flag() {
        let mut election = new_election(2);
        election.on_client_joined(2, 0);
        election.on_client_joined(9, 1);
        election
            .handle_message(ClientElectionMessage {
                message_type: ClientElectionMessageType::ElectionLeader,
                client_id: 9,
                event_id: 1,
            })
            .await
            .unwrap();
        assert!(election.on_client_removed(9));
        assert_eq!(election.current_leader(), None);
    }

    #[test]
    fn test_election_disabled_ownership_follows_entity_owner() {
        let election = LeaderElection::new(MockHubTransport::new(), 1, false);
        assert!(election.may_run_script_locally(1));
        assert!(!election.may_run_script_locally(2));
    }

    #[test]
    fn test_election_enabled_script_authority_follows_leadership() {
        let mut election = new_election(1);
        election.on_client_joined(1, 0);
        assert!(election.may_run_script_locally(999), "leader may run any entity's script");
    }
}
