//! Wire shapes for the election channel (§4.8).

use serde::{Deserialize, Serialize};

/// The `SendNetworkEventToClient` channel name election messages travel on.
pub const CLIENT_ELECTION_CHANNEL: &str = "ClientElectionMessage";

/// The channel name for leader-scoped script execution requests.
pub const REMOTE_RUN_SCRIPT_CHANNEL: &str = "RemoteRunScriptMessage";

/// One of the bully protocol's message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientElectionMessageType {
    Election,
    ElectionResponse,
    ElectionLeader,
    ElectionNotifyLeader,
    LeaderHeartbeat,
    LeaderLost,
}

/// A single election-protocol message.
///
/// `client_id`'s meaning is message-dependent, matching the single reused
/// field the hub's election channel carries: the sender's id for
/// `Election`/`ElectionResponse`/`LeaderHeartbeat`/`LeaderLost`, and the
/// *declared leader's* id for `ElectionLeader`/`ElectionNotifyLeader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientElectionMessage {
    pub message_type: ClientElectionMessageType,
    pub client_id: u64,
    pub event_id: u64,
}

/// A request that the leader run `script_text` in the JS context identified
/// by `context_id`, sent by a non-owning client that wants to mutate a
/// script it does not have write authority over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRunScriptMessage {
    pub context_id: u64,
    pub script_text: String,
}
