//! Hub-initiated events — the methods the hub invokes on the client.

use csp_wire::{ObjectMessage, ObjectPatch};
use serde::{Deserialize, Serialize};

/// A push event delivered by the hub outside of any RPC response.
///
/// The engine's tick drain enqueues these onto `pendingIncoming` /
/// `pendingAdds` rather than handling them on the delivering thread — see
/// `csp_realtime::OnlineRealtimeEngine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HubEvent {
    /// A full-state snapshot for an entity newly in scope.
    ObjectMessage(ObjectMessage),
    /// A delta for an entity already known to the client.
    ObjectPatch(ObjectPatch),
    /// The hub asks the client to re-send its current state for `entity_id`
    /// (a peer joined scope and doesn't have it yet).
    RequestToSendObject { entity_id: u64 },
    /// The hub is asking the client to disconnect, with a human-readable
    /// reason. The engine gives the connection 2s to tear down cleanly.
    RequestToDisconnect { reason: String },
    /// A network event on a named channel, e.g. `ClientElectionMessage` or
    /// `RemoteRunScriptMessage` — opaque payload, routed by channel name and
    /// addressed to `target_client_id`.
    NetworkEvent {
        channel: String,
        payload: Vec<u8>,
        target_client_id: u64,
    },
}
