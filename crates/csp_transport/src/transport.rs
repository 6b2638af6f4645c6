//! [`HubTransport`] — the RPC surface between a client and the message hub.

use csp_wire::{ObjectMessage, ObjectPatch};

use crate::error::TransportError;
use crate::events::HubEvent;

/// Result of `PageScopedObjects`: one page of entities plus the total count
/// across all pages, so the caller knows when it has seen everything.
#[derive(Debug, Clone)]
pub struct PagedObjects {
    pub items: Vec<ObjectMessage>,
    pub total_count: u32,
}

/// Bidirectional, ordered RPC with the hub (§6).
///
/// Implementors guarantee: requests issued from a single task observe their
/// own responses in issue order (TCP/NATS-ordered delivery); inbound
/// [`HubEvent`]s are delivered in hub-send order via [`HubTransport::recv_event`].
///
/// `&self` methods (not `&mut self`) — every implementation here is a thin,
/// cloneable handle over a shared connection, matching how the engine holds
/// one transport across many concurrently-issued RPCs.
pub trait HubTransport: Send + Sync {
    /// Allocate `count` fresh entity ids.
    fn generate_object_ids(
        &self,
        count: u32,
    ) -> impl Future<Output = Result<Vec<u64>, TransportError>> + Send;

    /// Send a full-state snapshot for a newly created (or re-requested)
    /// entity.
    fn send_object_message(
        &self,
        message: &ObjectMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send a batch of deltas in one ordered call.
    fn send_object_patches(
        &self,
        patches: &[ObjectPatch],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Tell the hub this client does not recognise `entity_id`, in reply to
    /// `OnRequestToSendObject`.
    fn send_object_not_found(
        &self,
        entity_id: u64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Page through the entities currently in scope.
    fn page_scoped_objects(
        &self,
        exclude_client_owned: bool,
        include_client_owned_persistent: bool,
        skip: u32,
        limit: u32,
    ) -> impl Future<Output = Result<PagedObjects, TransportError>> + Send;

    /// Suspend inbound event delivery. Used during the scope-refresh cycle:
    /// `StopListening` → `SetScopes` → `StartListening`.
    fn stop_listening(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Resume inbound event delivery.
    fn start_listening(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Change which space(s) this connection is scoped to.
    fn set_scopes(&self, space_id: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send a free-form named event to one specific client scoped to the
    /// same space. Carries election and remote-script-run messages; the hub
    /// relays it back out to `target_client_id` as `HubEvent::NetworkEvent`.
    fn send_network_event(
        &self,
        channel: &str,
        payload: Vec<u8>,
        target_client_id: u64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next hub-pushed event, in delivery order. Returns `None`
    /// once the transport is permanently closed.
    fn recv_event(&self) -> impl Future<Output = Option<HubEvent>> + Send;
}
