//! [`OnlineRealtimeEngine`] — the hub-replicated engine (§4.7).

use std::cell::RefCell;
use std::time::Duration;

use csp_election::{LeaderElection, RemoteRunScriptMessage, REMOTE_RUN_SCRIPT_CHANNEL};
use csp_entity::serializer;
use csp_script::ScriptHost;
use csp_transport::{HubEvent, HubTransport};
use csp_wire::{EntityType, ObjectPatch, ParentUpdate};

use crate::avatar;
use crate::collections::{self, EngineCollections, EntitiesLock, EntityCallbacks};
use crate::config::EngineConfig;
use crate::engine::{CreateAvatarParams, CreateEntityParams, RealtimeEngine};
use crate::error::EngineError;

/// Hub-replicated engine: every mutation that crosses the wire is an RPC on
/// `T`, inbound hub events are drained each tick into the pending queues
/// (§5), and a [`LeaderElection`] tracks which client may run scripts.
///
/// `T: Clone` because the same connection handle is shared between the
/// engine's own RPCs and the embedded [`LeaderElection`] (see
/// `NatsHubTransport`'s doc comment).
pub struct OnlineRealtimeEngine<T: HubTransport + Clone> {
    entities: EntitiesLock,
    transport: T,
    election: RefCell<LeaderElection<T>>,
    scripts: RefCell<ScriptHost>,
    local_client_id: u64,
    config: EngineConfig,
    join_order: RefCell<u64>,
    ticking: RefCell<bool>,
}

impl<T: HubTransport + Clone> OnlineRealtimeEngine<T> {
    #[must_use]
    pub fn new(transport: T, local_client_id: u64, config: EngineConfig) -> Self {
        let election = LeaderElection::new(transport.clone(), local_client_id, config.leader_election_enabled);
        Self {
            entities: collections::new_entities_lock(),
            transport,
            election: RefCell::new(election),
            scripts: RefCell::new(ScriptHost::new()),
            local_client_id,
            config,
            join_order: RefCell::new(0),
            ticking: RefCell::new(false),
        }
    }

    fn next_join_order(&self) -> u64 {
        let mut counter = self.join_order.borrow_mut();
        let order = *counter;
        *counter += 1;
        order
    }

    /// Register a freshly decoded entity into `collections`, wiring up
    /// election avatar-join tracking and script-context initialization —
    /// the bookkeeping common to the initial fetch and to `OnObjectMessage`.
    fn adopt_entity(&self, collections: &mut EngineCollections, mut entity: csp_entity::SpaceEntity) {
        if entity.has_avatar_component() {
            let order = self.next_join_order();
            self.election.borrow_mut().on_client_joined(entity.owner_id(), order);
        }
        if let Some(script) = entity.script_mut() {
            let source = script.source().to_string();
            if let Err(error) = self.scripts.borrow_mut().bind(script, source) {
                tracing::error!(entity_id = entity.id(), %error, "failed to initialize entity script");
            }
        }
        collections.register(entity);
    }

    /// Page through `PageScopedObjects` until every page has been consumed
    /// (§4.7 initial fetch protocol).
    async fn fetch_pages(&self) -> Result<u32, EngineError> {
        let mut skip = 0u32;
        let mut total = 0u32;
        loop {
            let page = self
                .transport
                .page_scoped_objects(true, true, skip, self.config.page_limit)
                .await?;
            total = page.total_count;
            if page.items.is_empty() {
                break;
            }
            let guard = self.entities.lock();
            let mut collections = guard.borrow_mut();
            for message in page.items {
                skip += 1;
                let entity = serializer::decode_message(message);
                self.adopt_entity(&mut collections, entity);
            }
            if skip >= total {
                break;
            }
        }
        Ok(total)
    }

    /// Construct the compound destroy patch: one delete entry for `entity_id`
    /// plus one reparent-to-root entry per child, in a single array (§4.7
    /// destroy protocol).
    fn build_destroy_patches(collections: &EngineCollections, entity_id: u64) -> Option<Vec<ObjectPatch>> {
        let entity = collections.get(entity_id)?;
        let mut patches = vec![ObjectPatch {
            id: entity_id,
            owner_id: entity.owner_id(),
            destroy: true,
            parent_update: ParentUpdate::NoChange,
            components: Default::default(),
        }];
        for &child_id in entity.children() {
            if let Some(child) = collections.get(child_id) {
                patches.push(ObjectPatch {
                    id: child_id,
                    owner_id: child.owner_id(),
                    destroy: false,
                    parent_update: ParentUpdate::Remove,
                    components: Default::default(),
                });
            }
        }
        Some(patches)
    }

    /// Drain every hub event currently buffered without blocking for more —
    /// the non-blocking analogue of the teacher's background-task drain,
    /// since `HubTransport::recv_event` itself always waits for the next
    /// event.
    async fn drain_hub_events(&self) -> Result<(), EngineError> {
        loop {
            let next = tokio::time::timeout(Duration::ZERO, self.transport.recv_event()).await;
            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => return Ok(()),
                Err(_) => return Ok(()),
            };
            self.handle_hub_event(event).await?;
        }
    }

    async fn handle_hub_event(&self, event: HubEvent) -> Result<(), EngineError> {
        match event {
            HubEvent::ObjectMessage(message) => {
                let guard = self.entities.lock();
                let mut collections = guard.borrow_mut();
                let entity = serializer::decode_message(message);
                self.adopt_entity(&mut collections, entity);
            }
            HubEvent::ObjectPatch(patch) => {
                let guard = self.entities.lock();
                guard.borrow_mut().queue_incoming_patch(patch);
            }
            HubEvent::RequestToSendObject { entity_id } => {
                let message = self.with_entity(entity_id, |entity| entity.map(serializer::encode_message));
                match message {
                    Some(message) => {
                        if let Err(error) = self.transport.send_object_message(&message).await {
                            tracing::error!(entity_id, %error, "failed to resend requested object");
                        }
                    }
                    None => {
                        if let Err(error) = self.transport.send_object_not_found(entity_id).await {
                            tracing::error!(entity_id, %error, "failed to report unknown object");
                        }
                    }
                }
            }
            HubEvent::RequestToDisconnect { reason } => {
                tracing::warn!(reason, "hub requested disconnect");
                tokio::time::sleep(self.config.disconnect_deadline).await;
            }
            HubEvent::NetworkEvent { ref channel, ref payload, .. } => {
                let handled = self
                    .election
                    .borrow_mut()
                    .handle_hub_event(&event)
                    .await
                    .map_err(EngineError::from)?;
                if handled {
                    return Ok(());
                }
                if channel == REMOTE_RUN_SCRIPT_CHANNEL {
                    self.handle_remote_run_script(payload)?;
                }
            }
        }
        Ok(())
    }

    fn handle_remote_run_script(&self, payload: &[u8]) -> Result<(), EngineError> {
        if !self.election.borrow().is_leader() {
            return Ok(());
        }
        let message: RemoteRunScriptMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(error) => {
                tracing::error!(%error, "malformed RemoteRunScriptMessage");
                return Ok(());
            }
        };
        self.with_entity_mut(message.context_id, |entity| {
            let Some(entity) = entity else {
                tracing::error!(entity_id = message.context_id, "remote script run targets unknown entity");
                return;
            };
            let Some(script) = entity.script_mut() else {
                return;
            };
            if let Err(error) = script.eval_raw(&message.script_text) {
                tracing::error!(entity_id = message.context_id, %error, "remote script run failed");
            }
        });
        Ok(())
    }

    /// Fire `entityTick` on every entity whose script the local client is
    /// responsible for (§4.9): owner if election is disabled, leader
    /// otherwise. Exceptions are logged and cleared for the next tick.
    fn tick_scripts(&self, delta_ms: u64) {
        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();
        let election = self.election.borrow();
        let ids: Vec<u64> = collections.entities().map(csp_entity::SpaceEntity::id).collect();
        for id in ids {
            let Some(entity) = collections.get_mut(id) else { continue };
            let owner_id = entity.owner_id();
            let Some(script) = entity.script_mut() else { continue };
            if !election.may_run_script_locally(owner_id) {
                continue;
            }
            if let Err(error) = script.dispatch_message("entityTick", &serde_json::json!({ "dt": delta_ms })) {
                tracing::error!(entity_id = id, %error, "entityTick raised");
            }
            script.take_last_error();
        }
    }

    /// Run one full tick: drain inbound hub events, process pending entity
    /// operations, run the election state machine, and dispatch scripts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a transport or election RPC fails.
    pub async fn tick(&self, delta_ms: u64) -> Result<(), EngineError> {
        self.drain_hub_events().await?;
        self.process_pending_entity_operations().await?;
        self.election.borrow_mut().tick().await.map_err(EngineError::from)?;
        if *self.ticking.borrow() {
            self.tick_scripts(delta_ms);
        }
        Ok(())
    }
}


impl<T: HubTransport + Clone> RealtimeEngine for OnlineRealtimeEngine<T> {
    async fn create_avatar(&self, params: CreateAvatarParams) -> Result<u64, EngineError> {
        let ids = self.transport.generate_object_ids(1).await?;
        let id = ids[0];

        let mut entity = csp_entity::SpaceEntity::new(id, EntityType::Avatar, self.local_client_id, params.name.clone(), params.transform);
        avatar::attach_avatar_component(&mut entity, &params)?;
        entity.apply_local_patch();

        let message = serializer::encode_message(&entity);
        self.transport.send_object_message(&message).await?;

        let order = self.next_join_order();
        self.election.borrow_mut().on_client_joined(self.local_client_id, order);

        let guard = self.entities.lock();
        guard.borrow_mut().register(entity);
        Ok(id)
    }

    async fn create_entity(&self, params: CreateEntityParams) -> Result<u64, EngineError> {
        let ids = self.transport.generate_object_ids(1).await?;
        let id = ids[0];

        let mut entity = csp_entity::SpaceEntity::new(id, EntityType::Object, self.local_client_id, params.name.clone(), params.transform);
        if let Some(parent_id) = params.parent_id {
            entity.set_parent_id(parent_id, self.local_client_id)?;
        }
        entity.apply_local_patch();

        let message = serializer::encode_message(&entity);
        self.transport.send_object_message(&message).await?;

        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();
        collections.register(entity);
        if params.parent_id.is_some() {
            collections.resolve_staged_parent(id);
        }
        Ok(id)
    }

    async fn destroy_entity(&self, entity_id: u64) -> Result<bool, EngineError> {
        let patches = {
            let guard = self.entities.lock();
            let collections = guard.borrow();
            Self::build_destroy_patches(&collections, entity_id)
        };
        let Some(patches) = patches else {
            return Ok(false);
        };

        // Local representation is removed immediately, ahead of the hub ack
        // (§4.7): the hub will either accept the patch or require the client
        // to drop the entity anyway, so there's nothing to gate on here.
        let owner_id = {
            let guard = self.entities.lock();
            let mut collections = guard.borrow_mut();
            let owner_id = collections.get(entity_id).map(csp_entity::SpaceEntity::owner_id);
            let children: Vec<u64> = collections.get(entity_id).map(|e| e.children().to_vec()).unwrap_or_default();
            for child in children {
                if let Some(child_entity) = collections.get_mut(child) {
                    child_entity.remove_parent(self.local_client_id).ok();
                }
                collections.resolve_staged_parent(child);
            }
            self.scripts.borrow_mut().unregister(entity_id);
            collections.unregister(entity_id);
            collections.notify_destroyed(entity_id, true);
            owner_id
        };

        if let Err(e) = self.transport.send_object_patches(&patches).await {
            tracing::error!(entity_id, error = %e, "failed to send destroy patch to hub");
        }

        if let Some(owner_id) = owner_id {
            if self.election.borrow_mut().on_client_removed(owner_id) {
                self.election.borrow_mut().start_election().await.map_err(EngineError::from)?;
            }
        }

        Ok(true)
    }

    fn set_entity_callbacks(&self, entity_id: u64, callbacks: EntityCallbacks) {
        let guard = self.entities.lock();
        guard.borrow_mut().set_callbacks(entity_id, callbacks);
    }

    fn with_entity<R>(&self, entity_id: u64, f: impl FnOnce(Option<&csp_entity::SpaceEntity>) -> R) -> R {
        let guard = self.entities.lock();
        let collections = guard.borrow();
        f(collections.get(entity_id))
    }

    fn with_entity_mut<R>(&self, entity_id: u64, f: impl FnOnce(Option<&mut csp_entity::SpaceEntity>) -> R) -> R {
        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();
        f(collections.get_mut(entity_id))
    }

    fn with_collections<R>(&self, f: impl FnOnce(&EngineCollections) -> R) -> R {
        let guard = self.entities.lock();
        let collections = guard.borrow();
        f(&collections)
    }

    fn queue_entity_update(&self, entity_id: u64) {
        let guard = self.entities.lock();
        guard.borrow_mut().queue_outbound(entity_id);
    }

    async fn process_pending_entity_operations(&self) -> Result<(), EngineError> {
        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();

        for entity in collections.drain_pending_adds() {
            self.adopt_entity(&mut collections, entity);
        }

        for patch in collections.drain_incoming_patches() {
            let entity_id = patch.id;
            let update = serializer::decode_patch(patch);
            let destroy = update.destroy;
            if let Some(entity) = collections.get_mut(entity_id) {
                let (flags, changed) = entity.apply_remote_patch(update);
                collections.resolve_staged_parent(entity_id);
                collections.notify_update(entity_id, flags);
                if let Some(entity) = collections.get_mut(entity_id) {
                    if let Some(script) = entity.script_mut() {
                        for property in &changed {
                            if let Err(error) = script.notify_property_changed(property.component_id, property.key, &property.value) {
                                tracing::error!(entity_id, %error, "property-change script callback raised");
                            }
                        }
                    }
                }
            } else {
                tracing::error!(entity_id, "patch for unknown entity dropped");
            }
            if destroy {
                self.scripts.borrow_mut().unregister(entity_id);
                collections.unregister(entity_id);
                collections.notify_destroyed(entity_id, true);
            }
        }

        let due_entities: Vec<u64> = collections
            .pending_outbound_ids()
            .into_iter()
            .filter(|&id| {
                self.config.rate_limiting_disabled
                    || collections
                        .last_patch_sent(id)
                        .is_none_or(|at| at.elapsed() >= self.config.entity_patch_rate)
            })
            .collect();

        let mut batch = Vec::new();
        let mut batched_ids = Vec::new();
        for id in due_entities {
            let Some(entity) = collections.get_mut(id) else {
                collections.drop_from_outbound(id);
                continue;
            };
            if !entity.is_modifiable(self.local_client_id) {
                tracing::error!(entity_id = id, "entity not modifiable by local client, dropping outbound update");
                collections.drop_from_outbound(id);
                continue;
            }
            entity.claim_ownership(self.local_client_id);
            if let Some(patch) = serializer::encode_local_patch(entity) {
                batch.push(patch);
                batched_ids.push(id);
            } else {
                collections.drop_from_outbound(id);
            }
        }

        if !batch.is_empty() {
            self.transport.send_object_patches(&batch).await?;
            let now = std::time::Instant::now();
            for id in batched_ids {
                if let Some(entity) = collections.get_mut(id) {
                    let flags = entity.apply_local_patch();
                    collections.resolve_staged_parent(id);
                    collections.mark_patch_sent(id, now);
                    collections.notify_update(id, flags);
                    collections.notify_patch_sent(id);
                }
            }
        }

        for id in collections.drain_pending_removes() {
            self.scripts.borrow_mut().unregister(id);
            collections.unregister(id);
            collections.notify_destroyed(id, true);
        }

        Ok(())
    }

    async fn fetch_all_entities_and_populate_buffers(
        &self,
        space_id: &str,
        started: impl FnOnce(),
        complete: impl FnOnce(u32),
    ) -> Result<(), EngineError> {
        self.transport.stop_listening().await?;
        self.transport.set_scopes(space_id).await?;
        self.transport.start_listening().await?;
        started();

        let total = self.fetch_pages().await?;
        self.process_pending_entity_operations().await?;

        let order = self.next_join_order();
        self.election.borrow_mut().on_client_joined(self.local_client_id, order);
        if self.config.leader_election_enabled && !self.election.borrow().is_leader() && self.election.borrow().current_leader().is_none() {
            self.election.borrow_mut().start_election().await.map_err(EngineError::from)?;
        }

        *self.ticking.borrow_mut() = true;
        complete(total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_math::Transform;
    use csp_transport::MockHubTransport;
    use csp_transport::PagedObjects;

    fn engine() -> OnlineRealtimeEngine<MockHubTransport> {
        OnlineRealtimeEngine::new(MockHubTransport::new(), 1, EngineConfig::default())
    }

    #[tokio::test]
    async fn test_create_avatar_sends_object_message_and_registers_locally() {
        let engine = engine();
        let id = engine
            .create_avatar(CreateAvatarParams::new("Steve", 1, Transform::IDENTITY))
            .await
            .unwrap();

        assert_eq!(engine.transport.sent_messages().len(), 1);
        engine.with_entity(id, |entity| {
            assert!(entity.unwrap().has_avatar_component());
        });
        assert!(engine.election.borrow().is_leader());
    }

    #[tokio::test]
    async fn test_create_entity_sends_object_message_and_resolves_parent() {
        let engine = engine();
        let a = engine.create_entity(CreateEntityParams::new("A", Transform::IDENTITY)).await.unwrap();
        let b = engine
            .create_entity(CreateEntityParams::new("B", Transform::IDENTITY).with_parent(a))
            .await
            .unwrap();

        assert_eq!(engine.transport.sent_messages().len(), 2);
        engine.with_collections(|collections| {
            assert_eq!(collections.get(a).unwrap().children(), &[b]);
        });
    }

    #[tokio::test]
    async fn test_fetch_all_entities_pages_until_drained() {
        use csp_wire::ObjectMessage;
        use std::collections::HashMap;

        let transport = MockHubTransport::new();
        let message = ObjectMessage {
            id: 42,
            entity_type: EntityType::Object,
            is_transferable: true,
            is_persistent: true,
            owner_id: 9,
            parent_id: None,
            components: HashMap::new(),
        };
        transport.queue_pages(vec![PagedObjects {
            items: vec![message],
            total_count: 1,
        }]);
        let engine = OnlineRealtimeEngine::new(transport, 1, EngineConfig::default());

        let mut completed = None;
        engine
            .fetch_all_entities_and_populate_buffers("space-1", || {}, |count| completed = Some(count))
            .await
            .unwrap();

        assert_eq!(completed, Some(1));
        engine.with_collections(|collections| assert_eq!(collections.num_entities(), 1));
    }

    #[tokio::test]
    async fn test_destroy_entity_sends_compound_patch() {
        let engine = engine();
        let a = engine.create_entity(CreateEntityParams::new("A", Transform::IDENTITY)).await.unwrap();
        let b = engine
            .create_entity(CreateEntityParams::new("B", Transform::IDENTITY).with_parent(a))
            .await
            .unwrap();

        let destroyed = engine.destroy_entity(a).await.unwrap();
        assert!(destroyed);

        let patches = engine.transport.sent_patches();
        let compound = patches.last().unwrap();
        assert_eq!(compound.len(), 2);
        assert!(compound[0].destroy);
        assert_eq!(compound[1].parent_update, ParentUpdate::Remove);

        engine.with_collections(|collections| {
            assert!(collections.get(a).is_none());
            assert_eq!(collections.get(b).unwrap().parent_id(), None);
        });
    }

    #[tokio::test]
    async fn test_queued_outbound_patch_is_sent_and_rate_limited() {
        let engine = engine();
        let id = engine.create_entity(CreateEntityParams::new("A", Transform::IDENTITY)).await.unwrap();
        engine.with_entity_mut(id, |entity| entity.unwrap().set_name("renamed", 1).unwrap());
        engine.queue_entity_update(id);
        engine.process_pending_entity_operations().await.unwrap();

        assert_eq!(engine.transport.sent_patches().len(), 2);
        engine.with_entity(id, |entity| assert_eq!(entity.unwrap().name(), "renamed"));
    }

    #[tokio::test]
    async fn test_request_to_send_object_replies_not_found_for_unknown_entity() {
        let engine = engine();
        engine.handle_hub_event(HubEvent::RequestToSendObject { entity_id: 999 }).await.unwrap();
        assert_eq!(engine.transport.sent_patches().len(), 0);
    }
}
