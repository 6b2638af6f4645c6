//! [`OfflineRealtimeEngine`] — a single-process engine with no transport
//! (§4.6).

use std::cell::RefCell;

use csp_entity::SpaceEntity;
use csp_math::Transform;
use csp_wire::EntityType;
use rand::Rng;

use crate::avatar;
use crate::collections::{self, EngineCollections, EntitiesLock, EntityCallbacks};
use crate::config::EngineConfig;
use crate::engine::{CreateAvatarParams, CreateEntityParams, RealtimeEngine};
use crate::error::EngineError;
use crate::scene::SceneDescription;

/// Single-process, transport-less engine (§4.6). Every mutation is
/// synchronous: the returned future resolves on first poll without
/// suspending, matching "callbacks fire before the initiating call
/// returns."
pub struct OfflineRealtimeEngine {
    entities: EntitiesLock,
    local_client_id: u64,
    #[allow(dead_code)]
    config: EngineConfig,
}

impl OfflineRealtimeEngine {
    #[must_use]
    pub fn new(local_client_id: u64, config: EngineConfig) -> Self {
        Self {
            entities: collections::new_entities_lock(),
            local_client_id,
            config,
        }
    }

    /// Build an engine pre-populated from a [`SceneDescription`] — the
    /// same logical shape as a stream of `ObjectMessage`s (§6).
    #[must_use]
    pub fn from_scene(local_client_id: u64, config: EngineConfig, scene: SceneDescription) -> Self {
        let engine = Self::new(local_client_id, config);
        {
            let guard = engine.entities.lock();
            let mut collections = guard.borrow_mut();
            for message in scene.entities {
                collections.register(csp_entity::serializer::decode_message(message));
            }
        }
        engine
    }

    /// Ids are assigned from a local PRNG with a large keyspace (§4.6) —
    /// collisions are astronomically unlikely and, unlike the hub's
    /// `GenerateObjectIds`, there's no authority to deduplicate against.
    fn next_id(&self) -> u64 {
        loop {
            let id = rand::thread_rng().gen::<u64>();
            if id != 0 {
                return id;
            }
        }
    }
}

impl RealtimeEngine for OfflineRealtimeEngine {
    async fn create_avatar(&self, params: CreateAvatarParams) -> Result<u64, EngineError> {
        let id = self.next_id();
        let mut entity = SpaceEntity::new(id, EntityType::Avatar, self.local_client_id, params.name.clone(), params.transform);
        avatar::attach_avatar_component(&mut entity, &params)?;
        entity.apply_local_patch();

        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();
        collections.register(entity);
        Ok(id)
    }

    async fn create_entity(&self, params: CreateEntityParams) -> Result<u64, EngineError> {
        let id = self.next_id();
        let mut entity = SpaceEntity::new(id, EntityType::Object, self.local_client_id, params.name.clone(), params.transform);
        if let Some(parent_id) = params.parent_id {
            entity.set_parent_id(parent_id, self.local_client_id)?;
        }
        entity.apply_local_patch();

        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();
        collections.register(entity);
        if params.parent_id.is_some() {
            collections.resolve_staged_parent(id);
        }
        Ok(id)
    }

    async fn destroy_entity(&self, entity_id: u64) -> Result<bool, EngineError> {
        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();

        let Some(entity) = collections.get(entity_id) else {
            return Ok(false);
        };
        let children: Vec<u64> = entity.children().to_vec();
        for child in children {
            if let Some(child_entity) = collections.get_mut(child) {
                child_entity.remove_parent(self.local_client_id).ok();
            }
            collections.resolve_staged_parent(child);
        }
        collections.unregister(entity_id);
        collections.notify_destroyed(entity_id, true);
        Ok(true)
    }

    fn set_entity_callbacks(&self, entity_id: u64, callbacks: EntityCallbacks) {
        let guard = self.entities.lock();
        guard.borrow_mut().set_callbacks(entity_id, callbacks);
    }

    fn with_entity<R>(&self, entity_id: u64, f: impl FnOnce(Option<&SpaceEntity>) -> R) -> R {
        let guard = self.entities.lock();
        let collections = guard.borrow();
        f(collections.get(entity_id))
    }

    fn with_entity_mut<R>(&self, entity_id: u64, f: impl FnOnce(Option<&mut SpaceEntity>) -> R) -> R {
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

    /// "Replication" is simply applying staged changes to committed state
    /// (§4.6) — there's no transport, so every queued entity commits
    /// immediately and no rate limit applies.
    async fn process_pending_entity_operations(&self) -> Result<(), EngineError> {
        let guard = self.entities.lock();
        let mut collections = guard.borrow_mut();

        for entity in collections.drain_pending_adds() {
            collections.register(entity);
        }
        for patch in collections.drain_incoming_patches() {
            let entity_id = patch.id;
            let update = csp_entity::serializer::decode_patch(patch);
            let destroy = update.destroy;
            if let Some(entity) = collections.get_mut(entity_id) {
                let (flags, _changed) = entity.apply_remote_patch(update);
                collections.resolve_staged_parent(entity_id);
                collections.notify_update(entity_id, flags);
            }
            if destroy {
                collections.unregister(entity_id);
                collections.notify_destroyed(entity_id, true);
            }
        }

        for id in collections.pending_outbound_ids() {
            if let Some(entity) = collections.get_mut(id) {
                let flags = entity.apply_local_patch();
                collections.resolve_staged_parent(id);
                collections.drop_from_outbound(id);
                collections.notify_update(id, flags);
                collections.notify_patch_sent(id);
            }
        }

        for id in collections.drain_pending_removes() {
            collections.unregister(id);
            collections.notify_destroyed(id, true);
        }

        Ok(())
    }

    /// Invokes `started`/`complete` immediately with the scene-loaded count
    /// (§4.6) — the scene was already loaded at construction time via
    /// [`OfflineRealtimeEngine::from_scene`].
    async fn fetch_all_entities_and_populate_buffers(
        &self,
        _space_id: &str,
        started: impl FnOnce(),
        complete: impl FnOnce(u32),
    ) -> Result<(), EngineError> {
        started();
        let count = self.with_collections(EngineCollections::num_entities);
        complete(count as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_math::Transform;

    fn engine() -> OfflineRealtimeEngine {
        OfflineRealtimeEngine::new(1, EngineConfig::default())
    }

    #[tokio::test]
    async fn test_create_entity_parent_child_hierarchy() {
        let engine = engine();
        let a = engine
            .create_entity(CreateEntityParams::new("A", Transform::IDENTITY))
            .await
            .unwrap();
        let b = engine
            .create_entity(CreateEntityParams::new("B", Transform::from_position(glam::Vec3::new(1.0, 0.0, 0.0))).with_parent(a))
            .await
            .unwrap();

        engine.with_collections(|collections| {
            assert_eq!(collections.root_hierarchy().count(), 1);
            assert_eq!(collections.get(a).unwrap().children(), &[b]);
            assert_eq!(collections.get(b).unwrap().parent_id(), Some(a));
        });
    }

    #[tokio::test]
    async fn test_destroy_parent_reparents_children_to_root() {
        let engine = engine();
        let a = engine
            .create_entity(CreateEntityParams::new("A", Transform::IDENTITY))
            .await
            .unwrap();
        let b = engine
            .create_entity(CreateEntityParams::new("B", Transform::IDENTITY).with_parent(a))
            .await
            .unwrap();

        engine.destroy_entity(a).await.unwrap();

        engine.with_collections(|collections| {
            assert!(collections.get(a).is_none());
            assert_eq!(collections.get(b).unwrap().parent_id(), None);
            assert_eq!(collections.root_hierarchy().count(), 1);
        });
    }

    #[tokio::test]
    async fn test_create_avatar_has_avatar_component() {
        let engine = engine();
        let id = engine
            .create_avatar(CreateAvatarParams::new("Steve", 1, Transform::IDENTITY))
            .await
            .unwrap();
        engine.with_entity(id, |entity| {
            assert!(entity.unwrap().has_avatar_component());
        });
    }

    #[tokio::test]
    async fn test_fetch_all_entities_reports_scene_count() {
        use csp_wire::{EntityType as WireEntityType, ObjectMessage};
        use std::collections::HashMap;

        let scene = SceneDescription {
            space: serde_json::json!({"id": "space-1"}),
            entities: vec![ObjectMessage {
                id: 7,
                entity_type: WireEntityType::Object,
                is_transferable: true,
                is_persistent: true,
                owner_id: 1,
                parent_id: None,
                components: HashMap::new(),
            }],
        };
        let engine = OfflineRealtimeEngine::from_scene(1, EngineConfig::default(), scene);

        let mut started = false;
        let mut completed_count = None;
        engine
            .fetch_all_entities_and_populate_buffers("space-1", || started = true, |count| completed_count = Some(count))
            .await
            .unwrap();

        assert!(started);
        assert_eq!(completed_count, Some(1));
    }

    #[tokio::test]
    async fn test_duplicate_script_component_rejected() {
        let engine = engine();
        let id = engine
            .create_entity(CreateEntityParams::new("A", Transform::IDENTITY))
            .await
            .unwrap();
        engine.with_entity_mut(id, |entity| {
            let entity = entity.unwrap();
            entity.add_component(csp_wire::ComponentType::ScriptData).unwrap();
            let err = entity.add_component(csp_wire::ComponentType::ScriptData).unwrap_err();
            assert!(matches!(err, csp_entity::EntityError::DuplicateScriptComponent { .. }));
        });
    }
}
