//! [`EngineCollections`] — the entity set and pending-operation queues
//! shared by both engine implementations (§5: "entitiesLock guards the
//! Entities/Avatars/Objects/RootHierarchy collections, the pending queues,
//! and the selection set").

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use parking_lot::ReentrantMutex;

use csp_entity::{SpaceEntity, UpdateFlags};
use csp_wire::{ObjectPatch, ParentUpdate};

/// Observer callbacks the application may register per entity (§6 Public
/// surface: "the update/destroy/patch-sent callbacks per entity").
///
/// Not stored on `SpaceEntity` itself — per §9's cyclic-ownership guidance,
/// the engine owns the callback table and invokes it when it applies a
/// patch or tears an entity down, rather than giving the entity a
/// back-reference into engine-owned closures.
#[derive(Default)]
pub struct EntityCallbacks {
    pub on_update: Option<Box<dyn FnMut(UpdateFlags) + Send>>,
    pub on_destroy: Option<Box<dyn FnOnce(bool) + Send>>,
    pub on_patch_sent: Option<Box<dyn FnMut() + Send>>,
}

/// The engine's owned entity set plus every pending-operation queue.
///
/// A single `EngineCollections` is wrapped in a `parking_lot::ReentrantMutex`
/// by each engine implementation (see §5's `entitiesLock`) so hub callbacks
/// arriving off the tick thread can enqueue work, and so a script callback
/// re-entering the engine mid-tick doesn't deadlock.
#[derive(Default)]
pub struct EngineCollections {
    entities: HashMap<u64, SpaceEntity>,
    avatars: HashSet<u64>,
    objects: HashSet<u64>,
    root_hierarchy: HashSet<u64>,

    pending_adds: Vec<SpaceEntity>,
    pending_removes: Vec<u64>,
    pending_incoming_patches: VecDeque<ObjectPatch>,
    pending_outbound: HashSet<u64>,

    last_patch_sent: HashMap<u64, Instant>,
    callbacks: HashMap<u64, EntityCallbacks>,
}

/// §5's recursive `entitiesLock`: re-entrant across nested calls on the same
/// thread (a script callback re-entering the engine mid-tick), interior
/// mutability via `RefCell` since `ReentrantMutex` only hands out shared
/// references.
///
/// Callers must keep any borrow scoped tightly — `RefCell` itself still
/// panics on a genuinely overlapping mutable borrow; the re-entrant mutex
/// only permits re-entering the *lock*, not a second live `borrow_mut`.
pub type EntitiesLock = ReentrantMutex<RefCell<EngineCollections>>;

#[must_use]
pub fn new_entities_lock() -> EntitiesLock {
    ReentrantMutex::new(RefCell::new(EngineCollections::new()))
}

impl EngineCollections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&SpaceEntity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: u64) -> Option<&mut SpaceEntity> {
        self.entities.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SpaceEntity> {
        self.entities.values().find(|e| e.name() == name)
    }

    pub fn find_avatar_by_name(&self, name: &str) -> Option<&SpaceEntity> {
        self.avatars
            .iter()
            .filter_map(|id| self.entities.get(id))
            .find(|e| e.name() == name)
    }

    pub fn find_object_by_name(&self, name: &str) -> Option<&SpaceEntity> {
        self.objects
            .iter()
            .filter_map(|id| self.entities.get(id))
            .find(|e| e.name() == name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &SpaceEntity> {
        self.entities.values()
    }

    pub fn avatars(&self) -> impl Iterator<Item = &SpaceEntity> {
        self.avatars.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn objects(&self) -> impl Iterator<Item = &SpaceEntity> {
        self.objects.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn root_hierarchy(&self) -> impl Iterator<Item = &SpaceEntity> {
        self.root_hierarchy
            .iter()
            .filter_map(|id| self.entities.get(id))
    }

    #[must_use]
    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn num_avatars(&self) -> usize {
        self.avatars.len()
    }

    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Register a just-created or just-received entity into the
    /// Entities/Avatars-or-Objects/RootHierarchy collections.
    pub fn register(&mut self, entity: SpaceEntity) {
        let id = entity.id();
        let is_avatar = entity.has_avatar_component();
        let has_parent = entity.parent_id().is_some();

        if is_avatar {
            self.avatars.insert(id);
        } else {
            self.objects.insert(id);
        }
        if !has_parent {
            self.root_hierarchy.insert(id);
        }
        if let Some(parent_id) = entity.parent_id() {
            if let Some(parent) = self.entities.get_mut(&parent_id) {
                parent.add_child(id);
            }
        }
        self.entities.insert(id, entity);
    }

    /// Remove an entity from every collection. Its children are reparented
    /// to root by the caller (via [`EngineCollections::reparent`]) before
    /// this is called, matching §4.7's destroy protocol.
    pub fn unregister(&mut self, id: u64) -> Option<SpaceEntity> {
        self.avatars.remove(&id);
        self.objects.remove(&id);
        self.root_hierarchy.remove(&id);
        self.last_patch_sent.remove(&id);
        self.entities.remove(&id)
    }

    /// Engine-level hierarchy resolution hook passed to
    /// `SpaceEntity::commit_parent`: updates the old/new parent's child
    /// list and the root-hierarchy set.
    pub fn reparent(&mut self, child_id: u64, old_parent: Option<u64>, new_parent: Option<u64>) {
        if let Some(old_id) = old_parent {
            if let Some(old) = self.entities.get_mut(&old_id) {
                old.remove_child(child_id);
            }
        }
        match new_parent {
            Some(new_id) => {
                self.root_hierarchy.remove(&child_id);
                if let Some(new) = self.entities.get_mut(&new_id) {
                    new.add_child(child_id);
                }
            }
            None => {
                self.root_hierarchy.insert(child_id);
            }
        }
    }

    /// `true` if `descendant_of` walking up from `candidate_parent` would
    /// eventually reach `child_id` — i.e. setting `child_id`'s parent to
    /// `candidate_parent` would create a cycle.
    #[must_use]
    pub fn would_cycle(&self, child_id: u64, candidate_parent: u64) -> bool {
        let mut current = Some(candidate_parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == child_id {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                // Already-corrupt chain; treat as a cycle rather than loop forever.
                return true;
            }
            current = self.entities.get(&id).and_then(SpaceEntity::parent_id);
        }
        false
    }

    pub fn queue_add(&mut self, entity: SpaceEntity) {
        self.pending_adds.push(entity);
    }

    pub fn drain_pending_adds(&mut self) -> Vec<SpaceEntity> {
        std::mem::take(&mut self.pending_adds)
    }

    pub fn queue_remove(&mut self, id: u64) {
        self.pending_removes.push(id);
    }

    pub fn drain_pending_removes(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.pending_removes)
    }

    pub fn queue_incoming_patch(&mut self, patch: ObjectPatch) {
        self.pending_incoming_patches.push_back(patch);
    }

    pub fn drain_incoming_patches(&mut self) -> Vec<ObjectPatch> {
        self.pending_incoming_patches.drain(..).collect()
    }

    /// Enqueue `id` into the de-duplicated pending-outbound set (§4.4
    /// `queueUpdate`).
    pub fn queue_outbound(&mut self, id: u64) {
        self.pending_outbound.insert(id);
    }

    #[must_use]
    pub fn is_pending_outbound(&self, id: u64) -> bool {
        self.pending_outbound.contains(&id)
    }

    #[must_use]
    pub fn last_patch_sent(&self, id: u64) -> Option<Instant> {
        self.last_patch_sent.get(&id).copied()
    }

    pub fn mark_patch_sent(&mut self, id: u64, at: Instant) {
        self.last_patch_sent.insert(id, at);
        self.pending_outbound.remove(&id);
    }

    pub fn drop_from_outbound(&mut self, id: u64) {
        self.pending_outbound.remove(&id);
    }

    /// Snapshot of ids currently queued for outbound send, for iteration
    /// without holding a mutable borrow on `self`.
    #[must_use]
    pub fn pending_outbound_ids(&self) -> Vec<u64> {
        self.pending_outbound.iter().copied().collect()
    }

    /// Resolve `entity_id`'s staged parent change (§4.4 `resolveHierarchy`):
    /// an unresolvable or cycle-forming target is logged and dropped,
    /// leaving the entity's current parent untouched; anything else commits
    /// and updates the old/new parent's child lists and the root set.
    pub fn resolve_staged_parent(&mut self, entity_id: u64) {
        let Some(mut entity) = self.entities.remove(&entity_id) else {
            return;
        };

        if let Some(update) = entity.take_staged_parent() {
            let resolved: Option<Option<u64>> = match update {
                ParentUpdate::NoChange => None,
                ParentUpdate::Remove => Some(None),
                ParentUpdate::Set(parent_id) => {
                    if !self.entities.contains_key(&parent_id) {
                        tracing::error!(entity_id, parent_id, "parent entity not found, leaving entity's parent unchanged");
                        None
                    } else if parent_id == entity_id || self.would_cycle(entity_id, parent_id) {
                        tracing::error!(entity_id, parent_id, "parent change would create a cycle, rejected");
                        None
                    } else {
                        Some(Some(parent_id))
                    }
                }
            };

            if let Some(new_parent) = resolved {
                entity.commit_parent(new_parent, &mut |child, old, new| {
                    self.reparent(child, old, new);
                });
            }
        }

        self.entities.insert(entity_id, entity);
    }

    pub fn set_callbacks(&mut self, id: u64, callbacks: EntityCallbacks) {
        self.callbacks.insert(id, callbacks);
    }

    pub fn notify_update(&mut self, id: u64, flags: UpdateFlags) {
        if let Some(cb) = self.callbacks.get_mut(&id) {
            if let Some(on_update) = cb.on_update.as_mut() {
                on_update(flags);
            }
        }
    }

    pub fn notify_patch_sent(&mut self, id: u64) {
        if let Some(cb) = self.callbacks.get_mut(&id) {
            if let Some(on_patch_sent) = cb.on_patch_sent.as_mut() {
                on_patch_sent();
            }
        }
    }

    /// Remove and invoke `id`'s destroy callback with the outcome. A no-op
    /// if none was registered.
    pub fn notify_destroyed(&mut self, id: u64, success: bool) {
        if let Some(cb) = self.callbacks.remove(&id) {
            if let Some(on_destroy) = cb.on_destroy {
                on_destroy(success);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_math::Transform;
    use csp_wire::EntityType;

    fn entity(id: u64, owner: u64) -> SpaceEntity {
        SpaceEntity::new(id, EntityType::Object, owner, "e", Transform::IDENTITY)
    }

    #[test]
    fn test_register_rootless_entity_is_in_root_hierarchy() {
        let mut collections = EngineCollections::new();
        collections.register(entity(1, 1));
        assert_eq!(collections.root_hierarchy().count(), 1);
        assert_eq!(collections.num_objects(), 1);
    }

    #[test]
    fn test_reparent_moves_out_of_root_hierarchy() {
        let mut collections = EngineCollections::new();
        collections.register(entity(1, 1));
        collections.register(entity(2, 1));
        collections.reparent(2, None, Some(1));
        assert_eq!(collections.root_hierarchy().count(), 1);
        assert_eq!(collections.get(1).unwrap().children(), &[2]);
    }

    #[test]
    fn test_reparent_to_none_restores_root_hierarchy() {
        let mut collections = EngineCollections::new();
        collections.register(entity(1, 1));
        collections.register(entity(2, 1));
        collections.reparent(2, None, Some(1));
        collections.reparent(2, Some(1), None);
        assert_eq!(collections.root_hierarchy().count(), 2);
        assert!(collections.get(1).unwrap().children().is_empty());
    }

    #[test]
    fn test_would_cycle_detects_self_parent() {
        let mut collections = EngineCollections::new();
        collections.register(entity(1, 1));
        collections.register(entity(2, 1));
        collections.reparent(2, None, Some(1));
        assert!(collections.would_cycle(1, 2));
        assert!(!collections.would_cycle(2, 1));
    }

    #[test]
    fn test_unregister_removes_from_every_collection() {
        let mut collections = EngineCollections::new();
        collections.register(entity(1, 1));
        collections.unregister(1);
        assert_eq!(collections.num_entities(), 0);
        assert_eq!(collections.root_hierarchy().count(), 0);
    }
}
