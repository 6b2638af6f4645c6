//! [`SpaceEntity`] — the client-side replicated object: transform, identity,
//! hierarchy, components, and (optionally) a script.

use std::collections::{HashMap, HashSet};

use csp_math::Transform;
use csp_script::EntityScript;
use csp_wire::{ComponentType, EntityType, ParentUpdate};
use glam::{Quat, Vec3};

use crate::component::{Component, ComponentDirtyState, COMPONENT_ID_FLOOR};
use crate::error::EntityError;
use crate::flags::UpdateFlags;

/// A decoded, already-demultiplexed remote update, produced by
/// `crate::serializer` from an `ObjectPatch`/`ObjectMessage` by splitting
/// the wire's unified `components` map into view-key and real-component
/// entries. `SpaceEntity` never looks at wire types directly.
#[derive(Debug, Clone, Default)]
pub struct RemoteUpdate {
    pub owner_id: u64,
    pub destroy: bool,
    pub parent_update: ParentUpdate,
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub third_party_platform: Option<String>,
    pub third_party_ref: Option<String>,
    /// `0` is reserved to mean "no selection" on the wire; see
    /// `crate::serializer` for the encode/decode of this sentinel.
    pub selection_client_id: Option<u64>,
    pub components: HashMap<u16, csp_wire::ComponentWire>,
}

/// A property changed by a remote patch, reported back to the caller so the
/// engine can forward it to a subscribed `EntityScript` without every
/// caller re-diffing component state.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedProperty {
    pub component_id: u16,
    pub key: u32,
    pub value: csp_value::ReplicatedValue,
}

/// The client-side replicated object. See §4 of the spec.
pub struct SpaceEntity {
    id: u64,
    entity_type: EntityType,
    is_transferable: bool,
    is_persistent: bool,
    owner_id: u64,
    parent_id: Option<u64>,
    name: String,
    transform: Transform,
    third_party_platform: String,
    third_party_ref: String,
    selection_client_id: Option<u64>,
    children: Vec<u64>,

    staged_name: Option<String>,
    staged_position: Option<Vec3>,
    staged_rotation: Option<Quat>,
    staged_scale: Option<Vec3>,
    staged_third_party_platform: Option<String>,
    staged_third_party_ref: Option<String>,
    staged_parent: Option<ParentUpdate>,
    selection_dirty: bool,

    components: HashMap<u16, Component>,
    dirty_components: HashMap<u16, ComponentDirtyState>,
    transient_deletions: HashSet<u16>,
    next_component_id: u16,

    script: Option<EntityScript>,
}

impl SpaceEntity {
    /// Construct a brand-new entity owned by `owner_id`. Used by the engine
    /// when it materializes the result of `GenerateObjectIds` +
    /// `CreateEntity`/`CreateAvatar`.
    #[must_use]
    pub fn new(
        id: u64,
        entity_type: EntityType,
        owner_id: u64,
        name: impl Into<String>,
        transform: Transform,
    ) -> Self {
        let (is_transferable, is_persistent) = match entity_type {
            EntityType::Avatar => (false, false),
            EntityType::Object => (true, true),
        };
        Self {
            id,
            entity_type,
            is_transferable,
            is_persistent,
            owner_id,
            parent_id: None,
            name: name.into(),
            transform,
            third_party_platform: String::new(),
            third_party_ref: String::new(),
            selection_client_id: None,
            children: Vec::new(),
            staged_name: None,
            staged_position: None,
            staged_rotation: None,
            staged_scale: None,
            staged_third_party_platform: None,
            staged_third_party_ref: None,
            staged_parent: None,
            selection_dirty: false,
            components: HashMap::new(),
            dirty_components: HashMap::new(),
            transient_deletions: HashSet::new(),
            next_component_id: COMPONENT_ID_FLOOR,
            script: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    #[must_use]
    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<u64> {
        self.parent_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub fn third_party_platform(&self) -> &str {
        &self.third_party_platform
    }

    #[must_use]
    pub fn third_party_ref(&self) -> &str {
        &self.third_party_ref
    }

    #[must_use]
    pub fn selection_client_id(&self) -> Option<u64> {
        self.selection_client_id
    }

    #[must_use]
    pub fn children(&self) -> &[u64] {
        &self.children
    }

    #[must_use]
    pub fn is_transferable(&self) -> bool {
        self.is_transferable
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.is_persistent
    }

    #[must_use]
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    #[must_use]
    pub fn component(&self, component_id: u16) -> Option<&Component> {
        self.components.get(&component_id)
    }

    pub fn script(&self) -> Option<&EntityScript> {
        self.script.as_ref()
    }

    pub fn script_mut(&mut self) -> Option<&mut EntityScript> {
        self.script.as_mut()
    }

    // -- Staged-state accessors for `crate::serializer` --------------------
    //
    // A patch must carry the pre-commit (staged) view of an entity's state,
    // so these are read-only peeks, not `take`s — `apply_local_patch` is
    // still what actually commits and clears them.

    #[must_use]
    pub fn staged_name(&self) -> Option<&str> {
        self.staged_name.as_deref()
    }

    #[must_use]
    pub fn staged_position(&self) -> Option<Vec3> {
        self.staged_position
    }

    #[must_use]
    pub fn staged_rotation(&self) -> Option<Quat> {
        self.staged_rotation
    }

    #[must_use]
    pub fn staged_scale(&self) -> Option<Vec3> {
        self.staged_scale
    }

    #[must_use]
    pub fn staged_third_party_platform(&self) -> Option<&str> {
        self.staged_third_party_platform.as_deref()
    }

    #[must_use]
    pub fn staged_third_party_ref(&self) -> Option<&str> {
        self.staged_third_party_ref.as_deref()
    }

    #[must_use]
    pub fn is_selection_dirty(&self) -> bool {
        self.selection_dirty
    }

    #[must_use]
    pub fn peek_staged_parent(&self) -> Option<ParentUpdate> {
        self.staged_parent
    }

    #[must_use]
    pub fn dirty_component_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.dirty_components.keys().copied()
    }

    #[must_use]
    pub fn transient_deletion_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.transient_deletions.iter().copied()
    }

    #[must_use]
    pub fn has_pending_local_changes(&self) -> bool {
        self.staged_name.is_some()
            || self.staged_position.is_some()
            || self.staged_rotation.is_some()
            || self.staged_scale.is_some()
            || self.staged_third_party_platform.is_some()
            || self.staged_third_party_ref.is_some()
            || self.staged_parent.is_some()
            || self.selection_dirty
            || !self.dirty_components.is_empty()
            || !self.transient_deletions.is_empty()
    }

    /// `true` if the local client may mutate this entity: it owns it, or the
    /// entity is marked transferable.
    #[must_use]
    pub fn is_modifiable(&self, local_client_id: u64) -> bool {
        self.owner_id == local_client_id || self.is_transferable
    }

    #[must_use]
    pub fn has_avatar_component(&self) -> bool {
        self.components
            .values()
            .any(|c| c.component_type() == ComponentType::Avatar)
    }

    /// Claim ownership for `local_client_id`. Called by the engine's
    /// outbound send protocol when a transferable entity is about to be
    /// mutated locally (§4.7 step 3: "set its owner to the local client").
    pub fn claim_ownership(&mut self, local_client_id: u64) {
        self.owner_id = local_client_id;
    }

    fn check_modifiable(&self, local_client_id: u64) -> Result<(), EntityError> {
        if self.is_modifiable(local_client_id) {
            Ok(())
        } else {
            tracing::error!(entity_id = self.id, "entity is not modifiable by this client");
            Err(EntityError::NonModifiableEntity { entity_id: self.id })
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        let name = name.into();
        if name != self.name {
            self.staged_name = Some(name);
        }
        Ok(())
    }

    pub fn set_position(&mut self, position: Vec3, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        if position != self.transform.position {
            self.staged_position = Some(position);
        }
        Ok(())
    }

    pub fn set_rotation(&mut self, rotation: Quat, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        if rotation != self.transform.rotation {
            self.staged_rotation = Some(rotation);
        }
        Ok(())
    }

    pub fn set_scale(&mut self, scale: Vec3, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        if scale != self.transform.scale {
            self.staged_scale = Some(scale);
        }
        Ok(())
    }

    pub fn set_third_party_platform(
        &mut self,
        platform: impl Into<String>,
        local_client_id: u64,
    ) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        let platform = platform.into();
        if platform != self.third_party_platform {
            self.staged_third_party_platform = Some(platform);
        }
        Ok(())
    }

    pub fn set_third_party_ref(
        &mut self,
        reference: impl Into<String>,
        local_client_id: u64,
    ) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        let reference = reference.into();
        if reference != self.third_party_ref {
            self.staged_third_party_ref = Some(reference);
        }
        Ok(())
    }

    /// Stage a parent change. Resolution (cycle detection, hierarchy commit)
    /// happens engine-side across all entities at tick time, so a single
    /// entity can't tell here whether the parent id is even valid.
    pub fn set_parent_id(&mut self, parent_id: u64, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        self.staged_parent = Some(ParentUpdate::Set(parent_id));
        Ok(())
    }

    pub fn remove_parent(&mut self, local_client_id: u64) -> Result<(), EntityError> {
        self.check_modifiable(local_client_id)?;
        if self.staged_parent.is_some() || self.parent_id.is_some() {
            self.staged_parent = Some(ParentUpdate::Remove);
        } else {
            self.staged_parent = None;
        }
        Ok(())
    }

    /// Claim selection for `local_client_id`. Succeeds iff currently
    /// unselected. Not gated by ownership — selection is advisory UI state,
    /// not a write to owned data.
    pub fn select(&mut self, local_client_id: u64) -> bool {
        if self.selection_client_id.is_some() {
            return false;
        }
        self.selection_client_id = Some(local_client_id);
        self.selection_dirty = true;
        true
    }

    /// Release selection. Succeeds iff currently selected by
    /// `local_client_id`.
    pub fn deselect(&mut self, local_client_id: u64) -> bool {
        if self.selection_client_id != Some(local_client_id) {
            return false;
        }
        self.selection_client_id = None;
        self.selection_dirty = true;
        true
    }

    /// Add a new component of `component_type`, returning its allocated id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateScriptComponent`] if `component_type`
    /// is [`ComponentType::ScriptData`] and this entity already has one
    /// (committed or staged for add).
    pub fn add_component(&mut self, component_type: ComponentType) -> Result<u16, EntityError> {
        if component_type == ComponentType::ScriptData && self.has_script_component() {
            tracing::error!(entity_id = self.id, "duplicate ScriptData component rejected");
            return Err(EntityError::DuplicateScriptComponent { entity_id: self.id });
        }

        let id = self.next_component_id;
        self.next_component_id += 1;
        self.components.insert(id, Component::new(id, component_type));
        self.dirty_components.insert(id, ComponentDirtyState::Add);

        if component_type == ComponentType::ScriptData && self.script.is_none() {
            self.script = Some(EntityScript::new(self.id));
        }

        Ok(id)
    }

    fn has_script_component(&self) -> bool {
        self.components
            .values()
            .any(|c| c.component_type() == ComponentType::ScriptData)
    }

    /// Mark `component_id` for removal. The component remains readable until
    /// the next local patch application; it is then dropped and an
    /// `Invalid`-tagged entry is emitted in the outbound patch.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownComponent`] if no such component exists.
    pub fn remove_component(&mut self, component_id: u16) -> Result<(), EntityError> {
        if !self.components.contains_key(&component_id) {
            return Err(EntityError::UnknownComponent {
                entity_id: self.id,
                component_id,
            });
        }
        self.transient_deletions.insert(component_id);
        Ok(())
    }

    pub fn set_component_property(
        &mut self,
        component_id: u16,
        key: u32,
        value: csp_value::ReplicatedValue,
    ) -> Result<(), EntityError> {
        let component = self
            .components
            .get_mut(&component_id)
            .ok_or(EntityError::UnknownComponent {
                entity_id: self.id,
                component_id,
            })?;
        component.set_property(key, value);
        self.dirty_components
            .entry(component_id)
            .or_insert(ComponentDirtyState::Update);
        Ok(())
    }

    /// Commit every staged local change (transform, identity, component
    /// properties, component add/remove) and report which categories
    /// changed. Parent resolution is handled separately by the engine via
    /// [`SpaceEntity::take_staged_parent`] since it requires visibility
    /// across the whole entity set (cycle detection, unresolved parents).
    pub fn apply_local_patch(&mut self) -> UpdateFlags {
        let mut flags = UpdateFlags::empty();

        if let Some(name) = self.staged_name.take() {
            self.name = name;
            flags |= UpdateFlags::NAME;
        }
        if let Some(position) = self.staged_position.take() {
            self.transform.position = position;
            flags |= UpdateFlags::POSITION;
        }
        if let Some(rotation) = self.staged_rotation.take() {
            self.transform.rotation = rotation;
            flags |= UpdateFlags::ROTATION;
        }
        if let Some(scale) = self.staged_scale.take() {
            self.transform.scale = scale;
            flags |= UpdateFlags::SCALE;
        }
        if let Some(platform) = self.staged_third_party_platform.take() {
            self.third_party_platform = platform;
            flags |= UpdateFlags::THIRD_PARTY_PLATFORM;
        }
        if let Some(reference) = self.staged_third_party_ref.take() {
            self.third_party_ref = reference;
            flags |= UpdateFlags::THIRD_PARTY_REF;
        }
        if self.selection_dirty {
            self.selection_dirty = false;
            flags |= UpdateFlags::SELECTION;
        }

        if !self.dirty_components.is_empty() || !self.transient_deletions.is_empty() {
            flags |= UpdateFlags::COMPONENTS;
        }
        for (id, _state) in self.dirty_components.drain() {
            if let Some(component) = self.components.get_mut(&id) {
                component.commit();
            }
        }
        for id in self.transient_deletions.drain() {
            self.components.remove(&id);
            if self.components.values().all(|c| c.component_type() != ComponentType::ScriptData) {
                self.script = None;
            }
        }

        flags
    }

    /// Take the staged parent change, if any, for engine-side resolution.
    /// Leaves no staged parent behind — the caller is responsible for
    /// calling [`SpaceEntity::commit_parent`] with the resolved id.
    pub fn take_staged_parent(&mut self) -> Option<ParentUpdate> {
        self.staged_parent.take()
    }

    /// Commit an engine-resolved parent id (or `None` to clear it). Returns
    /// `true` if the parent actually changed.
    pub fn commit_parent(&mut self, new_parent: Option<u64>, child_registry: &mut dyn FnMut(u64, Option<u64>, Option<u64>)) -> bool {
        if new_parent == self.parent_id {
            return false;
        }
        let old_parent = self.parent_id;
        self.parent_id = new_parent;
        child_registry(self.id, old_parent, new_parent);
        true
    }

    /// Record `child_id` as a child of this entity.
    ///
    /// Not called internally — hierarchy resolution is engine-level (see
    /// [`SpaceEntity::take_staged_parent`]/[`SpaceEntity::commit_parent`]):
    /// the engine calls this on the *new* parent after resolving a child's
    /// staged parent change.
    pub fn add_child(&mut self, child_id: u64) {
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }

    /// Remove `child_id` from this entity's child list. See
    /// [`SpaceEntity::add_child`].
    pub fn remove_child(&mut self, child_id: u64) {
        self.children.retain(|id| *id != child_id);
    }

    /// Apply a demultiplexed remote update. Returns the categories that
    /// changed plus the list of component properties that changed, so the
    /// engine can forward the latter to a subscribed script. Parent
    /// resolution is staged the same way a local change is (see
    /// [`SpaceEntity::take_staged_parent`]) — local and remote parent
    /// changes are resolved identically, once per tick, across all entities.
    pub fn apply_remote_patch(&mut self, update: RemoteUpdate) -> (UpdateFlags, Vec<ChangedProperty>) {
        let mut flags = UpdateFlags::empty();
        let mut changed = Vec::new();

        self.owner_id = update.owner_id;

        if let Some(name) = update.name {
            if name != self.name {
                self.name = name;
                flags |= UpdateFlags::NAME;
            }
        }
        if let Some(position) = update.position {
            if position != self.transform.position {
                self.transform.position = position;
                flags |= UpdateFlags::POSITION;
            }
        }
        if let Some(rotation) = update.rotation {
            if rotation != self.transform.rotation {
                self.transform.rotation = rotation;
                flags |= UpdateFlags::ROTATION;
            }
        }
        if let Some(scale) = update.scale {
            if scale != self.transform.scale {
                self.transform.scale = scale;
                flags |= UpdateFlags::SCALE;
            }
        }
        if let Some(platform) = update.third_party_platform {
            if platform != self.third_party_platform {
                self.third_party_platform = platform;
                flags |= UpdateFlags::THIRD_PARTY_PLATFORM;
            }
        }
        if let Some(reference) = update.third_party_ref {
            if reference != self.third_party_ref {
                self.third_party_ref = reference;
                flags |= UpdateFlags::THIRD_PARTY_REF;
            }
        }
        if let Some(selection) = update.selection_client_id {
            let resolved = if selection == 0 { None } else { Some(selection) };
            if resolved != self.selection_client_id {
                self.selection_client_id = resolved;
                flags |= UpdateFlags::SELECTION;
            }
        }

        if !matches!(update.parent_update, ParentUpdate::NoChange) {
            self.staged_parent = Some(update.parent_update);
        }

        for (component_id, wire) in update.components {
            if wire.component_type().is_invalid() {
                if self.components.remove(&component_id).is_some() {
                    flags |= UpdateFlags::COMPONENTS;
                    if self.components.values().all(|c| c.component_type() != ComponentType::ScriptData) {
                        self.script = None;
                    }
                }
                continue;
            }

            if let Some(existing) = self.components.get_mut(&component_id) {
                for (key, value) in &wire.properties {
                    changed.push(ChangedProperty {
                        component_id,
                        key: *key,
                        value: value.clone(),
                    });
                }
                existing.apply_remote(wire.properties);
                flags |= UpdateFlags::COMPONENTS;
            } else {
                let mut component = Component::new(component_id, wire.component_type());
                for (key, value) in &wire.properties {
                    changed.push(ChangedProperty {
                        component_id,
                        key: *key,
                        value: value.clone(),
                    });
                }
                component.apply_remote(wire.properties);
                if wire.component_type() == ComponentType::ScriptData && self.script.is_none() {
                    self.script = Some(EntityScript::new(self.id));
                }
                self.components.insert(component_id, component);
                flags |= UpdateFlags::COMPONENTS;
            }
        }

        (flags, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entity() -> SpaceEntity {
        SpaceEntity::new(1, EntityType::Object, 100, "box", Transform::IDENTITY)
    }

    #[test]
    fn test_object_defaults_transferable_and_persistent() {
        let e = new_entity();
        assert!(e.is_transferable());
        assert!(e.is_persistent());
    }

    #[test]
    fn test_avatar_defaults_non_transferable_non_persistent() {
        let e = SpaceEntity::new(1, EntityType::Avatar, 100, "me", Transform::IDENTITY);
        assert!(!e.is_transferable());
        assert!(!e.is_persistent());
    }

    #[test]
    fn test_set_name_by_non_owner_fails() {
        let mut e = new_entity();
        let result = e.set_name("new", 999);
        assert_eq!(result, Err(EntityError::NonModifiableEntity { entity_id: 1 }));
    }

    #[test]
    fn test_set_name_by_owner_stages_and_commits() {
        let mut e = new_entity();
        e.set_name("renamed", 100).unwrap();
        assert_eq!(e.name(), "box", "not visible until committed");
        let flags = e.apply_local_patch();
        assert!(flags.contains(UpdateFlags::NAME));
        assert_eq!(e.name(), "renamed");
    }

    #[test]
    fn test_setting_same_value_is_a_noop() {
        let mut e = new_entity();
        e.set_name("box", 100).unwrap();
        let flags = e.apply_local_patch();
        assert!(flags.is_empty());
    }

    #[test]
    fn test_empty_local_patch_has_no_flags() {
        let mut e = new_entity();
        assert_eq!(e.apply_local_patch(), UpdateFlags::empty());
    }

    #[test]
    fn test_add_component_allocates_from_floor() {
        let mut e = new_entity();
        let id = e.add_component(ComponentType::Other(5)).unwrap();
        assert_eq!(id, COMPONENT_ID_FLOOR);
        let id2 = e.add_component(ComponentType::Other(5)).unwrap();
        assert_eq!(id2, COMPONENT_ID_FLOOR + 1);
    }

    #[test]
    fn test_second_script_component_rejected() {
        let mut e = new_entity();
        e.add_component(ComponentType::ScriptData).unwrap();
        let result = e.add_component(ComponentType::ScriptData);
        assert_eq!(result, Err(EntityError::DuplicateScriptComponent { entity_id: 1 }));
    }

    #[test]
    fn test_script_context_created_with_script_component() {
        let mut e = new_entity();
        assert!(e.script().is_none());
        e.add_component(ComponentType::ScriptData).unwrap();
        assert!(e.script().is_some());
    }

    #[test]
    fn test_remove_component_unknown_errors() {
        let mut e = new_entity();
        let result = e.remove_component(999);
        assert_eq!(
            result,
            Err(EntityError::UnknownComponent {
                entity_id: 1,
                component_id: 999
            })
        );
    }

    #[test]
    fn test_remove_component_readable_until_commit() {
        let mut e = new_entity();
        let id = e.add_component(ComponentType::Other(1)).unwrap();
        e.apply_local_patch();
        e.remove_component(id).unwrap();
        assert!(e.component(id).is_some());
        let flags = e.apply_local_patch();
        assert!(flags.contains(UpdateFlags::COMPONENTS));
        assert!(e.component(id).is_none());
    }

    #[test]
    fn test_select_then_deselect() {
        let mut e = new_entity();
        assert!(e.select(5));
        assert!(!e.select(6), "already selected by someone else");
        assert!(!e.deselect(6), "6 doesn't hold the selection");
        assert!(e.deselect(5));
    }

    #[test]
    fn test_select_is_not_gated_by_ownership() {
        let mut e = new_entity();
        assert!(e.select(999));
    }

    #[test]
    fn test_set_parent_then_remove_parent_same_tick_collapses_to_unchanged() {
        let mut e = new_entity();
        e.set_parent_id(7, 100).unwrap();
        e.remove_parent(100).unwrap();
        let staged = e.take_staged_parent();
        assert_eq!(staged, Some(ParentUpdate::Remove));
        let mut registry = |_id: u64, _old: Option<u64>, _new: Option<u64>| {};
        let changed = e.commit_parent(None, &mut registry);
        assert!(!changed, "already had no parent");
    }

    #[test]
    fn test_apply_remote_patch_tracks_changed_properties() {
        let mut e = new_entity();
        let id = e.add_component(ComponentType::Other(1)).unwrap();
        e.apply_local_patch();

        let mut components = HashMap::new();
        let mut props = HashMap::new();
        props.insert(1, csp_value::ReplicatedValue::Integer(7));
        components.insert(
            id,
            csp_wire::ComponentWire::new(ComponentType::Other(1), props),
        );
        let update = RemoteUpdate {
            owner_id: 100,
            components,
            ..Default::default()
        };
        let (flags, changed) = e.apply_remote_patch(update);
        assert!(flags.contains(UpdateFlags::COMPONENTS));
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].component_id, id);
    }

    #[test]
    fn test_apply_remote_patch_deletes_invalid_component() {
        let mut e = new_entity();
        let id = e.add_component(ComponentType::Other(1)).unwrap();
        e.apply_local_patch();

        let mut components = HashMap::new();
        components.insert(id, csp_wire::ComponentWire::deleted());
        let update = RemoteUpdate {
            owner_id: 100,
            components,
            ..Default::default()
        };
        let (flags, _changed) = e.apply_remote_patch(update);
        assert!(flags.contains(UpdateFlags::COMPONENTS));
        assert!(e.component(id).is_none());
    }

    #[test]
    fn test_apply_empty_remote_patch_is_noop() {
        let mut e = new_entity();
        let update = RemoteUpdate {
            owner_id: e.owner_id(),
            ..Default::default()
        };
        let (flags, changed) = e.apply_remote_patch(update);
        assert!(flags.is_empty());
        assert!(changed.is_empty());
    }
}
