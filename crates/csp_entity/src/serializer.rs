//! Bidirectional mapping between [`SpaceEntity`] and the wire frames defined
//! in `csp_wire`.
//!
//! The wire carries one unified `components` map per frame, but
//! `SpaceEntity` draws a line between entity-level ("view") properties —
//! name, transform, third-party identity, selection — and real components.
//! This module is where that line gets drawn: view properties are packed
//! into (and unpacked from) pseudo-components tagged [`ComponentType::View`]
//! at fixed, reserved keys (`1..=64`, see `crate::component`).

use std::collections::HashMap;

use csp_value::ReplicatedValue;
use csp_wire::{ComponentType, ComponentWire, ObjectMessage, ObjectPatch, ParentUpdate};
use glam::{Quat, Vec3, Vec4};

use crate::entity::{RemoteUpdate, SpaceEntity};

/// The reserved view-key id space, packed as a single pseudo-component at
/// this wire id. Real components are allocated starting at
/// `crate::component::COMPONENT_ID_FLOOR` (65), so this never collides.
const VIEW_COMPONENT_ID: u16 = 1;

const KEY_NAME: u32 = 1;
const KEY_POSITION: u32 = 2;
const KEY_ROTATION: u32 = 3;
const KEY_SCALE: u32 = 4;
const KEY_THIRD_PARTY_PLATFORM: u32 = 5;
const KEY_THIRD_PARTY_REF: u32 = 6;
const KEY_SELECTION: u32 = 7;

/// Sentinel written for "no selection" — `ReplicatedValue` has no concept of
/// absence, and client ids are assumed never to be `0` (see
/// `csp_transport::HubTransport::generate_object_ids`).
const NO_SELECTION: u64 = 0;

fn quat_to_value(q: Quat) -> ReplicatedValue {
    ReplicatedValue::Vector4(Vec4::new(q.x, q.y, q.z, q.w))
}

fn value_to_quat(v: &ReplicatedValue) -> Quat {
    let v4 = v.get_vec4();
    Quat::from_xyzw(v4.x, v4.y, v4.z, v4.w)
}

fn vec3_to_value(v: Vec3) -> ReplicatedValue {
    ReplicatedValue::Vector3(v)
}

/// Encodes a full-state snapshot of `entity` — its committed state only —
/// suitable for `SendObjectMessage` / the initial upload of a newly created
/// entity.
#[must_use]
pub fn encode_message(entity: &SpaceEntity) -> ObjectMessage {
    let mut view = HashMap::new();
    view.insert(KEY_NAME, ReplicatedValue::String(entity.name().to_string()));
    view.insert(KEY_POSITION, vec3_to_value(entity.transform().position));
    view.insert(KEY_ROTATION, quat_to_value(entity.transform().rotation));
    view.insert(KEY_SCALE, vec3_to_value(entity.transform().scale));
    view.insert(
        KEY_THIRD_PARTY_PLATFORM,
        ReplicatedValue::String(entity.third_party_platform().to_string()),
    );
    view.insert(
        KEY_THIRD_PARTY_REF,
        ReplicatedValue::String(entity.third_party_ref().to_string()),
    );
    view.insert(
        KEY_SELECTION,
        ReplicatedValue::Integer(entity.selection_client_id().unwrap_or(NO_SELECTION) as i64),
    );

    let mut components = HashMap::new();
    components.insert(VIEW_COMPONENT_ID, ComponentWire::new(ComponentType::View, view));
    for component in entity.components() {
        components.insert(
            component.id(),
            ComponentWire::new(component.component_type(), component.committed_properties().clone()),
        );
    }

    ObjectMessage {
        id: entity.id(),
        entity_type: entity.entity_type(),
        is_transferable: entity.is_transferable(),
        is_persistent: entity.is_persistent(),
        owner_id: entity.owner_id(),
        parent_id: entity.parent_id(),
        components,
    }
}

/// Encodes the delta patch for `entity`'s *staged* (not-yet-committed)
/// changes. Must be called before [`SpaceEntity::apply_local_patch`] commits
/// them away. Returns `None` if there is nothing to send.
#[must_use]
pub fn encode_local_patch(entity: &SpaceEntity) -> Option<ObjectPatch> {
    if !entity.has_pending_local_changes() {
        return None;
    }

    let mut view = HashMap::new();
    if let Some(name) = entity.staged_name() {
        view.insert(KEY_NAME, ReplicatedValue::String(name.to_string()));
    }
    if let Some(position) = entity.staged_position() {
        view.insert(KEY_POSITION, vec3_to_value(position));
    }
    if let Some(rotation) = entity.staged_rotation() {
        view.insert(KEY_ROTATION, quat_to_value(rotation));
    }
    if let Some(scale) = entity.staged_scale() {
        view.insert(KEY_SCALE, vec3_to_value(scale));
    }
    if let Some(platform) = entity.staged_third_party_platform() {
        view.insert(KEY_THIRD_PARTY_PLATFORM, ReplicatedValue::String(platform.to_string()));
    }
    if let Some(reference) = entity.staged_third_party_ref() {
        view.insert(KEY_THIRD_PARTY_REF, ReplicatedValue::String(reference.to_string()));
    }
    if entity.is_selection_dirty() {
        view.insert(
            KEY_SELECTION,
            ReplicatedValue::Integer(entity.selection_client_id().unwrap_or(NO_SELECTION) as i64),
        );
    }

    let mut components = HashMap::new();
    if !view.is_empty() {
        components.insert(VIEW_COMPONENT_ID, ComponentWire::new(ComponentType::View, view));
    }
    for id in entity.dirty_component_ids() {
        if let Some(component) = entity.component(id) {
            components.insert(
                id,
                ComponentWire::new(component.component_type(), component.staged_properties().clone()),
            );
        }
    }
    for id in entity.transient_deletion_ids() {
        components.insert(id, ComponentWire::deleted());
    }

    Some(ObjectPatch {
        id: entity.id(),
        owner_id: entity.owner_id(),
        destroy: false,
        parent_update: entity.peek_staged_parent().unwrap_or(ParentUpdate::NoChange),
        components,
    })
}

/// Decodes a wire [`ObjectPatch`] into a [`RemoteUpdate`], splitting the
/// unified `components` map back into view-key fields and real component
/// entries. The view pseudo-component, if present, is consumed entirely and
/// does not appear in the returned `components` map.
#[must_use]
pub fn decode_patch(patch: ObjectPatch) -> RemoteUpdate {
    let mut update = RemoteUpdate {
        owner_id: patch.owner_id,
        destroy: patch.destroy,
        parent_update: patch.parent_update,
        ..Default::default()
    };

    let mut components = patch.components;
    if let Some(view) = components.remove(&VIEW_COMPONENT_ID) {
        if view.component_type() == ComponentType::View {
            if let Some(v) = view.properties.get(&KEY_NAME) {
                update.name = Some(v.get_string().to_string());
            }
            if let Some(v) = view.properties.get(&KEY_POSITION) {
                update.position = Some(v.get_vec3());
            }
            if let Some(v) = view.properties.get(&KEY_ROTATION) {
                update.rotation = Some(value_to_quat(v));
            }
            if let Some(v) = view.properties.get(&KEY_SCALE) {
                update.scale = Some(v.get_vec3());
            }
            if let Some(v) = view.properties.get(&KEY_THIRD_PARTY_PLATFORM) {
                update.third_party_platform = Some(v.get_string().to_string());
            }
            if let Some(v) = view.properties.get(&KEY_THIRD_PARTY_REF) {
                update.third_party_ref = Some(v.get_string().to_string());
            }
            if let Some(v) = view.properties.get(&KEY_SELECTION) {
                update.selection_client_id = Some(v.get_int() as u64);
            }
        }
    }
    update.components = components;

    update
}

/// Decodes a full-state [`ObjectMessage`] into a freshly constructed
/// [`SpaceEntity`]. Used when the hub sends a snapshot for an entity the
/// client hasn't seen yet (`OnObjectMessage` for scope entry, or the
/// response to `PageScopedObjects`).
#[must_use]
pub fn decode_message(message: ObjectMessage) -> SpaceEntity {
    let mut components = message.components;
    let view = components.remove(&VIEW_COMPONENT_ID);

    let name = view
        .as_ref()
        .and_then(|v| v.properties.get(&KEY_NAME))
        .map(|v| v.get_string().to_string())
        .unwrap_or_default();
    let position = view
        .as_ref()
        .and_then(|v| v.properties.get(&KEY_POSITION))
        .map(ReplicatedValue::get_vec3)
        .unwrap_or(Vec3::ZERO);
    let rotation = view
        .as_ref()
        .and_then(|v| v.properties.get(&KEY_ROTATION))
        .map(value_to_quat)
        .unwrap_or(Quat::IDENTITY);
    let scale = view
        .as_ref()
        .and_then(|v| v.properties.get(&KEY_SCALE))
        .map(ReplicatedValue::get_vec3)
        .unwrap_or(Vec3::ONE);

    let mut entity = SpaceEntity::new(
        message.id,
        message.entity_type,
        message.owner_id,
        name,
        csp_math::Transform { position, rotation, scale },
    );

    if let Some(view) = &view {
        if let Some(v) = view.properties.get(&KEY_THIRD_PARTY_PLATFORM) {
            entity.set_third_party_platform(v.get_string(), message.owner_id).ok();
        }
        if let Some(v) = view.properties.get(&KEY_THIRD_PARTY_REF) {
            entity.set_third_party_ref(v.get_string(), message.owner_id).ok();
        }
    }
    entity.apply_local_patch();

    if let Some(parent_id) = message.parent_id {
        let mut registry = |_id: u64, _old: Option<u64>, _new: Option<u64>| {};
        entity.commit_parent(Some(parent_id), &mut registry);
    }

    let update = RemoteUpdate {
        owner_id: message.owner_id,
        components,
        selection_client_id: view
            .as_ref()
            .and_then(|v| v.properties.get(&KEY_SELECTION))
            .map(|v| v.get_int() as u64),
        ..Default::default()
    };
    entity.apply_remote_patch(update);

    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_math::Transform;
    use csp_wire::EntityType;

    #[test]
    fn test_encode_message_roundtrips_through_decode() {
        let mut e = SpaceEntity::new(1, EntityType::Object, 100, "box", Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        e.set_third_party_platform("unity", 100).unwrap();
        e.apply_local_patch();

        let message = encode_message(&e);
        let restored = decode_message(message);
        assert_eq!(restored.id(), 1);
        assert_eq!(restored.name(), "box");
        assert_eq!(restored.transform().position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(restored.third_party_platform(), "unity");
    }

    #[test]
    fn test_encode_local_patch_none_when_clean() {
        let e = SpaceEntity::new(1, EntityType::Object, 100, "box", Transform::IDENTITY);
        assert!(encode_local_patch(&e).is_none());
    }

    #[test]
    fn test_encode_local_patch_carries_staged_name_only() {
        let mut e = SpaceEntity::new(1, EntityType::Object, 100, "box", Transform::IDENTITY);
        e.set_name("renamed", 100).unwrap();
        let patch = encode_local_patch(&e).unwrap();
        let view = patch.components.get(&VIEW_COMPONENT_ID).unwrap();
        assert_eq!(view.properties.len(), 1);
        assert_eq!(view.properties.get(&KEY_NAME).unwrap().get_string(), "renamed");
    }

    #[test]
    fn test_decode_patch_splits_view_from_real_components() {
        let mut patch = ObjectPatch::empty(1, 100);
        let mut view = HashMap::new();
        view.insert(KEY_NAME, ReplicatedValue::String("hello".into()));
        patch.components.insert(VIEW_COMPONENT_ID, ComponentWire::new(ComponentType::View, view));
        patch.components.insert(65, ComponentWire::new(ComponentType::Other(3), HashMap::new()));

        let update = decode_patch(patch);
        assert_eq!(update.name.as_deref(), Some("hello"));
        assert_eq!(update.components.len(), 1);
        assert!(update.components.contains_key(&65));
    }

    #[test]
    fn test_quat_roundtrips_through_value() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        let restored = value_to_quat(&quat_to_value(q));
        assert!((restored.x - q.x).abs() < 1e-6);
        assert!((restored.w - q.w).abs() < 1e-6);
    }
}
