//! The two frame shapes that flow through the hub transport: a full
//! snapshot ([`ObjectMessage`]) and a delta ([`ObjectPatch`]).

use std::collections::HashMap;

use csp_value::ReplicatedValue;
use serde::{Deserialize, Serialize};

use crate::component_type::ComponentType;
use crate::entity_type::EntityType;

/// A single component's wire representation: its type tag plus its keyed
/// property payload.
///
/// The engine does not inspect the payload of a component whose
/// [`ComponentType`] it does not recognise — `properties` round-trips
/// unchanged. A `type` of [`ComponentType::Invalid`] denotes removal; its
/// `properties` map is always empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentWire {
    pub type_tag: u16,
    pub properties: HashMap<u32, ReplicatedValue>,
}

impl ComponentWire {
    #[must_use]
    pub fn new(component_type: ComponentType, properties: HashMap<u32, ReplicatedValue>) -> Self {
        Self {
            type_tag: component_type.to_tag(),
            properties,
        }
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        ComponentType::from_tag(self.type_tag)
    }

    /// The deletion marker: an `Invalid`-tagged component with no properties.
    #[must_use]
    pub fn deleted() -> Self {
        Self::new(ComponentType::Invalid, HashMap::new())
    }
}

/// Full-state snapshot of one entity, as sent on `OnObjectMessage` /
/// `SendObjectMessage`.
///
/// Field order is significant: the wire encoding is a positional array,
/// matching the hub's polyglot wire format (`[id, type, isTransferable,
/// isPersistent, ownerId, parentId-or-null, components-map]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectMessage {
    pub id: u64,
    pub entity_type: EntityType,
    pub is_transferable: bool,
    pub is_persistent: bool,
    pub owner_id: u64,
    pub parent_id: Option<u64>,
    pub components: HashMap<u16, ComponentWire>,
}

/// How an [`ObjectPatch`] changes an entity's parent.
///
/// Mirrors the three-way tuple the hub actually sends:
/// `[false, null]` (no change), `[true, null]` (remove parent), or
/// `[true, parentId]` (set parent).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ParentUpdate {
    #[default]
    NoChange,
    Remove,
    Set(u64),
}

/// Delta frame for one entity, as sent on `OnObjectPatch` /
/// `SendObjectPatches`.
///
/// Absent keys in `components` mean "unchanged". A component entry whose
/// [`ComponentWire::component_type`] is [`ComponentType::Invalid`] means
/// that component was removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectPatch {
    pub id: u64,
    pub owner_id: u64,
    pub destroy: bool,
    pub parent_update: ParentUpdate,
    pub components: HashMap<u16, ComponentWire>,
}

impl ObjectPatch {
    /// An empty patch: no component changes, no parent update, not a
    /// destroy. Applying this to an entity must be a no-op (§8).
    #[must_use]
    pub fn empty(id: u64, owner_id: u64) -> Self {
        Self {
            id,
            owner_id,
            destroy: false,
            parent_update: ParentUpdate::NoChange,
            components: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.destroy
            && matches!(self.parent_update, ParentUpdate::NoChange)
            && self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_is_empty() {
        let patch = ObjectPatch::empty(1, 1);
        assert!(patch.is_empty());
    }

    #[test]
    fn test_component_wire_deleted_marker() {
        let deleted = ComponentWire::deleted();
        assert!(deleted.component_type().is_invalid());
        assert!(deleted.properties.is_empty());
    }

    #[test]
    fn test_object_message_roundtrip() {
        let mut components = HashMap::new();
        components.insert(
            65,
            ComponentWire::new(ComponentType::ScriptData, HashMap::new()),
        );
        let msg = ObjectMessage {
            id: 42,
            entity_type: EntityType::Avatar,
            is_transferable: false,
            is_persistent: false,
            owner_id: 7,
            parent_id: None,
            components,
        };
        let bytes = crate::codec::encode(&msg).unwrap();
        let restored: ObjectMessage = crate::codec::decode(&bytes).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn test_parent_update_variants_roundtrip() {
        for update in [ParentUpdate::NoChange, ParentUpdate::Remove, ParentUpdate::Set(9)] {
            let bytes = crate::codec::encode(&update).unwrap();
            let restored: ParentUpdate = crate::codec::decode(&bytes).unwrap();
            assert_eq!(update, restored);
        }
    }
}
