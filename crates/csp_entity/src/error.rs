//! The entity layer's stable error taxonomy (§7 of the spec).

/// Errors produced by mutating a [`crate::SpaceEntity`] or its components.
///
/// Per the propagation policy, these never cross a callback boundary as a
/// panic — a setter that returns `Err` has already logged at error level and
/// left the entity's local state unchanged (a no-op), matching "self-
/// inflicted violations... cause the current operation to no-op."
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EntityError {
    /// A second `ScriptData` component was added to an entity that already
    /// has one, committed or staged.
    #[error("entity {entity_id} already has a ScriptData component")]
    DuplicateScriptComponent { entity_id: u64 },

    /// A mutation was attempted on an entity the local client does not own
    /// and that is not transferable.
    #[error("entity {entity_id} is not modifiable by the local client")]
    NonModifiableEntity { entity_id: u64 },

    /// `SetParentId` would have introduced a cycle in the parent chain.
    #[error("setting parent {parent_id} on entity {entity_id} would create a cycle")]
    ParentCycle { entity_id: u64, parent_id: u64 },

    /// A component id was requested that does not exist on this entity.
    #[error("entity {entity_id} has no component {component_id}")]
    UnknownComponent { entity_id: u64, component_id: u16 },
}
