//! Property-key convention for the `Avatar` component's payload.
//!
//! The spec treats concrete component semantics as opaque schema (§1); the
//! one exception is the generic `AvatarComponent` shape `create_avatar`
//! itself populates, since §4.5 names its fields explicitly.

use std::collections::HashMap;

use csp_entity::SpaceEntity;
use csp_value::ReplicatedValue;
use csp_wire::ComponentType;

use crate::engine::CreateAvatarParams;
use crate::error::EngineError;

pub const KEY_AVATAR_ID: u32 = 65;
pub const KEY_STATE: u32 = 66;
pub const KEY_PLAY_MODE: u32 = 67;
pub const KEY_IS_VISIBLE: u32 = 68;

/// Add and populate the `Avatar` component on a freshly created entity.
///
/// # Errors
///
/// Returns [`EngineError::Entity`] if the entity already carries a
/// `ScriptData`/`Avatar` component (never true for a brand-new entity, but
/// propagated rather than unwrapped to honour the no-panic policy).
pub fn attach_avatar_component(entity: &mut SpaceEntity, params: &CreateAvatarParams) -> Result<(), EngineError> {
    let component_id = entity.add_component(ComponentType::Avatar)?;
    let mut properties = HashMap::new();
    properties.insert(KEY_AVATAR_ID, ReplicatedValue::String(params.avatar_id.clone()));
    properties.insert(KEY_STATE, ReplicatedValue::String(params.avatar_state.clone()));
    properties.insert(KEY_PLAY_MODE, ReplicatedValue::String(params.play_mode.clone()));
    properties.insert(KEY_IS_VISIBLE, ReplicatedValue::Boolean(params.is_visible));
    for (key, value) in properties {
        entity.set_component_property(component_id, key, value)?;
    }
    Ok(())
}
