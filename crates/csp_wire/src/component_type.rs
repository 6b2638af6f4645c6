//! The component type tag carried in every [`crate::ComponentWire`].

use serde::{Deserialize, Serialize};

/// The open set of component types the wire protocol can carry.
///
/// The engine only treats two variants as semantically meaningful:
/// [`ComponentType::ScriptData`] (at most one per entity — see
/// `csp_entity::Component::add`) and [`ComponentType::Avatar`] (used to
/// partition entities into avatars vs. objects). Every other concrete
/// component kind (animation, audio, light, ...) is opaque schema to this
/// engine and round-trips through [`ComponentType::Other`] untouched.
///
/// `Invalid` is not a real component kind — a component carrying it in a
/// patch denotes that component's removal (see §4.2 of the spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Invalid,
    Avatar,
    ScriptData,
    /// Pseudo-component used to carry a single entity-level ("view")
    /// property — name, transform, selection, ... — through the same
    /// `components` map a real component travels through. See
    /// `csp_entity`'s view-key constants.
    View,
    /// An opaque, concrete component type this engine does not interpret,
    /// identified by its raw wire tag.
    Other(u16),
}

impl ComponentType {
    /// The reserved wire tag for [`ComponentType::Invalid`].
    pub const INVALID_TAG: u16 = 0;
    const AVATAR_TAG: u16 = 1;
    const SCRIPT_DATA_TAG: u16 = 2;
    const VIEW_TAG: u16 = u16::MAX;

    /// Converts to the raw wire tag.
    #[must_use]
    pub fn to_tag(self) -> u16 {
        match self {
            ComponentType::Invalid => Self::INVALID_TAG,
            ComponentType::Avatar => Self::AVATAR_TAG,
            ComponentType::ScriptData => Self::SCRIPT_DATA_TAG,
            ComponentType::View => Self::VIEW_TAG,
            ComponentType::Other(tag) => tag,
        }
    }

    /// Converts from a raw wire tag.
    #[must_use]
    pub fn from_tag(tag: u16) -> Self {
        match tag {
            Self::INVALID_TAG => ComponentType::Invalid,
            Self::AVATAR_TAG => ComponentType::Avatar,
            Self::SCRIPT_DATA_TAG => ComponentType::ScriptData,
            Self::VIEW_TAG => ComponentType::View,
            other => ComponentType::Other(other),
        }
    }

    /// `true` for the soft-delete marker.
    #[must_use]
    pub fn is_invalid(self) -> bool {
        matches!(self, ComponentType::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for ty in [
            ComponentType::Invalid,
            ComponentType::Avatar,
            ComponentType::ScriptData,
            ComponentType::View,
            ComponentType::Other(9001),
        ] {
            assert_eq!(ComponentType::from_tag(ty.to_tag()), ty);
        }
    }

    #[test]
    fn test_invalid_marker() {
        assert!(ComponentType::Invalid.is_invalid());
        assert!(!ComponentType::Avatar.is_invalid());
    }
}
