//! Entity transform: position, rotation, scale.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A transform representing position, rotation, and (non-uniform) scale.
///
/// Stored on a [`SpaceEntity`](../csp_entity/struct.SpaceEntity.html) this is
/// always *local*: when the entity has a parent, these fields are relative
/// to the parent's frame. Use [`compose`] to derive the global transform by
/// walking the parent chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position and default
    /// rotation/scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Compute the 4×4 model matrix for this transform.
    #[must_use]
    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Composes a child's local [`Transform`] with its parent's global
/// [`Transform`], returning the child's global transform.
///
/// Position is rotated and scaled into the parent's frame then offset by the
/// parent's position; rotation and scale multiply. Calling this repeatedly
/// while walking a parent chain (root first) produces each ancestor's global
/// transform in turn.
#[must_use]
pub fn compose(parent_global: &Transform, child_local: &Transform) -> Transform {
    let position = parent_global.position
        + parent_global.rotation * (parent_global.scale * child_local.position);
    let rotation = parent_global.rotation * child_local.rotation;
    let scale = parent_global.scale * child_local.scale;
    Transform {
        position,
        rotation,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform::IDENTITY;
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_compose_with_identity_parent_is_local() {
        let child = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let global = compose(&Transform::IDENTITY, &child);
        assert_eq!(global.position, child.position);
    }

    #[test]
    fn test_compose_translates_by_parent_position() {
        let parent = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let global = compose(&parent, &child);
        assert_eq!(global.position, Vec3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let bytes = rmp_serde::to_vec(&t).unwrap();
        let restored: Transform = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(t, restored);
    }
}
