//! The entity's role: avatar or plain object.

use serde::{Deserialize, Serialize};

/// What kind of thing a [`crate::ObjectMessage`] / a `SpaceEntity` is.
///
/// Avatars are transient and non-transferable by default; objects default to
/// persistent and transferable (see `SpaceEntity` invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityType {
    Avatar = 0,
    Object = 1,
}
