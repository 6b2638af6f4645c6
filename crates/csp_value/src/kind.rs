//! Discriminator for [`crate::ReplicatedValue`].

use serde::{Deserialize, Serialize};

/// The discriminator carried alongside every [`crate::ReplicatedValue`] on
/// the wire.
///
/// `Invalid` never appears on a [`crate::ReplicatedValue`] itself — it is
/// reserved for the component-level "this component was deleted" marker (see
/// `csp_wire`'s patch encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReplicatedValueKind {
    /// No value / absent.
    Invalid = 0,
    Boolean = 1,
    Integer = 2,
    Float = 3,
    String = 4,
    Vector3 = 5,
    Vector4 = 6,
    StringMap = 7,
}
