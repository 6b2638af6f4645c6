//! [`ReplicatedValue`] — the tagged union of replicable scalar types.

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::kind::ReplicatedValueKind;

/// A single replicated value.
///
/// Every [`ReplicatedValue`] carries its own discriminator ([`ReplicatedValueKind`],
/// via [`ReplicatedValue::kind`]); the wire encoding is self-describing, so a
/// peer that does not recognise a component's schema can still decode (and
/// re-encode unchanged) any property on it.
///
/// Conversion between numeric widths is never implicit — construct the exact
/// variant you mean at the call site (`ReplicatedValue::Integer(x as i64)`,
/// not a blanket `From<i32>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplicatedValue {
    Boolean(bool),
    Integer(i64),
    Float(f32),
    String(String),
    Vector3(Vec3),
    Vector4(Vec4),
    StringMap(HashMap<String, ReplicatedValue>),
}

impl ReplicatedValue {
    /// Returns this value's discriminator.
    #[must_use]
    pub fn kind(&self) -> ReplicatedValueKind {
        match self {
            ReplicatedValue::Boolean(_) => ReplicatedValueKind::Boolean,
            ReplicatedValue::Integer(_) => ReplicatedValueKind::Integer,
            ReplicatedValue::Float(_) => ReplicatedValueKind::Float,
            ReplicatedValue::String(_) => ReplicatedValueKind::String,
            ReplicatedValue::Vector3(_) => ReplicatedValueKind::Vector3,
            ReplicatedValue::Vector4(_) => ReplicatedValueKind::Vector4,
            ReplicatedValue::StringMap(_) => ReplicatedValueKind::StringMap,
        }
    }

    /// Returns the boolean payload, or `false` and logs a type-mismatch error
    /// if this is not a [`ReplicatedValue::Boolean`].
    #[must_use]
    pub fn get_bool(&self) -> bool {
        match self {
            ReplicatedValue::Boolean(v) => *v,
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::Boolean, "replicated value type mismatch");
                false
            }
        }
    }

    /// Returns the integer payload, or `0` and logs a type-mismatch error if
    /// this is not a [`ReplicatedValue::Integer`].
    #[must_use]
    pub fn get_int(&self) -> i64 {
        match self {
            ReplicatedValue::Integer(v) => *v,
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::Integer, "replicated value type mismatch");
                0
            }
        }
    }

    /// Returns the float payload, or `0.0` and logs a type-mismatch error if
    /// this is not a [`ReplicatedValue::Float`].
    #[must_use]
    pub fn get_float(&self) -> f32 {
        match self {
            ReplicatedValue::Float(v) => *v,
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::Float, "replicated value type mismatch");
                0.0
            }
        }
    }

    /// Returns the string payload, or `""` and logs a type-mismatch error if
    /// this is not a [`ReplicatedValue::String`].
    #[must_use]
    pub fn get_string(&self) -> &str {
        match self {
            ReplicatedValue::String(v) => v.as_str(),
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::String, "replicated value type mismatch");
                ""
            }
        }
    }

    /// Returns the 3-float vector payload, or the zero vector and logs a
    /// type-mismatch error if this is not a [`ReplicatedValue::Vector3`].
    #[must_use]
    pub fn get_vec3(&self) -> Vec3 {
        match self {
            ReplicatedValue::Vector3(v) => *v,
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::Vector3, "replicated value type mismatch");
                Vec3::ZERO
            }
        }
    }

    /// Returns the 4-float vector payload, or the zero vector and logs a
    /// type-mismatch error if this is not a [`ReplicatedValue::Vector4`].
    #[must_use]
    pub fn get_vec4(&self) -> Vec4 {
        match self {
            ReplicatedValue::Vector4(v) => *v,
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::Vector4, "replicated value type mismatch");
                Vec4::ZERO
            }
        }
    }

    /// Returns the nested map payload, or an empty map and logs a
    /// type-mismatch error if this is not a [`ReplicatedValue::StringMap`].
    #[must_use]
    pub fn get_map(&self) -> HashMap<String, ReplicatedValue> {
        match self {
            ReplicatedValue::StringMap(v) => v.clone(),
            other => {
                tracing::error!(actual = ?other.kind(), expected = ?ReplicatedValueKind::StringMap, "replicated value type mismatch");
                HashMap::new()
            }
        }
    }
}

impl From<bool> for ReplicatedValue {
    fn from(v: bool) -> Self {
        ReplicatedValue::Boolean(v)
    }
}

impl From<i64> for ReplicatedValue {
    fn from(v: i64) -> Self {
        ReplicatedValue::Integer(v)
    }
}

impl From<f32> for ReplicatedValue {
    fn from(v: f32) -> Self {
        ReplicatedValue::Float(v)
    }
}

impl From<String> for ReplicatedValue {
    fn from(v: String) -> Self {
        ReplicatedValue::String(v)
    }
}

impl From<&str> for ReplicatedValue {
    fn from(v: &str) -> Self {
        ReplicatedValue::String(v.to_string())
    }
}

impl From<Vec3> for ReplicatedValue {
    fn from(v: Vec3) -> Self {
        ReplicatedValue::Vector3(v)
    }
}

impl From<Vec4> for ReplicatedValue {
    fn from(v: Vec4) -> Self {
        ReplicatedValue::Vector4(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(ReplicatedValue::Boolean(true).kind(), ReplicatedValueKind::Boolean);
        assert_eq!(ReplicatedValue::Integer(1).kind(), ReplicatedValueKind::Integer);
        assert_eq!(ReplicatedValue::Float(1.0).kind(), ReplicatedValueKind::Float);
        assert_eq!(
            ReplicatedValue::String("x".into()).kind(),
            ReplicatedValueKind::String
        );
        assert_eq!(
            ReplicatedValue::Vector3(Vec3::ZERO).kind(),
            ReplicatedValueKind::Vector3
        );
    }

    #[test]
    fn test_wrong_accessor_returns_default() {
        let v = ReplicatedValue::Integer(42);
        assert_eq!(v.get_bool(), false);
        assert_eq!(v.get_float(), 0.0);
        assert_eq!(v.get_string(), "");
    }

    #[test]
    fn test_correct_accessor_returns_value() {
        assert_eq!(ReplicatedValue::Integer(42).get_int(), 42);
        assert_eq!(ReplicatedValue::Boolean(true).get_bool(), true);
        assert_eq!(ReplicatedValue::String("hi".into()).get_string(), "hi");
    }

    #[test]
    fn test_nan_equality_follows_ieee754() {
        let a = ReplicatedValue::Float(f32::NAN);
        let b = ReplicatedValue::Float(f32::NAN);
        assert_ne!(a, b, "NaN must never equal NaN, even itself");
    }

    #[test]
    fn test_equal_values_are_equal() {
        assert_eq!(ReplicatedValue::Integer(5), ReplicatedValue::Integer(5));
        assert_ne!(ReplicatedValue::Integer(5), ReplicatedValue::Integer(6));
    }

    #[test]
    fn test_map_roundtrip_serialization() {
        let mut map = HashMap::new();
        map.insert("hp".to_string(), ReplicatedValue::Integer(100));
        let v = ReplicatedValue::StringMap(map);
        let bytes = rmp_serde::to_vec(&v).unwrap();
        let restored: ReplicatedValue = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(v, restored);
    }

    #[test]
    fn test_vec3_roundtrip_serialization() {
        let v = ReplicatedValue::Vector3(Vec3::new(1.0, 2.0, 3.0));
        let bytes = rmp_serde::to_vec(&v).unwrap();
        let restored: ReplicatedValue = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(v, restored);
    }
}
