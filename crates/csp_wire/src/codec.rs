//! Binary codec for wire frames.
//!
//! Thin wrappers around `rmp-serde`. Unlike an RPC payload meant to be
//! inspected by arbitrary polyglot tooling, object messages and patches use
//! **compact** (positional-array) MessagePack encoding — this is what makes
//! a component's payload byte-identical whether or not the decoding peer
//! understands its schema: an unknown component's `properties` map is never
//! re-keyed by name, only carried through as opaque positional data.

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// Encode a value to compact (array-style) MessagePack bytes.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    rmp_serde::to_vec(value).map_err(WireError::Encode)
}

/// Decode a value from compact MessagePack bytes.
///
/// # Errors
///
/// Returns [`WireError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, WireError> {
    rmp_serde::from_slice(bytes).map_err(WireError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct TestMsg {
        value: u32,
        name: String,
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let msg = TestMsg {
            value: 42,
            name: "hello".to_string(),
        };
        let bytes = encode(&msg).unwrap();
        let restored: TestMsg = decode(&bytes).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<TestMsg, _> = decode(&[0xFF, 0xFF]);
        assert!(result.is_err());
    }
}
