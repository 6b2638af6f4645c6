//! [`SceneDescription`] and its chunked-JSON builder, used to seed
//! [`crate::OfflineRealtimeEngine`] (§6, §4.6).

use csp_wire::ObjectMessage;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A space block plus its entity snapshots, the same logical shape as a
/// stream of `ObjectMessage`s (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    pub space: serde_json::Value,
    #[serde(default)]
    pub entities: Vec<ObjectMessage>,
}

impl SceneDescription {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            space: serde_json::Value::Null,
            entities: Vec::new(),
        }
    }

    /// Parse a complete JSON document into a `SceneDescription`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SceneDescription`] if `json` does not decode.
    pub fn parse(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Accumulates a `SceneDescription`'s JSON text from chunks that may each be
/// incomplete on their own — only the fully-concatenated buffer needs to
/// parse. Concatenating the appended chunks and parsing once they're all in
/// must round-trip to the same document as parsing it in one shot (§6,
/// §8's chunked-JSON testable property).
#[derive(Debug, Default)]
pub struct SceneDescriptionBuilder {
    buffer: String,
}

impl SceneDescriptionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next chunk of JSON text.
    pub fn append(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.buffer
    }

    /// Parse the accumulated buffer into a [`SceneDescription`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SceneDescription`] if the concatenated chunks
    /// do not form valid JSON (e.g. called before the final chunk arrived).
    pub fn finish(self) -> Result<SceneDescription, EngineError> {
        SceneDescription::parse(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_roundtrip() {
        let json = r#"{"space":{"id":"space-1"},"entities":[]}"#;
        let mut builder = SceneDescriptionBuilder::new();
        builder.append(json);
        let scene = builder.finish().unwrap();
        assert_eq!(scene.space["id"], "space-1");
        assert!(scene.entities.is_empty());
    }

    #[test]
    fn test_chunked_append_matches_single_shot_parse() {
        let json = r#"{"space":{"id":"space-1"},"entities":[]}"#;
        let mut chunked = SceneDescriptionBuilder::new();
        for chunk in [&json[..10], &json[10..25], &json[25..]] {
            chunked.append(chunk);
        }
        assert_eq!(chunked.raw(), json);
        let from_chunks = chunked.finish().unwrap();
        let from_whole = SceneDescription::parse(json).unwrap();
        assert_eq!(from_chunks.space, from_whole.space);
    }

    #[test]
    fn test_incomplete_buffer_fails_to_parse() {
        let mut builder = SceneDescriptionBuilder::new();
        builder.append(r#"{"space":{"#);
        assert!(builder.finish().is_err());
    }
}
