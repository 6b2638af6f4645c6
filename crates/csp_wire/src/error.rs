//! Wire-layer error types.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Failed to encode a frame to MessagePack.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a frame from MessagePack.
    #[error("failed to decode frame: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A patch or message referenced a component id outside the legal range.
    #[error("component id {0} collides with the reserved view-property range")]
    ReservedComponentId(u16),
}
