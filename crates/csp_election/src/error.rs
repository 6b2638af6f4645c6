//! The election layer's error taxonomy (§7's `ElectionConflict` kind).

/// Errors produced while running the bully election protocol.
#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    /// Sending an election message over the transport failed.
    #[error("failed to send election message: {0}")]
    Transport(#[from] csp_transport::TransportError),

    /// An inbound election message could not be decoded.
    #[error("malformed election message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// A leader notification disagreed with this client's current view —
    /// per §7 this is not propagated, it triggers a re-election instead.
    /// Kept as a variant so callers can log/observe it happening.
    #[error("election conflict: expected leader {expected:?}, notified of {notified}")]
    Conflict { expected: Option<u64>, notified: u64 },
}
