//! Transport-layer error types (§7's `TransportFailure` kind).

/// Errors that can occur while talking to the hub.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to encode a frame for the wire.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] csp_wire::WireError),

    /// The hub connection could not be established.
    #[error("hub connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// The per-client event subscription could not be established.
    #[error("hub event subscription error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// An RPC request failed at the transport level (not a hub-side
    /// application error — those are reported through the RPC's own
    /// success/ack payload).
    #[error("RPC request error: {0}")]
    Request(#[from] async_nats::RequestError),

    /// Failed to encode/decode an RPC payload as JSON.
    #[error("RPC payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// An RPC request exceeded its deadline.
    #[error("RPC request to '{subject}' timed out after {elapsed_ms}ms")]
    Timeout { subject: String, elapsed_ms: u64 },

    /// A call was made while not connected to the hub, and no reconnect
    /// attempt is in flight that the caller should wait on.
    #[error("not connected to hub")]
    Disconnected,

    /// The hub replied with an application-level error payload.
    #[error("hub rejected request: {0}")]
    Rejected(String),
}
