//! Script-layer error types.

/// Errors that can occur while creating, binding, or running an entity's
/// script context.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Failed to create or reset the underlying JS context.
    #[error("failed to create JS context: {0}")]
    ContextCreation(String),

    /// JS evaluation of the script source, or of a dispatched message call,
    /// raised an exception.
    ///
    /// Per §7 propagation policy this is captured on the entity's script
    /// (`EntityScript::last_error`) and cleared at the next tick — it is
    /// never allowed to unwind out of the engine's tick loop.
    #[error("script error: {0}")]
    Evaluation(String),

    /// A native binding received a payload that did not deserialize to the
    /// expected shape.
    #[error("invalid message payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
