//! The engine's stable error taxonomy (§7 of the spec), built on top of the
//! per-layer error enums from `csp_entity`, `csp_transport`, and `csp_script`.

/// Errors produced by a [`crate::RealtimeEngine`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A hub RPC failed. Per §7's propagation policy this never crosses a
    /// creation/destruction callback boundary as a panic — it's logged and
    /// the caller's continuation is invoked with failure.
    #[error("transport failure: {0}")]
    Transport(#[from] csp_transport::TransportError),

    /// A local entity mutation was rejected (ownership, parent cycle,
    /// duplicate script component, unknown component).
    #[error("entity error: {0}")]
    Entity(#[from] csp_entity::EntityError),

    /// Script evaluation failed. Captured on the entity's script and
    /// cleared next tick; surfaced here only for operations that bind a
    /// script directly (e.g. attaching source to a freshly created entity).
    #[error("script error: {0}")]
    Script(#[from] csp_script::ScriptError),

    /// A patch, request, or lookup referenced an entity id the engine does
    /// not know. Logged and dropped, never fatal.
    #[error("unknown entity {0}")]
    UnknownEntity(u64),

    /// A default/optional interface method was invoked on an engine
    /// implementation that does not support it (e.g. calling an
    /// online-only operation on `OfflineRealtimeEngine`).
    #[error("{method} is not supported by this engine implementation")]
    InvalidInterfaceUse { method: &'static str },

    /// A chunked `SceneDescription` buffer did not parse as JSON once
    /// complete, or a scene entity's snapshot failed to decode.
    #[error("scene description error: {0}")]
    SceneDescription(#[from] serde_json::Error),

    /// The leader-election protocol failed to broadcast or decode a
    /// message (§7's `ElectionConflict` kind).
    #[error("election error: {0}")]
    Election(#[from] csp_election::ElectionError),
}
