//! # csp_script
//!
//! The embedded JavaScript execution host: one JS context per entity,
//! native bindings that let scripts subscribe to engine messages and
//! property changes, and the shared bookkeeping that ties an entity id to
//! its context.
//!
//! Ownership follows the shape the design notes call for: an
//! [`EntityScript`] is *owned* by its `SpaceEntity` (in `csp_entity`); the
//! [`ScriptHost`] keeps only a non-owning registry of which entity ids have
//! an active context, torn down when the entity drops. This crate has no
//! dependency on `csp_entity` — it knows entities only by their `u64` id.
//!
//! This crate provides:
//!
//! - [`EntityScript`] — per-entity JS context, source, and subscriptions.
//! - [`ScriptHost`] — shared bookkeeping and (re)binding of contexts.
//! - [`ScriptError`] — the crate's error type.

mod error;
mod host;
mod script;

pub use error::ScriptError;
pub use host::ScriptHost;
pub use script::EntityScript;

/// The message name the engine dispatches once per tick to every script the
/// local client is responsible for running.
pub const MESSAGE_ENTITY_TICK: &str = "entityTick";

/// The message name dispatched once, after the initial entity fetch
/// completes.
pub const MESSAGE_ENTITIES_LOADED: &str = "entitiesLoaded";
