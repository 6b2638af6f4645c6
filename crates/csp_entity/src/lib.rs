//! # csp_entity
//!
//! The client-side data model: [`Component`] property bags and
//! [`SpaceEntity`] objects built from them, plus [`serializer`], which maps
//! both to and from the wire frames defined in `csp_wire`.
//!
//! This crate deliberately does not depend on `csp_transport` or
//! `csp_election` — an entity owns its [`csp_script::EntityScript`]
//! directly rather than reaching back into the engine that created it, so
//! there is no ownership cycle to manage.

mod component;
mod entity;
pub mod error;
mod flags;
pub mod serializer;

pub use component::{Component, ComponentDirtyState, COMPONENT_ID_FLOOR, VIEW_KEY_MAX, VIEW_KEY_MIN};
pub use entity::{ChangedProperty, RemoteUpdate, SpaceEntity};
pub use error::EntityError;
pub use flags::UpdateFlags;
