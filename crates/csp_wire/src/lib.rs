//! # csp_wire
//!
//! The wire protocol between a client and the message hub: the two frame
//! shapes that carry entity state (full snapshot and delta), and a binary
//! codec to encode/decode them.
//!
//! This crate provides:
//!
//! - [`EntityType`] / [`ComponentType`] — the open-set discriminators carried
//!   on the wire.
//! - [`ComponentWire`] — a single component's type tag and property payload.
//! - [`ObjectMessage`] / [`ObjectPatch`] / [`ParentUpdate`] — the two frame
//!   shapes.
//! - [`codec`] — encode/decode helpers.
//! - [`WireError`] — the crate's error type.

pub mod codec;
mod component_type;
mod entity_type;
mod error;
mod frame;

pub use component_type::ComponentType;
pub use entity_type::EntityType;
pub use error::WireError;
pub use frame::{ComponentWire, ObjectMessage, ObjectPatch, ParentUpdate};
