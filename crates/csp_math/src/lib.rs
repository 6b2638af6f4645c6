//! # csp_math
//!
//! Spatial types shared by every entity in the realtime engine.
//!
//! This crate provides:
//!
//! - [`Transform`] — position, rotation, and scale.
//! - [`compose`] — combines a child's local transform with its parent's
//!   already-global transform to produce the child's global transform.

mod transform;

pub use transform::{compose, Transform};
