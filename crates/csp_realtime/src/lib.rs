//! # csp_realtime
//!
//! The `RealtimeEngine` trait and its `OfflineRealtimeEngine` /
//! `OnlineRealtimeEngine` implementations (§4.5–§4.7): the tick loop, rate
//! limiting, hierarchy resolution, and the `Foundation` application-context
//! facade.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use csp_realtime::{EngineConfig, OfflineRealtimeEngine, RealtimeEngine, CreateEntityParams};
//! use csp_math::Transform;
//!
//! # async fn example() -> Result<(), csp_realtime::EngineError> {
//! let engine = OfflineRealtimeEngine::new(1, EngineConfig::default());
//! let id = engine
//!     .create_entity(CreateEntityParams::new("Box", Transform::IDENTITY))
//!     .await?;
//! engine.with_entity(id, |entity| assert!(entity.is_some()));
//! # Ok(())
//! # }
//! ```

mod avatar;
mod collections;
mod config;
mod engine;
mod error;
mod foundation;
mod offline;
mod online;
mod scene;

pub use collections::{EngineCollections, EntityCallbacks};
pub use config::EngineConfig;
pub use engine::{CreateAvatarParams, CreateEntityParams, RealtimeEngine};
pub use error::EngineError;
pub use foundation::Foundation;
pub use offline::OfflineRealtimeEngine;
pub use online::OnlineRealtimeEngine;
pub use scene::{SceneDescription, SceneDescriptionBuilder};
