//! # csp_transport
//!
//! The hub RPC transport (§6): a duplex, ordered, bidirectional RPC surface
//! with reconnection and scope management.
//!
//! This crate provides:
//!
//! - [`HubTransport`] — the RPC trait `csp_realtime::OnlineRealtimeEngine`
//!   and `csp_election::LeaderElection` are generic over.
//! - [`NatsHubTransport`] — a real implementation over NATS request/reply.
//! - [`MockHubTransport`] — an in-memory implementation for tests.
//! - [`HubEvent`] — the hub-pushed event shapes.
//! - [`TransportConfig`] / [`ReconnectBackoff`] — connection configuration
//!   and reconnect timing.
//! - [`TransportError`] — the crate's error type.

mod backoff;
mod config;
pub mod error;
mod events;
mod mock;
mod nats;
pub mod subjects;
mod transport;

pub use backoff::ReconnectBackoff;
pub use config::TransportConfig;
pub use error::TransportError;
pub use events::HubEvent;
pub use mock::MockHubTransport;
pub use nats::NatsHubTransport;
pub use transport::{HubTransport, PagedObjects};
