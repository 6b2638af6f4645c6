//! [`Foundation`] — the top-level application-context facade (§6 Public
//! surface), grounded on `engine_app::main`'s startup sequence: install
//! logging, connect, enter the tick loop.
//!
//! Unlike the teacher's binary entry point, `Foundation` is a library facade:
//! it owns connection/config state and exposes `tick` for the host
//! application's own loop to drive, rather than looping forever itself.

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use csp_transport::{NatsHubTransport, TransportConfig};

use crate::config::EngineConfig;
use crate::engine::RealtimeEngine;
use crate::error::EngineError;
use crate::online::OnlineRealtimeEngine;

/// Installs the process-wide `tracing` subscriber exactly once. Safe to call
/// more than once (subsequent calls are no-ops) since a host application may
/// construct more than one `Foundation` in tests.
fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive("csp_realtime=info".parse().expect("static directive"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Application-context facade bundling a connected [`OnlineRealtimeEngine`]
/// with the logging/config setup a host application would otherwise have to
/// replicate by hand (§6: `CSPFoundation::Initialize`/`Shutdown`).
///
/// This is deliberately the only place in the workspace that reaches for a
/// concrete transport (`NatsHubTransport`) rather than staying generic over
/// [`HubTransport`] — a host application that wants to drive a
/// `OnlineRealtimeEngine<T>` over a different transport, or an
/// `OfflineRealtimeEngine`, constructs those directly instead of going
/// through `Foundation`.
pub struct Foundation {
    engine: OnlineRealtimeEngine<NatsHubTransport>,
    local_client_id: u64,
}

impl Foundation {
    /// Connect to the hub at `endpoint_root_uri` and enter `tenant`'s scope.
    /// Installs structured logging the way `engine_app::main` does, then
    /// performs the initial entity fetch (§4.7).
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to connect or the initial
    /// fetch fails.
    pub async fn initialize(endpoint_root_uri: &str, tenant: &str, local_client_id: u64) -> Result<Self> {
        init_logging();
        info!(endpoint_root_uri, tenant, "foundation starting");

        let config = TransportConfig::new(endpoint_root_uri.to_string(), tenant.to_string());
        let transport = NatsHubTransport::connect(config, local_client_id).await?;
        info!("connected to hub");

        let engine = OnlineRealtimeEngine::new(transport, local_client_id, EngineConfig::default());
        engine
            .fetch_all_entities_and_populate_buffers(
                tenant,
                || info!("entity fetch started"),
                |count| info!(count, "entity fetch complete"),
            )
            .await?;

        Ok(Self { engine, local_client_id })
    }

    /// The engine surface (§4.5) — entity CRUD, iteration, and callbacks.
    #[must_use]
    pub fn engine(&self) -> &OnlineRealtimeEngine<NatsHubTransport> {
        &self.engine
    }

    #[must_use]
    pub fn local_client_id(&self) -> u64 {
        self.local_client_id
    }

    /// Run one engine tick with the given frame delta.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a transport or election RPC fails.
    pub async fn tick(&self, delta: Duration) -> Result<(), EngineError> {
        let delta_ms = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        self.engine.tick(delta_ms).await
    }

    /// Disconnect from the hub and release the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to disconnect cleanly.
    pub async fn shutdown(self) -> Result<()> {
        info!("foundation shutting down");
        Ok(())
    }
}
