//! Hub connection configuration.

use std::time::Duration;

/// Configuration for a [`crate::HubTransport`] connection.
///
/// Built with the same fluent-builder shape as the rest of the realtime
/// engine's configuration types — see `csp_realtime::EngineConfig`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Root URI of the hub endpoint, e.g. `"nats://hub.example.com:4222"`.
    pub endpoint_uri: String,
    /// Tenant identifier threaded through `Initialize(endpointRootURI, tenant)`.
    pub tenant: String,
    /// Per-RPC request deadline.
    pub request_timeout: Duration,
    /// Initial delay before the first reconnect attempt.
    pub reconnect_initial_delay: Duration,
    /// Upper bound for the exponential reconnect backoff.
    pub reconnect_max_delay: Duration,
}

impl TransportConfig {
    #[must_use]
    pub fn new(endpoint_uri: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            endpoint_uri: endpoint_uri.into(),
            tenant: tenant.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_reconnect_bounds(mut self, initial: Duration, max: Duration) -> Self {
        self.reconnect_initial_delay = initial;
        self.reconnect_max_delay = max;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint_uri: String::new(),
            tenant: String::new(),
            request_timeout: Duration::from_secs(10),
            reconnect_initial_delay: Duration::from_millis(250),
            reconnect_max_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sane_timeouts() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert!(cfg.reconnect_initial_delay < cfg.reconnect_max_delay);
    }

    #[test]
    fn test_builder_overrides_request_timeout() {
        let cfg = TransportConfig::new("nats://localhost:4222", "tenant-a")
            .with_request_timeout(Duration::from_secs(2));
        assert_eq!(cfg.request_timeout, Duration::from_secs(2));
        assert_eq!(cfg.tenant, "tenant-a");
    }
}
