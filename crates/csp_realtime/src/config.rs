//! Engine tuning knobs.

use std::time::Duration;

/// Tuning knobs for a [`crate::OnlineRealtimeEngine`] (and, where
/// applicable, [`crate::OfflineRealtimeEngine`]).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum interval between two outbound patches for the same entity.
    /// Default 90ms, per §4.7.
    pub entity_patch_rate: Duration,
    /// `true` to disable the patch rate limit entirely (every
    /// `queue_entity_update` is flushed the very next tick).
    pub rate_limiting_disabled: bool,
    /// Page size for `PageScopedObjects` during the initial fetch. Default
    /// 100, per §4.7.
    pub page_limit: u32,
    /// How long `OnRequestToDisconnect` waits for in-flight sends to drain
    /// before tearing the connection down. Default 2s, per §4.7.
    pub disconnect_deadline: Duration,
    /// `true` to run the bully leader-election protocol. Default enabled.
    pub leader_election_enabled: bool,
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity_patch_rate(mut self, rate: Duration) -> Self {
        self.entity_patch_rate = rate;
        self
    }

    #[must_use]
    pub fn with_rate_limiting_disabled(mut self, disabled: bool) -> Self {
        self.rate_limiting_disabled = disabled;
        self
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    #[must_use]
    pub fn with_disconnect_deadline(mut self, deadline: Duration) -> Self {
        self.disconnect_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_leader_election_enabled(mut self, enabled: bool) -> Self {
        self.leader_election_enabled = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entity_patch_rate: Duration::from_millis(90),
            rate_limiting_disabled: false,
            page_limit: 100,
            disconnect_deadline: Duration::from_secs(2),
            leader_election_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.entity_patch_rate, Duration::from_millis(90));
        assert_eq!(config.page_limit, 100);
        assert_eq!(config.disconnect_deadline, Duration::from_secs(2));
        assert!(!config.rate_limiting_disabled);
        assert!(config.leader_election_enabled);
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::new()
            .with_entity_patch_rate(Duration::from_millis(50))
            .with_page_limit(25)
            .with_leader_election_enabled(false);
        assert_eq!(config.entity_patch_rate, Duration::from_millis(50));
        assert_eq!(config.page_limit, 25);
        assert!(!config.leader_election_enabled);
    }
}
