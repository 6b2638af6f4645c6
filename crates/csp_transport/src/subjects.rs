//! NATS subject hierarchy for the hub RPC surface.
//!
//! All subjects are namespaced under the connection's tenant so multiple
//! tenants can share a cluster. Mirrors `engine_net::subjects`' builder
//! style.

/// Root prefix for every subject this crate publishes or subscribes to.
pub const PREFIX: &str = "csp";

#[must_use]
pub fn generate_object_ids(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.generate_object_ids")
}

#[must_use]
pub fn send_object_message(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.object_message")
}

#[must_use]
pub fn send_object_patches(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.object_patches")
}

#[must_use]
pub fn send_object_not_found(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.object_not_found")
}

#[must_use]
pub fn page_scoped_objects(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.page_scoped_objects")
}

#[must_use]
pub fn stop_listening(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.stop_listening")
}

#[must_use]
pub fn start_listening(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.start_listening")
}

#[must_use]
pub fn set_scopes(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.set_scopes")
}

/// The per-client inbox subject the hub publishes [`crate::HubEvent`]s to.
#[must_use]
pub fn client_events(tenant: &str, client_id: u64) -> String {
    format!("{PREFIX}.{tenant}.client.{client_id}.events")
}

/// RPC the hub relays as a `HubEvent::NetworkEvent` to the addressed client
/// only (election heartbeats, remote script requests).
#[must_use]
pub fn send_network_event(tenant: &str) -> String {
    format!("{PREFIX}.{tenant}.hub.network_event")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects_are_tenant_scoped() {
        assert_eq!(
            generate_object_ids("acme"),
            "csp.acme.hub.generate_object_ids"
        );
        assert_eq!(client_events("acme", 7), "csp.acme.client.7.events");
    }
}
