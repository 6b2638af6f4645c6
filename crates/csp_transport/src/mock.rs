//! [`MockHubTransport`] — an in-memory [`crate::HubTransport`] for tests and
//! local development without a running hub.
//!
//! Records every call so test code can assert on what the engine sent, and
//! lets the caller inject [`HubEvent`]s as if the hub had pushed them.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use csp_wire::{ObjectMessage, ObjectPatch};

use crate::error::TransportError;
use crate::events::HubEvent;
use crate::transport::{HubTransport, PagedObjects};

#[derive(Debug, Default)]
struct Recorded {
    next_id: u64,
    sent_messages: Vec<ObjectMessage>,
    sent_patches: Vec<Vec<ObjectPatch>>,
    not_found: Vec<u64>,
    scopes: Option<String>,
    listening: bool,
    network_events: Vec<(String, Vec<u8>, u64)>,
}

#[derive(Clone)]
pub struct MockHubTransport {
    state: Arc<Mutex<Recorded>>,
    events_tx: mpsc::Sender<HubEvent>,
    events_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<HubEvent>>>,
    pages: Arc<Mutex<Vec<PagedObjects>>>,
}

impl MockHubTransport {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(256);
        Self {
            state: Arc::new(Mutex::new(Recorded {
                listening: true,
                ..Recorded::default()
            })),
            events_tx: tx,
            events_rx: Arc::new(tokio::sync::Mutex::new(rx)),
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue the page(s) `page_scoped_objects` will return, in call order.
    pub fn queue_pages(&self, pages: Vec<PagedObjects>) {
        self.pages.lock().extend(pages);
    }

    /// Inject an event as if the hub had pushed it.
    pub async fn push_event(&self, event: HubEvent) {
        let _ = self.events_tx.send(event).await;
    }

    #[must_use]
    pub fn sent_messages(&self) -> Vec<ObjectMessage> {
        self.state.lock().sent_messages.clone()
    }

    #[must_use]
    pub fn sent_patches(&self) -> Vec<Vec<ObjectPatch>> {
        self.state.lock().sent_patches.clone()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }

    #[must_use]
    pub fn current_scope(&self) -> Option<String> {
        self.state.lock().scopes.clone()
    }

    #[must_use]
    pub fn sent_network_events(&self) -> Vec<(String, Vec<u8>, u64)> {
        self.state.lock().network_events.clone()
    }
}

impl Default for MockHubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HubTransport for MockHubTransport {
    async fn generate_object_ids(&self, count: u32) -> Result<Vec<u64>, TransportError> {
        let mut state = self.state.lock();
        let ids = (0..count).map(|_| {
            state.next_id += 1;
            state.next_id
        }).collect();
        Ok(ids)
    }

    async fn send_object_message(&self, message: &ObjectMessage) -> Result<(), TransportError> {
        self.state.lock().sent_messages.push(message.clone());
        Ok(())
    }

    async fn send_object_patches(&self, patches: &[ObjectPatch]) -> Result<(), TransportError> {
        self.state.lock().sent_patches.push(patches.to_vec());
        Ok(())
    }

    async fn send_object_not_found(&self, entity_id: u64) -> Result<(), TransportError> {
        self.state.lock().not_found.push(entity_id);
        Ok(())
    }

    async fn page_scoped_objects(
        &self,
        _exclude_client_owned: bool,
        _include_client_owned_persistent: bool,
        _skip: u32,
        _limit: u32,
    ) -> Result<PagedObjects, TransportError> {
        let mut pages = self.pages.lock();
        if pages.is_empty() {
            return Ok(PagedObjects {
                items: Vec::new(),
                total_count: 0,
            });
        }
        Ok(pages.remove(0))
    }

    async fn stop_listening(&self) -> Result<(), TransportError> {
        self.state.lock().listening = false;
        Ok(())
    }

    async fn start_listening(&self) -> Result<(), TransportError> {
        self.state.lock().listening = true;
        Ok(())
    }

    async fn set_scopes(&self, space_id: &str) -> Result<(), TransportError> {
        self.state.lock().scopes = Some(space_id.to_string());
        Ok(())
    }

    async fn send_network_event(
        &self,
        channel: &str,
        payload: Vec<u8>,
        target_client_id: u64,
    ) -> Result<(), TransportError> {
        self.state
            .lock()
            .network_events
            .push((channel.to_string(), payload, target_client_id));
        Ok(())
    }

    async fn recv_event(&self) -> Option<HubEvent> {
        self.events_rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csp_wire::EntityType;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_generate_object_ids_are_unique_and_increasing() {
        let transport = MockHubTransport::new();
        let ids = transport.generate_object_ids(3).await.unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_send_object_message_is_recorded() {
        let transport = MockHubTransport::new();
        let message = ObjectMessage {
            id: 1,
            entity_type: EntityType::Object,
            is_transferable: true,
            is_persistent: true,
            owner_id: 9,
            parent_id: None,
            components: HashMap::new(),
        };
        transport.send_object_message(&message).await.unwrap();
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_start_listening_toggles_state() {
        let transport = MockHubTransport::new();
        assert!(transport.is_listening());
        transport.stop_listening().await.unwrap();
        assert!(!transport.is_listening());
        transport.start_listening().await.unwrap();
        assert!(transport.is_listening());
    }

    #[tokio::test]
    async fn test_pushed_event_is_received_in_order() {
        let transport = MockHubTransport::new();
        transport.push_event(HubEvent::RequestToDisconnect { reason: "bye".into() }).await;
        let event = transport.recv_event().await.unwrap();
        assert!(matches!(event, HubEvent::RequestToDisconnect { .. }));
    }

    #[tokio::test]
    async fn test_empty_page_queue_returns_zero_count() {
        let transport = MockHubTransport::new();
        let page = transport.page_scoped_objects(true, true, 0, 100).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }
}
