//! [`NatsHubTransport`] — a [`crate::HubTransport`] backed by NATS
//! request/reply for RPC and a per-client subscription for hub-pushed
//! events.
//!
//! Mirrors `engine_net::connection::NatsConnection`'s shape (a thin client
//! wrapper, MessagePack payloads, a background task draining a
//! subscription), generalised from pub/sub fan-out to the request/reply
//! duplex the hub protocol needs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use csp_wire::{codec, ObjectMessage, ObjectPatch};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::events::HubEvent;
use crate::subjects;
use crate::transport::{HubTransport, PagedObjects};

#[derive(Debug, Serialize, Deserialize)]
struct CountRequest {
    count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdsResponse {
    ids: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NotFoundRequest {
    entity_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PageRequest {
    exclude_client_owned: bool,
    include_client_owned_persistent: bool,
    skip: u32,
    limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PageResponse {
    items: Vec<ObjectMessage>,
    total_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScopeRequest {
    space_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NetworkEventRequest {
    channel: String,
    payload: Vec<u8>,
    target_client_id: u64,
}

/// Carries an already-encoded, opaque frame (see [`csp_wire::codec`]) as the
/// RPC payload, so the JSON envelope never re-derives a schema for
/// component data it doesn't understand.
#[derive(Debug, Serialize, Deserialize)]
struct FramePayload {
    bytes: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Ack;

/// A connected hub transport over NATS.
///
/// Cheap to clone: the NATS client and event receiver are both shared
/// handles, matching how the engine passes one transport instance to both
/// `OnlineRealtimeEngine` and `LeaderElection`.
#[derive(Clone)]
pub struct NatsHubTransport {
    client: async_nats::Client,
    config: Arc<TransportConfig>,
    client_id: u64,
    events: Arc<Mutex<mpsc::Receiver<HubEvent>>>,
}

impl NatsHubTransport {
    /// Connect to the hub and begin draining this client's event inbox.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the NATS connection or the
    /// event subscription cannot be established.
    pub async fn connect(config: TransportConfig, client_id: u64) -> Result<Self, TransportError> {
        info!(endpoint = %config.endpoint_uri, tenant = %config.tenant, "connecting to hub");
        let client = async_nats::connect(&config.endpoint_uri).await?;

        let subject = subjects::client_events(&config.tenant, client_id);
        let mut subscriber = client.subscribe(subject.clone()).await?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            use futures::StreamExt as _;
            while let Some(message) = subscriber.next().await {
                match serde_json::from_slice::<HubEvent>(&message.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "dropped malformed hub event"),
                }
            }
            debug!(subject, "hub event stream closed");
        });

        Ok(Self {
            client,
            config: Arc::new(config),
            client_id,
            events: Arc::new(Mutex::new(rx)),
        })
    }

    async fn request<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        subject: String,
        request: &Req,
    ) -> Result<Resp, TransportError> {
        let payload = serde_json::to_vec(request)?;
        let result = tokio::time::timeout(
            self.config.request_timeout,
            self.client.request(subject.clone(), payload.into()),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            subject: subject.clone(),
            elapsed_ms: self.config.request_timeout.as_millis() as u64,
        })??;

        Ok(serde_json::from_slice(&result.payload)?)
    }
}

impl HubTransport for NatsHubTransport {
    async fn generate_object_ids(&self, count: u32) -> Result<Vec<u64>, TransportError> {
        let resp: IdsResponse = self
            .request(subjects::generate_object_ids(&self.config.tenant), &CountRequest { count })
            .await?;
        Ok(resp.ids)
    }

    async fn send_object_message(&self, message: &ObjectMessage) -> Result<(), TransportError> {
        let bytes = codec::encode(message)?;
        let _: Ack = self
            .request(subjects::send_object_message(&self.config.tenant), &FramePayload { bytes })
            .await?;
        Ok(())
    }

    async fn send_object_patches(&self, patches: &[ObjectPatch]) -> Result<(), TransportError> {
        let bytes = codec::encode(&patches.to_vec())?;
        let _: Ack = self
            .request(subjects::send_object_patches(&self.config.tenant), &FramePayload { bytes })
            .await?;
        Ok(())
    }

    async fn send_object_not_found(&self, entity_id: u64) -> Result<(), TransportError> {
        let _: Ack = self
            .request(
                subjects::send_object_not_found(&self.config.tenant),
                &NotFoundRequest { entity_id },
            )
            .await?;
        Ok(())
    }

    async fn page_scoped_objects(
        &self,
        exclude_client_owned: bool,
        include_client_owned_persistent: bool,
        skip: u32,
        limit: u32,
    ) -> Result<PagedObjects, TransportError> {
        let resp: PageResponse = self
            .request(
                subjects::page_scoped_objects(&self.config.tenant),
                &PageRequest {
                    exclude_client_owned,
                    include_client_owned_persistent,
                    skip,
                    limit,
                },
            )
            .await?;
        Ok(PagedObjects {
            items: resp.items,
            total_count: resp.total_count,
        })
    }

    async fn stop_listening(&self) -> Result<(), TransportError> {
        let _: Ack = self.request(subjects::stop_listening(&self.config.tenant), &()).await?;
        Ok(())
    }

    async fn start_listening(&self) -> Result<(), TransportError> {
        let _: Ack = self.request(subjects::start_listening(&self.config.tenant), &()).await?;
        Ok(())
    }

    async fn set_scopes(&self, space_id: &str) -> Result<(), TransportError> {
        let _: Ack = self
            .request(
                subjects::set_scopes(&self.config.tenant),
                &ScopeRequest {
                    space_id: space_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn send_network_event(
        &self,
        channel: &str,
        payload: Vec<u8>,
        target_client_id: u64,
    ) -> Result<(), TransportError> {
        let _: Ack = self
            .request(
                subjects::send_network_event(&self.config.tenant),
                &NetworkEventRequest {
                    channel: channel.to_string(),
                    payload,
                    target_client_id,
                },
            )
            .await?;
        Ok(())
    }

    async fn recv_event(&self) -> Option<HubEvent> {
        let mut rx = self.events.lock().await;
        match rx.recv().await {
            Some(event) => Some(event),
            None => {
                error!(client_id = self.client_id, "hub event channel closed");
                None
            }
        }
    }
}
