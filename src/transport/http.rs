//! HTTP transport provider: axum on the server side, `reqwest` on the client
//! side, implementing the RPCs in §6 ("External Interfaces") over the
//! [`Transport`] contract.
//!
//! Node addresses are resolved through a small peer registry
//! (`NodeId -> SocketAddr`) rather than being encoded in
//! [`RemoteActorAddress`] itself; a real deployment populates it from
//! cluster membership (`cluster::ClusterManager`), mirroring
//! `broker::ActorRegistry`'s `DashMap`-backed lookup shape.

// Layer 1: Standard library imports
use std::net::SocketAddr;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;
use uuid::Uuid;

// Layer 3: Internal module imports
use super::config::TransportConfig;
use super::envelope::WireEnvelope;
use super::error::TransportError;
use super::traits::{LifecycleEvent, RemoteActorHost, Transport};
use crate::util::{ActorId, NodeId, RemoteActorAddress};

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

/// A [`Transport`] provider built on plain HTTP request/response RPCs, plus
/// one server-sent-events stream for `WatchActor`.
pub struct HttpTransport {
    config: TransportConfig,
    local_node: NodeId,
    host: Arc<dyn RemoteActorHost>,
    client: reqwest::Client,
    peers: Arc<DashMap<NodeId, SocketAddr>>,
    running: Mutex<Option<RunningServer>>,
    bound_addr: Mutex<Option<SocketAddr>>,
}

impl HttpTransport {
    /// Build a transport bound to `config.bind_addr`, delegating decoded
    /// requests to `host`.
    pub fn new(config: TransportConfig, local_node: NodeId, host: Arc<dyn RemoteActorHost>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            config,
            local_node,
            host,
            client,
            peers: Arc::new(DashMap::new()),
            running: Mutex::new(None),
            bound_addr: Mutex::new(None),
        }
    }

    /// The socket address the server side is actually bound to, once
    /// started. Useful when `config.bind_addr`'s port is `0`.
    pub async fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock().await
    }

    /// Record (or update) the network address a peer node is reachable at.
    ///
    /// Populated externally, typically by cluster membership as nodes join.
    pub fn register_peer(&self, node: NodeId, addr: SocketAddr) {
        self.peers.insert(node, addr);
    }

    /// Forget a peer's network address (e.g. once it is declared `Dead`).
    pub fn unregister_peer(&self, node: NodeId) {
        self.peers.remove(&node);
    }

    fn peer_base_url(&self, node: NodeId) -> Result<String, TransportError> {
        let addr = self
            .peers
            .get(&node)
            .map(|entry| *entry.value())
            .ok_or_else(|| TransportError::SendFailed(format!("no known address for node {node}")))?;
        Ok(format!("http://{addr}"))
    }

    fn router(host: Arc<dyn RemoteActorHost>) -> Router {
        Router::new()
            .route("/actors", post(spawn_actor_handler))
            .route("/actors/{id}", delete(stop_actor_handler))
            .route("/actors/{id}/messages", post(send_message_handler))
            .route("/actors/{id}/watch", get(watch_actor_handler))
            .with_state(host)
    }

    /// Spawn an actor from a template registered on the peer node.
    pub async fn spawn_remote(
        &self,
        peer: NodeId,
        template: &str,
    ) -> Result<RemoteActorAddress, TransportError> {
        let url = format!("{}/actors", self.peer_base_url(peer)?);
        let response = self
            .client
            .post(&url)
            .json(&SpawnActorRequest {
                template: template.to_string(),
            })
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::SendFailed(format!(
                "spawn request rejected: {}",
                response.status()
            )));
        }

        response
            .json::<RemoteActorAddress>()
            .await
            .map_err(|e| TransportError::Serialization(e.to_string()))
    }

    /// Stop an actor hosted on a peer node.
    pub async fn stop_remote(&self, peer: NodeId, actor_id: ActorId) -> Result<(), TransportError> {
        let url = format!("{}/actors/{}", self.peer_base_url(peer)?, actor_id.as_uuid());
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TransportError::ActorNotFound(actor_id));
        }
        if !response.status().is_success() {
            return Err(TransportError::SendFailed(format!(
                "stop request rejected: {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Subscribe to lifecycle events for an actor hosted on a peer node
    /// (§6 `WatchActor` streaming RPC), decoded off a server-sent-events
    /// response body.
    pub async fn watch_remote(
        &self,
        peer: NodeId,
        actor_id: ActorId,
    ) -> Result<impl Stream<Item = Result<LifecycleEvent, TransportError>>, TransportError> {
        let url = format!(
            "{}/actors/{}/watch",
            self.peer_base_url(peer)?,
            actor_id.as_uuid()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::SendFailed(format!(
                "watch request rejected: {}",
                response.status()
            )));
        }

        let byte_stream = Box::pin(response.bytes_stream());
        Ok(sse_events(byte_stream))
    }
}

/// Parse a `text/event-stream` byte stream into decoded [`LifecycleEvent`]s,
/// one per `data: ...` line.
fn sse_events(
    byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
) -> impl Stream<Item = Result<LifecycleEvent, TransportError>> {
    stream::unfold(
        (byte_stream, Vec::<u8>::new()),
        |(mut byte_stream, mut buf)| async move {
            loop {
                if let Some(pos) = find_double_newline(&buf) {
                    let frame: Vec<u8> = buf.drain(..pos + 2).collect();
                    match parse_sse_data_line(&frame) {
                        Some(event) => return Some((event, (byte_stream, buf))),
                        None => continue,
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        return Some((
                            Err(TransportError::SendFailed(e.to_string())),
                            (byte_stream, buf),
                        ))
                    }
                    None => return None,
                }
            }
        },
    )
}

fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_sse_data_line(frame: &[u8]) -> Option<Result<LifecycleEvent, TransportError>> {
    let text = String::from_utf8_lossy(frame);
    let data_line = text.lines().find_map(|line| line.strip_prefix("data: "))?;
    Some(
        serde_json::from_str::<LifecycleEvent>(data_line)
            .map_err(|e| TransportError::Serialization(e.to_string())),
    )
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(&self) -> Result<(), TransportError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(TransportError::AlreadyStarted);
        }

        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        *self.bound_addr.lock().await = Some(local_addr);

        let app = Self::router(Arc::clone(&self.host));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        *running = Some(RunningServer {
            shutdown: shutdown_tx,
            join,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut running = self.running.lock().await;
        match running.take() {
            Some(server) => {
                let _ = server.shutdown.send(());
                let _ = server.join.await;
                Ok(())
            }
            None => Err(TransportError::NotStarted),
        }
    }

    async fn send(
        &self,
        target: &RemoteActorAddress,
        envelope: WireEnvelope,
    ) -> Result<(), TransportError> {
        let url = format!(
            "{}/actors/{}/messages",
            self.peer_base_url(target.node())?,
            envelope.target_id.as_uuid()
        );

        let body = SendMessageRequest {
            message_type: envelope.message_type,
            payload: envelope.payload,
            sender: envelope.sender,
            metadata: envelope.metadata,
        };

        debug!(target_node = %target.node(), %url, "sending wire envelope");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|_| TransportError::Unreachable(target.clone()))?;

        let ack: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        match ack.error {
            None => Ok(()),
            Some(error) => {
                debug!(target_node = %target.node(), %error, "send rejected by peer");
                Err(TransportError::SendFailed(error))
            }
        }
    }

    fn local_address(&self) -> NodeId {
        self.local_node
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SpawnActorRequest {
    template: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SendMessageRequest {
    message_type: String,
    payload: Vec<u8>,
    sender: Option<RemoteActorAddress>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SendMessageResponse {
    success: bool,
    error: Option<String>,
}

fn parse_actor_id(raw: &str) -> Result<ActorId, StatusCode> {
    Uuid::parse_str(raw)
        .map(ActorId::from_uuid)
        .map_err(|_| StatusCode::BAD_REQUEST)
}

async fn spawn_actor_handler(
    State(host): State<Arc<dyn RemoteActorHost>>,
    Json(request): Json<SpawnActorRequest>,
) -> Result<Json<RemoteActorAddress>, StatusCode> {
    host.spawn_from_template(&request.template)
        .await
        .map(Json)
        .map_err(|_| StatusCode::BAD_REQUEST)
}

async fn stop_actor_handler(
    State(host): State<Arc<dyn RemoteActorHost>>,
    Path(id): Path<String>,
) -> StatusCode {
    let Ok(actor_id) = parse_actor_id(&id) else {
        return StatusCode::BAD_REQUEST;
    };
    match host.stop_actor(actor_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(TransportError::ActorNotFound(_)) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn send_message_handler(
    State(host): State<Arc<dyn RemoteActorHost>>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Json<SendMessageResponse> {
    let Ok(actor_id) = parse_actor_id(&id) else {
        return Json(SendMessageResponse {
            success: false,
            error: Some("invalid actor id".to_string()),
        });
    };

    let envelope = WireEnvelope {
        target_id: actor_id,
        message_type: request.message_type,
        payload: request.payload,
        sender: request.sender,
        metadata: request.metadata,
        timestamp: chrono::Utc::now(),
    };

    match host.deliver(envelope).await {
        Ok(()) => Json(SendMessageResponse {
            success: true,
            error: None,
        }),
        Err(e) => Json(SendMessageResponse {
            success: false,
            error: Some(e.to_string()),
        }),
    }
}

type SseItem = Result<Event, std::convert::Infallible>;

async fn watch_actor_handler(
    State(host): State<Arc<dyn RemoteActorHost>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(actor_id) = parse_actor_id(&id) else {
        return Sse::new(stream::empty::<SseItem>()).into_response();
    };

    let Ok(receiver) = host.watch(actor_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    let item: SseItem = Ok(Event::default().data(json));
                    return Some((item, receiver));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}
