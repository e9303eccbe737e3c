//! Host side: WebSocket endpoint that accepts exactly one peer

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::util::rate_limit::PeerRateLimiter;

use super::session::run_session;
use super::{LinkError, LinkEvent};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Identity of the host being dialed
    pub peer: Uuid,
}

/// State shared by the endpoint
#[derive(Clone)]
pub struct HostState {
    pub peer_id: Uuid,
    paired: Arc<AtomicBool>,
    events: mpsc::Sender<LinkEvent>,
}

impl HostState {
    pub fn new(peer_id: Uuid, events: mpsc::Sender<LinkEvent>) -> Self {
        Self {
            peer_id,
            paired: Arc::new(AtomicBool::new(false)),
            events,
        }
    }
}

pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<HostState>,
) -> Response {
    if query.peer != state.peer_id {
        warn!(requested = %query.peer, "Connection for unknown peer id");
        return (StatusCode::NOT_FOUND, "Unknown peer").into_response();
    }

    if state
        .paired
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        warn!(peer_id = %state.peer_id, "Rejecting connection, already paired");
        return (StatusCode::CONFLICT, "Already paired").into_response();
    }

    info!(peer_id = %state.peer_id, "WebSocket upgrade for peer");
    let paired = state.paired.clone();
    ws.on_failed_upgrade(move |e| {
        error!(error = %e, "WebSocket upgrade failed");
        paired.store(false, Ordering::SeqCst);
    })
    .on_upgrade(move |socket| async move {
        run_session(socket, state.events.clone(), Some(PeerRateLimiter::new())).await;
        info!(peer_id = %state.peer_id, "Peer connection closed");
    })
}

/// A bound host identity; dropping or releasing it stops the listener
pub struct HostListener {
    peer_id: Uuid,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    _server: JoinHandle<()>,
}

impl HostListener {
    /// Bind `addr` under a fresh identity and serve until released
    pub async fn bind(addr: SocketAddr, events: mpsc::Sender<LinkEvent>) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(addr).await.map_err(LinkError::Bind)?;
        let local_addr = listener.local_addr().map_err(LinkError::Bind)?;
        let peer_id = Uuid::new_v4();
        let router = build_router(HostState::new(peer_id, events));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!(error = %e, "Host listener failed");
            }
        });

        info!(peer_id = %peer_id, addr = %local_addr, "Hosting");
        Ok(Self {
            peer_id,
            local_addr,
            shutdown: Some(shutdown_tx),
            _server: server,
        })
    }

    pub fn peer_id(&self) -> Uuid {
        self.peer_id
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and drop the identity
    pub fn release(mut self) {
        self.signal_shutdown();
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            info!(peer_id = %self.peer_id, "Releasing host identity");
            let _ = tx.send(());
        }
    }
}

impl Drop for HostListener {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}
