//! Client side: dial a host identity

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};
use uuid::Uuid;

use super::session::run_session;
use super::{LinkError, LinkEvent};

/// Endpoint for `peer_id` on the host at `base_url` (e.g. `ws://host:9000`)
pub fn peer_url(base_url: &str, peer_id: Uuid) -> String {
    format!("{}/ws?peer={}", base_url.trim_end_matches('/'), peer_id)
}

/// Connect in the background. Failure arrives as `LinkEvent::Error`;
/// aborting the handle tears the connection down.
pub fn dial(base_url: String, peer_id: Uuid, events: mpsc::Sender<LinkEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = peer_url(&base_url, peer_id);
        info!(url = %url, "Connecting to host");

        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!(peer_id = %peer_id, "Connected to host");
                run_session(socket, events, None).await;
            }
            Err(e) => {
                let err = LinkError::Connect(e);
                warn!(error = %err, "Could not reach host");
                let _ = events.send(LinkEvent::Error(err.to_string())).await;
            }
        }
    })
}
