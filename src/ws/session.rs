//! Socket pump shared by the host endpoint and the client dialer

use std::fmt::Display;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::util::rate_limit::PeerRateLimiter;

use super::protocol::{decode, encode};
use super::{LinkEvent, PeerSender, OUTBOUND_CAPACITY};

/// What the pump cares about in a frame
pub(crate) enum Frame {
    Text(String),
    Close,
    Other,
}

/// Bridges the two WebSocket message types onto `Frame`
pub(crate) trait WireFrame: Sized {
    fn text(text: String) -> Self;
    fn classify(self) -> Frame;
}

impl WireFrame for axum::extract::ws::Message {
    fn text(text: String) -> Self {
        Self::Text(text)
    }

    fn classify(self) -> Frame {
        match self {
            Self::Text(text) => Frame::Text(text),
            Self::Close(_) => Frame::Close,
            _ => Frame::Other,
        }
    }
}

impl WireFrame for tokio_tungstenite::tungstenite::Message {
    fn text(text: String) -> Self {
        Self::Text(text)
    }

    fn classify(self) -> Frame {
        match self {
            Self::Text(text) => Frame::Text(text),
            Self::Close(_) => Frame::Close,
            _ => Frame::Other,
        }
    }
}

/// Run one paired connection until either side closes it.
/// Emits `Opened` first and `Closed` last on `events`.
pub(crate) async fn run_session<S, M, E>(
    socket: S,
    events: mpsc::Sender<LinkEvent>,
    limiter: Option<PeerRateLimiter>,
) where
    S: Stream<Item = Result<M, E>> + Sink<M> + Send + 'static,
    <S as Sink<M>>::Error: Display,
    M: WireFrame + Send + 'static,
    E: Display + Send,
{
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (sender, mut outbound_rx) = PeerSender::channel(OUTBOUND_CAPACITY);

    if events.send(LinkEvent::Opened(sender)).await.is_err() {
        debug!("Session owner gone before pairing");
        return;
    }

    // Writer task: session -> socket. Ends when every PeerSender is dropped.
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match encode(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(kind = msg.kind(), error = %e, "Dropping unencodable message");
                    continue;
                }
            };
            if let Err(e) = ws_sink.send(M::text(text)).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: socket -> session
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(frame) => match frame.classify() {
                Frame::Text(text) => {
                    if let Some(limiter) = &limiter {
                        if !limiter.check_message() {
                            warn!("Rate limited peer message");
                            continue;
                        }
                    }

                    match decode(&text) {
                        Ok(msg) => {
                            if events.send(LinkEvent::Data(msg)).await.is_err() {
                                debug!("Event channel closed");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to parse peer message");
                        }
                    }
                }
                Frame::Close => {
                    info!("Peer initiated close");
                    break;
                }
                Frame::Other => {}
            },
            Err(e) => {
                error!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
    let _ = events.send(LinkEvent::Closed).await;
}
