//! Socket Mode connection task.
//!
//! Opens a websocket URL via `apps.connections.open`, acknowledges every
//! envelope, forwards translated events over an unbounded channel, and
//! reconnects with exponential backoff when the socket drops.

use std::{sync::Arc, time::Duration};

use {
    futures::{SinkExt, StreamExt},
    teambot_channels::Event,
    tokio::sync::mpsc,
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{Result, api::SlackApi, event::route_frame};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Handles held by the transport while the socket task runs.
pub struct SocketHandle {
    pub events: mpsc::UnboundedReceiver<Event>,
    /// Frames to write on the current socket (pings).
    pub writer: mpsc::UnboundedSender<Message>,
}

/// Spawn the connection task. It stops when `cancel` fires.
pub fn spawn(api: Arc<SlackApi>, max_backoff: Duration, cancel: CancellationToken) -> SocketHandle {
    let (event_tx, events) = mpsc::unbounded_channel();
    let (writer, write_rx) = mpsc::unbounded_channel();
    tokio::spawn(connection_loop(api, max_backoff, event_tx, write_rx, cancel));
    SocketHandle { events, writer }
}

/// Connect, run until the socket closes, back off, repeat.
async fn connection_loop(
    api: Arc<SlackApi>,
    max_backoff: Duration,
    event_tx: mpsc::UnboundedSender<Event>,
    mut write_rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    let max_backoff = max_backoff.max(INITIAL_BACKOFF);
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match connect_and_run(&api, &event_tx, &mut write_rx, &cancel).await {
            Ok(()) => {
                debug!("socket mode connection closed");
                backoff = INITIAL_BACKOFF;
            },
            Err(e) => {
                error!(error = %e, "socket mode connection error");
            },
        }

        if cancel.is_cancelled() || event_tx.is_closed() {
            info!("socket mode listener stopped");
            return;
        }

        info!(delay_ms = backoff.as_millis() as u64, "reconnecting socket mode after delay");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(backoff) => {},
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

/// One connection: open, then forward frames until close, disconnect request
/// or cancellation.
async fn connect_and_run(
    api: &SlackApi,
    event_tx: &mpsc::UnboundedSender<Event>,
    write_rx: &mut mpsc::UnboundedReceiver<Message>,
    cancel: &CancellationToken,
) -> Result<()> {
    let url = api.open_connection().await?;
    let (ws_stream, _response) = connect_async(url.as_str()).await?;
    let (mut ws_sink, mut ws_reader) = ws_stream.split();
    info!("socket mode connected");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_sink.send(Message::Close(None)).await;
                return Ok(());
            },
            outgoing = write_rx.recv() => {
                let Some(frame) = outgoing else {
                    return Ok(());
                };
                ws_sink.send(frame).await?;
            },
            incoming = ws_reader.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let action = match route_frame(text.as_str()) {
                            Ok(action) => action,
                            Err(e) => {
                                warn!(error = %e, "ignoring undecodable socket mode frame");
                                continue;
                            },
                        };
                        if let Some(ack) = action.ack {
                            ws_sink.send(Message::Text(ack.into())).await?;
                        }
                        if let Some(event) = action.event
                            && event_tx.send(event).is_err()
                        {
                            return Ok(());
                        }
                        if action.reconnect {
                            info!("slack requested reconnect");
                            return Ok(());
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("websocket closed by server");
                        return Ok(());
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(e.into()),
                }
            },
        }
    }
}
