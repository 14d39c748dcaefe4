// =============================================================================
// WebSocket Handler — Push-based board updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. The full board immediately on connect.
//   2. The full board again every time the pipeline publishes.
//
// Any text frame from the client is taken as a new query and forwarded to the
// coalescing sink, so a client can type into a search box and stream every
// keystroke.  Ping frames are answered with Pong.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ApiState, BoardView};
use crate::market_data::Board;

/// Outbound frame: the board plus a per-connection sequence number.
#[derive(Serialize)]
struct BoardFrame {
    sequence: u64,
    #[serde(flatten)]
    board: BoardView,
}

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted, upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Manages a single WebSocket connection lifecycle.
async fn handle_ws_connection(socket: WebSocket, state: Arc<ApiState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut board_rx = state.pipeline.subscribe();
    let mut sequence: u64 = 0;

    let initial = board_rx.borrow_and_update().clone();
    if let Err(e) = send_board(&mut sender, initial, &mut sequence).await {
        warn!(error = %e, "failed to send initial board");
        return;
    }

    loop {
        tokio::select! {
            // ── Push: every publication ─────────────────────────────────
            changed = board_rx.changed() => {
                if changed.is_err() {
                    debug!("pipeline gone, closing WebSocket");
                    break;
                }
                let board = board_rx.borrow_and_update().clone();
                if let Err(e) = send_board(&mut sender, board, &mut sequence).await {
                    debug!(error = %e, "WebSocket send failed, disconnecting");
                    break;
                }
            }

            // ── Recv: queries and control frames ────────────────────────
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!(query = %text, "query received over WebSocket");
                        state.query_sink.submit(text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "failed to send Pong, disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error, disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(frames = sequence, "WebSocket connection closed");
}

async fn send_board<S>(
    sender: &mut S,
    board: Board,
    sequence: &mut u64,
) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    *sequence += 1;
    let frame = BoardFrame {
        sequence: *sequence,
        board: BoardView::from(board),
    };

    match serde_json::to_string(&frame) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(seq = *sequence, count = frame.board.count, "board pushed");
            Ok(())
        }
        Err(e) => {
            // Not a transport failure; keep the connection.
            warn!(error = %e, "failed to serialize board");
            Ok(())
        }
    }
}
