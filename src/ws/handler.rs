//! WebSocket upgrade and session handling
//!
//! Each connection is one player, identified by a fresh id for its whole
//! lifetime. The session forwards parsed client messages into the room
//! layer and drains a per-connection outbound queue back to the socket;
//! a slow client backs up only its own queue, never a room tick.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::geometry::Vec2;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "new WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbound queue: the room broadcasts into it, the writer drains it
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMsg>();

    let writer_conn_id = conn_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %writer_conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let rate_limiter = ConnectionRateLimiter::new();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "rate limited client message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => handle_client_msg(conn_id, msg, &state, &tx).await,
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "unparseable client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "ignoring binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "client initiated close");
                break;
            }
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Disconnect implies leaving the current room
    state.rooms.leave(conn_id);
    writer_handle.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Dispatch one parsed client message
async fn handle_client_msg(
    conn_id: Uuid,
    msg: ClientMsg,
    state: &AppState,
    tx: &mpsc::UnboundedSender<ServerMsg>,
) {
    match msg {
        ClientMsg::CreateRoom {
            game_type,
            room_id,
            config,
        } => match state.rooms.create_room(&room_id, &game_type, config) {
            Ok(handle) => {
                let _ = tx.send(ServerMsg::RoomCreated {
                    room_id: handle.id.clone(),
                    game_type: handle.game_type,
                    game_info: crate::game::game_info(handle.game_type),
                });
            }
            Err(e) => send_error(tx, &e),
        },
        ClientMsg::JoinRoom {
            room_id,
            player_name,
        } => {
            // A connection plays in one room at a time
            state.rooms.leave(conn_id);
            match state
                .rooms
                .join_room(&room_id, conn_id, player_name, tx.clone())
                .await
            {
                Ok(joined) => {
                    let _ = tx.send(ServerMsg::PlayerJoined {
                        player_id: joined.player_id,
                        room_id,
                        game_type: joined.game_type,
                        player_data: joined.player_data,
                        game_config: joined.game_config,
                    });
                }
                Err(e) => send_error(tx, &e),
            }
        }
        ClientMsg::ScreenDimensions { width, height } => {
            state.rooms.handle_screen_dimensions(conn_id, width, height);
        }
        ClientMsg::PlayerInput { x, y } => {
            state.rooms.handle_input(conn_id, Vec2::new(x, y));
        }
        ClientMsg::PlayerAim { x, y } => {
            state.rooms.handle_aim(conn_id, Vec2::new(x, y));
        }
        ClientMsg::PlayerShoot => {
            state.rooms.handle_shoot(conn_id);
        }
    }
}

fn send_error(tx: &mpsc::UnboundedSender<ServerMsg>, err: &crate::room::RoomError) {
    let _ = tx.send(ServerMsg::Error {
        message: err.to_string(),
    });
}

/// Serialize and send one message over the socket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
