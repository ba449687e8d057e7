//! Per-room simulation task
//!
//! A room owns one game instance and is its single writer. Everything that
//! mutates the game arrives on the command channel and is applied between
//! ticks, so a removed player can never be touched by a later tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::geometry::Vec2;
use crate::game::{create_game, Game, GameConfig, GameType};
use crate::util::time::{unix_millis, MAX_TICK_DELTA, TICK_DURATION};
use crate::ws::protocol::{PlayerData, ServerMsg};

/// A room that nobody ever joined is closed after this long
const EMPTY_ROOM_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound channel to one WebSocket connection
pub type ConnectionTx = mpsc::UnboundedSender<ServerMsg>;

/// Reply payload for a successful join
#[derive(Debug)]
pub struct JoinedPlayer {
    pub player_id: Uuid,
    pub game_type: GameType,
    pub player_data: PlayerData,
    pub game_config: GameConfig,
}

/// Commands applied serially by the room task between ticks
pub enum RoomCmd {
    Join {
        conn_id: Uuid,
        player_name: Option<String>,
        tx: ConnectionTx,
        reply: oneshot::Sender<JoinedPlayer>,
    },
    Leave {
        conn_id: Uuid,
    },
    Input {
        conn_id: Uuid,
        axes: Vec2,
    },
    Aim {
        conn_id: Uuid,
        axes: Vec2,
    },
    Shoot {
        conn_id: Uuid,
    },
    ScreenDimensions {
        width: f32,
        height: f32,
    },
    Close,
}

/// Handle to a running room
#[derive(Clone, Debug)]
pub struct RoomHandle {
    pub id: String,
    pub game_type: GameType,
    /// Unix millis at creation
    pub created_at: u64,
    pub cmd_tx: mpsc::Sender<RoomCmd>,
    player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// The authoritative room simulation
pub struct Room {
    id: String,
    game: Box<dyn Game>,
    cmd_rx: mpsc::Receiver<RoomCmd>,
    connections: HashMap<Uuid, ConnectionTx>,
    player_count: Arc<AtomicUsize>,
    ever_joined: bool,
}

impl Room {
    pub fn new(id: String, game_type: GameType, config: GameConfig) -> (Self, RoomHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            id: id.clone(),
            game_type,
            created_at: unix_millis(),
            cmd_tx,
            player_count: player_count.clone(),
        };

        let room = Self {
            id,
            game: create_game(game_type, config),
            cmd_rx,
            connections: HashMap::new(),
            player_count,
            ever_joined: false,
        };

        (room, handle)
    }

    /// Run the tick loop until the room empties or is closed
    pub async fn run(mut self) {
        info!(room_id = %self.id, game_type = %self.game.game_type(), "room started");

        let started_at = Instant::now();
        let mut ticker = interval(TICK_DURATION);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let dt = (now - last_tick).as_secs_f32().min(MAX_TICK_DELTA);
                    last_tick = now;

                    if self.tick(dt) {
                        break;
                    }
                    if !self.ever_joined && started_at.elapsed() > EMPTY_ROOM_TIMEOUT {
                        info!(room_id = %self.id, "nobody joined, closing room");
                        break;
                    }
                }
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        // Manager dropped the handle
                        None => break,
                    }
                }
            }
        }

        info!(room_id = %self.id, "room closed");
    }

    /// One simulation step plus broadcast. Returns true when the room should
    /// close because the last connection went away.
    fn tick(&mut self, dt: f32) -> bool {
        let events = self.game.update(dt);
        for event in events {
            self.broadcast(event.into_msg());
        }
        self.broadcast(ServerMsg::GameState(self.game.snapshot()));

        self.ever_joined && self.connections.is_empty()
    }

    /// Apply one command. Returns true when the room should close.
    fn handle_cmd(&mut self, cmd: RoomCmd) -> bool {
        match cmd {
            RoomCmd::Join {
                conn_id,
                player_name,
                tx,
                reply,
            } => {
                let name = player_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("Player_{}", &conn_id.to_string()[..8]));
                let player_data = self.game.add_player(conn_id, name.trim());

                self.connections.insert(conn_id, tx);
                self.ever_joined = true;
                self.player_count
                    .store(self.game.player_count(), Ordering::Relaxed);

                let _ = reply.send(JoinedPlayer {
                    player_id: conn_id,
                    game_type: self.game.game_type(),
                    player_data: player_data.clone(),
                    game_config: self.game.config(),
                });

                self.broadcast(ServerMsg::PlayerConnected { player_data });

                info!(
                    room_id = %self.id,
                    player_id = %conn_id,
                    player_count = self.game.player_count(),
                    "player joined room"
                );
                false
            }
            RoomCmd::Leave { conn_id } => self.drop_connection(conn_id),
            RoomCmd::Input { conn_id, axes } => {
                self.game.handle_input(conn_id, axes);
                false
            }
            RoomCmd::Aim { conn_id, axes } => {
                self.game.handle_aim(conn_id, axes);
                false
            }
            RoomCmd::Shoot { conn_id } => {
                self.game.handle_shoot(conn_id);
                false
            }
            RoomCmd::ScreenDimensions { width, height } => {
                if let Some((width, height)) = self.game.update_world_size(width, height) {
                    debug!(room_id = %self.id, width, height, "world resized");
                    self.broadcast(ServerMsg::WorldDimensions { width, height });
                }
                false
            }
            RoomCmd::Close => true,
        }
    }

    /// Remove a connection and its player. Idempotent; a second leave for
    /// the same connection is a no-op. Returns true when the room emptied.
    fn drop_connection(&mut self, conn_id: Uuid) -> bool {
        if self.connections.remove(&conn_id).is_none() {
            return false;
        }
        self.game.remove_player(conn_id);
        self.player_count
            .store(self.game.player_count(), Ordering::Relaxed);
        self.broadcast(ServerMsg::PlayerDisconnected { player_id: conn_id });

        info!(
            room_id = %self.id,
            player_id = %conn_id,
            player_count = self.game.player_count(),
            "player left room"
        );
        self.connections.is_empty()
    }

    /// Fire-and-forget send to every connection; connections whose receiver
    /// is gone are dropped as if they had left.
    fn broadcast(&mut self, msg: ServerMsg) {
        let mut dead: Vec<Uuid> = Vec::new();
        for (conn_id, tx) in &self.connections {
            if tx.send(msg.clone()).is_err() {
                dead.push(*conn_id);
            }
        }
        for conn_id in dead {
            self.drop_connection(conn_id);
        }
    }
}
