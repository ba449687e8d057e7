//! Process-wide room registry
//!
//! The manager owns the only cross-room shared state: the handle registry
//! and the connection-to-room membership map. Everything else lives inside
//! the room tasks.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::game::geometry::Vec2;
use crate::game::{GameConfig, GameType};

use super::room::{ConnectionTx, JoinedPlayer, Room, RoomCmd, RoomHandle};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room '{0}' already exists")]
    DuplicateRoom(String),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("unknown game type '{0}'")]
    UnknownGameType(String),
    #[error("room '{0}' is closed")]
    RoomClosed(String),
}

/// Listing entry for the rooms endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: String,
    pub game_type: GameType,
    pub player_count: usize,
    pub created_at: u64,
}

pub struct RoomManager {
    rooms: Arc<DashMap<String, RoomHandle>>,
    /// Which room each connection currently plays in
    memberships: Arc<DashMap<Uuid, String>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
        }
    }

    /// Create a room and spawn its tick task. The task unregisters itself
    /// when it ends, however it ends.
    pub fn create_room(
        &self,
        room_id: &str,
        game_type: &str,
        config: GameConfig,
    ) -> Result<RoomHandle, RoomError> {
        let game_type: GameType = game_type
            .parse()
            .map_err(|_| RoomError::UnknownGameType(game_type.to_string()))?;

        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(_) => Err(RoomError::DuplicateRoom(room_id.to_string())),
            Entry::Vacant(slot) => {
                let (room, handle) = Room::new(room_id.to_string(), game_type, config);
                slot.insert(handle.clone());

                let rooms = self.rooms.clone();
                let memberships = self.memberships.clone();
                let id = room_id.to_string();
                tokio::spawn(async move {
                    // A panicking room must still unregister itself, and must
                    // never take down any other room
                    if AssertUnwindSafe(room.run()).catch_unwind().await.is_err() {
                        error!(room_id = %id, "room task panicked");
                    }
                    rooms.remove(&id);
                    memberships.retain(|_, room| *room != id);
                    info!(room_id = %id, "room removed from registry");
                });

                info!(room_id = %room_id, game_type = %game_type, "room created");
                Ok(handle)
            }
        }
    }

    /// Join a connection to a room as a new player
    pub async fn join_room(
        &self,
        room_id: &str,
        conn_id: Uuid,
        player_name: Option<String>,
        tx: ConnectionTx,
    ) -> Result<JoinedPlayer, RoomError> {
        let handle = self
            .get(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .cmd_tx
            .send(RoomCmd::Join {
                conn_id,
                player_name,
                tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::RoomClosed(room_id.to_string()))?;

        let joined = reply_rx
            .await
            .map_err(|_| RoomError::RoomClosed(room_id.to_string()))?;

        self.memberships.insert(conn_id, room_id.to_string());
        Ok(joined)
    }

    /// Remove a connection from its room, if it is in one. Idempotent.
    pub fn leave(&self, conn_id: Uuid) {
        if let Some((_, room_id)) = self.memberships.remove(&conn_id) {
            self.send_cmd(&room_id, RoomCmd::Leave { conn_id });
        }
    }

    /// Ask a room to shut down. The task unregisters itself on exit, so a
    /// close for an already-gone room is a no-op.
    pub fn close_room(&self, room_id: &str) {
        self.send_cmd(room_id, RoomCmd::Close);
    }

    pub fn handle_input(&self, conn_id: Uuid, axes: Vec2) {
        self.route(conn_id, RoomCmd::Input { conn_id, axes });
    }

    pub fn handle_aim(&self, conn_id: Uuid, axes: Vec2) {
        self.route(conn_id, RoomCmd::Aim { conn_id, axes });
    }

    pub fn handle_shoot(&self, conn_id: Uuid) {
        self.route(conn_id, RoomCmd::Shoot { conn_id });
    }

    pub fn handle_screen_dimensions(&self, conn_id: Uuid, width: f32, height: f32) {
        self.route(conn_id, RoomCmd::ScreenDimensions { width, height });
    }

    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    pub fn list_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .map(|r| RoomInfo {
                room_id: r.key().clone(),
                game_type: r.value().game_type,
                player_count: r.value().player_count(),
                created_at: r.value().created_at,
            })
            .collect()
    }

    /// Route a command through the connection's membership. Unmapped
    /// connections are a silent no-op; pre-join inputs are expected.
    fn route(&self, conn_id: Uuid, cmd: RoomCmd) {
        if let Some(room_id) = self.memberships.get(&conn_id) {
            self.send_cmd(room_id.value(), cmd);
        }
    }

    /// Non-blocking send; a full queue sheds the command rather than stall
    /// the caller. Inputs are client-paced and superseded next tick anyway.
    fn send_cmd(&self, room_id: &str, cmd: RoomCmd) {
        if let Some(handle) = self.rooms.get(room_id) {
            if handle.cmd_tx.try_send(cmd).is_err() {
                warn!(room_id = %room_id, "room command queue full, dropping command");
            }
        }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
