//! WebSocket protocol message definitions
//! These are the wire types for client-server communication. Field and tag
//! names are camelCase to stay wire-compatible with the browser clients.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::game::geometry::Vec2;
use crate::game::{GameConfig, GameInfo, GameType};

/// Lenient numeric field parsing: numbers pass through, numeric strings are
/// parsed, everything else (missing, null, booleans, NaN) coerces to zero.
/// Clients on flaky touch controllers occasionally send junk axes; a zeroed
/// axis is harmless while a rejected message would drop the whole input.
fn lenient_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Create a new room hosting a game of the given type
    CreateRoom {
        game_type: String,
        room_id: String,
        /// Optional config overrides; anything omitted uses defaults
        #[serde(default)]
        config: GameConfig,
    },

    /// Join an existing room as a player
    JoinRoom {
        room_id: String,
        #[serde(default)]
        player_name: Option<String>,
    },

    /// Report the client's screen size so the world can grow to fit
    ScreenDimensions {
        #[serde(default, deserialize_with = "lenient_f32")]
        width: f32,
        #[serde(default, deserialize_with = "lenient_f32")]
        height: f32,
    },

    /// Movement input axes, each in [-1, 1], client-paced
    PlayerInput {
        #[serde(default, deserialize_with = "lenient_f32")]
        x: f32,
        #[serde(default, deserialize_with = "lenient_f32")]
        y: f32,
    },

    /// Explicit aim direction, independent of movement
    PlayerAim {
        #[serde(default, deserialize_with = "lenient_f32")]
        x: f32,
        #[serde(default, deserialize_with = "lenient_f32")]
        y: f32,
    },

    /// Fire in the current aim direction
    PlayerShoot,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Room creation confirmation, sent to the creator
    RoomCreated {
        room_id: String,
        game_type: GameType,
        game_info: GameInfo,
    },

    /// Join confirmation, sent to the joining connection only
    PlayerJoined {
        player_id: Uuid,
        room_id: String,
        game_type: GameType,
        player_data: PlayerData,
        game_config: GameConfig,
    },

    /// A new player joined the room, broadcast to everyone in it
    PlayerConnected { player_data: PlayerData },

    /// A player left the room
    PlayerDisconnected { player_id: Uuid },

    /// Full state snapshot, broadcast every tick
    GameState(GameSnapshot),

    /// A projectile killed a player
    PlayerHit { player_id: Uuid, shooter_id: Uuid },

    /// A projectile killed a bot
    BotKilled {
        bot_id: String,
        killer_id: Uuid,
        x: f32,
        y: f32,
    },

    /// World dimensions changed (a larger screen connected)
    WorldDimensions { width: f32, height: f32 },

    /// Error reply to the requesting connection
    Error { message: String },
}

/// Full room state, serialized once per tick for every connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub players: Vec<PlayerData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bots: Vec<BotData>,
    pub projectiles: Vec<ProjectileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoints: Option<Vec<CheckpointData>>,
    pub obstacles: Vec<ObstacleData>,
    pub interactive_objects: Vec<InteractiveObjectData>,
    /// Tower-defence only: current wave number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave: Option<u32>,
    /// Tower-defence only: remaining base health
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_health: Option<f32>,
}

/// Per-player snapshot data. The shooter and race variants expose different
/// subsets; absent fields are omitted from the wire entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    pub color: String,

    // Shooter fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaths: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_kills: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectsData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facing_direction: Option<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aim_direction: Option<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,

    // Race fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap: Option<u32>,
}

impl PlayerData {
    /// Base data with all variant-specific fields absent
    pub fn base(id: Uuid, name: String, x: f32, y: f32, alive: bool, color: String) -> Self {
        Self {
            id,
            name,
            x,
            y,
            alive,
            color,
            health: None,
            kills: None,
            deaths: None,
            bot_kills: None,
            effects: None,
            facing_direction: None,
            aim_direction: None,
            is_moving: None,
            angle: None,
            speed: None,
            lap: None,
        }
    }
}

/// Timed buff state as seen by clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectData {
    pub active: bool,
    /// Simulation-clock time (seconds) at which the effect ends
    pub end_time: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsData {
    pub speed_boost: EffectData,
    pub shield: EffectData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotData {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    pub color: String,
    pub size: f32,
    pub is_chasing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileData {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub player_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveObjectData {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointData {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
