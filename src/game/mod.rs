//! Game simulation modules
//!
//! Each game variant implements the [`Game`] capability contract and owns its
//! own entity collections; variants are selected by [`GameType`] at room
//! creation. The room task drives a variant exclusively through this trait.

pub mod bot;
pub mod combat;
pub mod geometry;
pub mod objects;
pub mod player;
pub mod race;
pub mod shooter;
pub mod tower_defence;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ws::protocol::{GameSnapshot, PlayerData, ServerMsg};
use geometry::Vec2;

/// Available game variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
    Shooter,
    Race,
    TowerDefence,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Shooter => "shooter",
            GameType::Race => "race",
            GameType::TowerDefence => "towerDefence",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shooter" => Ok(GameType::Shooter),
            "race" => Ok(GameType::Race),
            "towerDefence" => Ok(GameType::TowerDefence),
            _ => Err(()),
        }
    }
}

/// World and movement tuning shared by all variants. Clients may override
/// individual fields at room creation; anything omitted keeps the default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub player_size: f32,
    pub player_speed: f32,
    pub bullet_speed: f32,
    pub bullet_size: f32,
    /// Seconds between a player's death and its in-place respawn
    pub respawn_delay: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 1920.0,
            world_height: 1080.0,
            player_size: 30.0,
            player_speed: 200.0,
            bullet_speed: 400.0,
            bullet_size: 6.0,
            respawn_delay: 2.0,
        }
    }
}

/// Catalog entry describing a game variant to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub id: GameType,
    pub name: String,
    pub description: String,
    pub min_players: u32,
    pub max_players: u32,
    pub icon: String,
}

/// Catalog entry for a variant
pub fn game_info(game_type: GameType) -> GameInfo {
    match game_type {
        GameType::Shooter => GameInfo {
            id: GameType::Shooter,
            name: "Battle Arena".to_string(),
            description: "Multiplayer top-down shooter with bots and power-ups".to_string(),
            min_players: 1,
            max_players: 10,
            icon: "\u{1F3AF}".to_string(),
        },
        GameType::Race => GameInfo {
            id: GameType::Race,
            name: "Race Track".to_string(),
            description: "Competitive racing game with checkpoints".to_string(),
            min_players: 1,
            max_players: 8,
            icon: "\u{1F3CE}\u{FE0F}".to_string(),
        },
        GameType::TowerDefence => GameInfo {
            id: GameType::TowerDefence,
            name: "Last Stand".to_string(),
            description: "Defend the base against waves of creeps".to_string(),
            min_players: 1,
            max_players: 6,
            icon: "\u{1F3F0}".to_string(),
        },
    }
}

/// Catalog entries for every variant
pub fn all_game_info() -> Vec<GameInfo> {
    [GameType::Shooter, GameType::Race, GameType::TowerDefence]
        .into_iter()
        .map(game_info)
        .collect()
}

/// Events produced by a simulation tick, broadcast alongside the snapshot
#[derive(Debug, Clone)]
pub enum GameEvent {
    PlayerHit {
        player_id: Uuid,
        shooter_id: Uuid,
    },
    BotKilled {
        bot_id: String,
        killer_id: Uuid,
        x: f32,
        y: f32,
    },
}

impl GameEvent {
    pub fn into_msg(self) -> ServerMsg {
        match self {
            GameEvent::PlayerHit {
                player_id,
                shooter_id,
            } => ServerMsg::PlayerHit {
                player_id,
                shooter_id,
            },
            GameEvent::BotKilled {
                bot_id,
                killer_id,
                x,
                y,
            } => ServerMsg::BotKilled {
                bot_id,
                killer_id,
                x,
                y,
            },
        }
    }
}

/// Capability contract every game variant implements. The room task is the
/// single writer: all methods take `&mut self` and run serially between
/// ticks. Aim, shoot and world resize are optional capabilities; the
/// defaults make them silent no-ops on variants that lack them.
pub trait Game: Send {
    fn game_type(&self) -> GameType;

    fn config(&self) -> GameConfig;

    fn player_count(&self) -> usize;

    /// Add a player and return its initial data
    fn add_player(&mut self, id: Uuid, name: &str) -> PlayerData;

    /// Remove a player from the live game immediately
    fn remove_player(&mut self, id: Uuid);

    /// Overwrite a player's pending movement input (last write wins)
    fn handle_input(&mut self, id: Uuid, axes: Vec2);

    /// Advance the simulation by `dt` seconds
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Full serializable state for broadcast
    fn snapshot(&self) -> GameSnapshot;

    fn handle_aim(&mut self, _id: Uuid, _axes: Vec2) {}

    fn handle_shoot(&mut self, _id: Uuid) {}

    /// Grow the world to fit a client screen; returns the new dimensions if
    /// the variant supports resizing
    fn update_world_size(&mut self, _width: f32, _height: f32) -> Option<(f32, f32)> {
        None
    }
}

/// Construct a game variant with a fresh random seed
pub fn create_game(game_type: GameType, config: GameConfig) -> Box<dyn Game> {
    let seed = rand::random::<u64>();
    match game_type {
        GameType::Shooter => Box::new(shooter::ShooterGame::new(config, seed)),
        GameType::Race => Box::new(race::RaceGame::new(config, seed)),
        GameType::TowerDefence => Box::new(tower_defence::TowerDefenceGame::new(config, seed)),
    }
}

/// Pool of distinct player colors, assigned round-robin as players join
pub const PLAYER_COLORS: [&str; 15] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57", "#ff9ff3", "#54a0ff", "#5f27cd",
    "#00d2d3", "#ff9f43", "#10ac84", "#ee5a24", "#0abde3", "#3867d6", "#8854d0",
];
