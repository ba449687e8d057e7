//! Bot AI - a two-state wander/chase controller
//!
//! Bots chase the nearest alive player inside their detection radius and
//! otherwise drift on a randomly resampled heading. The chased player is
//! held only as an id; it is resolved against the live player set every
//! tick, so a disconnecting player simply stops being found.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::BotData;

use super::geometry::{wrap_coord, Rect, Vec2};
use super::GameConfig;

pub const BOT_SIZE: f32 = 25.0;
pub const BOT_COLOR: &str = "#ff4444";
pub const BOT_HEALTH: i32 = 2;
pub const BOT_SPEED: f32 = 150.0;
/// Distance at which a bot notices a player
pub const DETECTION_RADIUS: f32 = 300.0;
/// Distance at which a bot starts dealing contact damage
pub const DAMAGE_RADIUS: f32 = 35.0;
/// Contact damage applied once per [`DAMAGE_INTERVAL`]
pub const CONTACT_DAMAGE: f32 = 25.0;
pub const DAMAGE_INTERVAL: f64 = 1.0;
/// Seconds between death and respawn at the original spawn point
pub const RESPAWN_DELAY: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAiState {
    Wandering,
    Chasing,
}

#[derive(Debug, Clone)]
pub struct Bot {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub alive: bool,
    pub ai_state: BotAiState,
    /// Weak reference to the chased player, lookup-only
    pub target: Option<Uuid>,
    pub spawn: Vec2,
    wander_angle: f32,
    next_wander_at: f64,
    last_damage_at: f64,
    respawn_at: Option<f64>,
}

impl Bot {
    pub fn new(index: usize, spawn: Vec2, rng: &mut ChaCha8Rng) -> Self {
        Self {
            id: format!("bot_{}", index),
            x: spawn.x,
            y: spawn.y,
            health: BOT_HEALTH,
            alive: true,
            ai_state: BotAiState::Wandering,
            target: None,
            spawn,
            wander_angle: rng.gen_range(0.0..std::f32::consts::TAU),
            next_wander_at: 0.0,
            last_damage_at: f64::NEG_INFINITY,
            respawn_at: None,
        }
    }

    /// Advance the bot one tick against the alive players `(id, x, y)`.
    /// Returns the player to damage this tick, if any.
    pub fn update(
        &mut self,
        dt: f32,
        clock: f64,
        players: &[(Uuid, f32, f32)],
        config: &GameConfig,
        rng: &mut ChaCha8Rng,
    ) -> Option<Uuid> {
        if !self.alive {
            if let Some(at) = self.respawn_at {
                if clock >= at {
                    self.respawn(clock, rng);
                }
            }
            return None;
        }

        let nearest = players
            .iter()
            .map(|&(id, x, y)| {
                let dx = x - self.x;
                let dy = y - self.y;
                (id, x, y, (dx * dx + dy * dy).sqrt())
            })
            .min_by(|a, b| a.3.total_cmp(&b.3));

        let mut damage_target = None;

        match nearest {
            Some((id, px, py, dist)) if dist < DETECTION_RADIUS => {
                self.ai_state = BotAiState::Chasing;
                self.target = Some(id);

                if dist > 0.0 {
                    self.x += (px - self.x) / dist * BOT_SPEED * dt;
                    self.y += (py - self.y) / dist * BOT_SPEED * dt;
                }

                if dist < DAMAGE_RADIUS && clock - self.last_damage_at > DAMAGE_INTERVAL {
                    self.last_damage_at = clock;
                    damage_target = Some(id);
                }
            }
            _ => {
                self.ai_state = BotAiState::Wandering;
                self.target = None;

                // Pick a fresh heading every 2-4 seconds
                if clock >= self.next_wander_at {
                    self.wander_angle = rng.gen_range(0.0..std::f32::consts::TAU);
                    self.next_wander_at = clock + rng.gen_range(2.0..4.0);
                }

                self.x += self.wander_angle.cos() * BOT_SPEED * 0.5 * dt;
                self.y += self.wander_angle.sin() * BOT_SPEED * 0.5 * dt;
            }
        }

        self.x = wrap_coord(self.x, config.world_width, BOT_SIZE);
        self.y = wrap_coord(self.y, config.world_height, BOT_SIZE);

        damage_target
    }

    /// Apply one projectile hit. Returns true if this hit killed the bot.
    pub fn take_hit(&mut self, clock: f64) -> bool {
        self.health -= 1;
        if self.health <= 0 {
            self.alive = false;
            self.respawn_at = Some(clock + RESPAWN_DELAY);
            true
        } else {
            false
        }
    }

    /// Same instance returns at its original spawn with reset AI state
    fn respawn(&mut self, clock: f64, rng: &mut ChaCha8Rng) {
        self.x = self.spawn.x;
        self.y = self.spawn.y;
        self.health = BOT_HEALTH;
        self.alive = true;
        self.ai_state = BotAiState::Wandering;
        self.target = None;
        self.wander_angle = rng.gen_range(0.0..std::f32::consts::TAU);
        self.next_wander_at = clock + rng.gen_range(2.0..4.0);
        self.respawn_at = None;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, BOT_SIZE, BOT_SIZE)
    }

    pub fn data(&self) -> BotData {
        BotData {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            alive: self.alive,
            color: BOT_COLOR.to_string(),
            size: BOT_SIZE,
            is_chasing: self.ai_state == BotAiState::Chasing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_bot() -> (Bot, GameConfig, ChaCha8Rng) {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bot = Bot::new(0, Vec2::new(500.0, 500.0), &mut rng);
        (bot, config, rng)
    }

    #[test]
    fn bot_chases_player_in_detection_radius() {
        let (mut bot, config, mut rng) = test_bot();
        let player_id = Uuid::new_v4();
        let players = vec![(player_id, 600.0, 500.0)];

        bot.update(1.0 / 60.0, 0.0, &players, &config, &mut rng);
        assert_eq!(bot.ai_state, BotAiState::Chasing);
        assert_eq!(bot.target, Some(player_id));
        assert!(bot.x > 500.0);
    }

    #[test]
    fn bot_wanders_when_no_player_in_range() {
        let (mut bot, config, mut rng) = test_bot();
        let players = vec![(Uuid::new_v4(), 1500.0, 900.0)];

        bot.update(1.0 / 60.0, 0.0, &players, &config, &mut rng);
        assert_eq!(bot.ai_state, BotAiState::Wandering);
        assert!(bot.target.is_none());
    }

    #[test]
    fn contact_damage_is_spaced_by_interval() {
        let (mut bot, config, mut rng) = test_bot();
        let player_id = Uuid::new_v4();
        let players = vec![(player_id, 510.0, 500.0)];

        let first = bot.update(1.0 / 60.0, 2.0, &players, &config, &mut rng);
        assert_eq!(first, Some(player_id));
        let second = bot.update(1.0 / 60.0, 2.5, &players, &config, &mut rng);
        assert_eq!(second, None);
        let third = bot.update(1.0 / 60.0, 3.1, &players, &config, &mut rng);
        assert_eq!(third, Some(player_id));
    }

    #[test]
    fn two_hits_kill_and_respawn_at_spawn() {
        let (mut bot, config, mut rng) = test_bot();
        bot.x = 700.0;
        bot.y = 800.0;

        assert!(!bot.take_hit(10.0));
        assert!(bot.alive);
        assert!(bot.take_hit(10.1));
        assert!(!bot.alive);

        // Nothing happens before the deadline
        bot.update(1.0 / 60.0, 12.0, &[], &config, &mut rng);
        assert!(!bot.alive);

        bot.update(1.0 / 60.0, 13.2, &[], &config, &mut rng);
        assert!(bot.alive);
        assert_eq!(bot.health, BOT_HEALTH);
        assert_eq!(bot.x, bot.spawn.x);
        assert_eq!(bot.y, bot.spawn.y);
        assert_eq!(bot.ai_state, BotAiState::Wandering);
    }
}
