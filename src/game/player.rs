//! Shooter player model (authoritative)
//!
//! All timed behavior (respawns, effect expiry, the shot rate limit) is
//! expressed against the game's simulation clock as deadline fields, checked
//! inside the tick. There are no out-of-band timers to fire after a player
//! has been removed.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{EffectData, EffectsData, PlayerData};

use super::combat::Projectile;
use super::geometry::{wrap_coord, Rect, Vec2};
use super::GameConfig;

/// Minimum seconds between two shots from one player
pub const SHOT_COOLDOWN: f64 = 0.3;
/// Speed multiplier while a speed boost is active
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
/// Input below this magnitude counts as standing still
const MOVE_THRESHOLD: f32 = 0.1;
/// Fallback shot direction when neither aim nor facing is usable
const DEFAULT_DIRECTION: Vec2 = Vec2::new(0.0, -1.0);

/// A timed buff; `ends_at` is always strictly later than activation
#[derive(Debug, Clone, Copy, Default)]
pub struct Effect {
    pub active: bool,
    pub ends_at: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Effects {
    pub speed_boost: Effect,
    pub shield: Effect,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub alive: bool,
    pub color: String,
    pub kills: u32,
    pub deaths: u32,
    pub bot_kills: u32,

    pub facing: Vec2,
    pub aim: Vec2,
    pub input: Vec2,
    pub is_moving: bool,

    pub effects: Effects,
    /// Deadline for the in-place respawn of a dead player
    pub respawn_at: Option<f64>,
    last_shot: f64,
}

impl Player {
    pub fn new(id: Uuid, name: &str, color: &str, config: &GameConfig, rng: &mut ChaCha8Rng) -> Self {
        let (x, y) = Self::spawn_position(config, rng);
        Self {
            id,
            name: name.to_string(),
            x,
            y,
            health: 100.0,
            alive: true,
            color: color.to_string(),
            kills: 0,
            deaths: 0,
            bot_kills: 0,
            facing: DEFAULT_DIRECTION,
            aim: DEFAULT_DIRECTION,
            input: Vec2::default(),
            is_moving: false,
            effects: Effects::default(),
            respawn_at: None,
            last_shot: f64::NEG_INFINITY,
        }
    }

    /// Safe center-area spawn with a little jitter so players don't stack
    fn spawn_position(config: &GameConfig, rng: &mut ChaCha8Rng) -> (f32, f32) {
        let x = config.world_width / 2.0 - config.player_size / 2.0 + rng.gen_range(-50.0..50.0);
        let y = config.world_height / 2.0 - config.player_size / 2.0 + rng.gen_range(-50.0..50.0);
        (x, y)
    }

    /// Overwrite the pending movement input. Axes are clamped to [-1, 1]
    /// and the vector is normalized above unit length so diagonal input
    /// cannot outrun straight-line input.
    pub fn set_input(&mut self, axes: Vec2) {
        let mut input = Vec2::new(axes.x.clamp(-1.0, 1.0), axes.y.clamp(-1.0, 1.0));
        if input.magnitude() > 1.0 {
            input = input.normalized();
        }
        self.input = input;
        self.is_moving = input.magnitude() > MOVE_THRESHOLD;
        if self.is_moving {
            self.facing = input;
            self.aim = input;
        }
        // When idle the last aim direction is kept for shooting
    }

    /// Explicit aim direction, independent of movement
    pub fn set_aim(&mut self, axes: Vec2) {
        let aim = Vec2::new(axes.x.clamp(-1.0, 1.0), axes.y.clamp(-1.0, 1.0));
        if aim.magnitude() > MOVE_THRESHOLD {
            self.aim = aim;
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        if self.effects.speed_boost.active {
            SPEED_BOOST_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Expire timed effects whose deadline has passed
    pub fn update_effects(&mut self, clock: f64) {
        if self.effects.speed_boost.active && clock > self.effects.speed_boost.ends_at {
            self.effects.speed_boost.active = false;
        }
        if self.effects.shield.active && clock > self.effects.shield.ends_at {
            self.effects.shield.active = false;
        }
    }

    /// Respawn in place once the deadline passes: same instance, restored
    /// health, fresh spawn-area position, default directions.
    pub fn tick_respawn(&mut self, clock: f64, config: &GameConfig, rng: &mut ChaCha8Rng) {
        if self.alive {
            return;
        }
        if let Some(at) = self.respawn_at {
            if clock >= at {
                let (x, y) = Self::spawn_position(config, rng);
                self.x = x;
                self.y = y;
                self.health = 100.0;
                self.alive = true;
                self.facing = DEFAULT_DIRECTION;
                self.aim = DEFAULT_DIRECTION;
                self.input = Vec2::default();
                self.is_moving = false;
                self.respawn_at = None;
            }
        }
    }

    /// Apply the pending input for one tick. The move wraps toroidally and
    /// is rejected wholesale (no sliding) if it would overlap an obstacle.
    /// Returns true if the player actually moved.
    pub fn advance(&mut self, dt: f32, config: &GameConfig, obstacles: &[Rect]) -> bool {
        if !self.alive {
            return false;
        }

        let speed = config.player_speed * self.speed_multiplier() * dt;
        let mut new_x = self.x + self.input.x * speed;
        let mut new_y = self.y + self.input.y * speed;

        new_x = wrap_coord(new_x, config.world_width, config.player_size);
        new_y = wrap_coord(new_y, config.world_height, config.player_size);

        let moved_rect = Rect::new(new_x, new_y, config.player_size, config.player_size);
        if obstacles.iter().any(|o| o.overlaps(&moved_rect)) {
            return false;
        }

        self.x = new_x;
        self.y = new_y;
        true
    }

    /// Attempt to fire. Rate-limited to one shot per [`SHOT_COOLDOWN`];
    /// direction falls back aim -> facing -> straight up.
    pub fn try_shoot(&mut self, clock: f64, config: &GameConfig) -> Option<Projectile> {
        if !self.alive || clock - self.last_shot < SHOT_COOLDOWN {
            return None;
        }
        self.last_shot = clock;

        let mut direction = self.aim;
        if direction.magnitude() < MOVE_THRESHOLD {
            direction = self.facing;
        }
        if direction.magnitude() < MOVE_THRESHOLD {
            direction = DEFAULT_DIRECTION;
        }

        Some(Projectile::new(
            self.id,
            self.x + config.player_size / 2.0,
            self.y + config.player_size / 2.0,
            direction.normalized(),
            config.bullet_speed,
            clock,
        ))
    }

    /// Apply a lethal hit. Returns false if the shield blocked it. On death
    /// the respawn deadline is armed and all effects are cleared.
    pub fn take_damage(&mut self, clock: f64, config: &GameConfig) -> bool {
        if !self.alive {
            return false;
        }
        if self.effects.shield.active && clock < self.effects.shield.ends_at {
            return false;
        }
        self.kill(clock, config);
        true
    }

    /// Unconditional death path (bot contact damage reaching zero health)
    pub fn kill(&mut self, clock: f64, config: &GameConfig) {
        self.alive = false;
        self.deaths += 1;
        self.effects.speed_boost.active = false;
        self.effects.shield.active = false;
        self.respawn_at = Some(clock + config.respawn_delay as f64);
    }

    pub fn shield_blocks(&self, clock: f64) -> bool {
        self.effects.shield.active && clock < self.effects.shield.ends_at
    }

    pub fn rect(&self, config: &GameConfig) -> Rect {
        Rect::new(self.x, self.y, config.player_size, config.player_size)
    }

    pub fn data(&self) -> PlayerData {
        let mut data = PlayerData::base(
            self.id,
            self.name.clone(),
            self.x,
            self.y,
            self.alive,
            self.color.clone(),
        );
        data.health = Some(self.health);
        data.kills = Some(self.kills);
        data.deaths = Some(self.deaths);
        data.bot_kills = Some(self.bot_kills);
        data.effects = Some(EffectsData {
            speed_boost: EffectData {
                active: self.effects.speed_boost.active,
                end_time: self.effects.speed_boost.ends_at,
            },
            shield: EffectData {
                active: self.effects.shield.active,
                end_time: self.effects.shield.ends_at,
            },
        });
        data.facing_direction = Some(self.facing);
        data.aim_direction = Some(self.aim);
        data.is_moving = Some(self.is_moving);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_player() -> (Player, GameConfig, ChaCha8Rng) {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let player = Player::new(Uuid::new_v4(), "tester", "#ff6b6b", &config, &mut rng);
        (player, config, rng)
    }

    #[test]
    fn input_is_clamped_and_normalized() {
        let (mut player, _, _) = test_player();
        player.set_input(Vec2::new(5.0, -5.0));
        assert!(player.input.magnitude() <= 1.0 + 1e-5);
        assert!(player.is_moving);
        assert_eq!(player.aim, player.input);
    }

    #[test]
    fn idle_input_keeps_last_aim() {
        let (mut player, _, _) = test_player();
        player.set_input(Vec2::new(1.0, 0.0));
        player.set_input(Vec2::new(0.0, 0.0));
        assert!(!player.is_moving);
        assert_eq!(player.aim, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn shot_rate_limit_allows_one_per_window() {
        let (mut player, config, _) = test_player();
        assert!(player.try_shoot(1.0, &config).is_some());
        assert!(player.try_shoot(1.2, &config).is_none());
        assert!(player.try_shoot(1.31, &config).is_some());
    }

    #[test]
    fn shot_direction_falls_back_to_up() {
        let (mut player, config, _) = test_player();
        player.aim = Vec2::default();
        player.facing = Vec2::default();
        let shot = player.try_shoot(0.0, &config).unwrap();
        assert_eq!(shot.vx, 0.0);
        assert_eq!(shot.vy, -config.bullet_speed);
    }

    #[test]
    fn shield_blocks_damage_until_expiry() {
        let (mut player, config, _) = test_player();
        player.effects.shield = Effect {
            active: true,
            ends_at: 10.0,
        };
        assert!(!player.take_damage(5.0, &config));
        assert!(player.alive);
        assert_eq!(player.deaths, 0);

        player.update_effects(10.1);
        assert!(player.take_damage(10.1, &config));
        assert!(!player.alive);
        assert_eq!(player.deaths, 1);
    }

    #[test]
    fn respawn_restores_health_and_directions_in_place() {
        let (mut player, config, mut rng) = test_player();
        player.aim = Vec2::new(1.0, 0.0);
        assert!(player.take_damage(0.0, &config));
        assert_eq!(player.respawn_at, Some(config.respawn_delay as f64));

        player.tick_respawn(1.9, &config, &mut rng);
        assert!(!player.alive);
        player.tick_respawn(2.0, &config, &mut rng);
        assert!(player.alive);
        assert_eq!(player.health, 100.0);
        assert_eq!(player.aim, Vec2::new(0.0, -1.0));
        assert!(player.respawn_at.is_none());
    }

    #[test]
    fn displacement_never_exceeds_speed_budget() {
        let (mut player, config, _) = test_player();
        let dt = 1.0 / 60.0;
        let budget = config.player_speed * dt + 1e-3;
        for ix in [-1.0f32, -0.5, 0.0, 0.5, 1.0] {
            for iy in [-1.0f32, -0.5, 0.0, 0.5, 1.0] {
                player.x = 500.0;
                player.y = 500.0;
                player.set_input(Vec2::new(ix, iy));
                player.advance(dt, &config, &[]);
                let dx = player.x - 500.0;
                let dy = player.y - 500.0;
                assert!(
                    (dx * dx + dy * dy).sqrt() <= budget,
                    "input ({}, {}) outran the speed budget",
                    ix,
                    iy
                );
            }
        }
    }

    #[test]
    fn obstacle_rejects_move_wholesale() {
        let (mut player, config, _) = test_player();
        player.x = 100.0;
        player.y = 100.0;
        player.set_input(Vec2::new(1.0, 0.0));
        let wall = Rect::new(105.0, 0.0, 20.0, 400.0);
        let moved = player.advance(1.0 / 60.0, &config, &[wall]);
        assert!(!moved);
        assert_eq!(player.x, 100.0);
        assert_eq!(player.y, 100.0);
    }

    #[test]
    fn dead_player_cannot_shoot_or_move() {
        let (mut player, config, _) = test_player();
        player.set_input(Vec2::new(1.0, 0.0));
        assert!(player.take_damage(0.0, &config));
        assert!(player.try_shoot(5.0, &config).is_none());
        assert!(!player.advance(1.0 / 60.0, &config, &[]));
    }
}
