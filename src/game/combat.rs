//! Projectiles and their movement
//!
//! A projectile holds its owner only as an id: the owner may disconnect
//! while the projectile is in flight, and crediting a kill degrades to a
//! no-op instead of dangling.

use uuid::Uuid;

use crate::ws::protocol::ProjectileData;

use super::geometry::{wrap_coord, Rect, Vec2};
use super::GameConfig;

/// Projectile lifetime in seconds of simulation time
pub const PROJECTILE_TTL: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Weak reference; resolved by lookup when a hit lands
    pub owner: Uuid,
    pub spawned_at: f64,
}

impl Projectile {
    /// Spawn a projectile travelling in `direction` (normalized by the
    /// caller) at the configured bullet speed.
    pub fn new(owner: Uuid, x: f32, y: f32, direction: Vec2, speed: f32, clock: f64) -> Self {
        Self {
            id: format!("bullet_{}_{}", (clock * 1000.0) as u64, owner.simple()),
            x,
            y,
            vx: direction.x * speed,
            vy: direction.y * speed,
            owner,
            spawned_at: clock,
        }
    }

    /// Advance by velocity and wrap toroidally at the world edges
    pub fn advance(&mut self, dt: f32, config: &GameConfig) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.x = wrap_coord(self.x, config.world_width, 0.0);
        self.y = wrap_coord(self.y, config.world_height, 0.0);
    }

    pub fn expired(&self, clock: f64) -> bool {
        clock - self.spawned_at > PROJECTILE_TTL
    }

    /// Hitbox centered on the projectile position
    pub fn rect(&self, config: &GameConfig) -> Rect {
        Rect::new(
            self.x - config.bullet_size / 2.0,
            self.y - config.bullet_size / 2.0,
            config.bullet_size,
            config.bullet_size,
        )
    }

    pub fn data(&self) -> ProjectileData {
        ProjectileData {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            player_id: self.owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projectile_advances_and_expires() {
        let config = GameConfig::default();
        let mut p = Projectile::new(
            Uuid::new_v4(),
            100.0,
            100.0,
            Vec2::new(1.0, 0.0),
            400.0,
            0.0,
        );
        p.advance(0.5, &config);
        assert_eq!(p.x, 300.0);
        assert_eq!(p.y, 100.0);
        assert!(!p.expired(PROJECTILE_TTL));
        assert!(p.expired(PROJECTILE_TTL + 0.01));
    }

    #[test]
    fn projectile_wraps_at_world_edges() {
        let config = GameConfig::default();
        let mut p = Projectile::new(
            Uuid::new_v4(),
            config.world_width - 1.0,
            50.0,
            Vec2::new(1.0, 0.0),
            400.0,
            0.0,
        );
        p.advance(0.1, &config);
        assert!(p.x < config.world_width);
    }
}
