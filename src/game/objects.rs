//! Interactive world objects - teleporters, power-ups and bouncers
//!
//! Objects are never destroyed; pick-ups cycle between active and a timed
//! respawn, teleporters run a shared cooldown. All timing is expressed as
//! deadlines on the game's simulation clock and re-checked every tick.

use crate::ws::protocol::InteractiveObjectData;

use super::geometry::Rect;

/// How long a speed boost lasts once collected (seconds)
pub const SPEED_BOOST_DURATION: f64 = 5.0;
/// How long a collected speed boost stays uncollectible
pub const SPEED_BOOST_RESPAWN: f64 = 10.0;
/// How long a shield lasts once collected
pub const SHIELD_DURATION: f64 = 8.0;
/// How long a collected shield stays uncollectible
pub const SHIELD_RESPAWN: f64 = 15.0;
/// Shared cooldown applied to both ends of a teleporter pair
pub const TELEPORT_COOLDOWN: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveKind {
    /// Paired teleporter; stepping on one end moves the player to the other
    Teleporter { target_id: String },
    SpeedBoost,
    Shield,
    /// Reflects projectiles instead of destroying them
    Bouncer,
}

impl InteractiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            InteractiveKind::Teleporter { .. } => "teleporter",
            InteractiveKind::SpeedBoost => "speedBoost",
            InteractiveKind::Shield => "shield",
            InteractiveKind::Bouncer => "bouncer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractiveObject {
    pub id: String,
    pub rect: Rect,
    pub kind: InteractiveKind,
    pub active: bool,
    /// Teleporter ends are unusable until this clock time
    pub cooldown_until: f64,
    /// Collected pick-ups reactivate at this clock time
    pub respawn_at: f64,
}

impl InteractiveObject {
    pub fn new(id: &str, rect: Rect, kind: InteractiveKind) -> Self {
        Self {
            id: id.to_string(),
            rect,
            kind,
            active: true,
            cooldown_until: 0.0,
            respawn_at: 0.0,
        }
    }

    /// Reactivate a collected pick-up once its respawn deadline passes.
    /// Driven by the room's tick clock, never by player action.
    pub fn tick_respawn(&mut self, clock: f64) {
        if !self.active && clock >= self.respawn_at {
            self.active = true;
        }
    }

    pub fn data(&self) -> InteractiveObjectData {
        let target_id = match &self.kind {
            InteractiveKind::Teleporter { target_id } => Some(target_id.clone()),
            _ => None,
        };
        InteractiveObjectData {
            id: self.id.clone(),
            x: self.rect.x,
            y: self.rect.y,
            width: self.rect.width,
            height: self.rect.height,
            kind: self.kind.name().to_string(),
            active: self.active,
            target_id,
        }
    }
}
