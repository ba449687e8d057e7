//! Shared geometry primitives - the one rectangle overlap test every
//! collision check in the server goes through, plus toroidal wrapping.

use serde::{Deserialize, Serialize};

/// 2D vector used for positions, velocities and input axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalized(self) -> Self {
        let len = self.magnitude();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            self
        }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Axis-aligned overlap test. Touching edges do not count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Wrap a coordinate toroidally within [0, extent). An entity of the given
/// size that leaves one edge reappears at the opposite edge, never clamped.
pub fn wrap_coord(value: f32, extent: f32, size: f32) -> f32 {
    if value < 0.0 {
        extent - size
    } else if value > extent - size {
        0.0
    } else {
        value
    }
}
