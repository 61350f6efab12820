//! Current screen dimensions.

use glam::{Vec2, Vec3};

/// Width/height in pixels of the area the game is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width:  f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    /// Phone-sized or portrait screens get slower, smaller objects.
    pub fn is_narrow(&self) -> bool {
        self.width <= 768.0 || (self.width <= 1024.0 && self.height > self.width)
    }

    /// Map a normalized sensor point to screen pixels.
    ///
    /// The camera faces the player, so the horizontal axis is mirrored.
    pub fn to_screen(&self, p: Vec3) -> Vec2 {
        Vec2::new((1.0 - p.x) * self.width, p.y * self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self { Viewport::new(1280.0, 720.0) }
}
