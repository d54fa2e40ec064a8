//! Viewport camera that follows the players
//!
//! The camera keeps a view center that lags behind the followed point by at
//! most `player_margin` and never shows anything outside the world bounds.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_or_center;
use crate::consts::*;

/// Axis-aligned world bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds spanning `(0, 0)` to `(width, height)`
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Camera state (derived each tick from the player positions)
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World-space point shown at the middle of the canvas
    pub center: Vec2,
    /// Canvas size in pixels
    pub viewport: Vec2,
    /// How far the followed point may drift from the center
    pub player_margin: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vec2::new(VIEWPORT_WIDTH / 2.0, VIEWPORT_HEIGHT / 2.0),
            viewport: Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            player_margin: PLAYER_MARGIN,
        }
    }
}

impl Camera {
    pub fn new(viewport: Vec2, player_margin: f32) -> Self {
        Self {
            center: viewport * 0.5,
            viewport,
            player_margin,
        }
    }

    /// Move the center just enough to keep `point` within the margin, then
    /// keep the view inside `bounds`. Each axis is handled independently.
    pub fn move_into_view(&mut self, point: Vec2, bounds: &Bounds) {
        let margin = self.player_margin;
        let half = self.viewport * 0.5;

        self.center.x = clamp_or_center(self.center.x, point.x - margin, point.x + margin);
        self.center.y = clamp_or_center(self.center.y, point.y - margin, point.y + margin);

        self.center.x = clamp_or_center(self.center.x, bounds.min.x + half.x, bounds.max.x - half.x);
        self.center.y = clamp_or_center(self.center.y, bounds.min.y + half.y, bounds.max.y - half.y);
    }

    /// World position of the canvas' upper-left corner
    pub fn upper_left(&self) -> Vec2 {
        self.center - self.viewport * 0.5
    }

    /// Canvas pixel -> world position
    pub fn view_to_world(&self, point: Vec2) -> Vec2 {
        point + self.upper_left()
    }

    /// World position -> canvas pixel
    pub fn world_to_view(&self, point: Vec2) -> Vec2 {
        point - self.upper_left()
    }

    /// Resize the viewport (keeps the center)
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }
}
