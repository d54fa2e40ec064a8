//! Sandlot - A top-down physics playground
//!
//! Core modules:
//! - `sim`: Level, actors, camera and the rapier physics world
//! - `renderer`: Draw lists and the WebGPU render pipeline
//! - `audio`: Procedural Web Audio sound effects and music
//! - `hud`: HUD text and the frame-time debug graph
//! - `platform`: Browser event listener bookkeeping

pub mod audio;
pub mod error;
pub mod hud;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{Result, SandlotError};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the physics engine's native rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default level dimensions
    pub const LEVEL_WIDTH: f32 = 800.0;
    pub const LEVEL_HEIGHT: f32 = 600.0;
    pub const HUD_MARGIN: f32 = 32.0;

    /// Default viewport and camera slack around the player
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;
    pub const PLAYER_MARGIN: f32 = 200.0;

    /// Player body
    pub const PLAYER_RADIUS: f32 = 15.0;
    /// Fraction of velocity lost per 60 Hz step to air friction
    pub const PLAYER_AIR_FRICTION: f32 = 0.25;
    /// Walking acceleration (pixels/s²)
    pub const PLAYER_LEG_STRENGTH: f32 = 4000.0;
    /// Time spent in water before the player drowns
    pub const DROWN_SECONDS: f32 = 4.0;

    /// Pushable ball
    pub const BALL_RADIUS: f32 = 20.0;
    pub const BALL_AIR_FRICTION: f32 = 0.05;
    /// Points awarded for sinking a ball in water
    pub const BALL_SINK_POINTS: u64 = 100;

    /// Terrain friction (fraction of velocity lost per 60 Hz step)
    pub const FLOOR_FRICTION: f32 = 0.01;
    pub const SAND_FRICTION: f32 = 0.2;
    pub const WATER_FRICTION: f32 = 0.35;
}

/// Convert a per-step velocity retention loss (as used by frame-based engines
/// at 60 Hz) into a continuous linear damping coefficient.
///
/// A friction of `0.25` keeps 75% of the velocity every 1/60 s.
#[inline]
pub fn friction_to_damping(friction: f32) -> f32 {
    let retained = (1.0 - friction).clamp(1e-4, 1.0);
    -retained.ln() / consts::SIM_DT
}

/// Clamp `value` into `[min, max]`, collapsing to the midpoint when the range
/// is empty instead of panicking like `f32::clamp`.
#[inline]
pub fn clamp_or_center(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        (min + max) * 0.5
    } else {
        value.clamp(min, max)
    }
}
