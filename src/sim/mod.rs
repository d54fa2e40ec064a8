//! Simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only (sand texture)
//! - Actors stored and ticked in spawn order
//! - No platform dependencies; actors only emit draw lists

pub mod actor;
pub mod ball;
pub mod camera;
pub mod demo;
pub mod input;
pub mod level;
pub mod physics;
pub mod player;
pub mod terrain;

pub use actor::{Actor, ActorId, ActorKind, LevelContext, Outcome, Surface};
pub use ball::Ball;
pub use camera::{Bounds, Camera};
pub use demo::FloorDemo;
pub use input::PlayerInput;
pub use level::{Level, LevelConfig, LevelScript, LevelState, PointerKind, TouchKind};
pub use physics::{BodyOutline, CollisionPair, ContactEvent, PhysicsWorld};
pub use player::Player;
pub use terrain::Terrain;
