//! Actor trait and the level context actors operate on
//!
//! Actors never hold a reference to their level. Every hook receives the
//! [`LevelContext`] instead: the physics world, camera, input, score and the
//! sound queue.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

use super::camera::{Bounds, Camera};
use super::input::PlayerInput;
use super::level::LevelConfig;
use super::physics::{CollisionPair, PhysicsWorld};
use crate::audio::{SoundEffect, SoundRequest};
use crate::friction_to_damping;
use crate::renderer::DrawList;

/// Stable actor identifier (allocation order)
pub type ActorId = u32;

/// Concrete actor types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Floor,
    Sand,
    Water,
    Ball,
}

/// Ground properties of a terrain region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub kind: ActorKind,
    /// Fraction of velocity lost per 60 Hz step while on this surface
    pub friction: f32,
    /// Players drown here
    pub lethal: bool,
}

/// How the level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won { score: u64 },
    Lost,
}

impl Outcome {
    /// Message shown on the game-end overlay
    pub fn message(&self) -> String {
        match self {
            Outcome::Won { score } => format!("You won! Your score was {}!", score),
            Outcome::Lost => "You lost! Nobody made it out of the water.".to_string(),
        }
    }
}

/// Everything an actor may read or change while the level runs
pub struct LevelContext {
    pub config: LevelConfig,
    pub bounds: Bounds,
    pub physics: PhysicsWorld,
    pub camera: Camera,
    pub input: PlayerInput,
    /// Simulation tick counter
    pub time_ticks: u64,
    tags: HashMap<ColliderHandle, ActorKind>,
    surfaces: HashMap<ColliderHandle, Surface>,
    score: u64,
    outcome: Option<Outcome>,
    sounds: Vec<SoundRequest>,
    audio_enabled: bool,
    next_id: ActorId,
}

impl LevelContext {
    pub fn new(config: LevelConfig) -> Self {
        let bounds = Bounds::from_size(config.width, config.height);
        let camera = Camera::new(
            Vec2::new(config.viewport_width, config.viewport_height),
            config.player_margin,
        );
        let physics = PhysicsWorld::new(Vec2::new(config.gravity_x, config.gravity_y));

        Self {
            config,
            bounds,
            physics,
            camera,
            input: PlayerInput::default(),
            time_ticks: 0,
            tags: HashMap::new(),
            surfaces: HashMap::new(),
            score: 0,
            outcome: None,
            sounds: Vec::new(),
            audio_enabled: true,
            next_id: 1,
        }
    }

    /// Allocate a new actor ID
    pub fn next_actor_id(&mut self) -> ActorId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Collider bookkeeping ===

    /// Remember which kind of actor owns a collider
    pub fn tag_collider(&mut self, collider: ColliderHandle, kind: ActorKind) {
        self.tags.insert(collider, kind);
    }

    pub fn untag_collider(&mut self, collider: ColliderHandle) {
        self.tags.remove(&collider);
    }

    pub fn kind_of(&self, collider: ColliderHandle) -> Option<ActorKind> {
        self.tags.get(&collider).copied()
    }

    pub fn register_surface(&mut self, collider: ColliderHandle, surface: Surface) {
        self.tag_collider(collider, surface.kind);
        self.surfaces.insert(collider, surface);
    }

    pub fn remove_surface(&mut self, collider: ColliderHandle) {
        self.untag_collider(collider);
        self.surfaces.remove(&collider);
    }

    pub fn surface(&self, collider: ColliderHandle) -> Option<Surface> {
        self.surfaces.get(&collider).copied()
    }

    /// Terrain surfaces the collider currently overlaps
    pub fn surfaces_under(&self, collider: ColliderHandle) -> Vec<Surface> {
        self.physics
            .intersecting(collider)
            .into_iter()
            .filter_map(|other| self.surface(other))
            .collect()
    }

    /// Damp `body` by its own air friction combined with the stickiest
    /// surface under `collider`. Returns the surfaces it overlaps.
    pub fn apply_ground_drag(
        &mut self,
        body: RigidBodyHandle,
        collider: ColliderHandle,
        air_friction: f32,
    ) -> Vec<Surface> {
        let surfaces = self.surfaces_under(collider);
        let ground = surfaces
            .iter()
            .map(|s| s.friction)
            .fold(0.0_f32, f32::max);
        let retained = (1.0 - air_friction) * (1.0 - ground);
        self.physics
            .set_linear_damping(body, friction_to_damping(1.0 - retained));
        surfaces
    }

    // === World ===

    pub fn point_is_out_of_bounds(&self, point: Vec2) -> bool {
        !self.bounds.contains(point)
    }

    // === Score and outcome ===

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// End the level as won (ignored once an outcome is set)
    pub fn win(&mut self) {
        if self.outcome.is_none() {
            log::info!("Level won with score {}", self.score);
            self.outcome = Some(Outcome::Won { score: self.score });
        }
    }

    /// End the level as lost (ignored once an outcome is set)
    pub fn lose(&mut self) {
        if self.outcome.is_none() {
            log::info!("Level lost");
            self.outcome = Some(Outcome::Lost);
        }
    }

    // === Sound ===

    /// Without audio, sound requests are dropped
    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
        if !enabled {
            self.sounds.clear();
        }
    }

    pub fn play_sound(&mut self, effect: SoundEffect) {
        if self.audio_enabled {
            self.sounds.push(SoundRequest { effect, at: None });
        }
    }

    pub fn play_sound_at_point(&mut self, effect: SoundEffect, point: Vec2) {
        if self.audio_enabled {
            self.sounds.push(SoundRequest {
                effect,
                at: Some(point),
            });
        }
    }

    pub fn drain_sounds(&mut self) -> Vec<SoundRequest> {
        std::mem::take(&mut self.sounds)
    }
}

/// A drawable, tickable entity placed in a level.
///
/// Every hook except [`Actor::id`] and [`Actor::kind`] is optional.
pub trait Actor {
    fn id(&self) -> ActorId;

    fn kind(&self) -> ActorKind;

    /// World position, for actors backed by a body
    fn position(&self, _ctx: &LevelContext) -> Option<Vec2> {
        None
    }

    /// Dead actors are dropped from the level after the current tick
    fn is_alive(&self) -> bool {
        true
    }

    fn tick(&mut self, _ctx: &mut LevelContext) {}

    fn on_collision_start(&mut self, _ctx: &mut LevelContext, _pair: &CollisionPair) {}

    fn on_collision_end(&mut self, _ctx: &mut LevelContext, _pair: &CollisionPair) {}

    /// Pointer moved, in game space
    fn on_mouse_move(&mut self, _ctx: &mut LevelContext, _position: Vec2) {}

    /// Drawn beneath the physics bodies
    fn draw_background(&self, _ctx: &LevelContext, _list: &mut DrawList) {}

    fn draw(&self, _ctx: &LevelContext, _list: &mut DrawList) {}

    /// Remove the actor's bodies and colliders from the world
    fn destroy(&mut self, _ctx: &mut LevelContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_outcome_sticks() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        ctx.add_score(40);
        ctx.win();
        ctx.add_score(10);
        ctx.lose();
        assert_eq!(ctx.outcome(), Some(Outcome::Won { score: 40 }));
        assert_eq!(ctx.outcome().unwrap().message(), "You won! Your score was 40!");
    }

    #[test]
    fn test_sounds_dropped_without_audio() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        ctx.play_sound(SoundEffect::Bump);
        ctx.set_audio_enabled(false);
        ctx.play_sound_at_point(SoundEffect::Dead, Vec2::ONE);
        assert!(ctx.drain_sounds().is_empty());

        ctx.set_audio_enabled(true);
        ctx.play_sound_at_point(SoundEffect::Dead, Vec2::ONE);
        let sounds = ctx.drain_sounds();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].at, Some(Vec2::ONE));
        assert!(ctx.drain_sounds().is_empty());
    }

    #[test]
    fn test_score_saturates() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        ctx.add_score(u64::MAX);
        ctx.add_score(5);
        assert_eq!(ctx.score(), u64::MAX);
    }

    #[test]
    fn test_actor_ids_increase() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let a = ctx.next_actor_id();
        let b = ctx.next_actor_id();
        assert!(b > a);
    }
}
