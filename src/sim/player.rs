//! The player-controlled circle

use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

use super::actor::{Actor, ActorId, ActorKind, LevelContext};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::friction_to_damping;
use crate::renderer::{DrawList, colors};

/// Player actor: walks with the keyboard, faces the pointer when idle
pub struct Player {
    id: ActorId,
    spawn_point: Vec2,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Facing angle (radians)
    facing: f32,
    /// Last pointer position in game space
    look_at: Option<Vec2>,
    /// Consecutive ticks spent in lethal water
    submerged_ticks: u32,
    alive: bool,
}

impl Player {
    pub fn new(ctx: &mut LevelContext, spawn_point: Vec2) -> Self {
        let id = ctx.next_actor_id();
        let (body, collider) = Self::create_body(ctx, spawn_point);
        log::debug!("Player {} spawned at {:?}", id, spawn_point);

        Self {
            id,
            spawn_point,
            body,
            collider,
            facing: 0.0,
            look_at: None,
            submerged_ticks: 0,
            alive: true,
        }
    }

    fn create_body(ctx: &mut LevelContext, at: Vec2) -> (RigidBodyHandle, ColliderHandle) {
        let (body, collider) = ctx.physics.create_circle(
            at,
            PLAYER_RADIUS,
            friction_to_damping(PLAYER_AIR_FRICTION),
        );
        ctx.tag_collider(collider, ActorKind::Player);
        (body, collider)
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Drop the current body and start over at the spawn point
    fn respawn(&mut self, ctx: &mut LevelContext) {
        log::debug!("Player {} left the world, respawning", self.id);
        ctx.untag_collider(self.collider);
        ctx.physics.remove_body(self.body);
        let (body, collider) = Self::create_body(ctx, self.spawn_point);
        self.body = body;
        self.collider = collider;
        self.submerged_ticks = 0;
    }

    fn do_movement(&mut self, ctx: &mut LevelContext) {
        let walk = ctx.input.normalized_movement() * PLAYER_LEG_STRENGTH;
        ctx.physics.set_acceleration(self.body, walk);

        if walk.length_squared() > 0.0 {
            self.facing = walk.y.atan2(walk.x);
            ctx.physics.set_rotation(self.body, self.facing);
        } else if let (Some(target), Some(pos)) = (self.look_at, self.position(ctx)) {
            let to_target = target - pos;
            if to_target.length_squared() > 1.0 {
                self.facing = to_target.y.atan2(to_target.x);
                ctx.physics.set_rotation(self.body, self.facing);
            }
        }
    }

    /// Ground friction from the terrain underneath, and drowning
    fn apply_surfaces(&mut self, ctx: &mut LevelContext) {
        let surfaces = ctx.apply_ground_drag(self.body, self.collider, PLAYER_AIR_FRICTION);
        if surfaces.iter().any(|s| s.lethal) {
            self.submerged_ticks += 1;
        } else {
            self.submerged_ticks = 0;
        }
    }

    pub fn kill(&mut self, ctx: &mut LevelContext) {
        if let Some(pos) = self.position(ctx) {
            ctx.play_sound_at_point(SoundEffect::Dead, pos);
        }
        log::info!("Player {} died", self.id);
        self.destroy(ctx);
    }
}

impl Actor for Player {
    fn id(&self) -> ActorId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Player
    }

    fn position(&self, ctx: &LevelContext) -> Option<Vec2> {
        ctx.physics.body_position(self.body)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn tick(&mut self, ctx: &mut LevelContext) {
        if !self.alive {
            return;
        }

        self.do_movement(ctx);
        self.apply_surfaces(ctx);

        if self.submerged_ticks as f32 * SIM_DT >= DROWN_SECONDS {
            self.kill(ctx);
            return;
        }

        if let Some(pos) = self.position(ctx) {
            if ctx.point_is_out_of_bounds(pos) {
                self.respawn(ctx);
            }
        }
    }

    fn on_mouse_move(&mut self, _ctx: &mut LevelContext, position: Vec2) {
        self.look_at = Some(position);
    }

    fn draw(&self, ctx: &LevelContext, list: &mut DrawList) {
        let Some(pos) = self.position(ctx) else {
            return;
        };
        list.fill_circle(pos, PLAYER_RADIUS, colors::PLAYER);
        list.stroke_circle(pos, PLAYER_RADIUS, 1.5, colors::PLAYER_STROKE);

        let nose = pos + Vec2::from_angle(self.facing) * PLAYER_RADIUS;
        list.line(pos, nose, 2.0, colors::PLAYER_STROKE);
    }

    fn destroy(&mut self, ctx: &mut LevelContext) {
        if !self.alive {
            return;
        }
        self.alive = false;
        ctx.untag_collider(self.collider);
        ctx.physics.remove_body(self.body);
    }
}
