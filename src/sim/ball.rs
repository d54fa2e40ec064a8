//! A pushable ball that sinks in water

use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

use super::actor::{Actor, ActorId, ActorKind, LevelContext};
use super::physics::CollisionPair;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::friction_to_damping;
use crate::renderer::{DrawList, colors};

pub struct Ball {
    id: ActorId,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Touched water this step; sinks on the next tick
    sinking: bool,
    alive: bool,
}

impl Ball {
    pub fn new(ctx: &mut LevelContext, position: Vec2) -> Self {
        let id = ctx.next_actor_id();
        let (body, collider) =
            ctx.physics
                .create_circle(position, BALL_RADIUS, friction_to_damping(BALL_AIR_FRICTION));
        ctx.tag_collider(collider, ActorKind::Ball);

        Self {
            id,
            body,
            collider,
            sinking: false,
            alive: true,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn is_sinking(&self) -> bool {
        self.sinking
    }

    fn sink(&mut self, ctx: &mut LevelContext) {
        if let Some(pos) = self.position(ctx) {
            ctx.play_sound_at_point(SoundEffect::Sink, pos);
        }
        ctx.add_score(BALL_SINK_POINTS);
        log::info!("Ball {} sank, score {}", self.id, ctx.score());
        self.destroy(ctx);
    }
}

impl Actor for Ball {
    fn id(&self) -> ActorId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Ball
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
        // Removal waits until every actor has seen this step's contacts
        if self.sinking {
            self.sink(ctx);
            return;
        }
        ctx.apply_ground_drag(self.body, self.collider, BALL_AIR_FRICTION);
    }

    fn on_collision_start(&mut self, ctx: &mut LevelContext, pair: &CollisionPair) {
        if !self.alive || self.sinking {
            return;
        }
        let Some(other) = pair.other(self.collider) else {
            return;
        };

        if pair.sensor {
            if ctx.surface(other).is_some_and(|s| s.lethal) {
                self.sinking = true;
            }
        } else if let Some(pos) = self.position(ctx) {
            ctx.play_sound_at_point(SoundEffect::Bump, pos);
        }
    }

    fn draw(&self, ctx: &LevelContext, list: &mut DrawList) {
        let Some(pos) = self.position(ctx) else {
            return;
        };
        let angle = ctx.physics.body_rotation(self.body).unwrap_or(0.0);

        list.fill_circle(pos, BALL_RADIUS, colors::BALL);
        // Stripe shows the spin
        let dir = Vec2::from_angle(angle) * BALL_RADIUS * 0.8;
        list.line(pos - dir, pos + dir, 4.0, colors::BALL_STRIPE);
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
