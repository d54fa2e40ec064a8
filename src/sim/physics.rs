//! Rigid body physics backed by rapier2d
//!
//! World coordinates are canvas pixels with +y pointing down. Gravity is zero
//! by default: levels are seen from above and bodies slide on the ground.

use glam::Vec2;
use rapier2d::crossbeam::channel::{Receiver, unbounded};
use rapier2d::prelude::*;

use crate::consts::SIM_DT;

/// A pair of colliders that started or stopped touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: ColliderHandle,
    pub b: ColliderHandle,
    /// One of the two colliders is a sensor region
    pub sensor: bool,
}

impl CollisionPair {
    /// True if `handle` is one of the two colliders
    pub fn involves(&self, handle: ColliderHandle) -> bool {
        self.a == handle || self.b == handle
    }

    /// The collider on the other side of `handle`, if `handle` is involved
    pub fn other(&self, handle: ColliderHandle) -> Option<ColliderHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Contact events produced by one physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Started(CollisionPair),
    Stopped(CollisionPair),
}

/// Outline of a solid collider, for debug drawing
#[derive(Debug, Clone, PartialEq)]
pub enum BodyOutline {
    Circle { center: Vec2, radius: f32 },
    Polygon(Vec<Vec2>),
}

#[inline]
fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Manages the rapier2d physics world
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    /// Contact force events are never enabled
    _force_events: Receiver<ContactForceEvent>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: SIM_DT,
            ..Default::default()
        };
        let (collision_send, collision_events) = unbounded();
        let (force_send, force_events) = unbounded();

        Self {
            gravity: vector![gravity.x, gravity.y],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            _force_events: force_events,
        }
    }

    /// Advance the simulation by one fixed step and return the contact
    /// events it produced, in the order the pipeline reported them.
    pub fn step(&mut self) -> Vec<ContactEvent> {
        let physics_hooks = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &self.collector,
        );

        self.collision_events
            .try_iter()
            .map(|event| {
                let pair = CollisionPair {
                    a: event.collider1(),
                    b: event.collider2(),
                    sensor: event.sensor(),
                };
                if event.started() {
                    ContactEvent::Started(pair)
                } else {
                    ContactEvent::Stopped(pair)
                }
            })
            .collect()
    }

    /// Create a dynamic circle that reports collision events.
    /// Returns the body and its collider.
    pub fn create_circle(
        &mut self,
        position: Vec2,
        radius: f32,
        linear_damping: f32,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y])
            .linear_damping(linear_damping)
            .angular_damping(linear_damping)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .density(1.0)
            .friction(0.1)
            .restitution(0.3)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        log::debug!(
            "Physics: created circle r={} at ({:.1}, {:.1})",
            radius,
            position.x,
            position.y
        );

        (body_handle, collider_handle)
    }

    /// Add a static rectangle centered at `center`
    pub fn add_static_rect(&mut self, center: Vec2, width: f32, height: f32) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(width / 2.0, height / 2.0)
            .translation(vector![center.x, center.y])
            .friction(0.1)
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static sensor region shaped like the (possibly concave) polygon.
    /// Returns `None` for degenerate outlines.
    pub fn add_sensor_polygon(&mut self, vertices: &[Vec2]) -> Option<ColliderHandle> {
        if vertices.len() < 3 {
            return None;
        }

        let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y]).collect();
        let n = points.len() as u32;
        let indices: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();

        let collider = ColliderBuilder::convex_decomposition(&points, &indices)
            .sensor(true)
            .build();
        Some(self.collider_set.insert(collider))
    }

    /// Remove a body together with its attached colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Remove a parentless collider
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
    }

    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    pub fn contains_collider(&self, handle: ColliderHandle) -> bool {
        self.collider_set.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec2(body.translation()))
    }

    /// World position of a collider (the body position for attached colliders)
    pub fn collider_position(&self, handle: ColliderHandle) -> Option<Vec2> {
        self.collider_set
            .get(handle)
            .map(|collider| to_vec2(&collider.position().translation.vector))
    }

    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set
            .get(handle)
            .map(|body| body.rotation().angle())
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec2(body.linvel()))
    }

    /// Replace the persistent force on a body with `acceleration * mass`
    pub fn set_acceleration(&mut self, handle: RigidBodyHandle, acceleration: Vec2) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let mass = body.mass();
            body.reset_forces(false);
            if acceleration != Vec2::ZERO {
                body.add_force(vector![acceleration.x * mass, acceleration.y * mass], true);
            }
        }
    }

    pub fn set_rotation(&mut self, handle: RigidBodyHandle, angle: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_rotation(Rotation::new(angle), true);
        }
    }

    pub fn set_linear_damping(&mut self, handle: RigidBodyHandle, damping: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linear_damping(damping);
        }
    }

    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    /// Colliders currently overlapping `handle` (sensor intersections only)
    pub fn intersecting(&self, handle: ColliderHandle) -> Vec<ColliderHandle> {
        self.narrow_phase
            .intersection_pairs_with(handle)
            .filter(|(_, _, intersecting)| *intersecting)
            .map(|(a, b, _)| if a == handle { b } else { a })
            .collect()
    }

    /// Outlines of every solid (non-sensor) collider, in insertion order
    pub fn solid_outlines(&self) -> Vec<BodyOutline> {
        let mut outlines = Vec::new();

        for (_, collider) in self.collider_set.iter() {
            if collider.is_sensor() {
                continue;
            }
            let iso = collider.position();
            let shape = collider.shape();

            if let Some(ball) = shape.as_ball() {
                outlines.push(BodyOutline::Circle {
                    center: to_vec2(&iso.translation.vector),
                    radius: ball.radius,
                });
            } else if let Some(cuboid) = shape.as_cuboid() {
                let h = cuboid.half_extents;
                let corners = [
                    point![-h.x, -h.y],
                    point![h.x, -h.y],
                    point![h.x, h.y],
                    point![-h.x, h.y],
                ];
                let polygon = corners
                    .iter()
                    .map(|p| {
                        let world = iso * p;
                        Vec2::new(world.x, world.y)
                    })
                    .collect();
                outlines.push(BodyOutline::Polygon(polygon));
            } else if let Some(convex) = shape.as_convex_polygon() {
                let polygon = convex
                    .points()
                    .iter()
                    .map(|p| {
                        let world = iso * p;
                        Vec2::new(world.x, world.y)
                    })
                    .collect();
                outlines.push(BodyOutline::Polygon(polygon));
            }
        }

        outlines
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, size: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(x, y),
            Vec2::new(x + size, y),
            Vec2::new(x + size, y + size),
            Vec2::new(x, y + size),
        ]
    }

    #[test]
    fn test_circle_moves_under_acceleration() {
        let mut world = PhysicsWorld::default();
        let (body, _) = world.create_circle(Vec2::new(100.0, 100.0), 10.0, 0.0);

        world.set_acceleration(body, Vec2::new(600.0, 0.0));
        for _ in 0..30 {
            world.step();
        }

        let pos = world.body_position(body).unwrap();
        assert!(pos.x > 110.0, "body should have moved right, got {:?}", pos);
        assert!((pos.y - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_remove_body_removes_collider() {
        let mut world = PhysicsWorld::default();
        let (body, collider) = world.create_circle(Vec2::new(0.0, 0.0), 5.0, 0.0);
        assert!(world.contains_body(body));
        assert!(world.contains_collider(collider));

        world.remove_body(body);
        assert!(!world.contains_body(body));
        assert!(!world.contains_collider(collider));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_sensor_reports_start_and_overlap() {
        let mut world = PhysicsWorld::default();
        let sensor = world
            .add_sensor_polygon(&square(0.0, 0.0, 100.0))
            .expect("valid polygon");
        let (_, ball) = world.create_circle(Vec2::new(50.0, 50.0), 5.0, 0.0);

        let events = world.step();
        let started = events.iter().any(|e| match e {
            ContactEvent::Started(pair) => pair.involves(sensor) && pair.involves(ball) && pair.sensor,
            ContactEvent::Stopped(_) => false,
        });
        assert!(started, "expected sensor start event, got {:?}", events);
        assert_eq!(world.intersecting(ball), vec![sensor]);
    }

    #[test]
    fn test_events_drained_each_step() {
        let mut world = PhysicsWorld::default();
        let sensor = world
            .add_sensor_polygon(&square(0.0, 0.0, 100.0))
            .expect("valid polygon");
        let (body, ball) = world.create_circle(Vec2::new(50.0, 50.0), 5.0, 0.0);

        assert_eq!(world.step().len(), 1);
        assert!(world.step().is_empty(), "events must not be reported twice");

        world.set_velocity(body, Vec2::new(0.0, 6000.0));
        let mut stopped = false;
        for _ in 0..10 {
            stopped |= world.step().iter().any(|e| {
                matches!(e, ContactEvent::Stopped(pair) if pair.involves(sensor) && pair.involves(ball))
            });
        }
        assert!(stopped, "leaving the sensor should report a stop event");
    }

    #[test]
    fn test_degenerate_sensor_rejected() {
        let mut world = PhysicsWorld::default();
        assert!(world.add_sensor_polygon(&[Vec2::ZERO, Vec2::X]).is_none());
    }

    #[test]
    fn test_solid_outlines_skip_sensors() {
        let mut world = PhysicsWorld::default();
        world.add_static_rect(Vec2::new(50.0, 50.0), 20.0, 10.0);
        world.add_sensor_polygon(&square(200.0, 200.0, 50.0));
        world.create_circle(Vec2::new(300.0, 300.0), 7.0, 0.0);

        let outlines = world.solid_outlines();
        assert_eq!(outlines.len(), 2);
        assert!(outlines.contains(&BodyOutline::Circle {
            center: Vec2::new(300.0, 300.0),
            radius: 7.0,
        }));
        let rect = outlines
            .iter()
            .find_map(|o| match o {
                BodyOutline::Polygon(points) => Some(points.clone()),
                _ => None,
            })
            .unwrap();
        assert!(rect.contains(&Vec2::new(40.0, 45.0)));
        assert!(rect.contains(&Vec2::new(60.0, 55.0)));
    }

    #[test]
    fn test_collision_pair_other() {
        let mut world = PhysicsWorld::default();
        let a = world.add_static_rect(Vec2::ZERO, 1.0, 1.0);
        let b = world.add_static_rect(Vec2::ONE, 1.0, 1.0);
        let c = world.add_static_rect(Vec2::ONE * 5.0, 1.0, 1.0);
        let pair = CollisionPair { a, b, sensor: false };
        assert_eq!(pair.other(a), Some(b));
        assert_eq!(pair.other(b), Some(a));
        assert_eq!(pair.other(c), None);
    }
}
