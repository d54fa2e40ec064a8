//! Static terrain regions: floor, sand and water
//!
//! Terrain is a polygon painted beneath everything else. Each region is also a
//! sensor in the physics world so bodies rolling over it can look up its
//! [`Surface`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rapier2d::prelude::ColliderHandle;

use super::actor::{Actor, ActorId, ActorKind, LevelContext, Surface};
use super::physics::CollisionPair;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::renderer::{DrawList, colors};

/// Sand grains per 1000 square pixels
const GRAIN_DENSITY: f32 = 1.5;
/// Ripple lifetime in ticks
const RIPPLE_TICKS: u64 = 60;
const RIPPLE_MAX_RADIUS: f32 = 40.0;

/// Even-odd point in polygon test
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Absolute polygon area (shoelace)
fn polygon_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum::<f32>()
        .abs()
        / 2.0
}

/// Scatter grains uniformly inside the polygon
fn scatter_grains(polygon: &[Vec2], seed: u64) -> Vec<Vec2> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let min = polygon.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min);
    let max = polygon.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max);
    let target = (polygon_area(polygon) / 1000.0 * GRAIN_DENSITY) as usize;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut grains = Vec::with_capacity(target);
    let mut attempts = 0;
    while grains.len() < target && attempts < target * 20 {
        attempts += 1;
        let p = Vec2::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
        );
        if point_in_polygon(p, polygon) {
            grains.push(p);
        }
    }
    grains
}

/// A floor, sand or water region
pub struct Terrain {
    id: ActorId,
    surface: Surface,
    vertices: Vec<Vec2>,
    collider: Option<ColliderHandle>,
    color: [f32; 4],
    /// Sand texture
    grains: Vec<Vec2>,
    /// Water ripples: (center, tick started)
    ripples: Vec<(Vec2, u64)>,
}

impl Terrain {
    fn new(ctx: &mut LevelContext, surface: Surface, vertices: Vec<Vec2>, color: [f32; 4]) -> Self {
        let id = ctx.next_actor_id();
        let collider = ctx.physics.add_sensor_polygon(&vertices);
        match collider {
            Some(handle) => ctx.register_surface(handle, surface),
            None => log::warn!(
                "{:?} region {} has a degenerate outline ({} vertices)",
                surface.kind,
                id,
                vertices.len()
            ),
        }

        Self {
            id,
            surface,
            vertices,
            collider,
            color,
            grains: Vec::new(),
            ripples: Vec::new(),
        }
    }

    /// Plain ground with almost no friction
    pub fn floor(ctx: &mut LevelContext, vertices: Vec<Vec2>) -> Self {
        let surface = Surface {
            kind: ActorKind::Floor,
            friction: FLOOR_FRICTION,
            lethal: false,
        };
        Self::new(ctx, surface, vertices, colors::FLOOR)
    }

    /// Sticky ground; grain texture is derived from `seed`
    pub fn sand(ctx: &mut LevelContext, vertices: Vec<Vec2>, seed: u64) -> Self {
        let surface = Surface {
            kind: ActorKind::Sand,
            friction: SAND_FRICTION,
            lethal: false,
        };
        let mut terrain = Self::new(ctx, surface, vertices, colors::SAND);
        terrain.grains = scatter_grains(&terrain.vertices, seed);
        terrain
    }

    /// Deep water: slows bodies down and drowns players
    pub fn water(ctx: &mut LevelContext, vertices: Vec<Vec2>) -> Self {
        let surface = Surface {
            kind: ActorKind::Water,
            friction: WATER_FRICTION,
            lethal: true,
        };
        Self::new(ctx, surface, vertices, colors::WATER)
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn collider(&self) -> Option<ColliderHandle> {
        self.collider
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn grains(&self) -> &[Vec2] {
        &self.grains
    }

    pub fn ripple_count(&self) -> usize {
        self.ripples.len()
    }
}

impl Actor for Terrain {
    fn id(&self) -> ActorId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        self.surface.kind
    }

    fn tick(&mut self, ctx: &mut LevelContext) {
        let now = ctx.time_ticks;
        self.ripples
            .retain(|(_, start)| now.saturating_sub(*start) < RIPPLE_TICKS);
    }

    fn on_collision_start(&mut self, ctx: &mut LevelContext, pair: &CollisionPair) {
        if self.surface.kind != ActorKind::Water {
            return;
        }
        let Some(mine) = self.collider else { return };
        let Some(other) = pair.other(mine) else { return };

        if matches!(ctx.kind_of(other), Some(ActorKind::Player) | Some(ActorKind::Ball)) {
            if let Some(at) = ctx.physics.collider_position(other) {
                self.ripples.push((at, ctx.time_ticks));
                ctx.play_sound_at_point(SoundEffect::Splash, at);
            }
        }
    }

    fn draw_background(&self, ctx: &LevelContext, list: &mut DrawList) {
        list.fill_polygon(&self.vertices, self.color);

        for grain in &self.grains {
            list.fill_rect(*grain, Vec2::splat(2.0), colors::SAND_GRAIN);
        }

        for (center, start) in &self.ripples {
            let age = ctx.time_ticks.saturating_sub(*start) as f32 / RIPPLE_TICKS as f32;
            list.stroke_circle(*center, age * RIPPLE_MAX_RADIUS, 2.0, colors::WATER_RIPPLE);
        }
    }

    fn destroy(&mut self, ctx: &mut LevelContext) {
        if let Some(handle) = self.collider.take() {
            ctx.remove_surface(handle);
            ctx.physics.remove_collider(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelConfig;

    fn square(x: f32, y: f32, size: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(x, y),
            Vec2::new(x + size, y),
            Vec2::new(x + size, y + size),
            Vec2::new(x, y + size),
        ]
    }

    #[test]
    fn test_point_in_polygon() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(15.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(5.0, 5.0), &sq[..2]));
    }

    #[test]
    fn test_sand_grains_inside_and_deterministic() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let outline = square(100.0, 100.0, 200.0);
        let a = Terrain::sand(&mut ctx, outline.clone(), 3);
        let b = Terrain::sand(&mut ctx, outline.clone(), 3);

        assert!(!a.grains().is_empty());
        assert_eq!(a.grains(), b.grains());
        assert!(a.grains().iter().all(|g| point_in_polygon(*g, &outline)));
    }

    #[test]
    fn test_surfaces_registered_and_removed() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let mut floor = Terrain::floor(&mut ctx, square(0.0, 0.0, 50.0));
        let handle = floor.collider().unwrap();

        let surface = ctx.surface(handle).unwrap();
        assert_eq!(surface.kind, ActorKind::Floor);
        assert_eq!(surface.friction, FLOOR_FRICTION);
        assert_eq!(ctx.kind_of(handle), Some(ActorKind::Floor));

        floor.destroy(&mut ctx);
        assert!(ctx.surface(handle).is_none());
        assert!(!ctx.physics.contains_collider(handle));
    }

    #[test]
    fn test_degenerate_region_has_no_collider() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let water = Terrain::water(&mut ctx, vec![Vec2::ZERO, Vec2::X]);
        assert!(water.collider().is_none());
        assert!(water.surface().lethal);
    }

    #[test]
    fn test_water_splashes_for_player() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let mut water = Terrain::water(&mut ctx, square(0.0, 0.0, 100.0));
        let (_, player) = ctx.physics.create_circle(Vec2::new(50.0, 50.0), 5.0, 0.0);
        ctx.tag_collider(player, ActorKind::Player);

        let pair = CollisionPair {
            a: player,
            b: water.collider().unwrap(),
            sensor: true,
        };
        water.on_collision_start(&mut ctx, &pair);

        assert_eq!(water.ripple_count(), 1);
        let sounds = ctx.drain_sounds();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].effect, SoundEffect::Splash);
        assert_eq!(sounds[0].at, Some(Vec2::new(50.0, 50.0)));

        // Ripples fade out
        ctx.time_ticks += RIPPLE_TICKS;
        water.tick(&mut ctx);
        assert_eq!(water.ripple_count(), 0);
    }

    #[test]
    fn test_water_splashes_for_ball() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let mut water = Terrain::water(&mut ctx, square(0.0, 0.0, 100.0));
        let (_, ball) = ctx.physics.create_circle(Vec2::new(20.0, 30.0), 5.0, 0.0);
        ctx.tag_collider(ball, ActorKind::Ball);

        let pair = CollisionPair {
            a: water.collider().unwrap(),
            b: ball,
            sensor: true,
        };
        water.on_collision_start(&mut ctx, &pair);

        assert_eq!(water.ripple_count(), 1);
        let sounds = ctx.drain_sounds();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].effect, SoundEffect::Splash);
        assert_eq!(sounds[0].at, Some(Vec2::new(20.0, 30.0)));
    }

    #[test]
    fn test_floor_ignores_collisions() {
        let mut ctx = LevelContext::new(LevelConfig::default());
        let mut floor = Terrain::floor(&mut ctx, square(0.0, 0.0, 100.0));
        let (_, player) = ctx.physics.create_circle(Vec2::new(50.0, 50.0), 5.0, 0.0);
        ctx.tag_collider(player, ActorKind::Player);
        let pair = CollisionPair {
            a: floor.collider().unwrap(),
            b: player,
            sensor: true,
        };
        floor.on_collision_start(&mut ctx, &pair);
        assert!(ctx.drain_sounds().is_empty());
    }
}
