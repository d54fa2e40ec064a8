//! Frame composition
//!
//! Paints a level in a fixed order: level background, actor backgrounds,
//! solid physics bodies, actors, level foreground. The HUD overlay is drawn
//! afterwards in screen space.

use glam::Vec2;

use super::shapes::DrawList;
use super::vertex::{Vertex, colors};
use crate::hud::{FrameStats, GRAPH_HEIGHT};
use crate::settings::Settings;
use crate::sim::{BodyOutline, Camera, Level};

/// One composed frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// World-space triangles
    pub world: DrawList,
    /// Screen-space triangles on top of the world
    pub overlay: DrawList,
    pub camera: Camera,
}

impl Frame {
    /// All triangles in normalized device coordinates, world first
    pub fn to_clip_space(&self) -> Vec<Vertex> {
        let viewport = self.camera.viewport;
        let world = self.world.vertices().iter().map(|v| {
            let view = self.camera.world_to_view(Vec2::from(v.position));
            Vertex::new_at(view_to_ndc(view, viewport), v.color)
        });
        let overlay = self
            .overlay
            .vertices()
            .iter()
            .map(|v| Vertex::new_at(view_to_ndc(Vec2::from(v.position), viewport), v.color));
        world.chain(overlay).collect()
    }
}

/// Canvas pixel (y down) -> NDC (y up)
pub fn view_to_ndc(point: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        point.x / viewport.x * 2.0 - 1.0,
        1.0 - point.y / viewport.y * 2.0,
    )
}

/// Paint the level and HUD overlay
pub fn compose_frame(level: &Level, settings: &Settings, stats: &FrameStats) -> Frame {
    let ctx = level.context();
    let mut world = DrawList::new();

    level.draw_background(&mut world);

    for actor in level.actors() {
        actor.draw_background(ctx, &mut world);
    }

    if settings.draw_bodies {
        for outline in ctx.physics.solid_outlines() {
            match outline {
                BodyOutline::Circle { center, radius } => {
                    world.fill_circle(center, radius, colors::BODY)
                }
                BodyOutline::Polygon(points) => world.fill_polygon(&points, colors::BODY),
            }
        }
    }

    for actor in level.actors() {
        actor.draw(ctx, &mut world);
    }

    level.draw(&mut world);

    let mut overlay = DrawList::new();
    level.draw_hud(&mut overlay);
    if settings.debug_graph {
        let origin = Vec2::new(0.0, ctx.camera.viewport.y - GRAPH_HEIGHT);
        overlay.extend(&stats.graph(origin));
    }

    Frame {
        world,
        overlay,
        camera: ctx.camera.clone(),
    }
}
