//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn new_at(position: glam::Vec2, color: [f32; 4]) -> Self {
        Self::new(position.x, position.y, color)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Opaque color from a `0xRRGGBB` literal
pub const fn hex(rgb: u32) -> [f32; 4] {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::hex;

    pub const FLOOR: [f32; 4] = hex(0x067319);
    pub const SAND: [f32; 4] = hex(0xd8c078);
    pub const SAND_GRAIN: [f32; 4] = hex(0xa88e4a);
    pub const WATER: [f32; 4] = [0.12, 0.38, 0.85, 0.85];
    pub const WATER_RIPPLE: [f32; 4] = [0.7, 0.85, 1.0, 0.5];
    pub const BODY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const PLAYER: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    pub const PLAYER_STROKE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BALL: [f32; 4] = hex(0xe05a2a);
    pub const BALL_STRIPE: [f32; 4] = hex(0xf6e7c8);
    pub const BACKGROUND: [f32; 4] = hex(0x3b2f22);
    pub const GRAPH_BACKGROUND: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const GRAPH_BAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const GRAPH_60FPS: [f32; 4] = hex(0x008000);
    pub const GRAPH_30FPS: [f32; 4] = hex(0xff7f50);
    pub const GRAPH_15FPS: [f32; 4] = hex(0xff0000);
}
