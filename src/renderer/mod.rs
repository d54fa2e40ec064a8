//! WebGPU rendering module
//!
//! Actors paint into [`DrawList`]s; a composed [`Frame`] is converted to clip
//! space and drawn as a single triangle list.

pub mod frame;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use frame::{Frame, compose_frame, view_to_ndc};
pub use pipeline::RenderState;
pub use shapes::{DrawList, triangulate};
pub use vertex::{Vertex, colors, hex};
