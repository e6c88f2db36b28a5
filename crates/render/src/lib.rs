//! Rendering core, independent of any GPU API.
//!
//! [`Camera`] turns input into a view transform, [`Renderer`] combines it with
//! the projection, [`Lighting`] and a [`Scene`](cisco_scene::Scene) into a
//! [`Frame`], and a [`GraphicsBackend`] executes the frame.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Fill mode travels with each draw call; no rasteriser state leaks
//!   between draws.
//!
//! [`DebugTextBackend`] is a headless backend that renders frames as text.

mod backend;
mod camera;
mod debug;
mod frame;
mod lighting;
mod renderer;

pub use backend::{GraphicsBackend, RenderError};
pub use camera::Camera;
pub use debug::{DebugMesh, DebugTextBackend};
pub use frame::{DrawCall, FillMode, Frame};
pub use lighting::{Lighting, LightingUniforms};
pub use renderer::Renderer;

pub fn crate_info() -> &'static str {
    "cisco-render v0.1.0"
}
