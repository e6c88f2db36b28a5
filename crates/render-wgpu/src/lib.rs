//! wgpu graphics backend.
//!
//! [`WgpuBackend`] owns the window surface, device and queue, uploads
//! meshes as [`GpuMesh`] handles and executes frames built by
//! `cisco_render::Renderer`.
//!
//! # Invariants
//! - Every draw is depth tested against a depth buffer cleared each frame.
//! - Shader and pipeline validation errors surface as `RenderError`.
//! - A `GpuMesh` destroys its buffers when dropped.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{WgpuBackend, WireframeMode};
pub use mesh::GpuMesh;
pub use shaders::{LIGHTING_SHADER, compile_lighting_shader};
