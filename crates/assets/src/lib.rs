//! Mesh data for the renderer.
//!
//! Meshes come from two places: plain-text OBJ files and the procedural
//! floor grid. Both produce a [`MeshData`] holding interleaved vertices and
//! a triangle-list index buffer, ready for upload.

pub mod grid;
pub mod mesh;
pub mod obj;

pub use grid::floor_grid;
pub use mesh::{Bounds, MeshData, MeshError, MeshStats, VertexLayout, wireframe_indices};
pub use obj::{ObjError, load_obj, parse_obj, read_obj};

pub fn crate_info() -> &'static str {
    "cisco-assets v0.1.0"
}
