use crate::lighting::LightingUniforms;
use cisco_assets::VertexLayout;
use glam::{Mat4, Vec3};

/// Rasterisation mode of one draw call.
///
/// Fill mode is carried per draw, never as ambient state, so a wireframe
/// floor cannot affect the objects drawn after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// One indexed draw.
#[derive(Debug)]
pub struct DrawCall<'a, M> {
    pub label: &'a str,
    pub mesh: &'a M,
    pub layout: VertexLayout,
    pub index_count: u32,
    pub model: Mat4,
    pub color: Vec3,
    pub fill: FillMode,
}

/// Everything a backend needs to draw one frame: clear colour+depth,
/// camera matrices, lighting, and the ordered draw list.
#[derive(Debug)]
pub struct Frame<'a, M> {
    pub clear_color: [f64; 4],
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub lighting: LightingUniforms,
    pub delta_time: f32,
    pub draws: Vec<DrawCall<'a, M>>,
}

impl<M> Frame<'_, M> {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn index_total(&self) -> u64 {
        self.draws.iter().map(|d| d.index_count as u64).sum()
    }
}
