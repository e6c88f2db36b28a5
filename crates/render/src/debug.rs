use crate::backend::{GraphicsBackend, RenderError};
use crate::frame::{FillMode, Frame};
use cisco_assets::MeshData;
use cisco_scene::MeshUploader;
use glam::Vec3;
use std::cell::Cell;
use std::rc::Rc;

/// Mesh handle of the [`DebugTextBackend`].
///
/// Counts itself in the backend's live-mesh tally until dropped.
#[derive(Debug)]
pub struct DebugMesh {
    id: usize,
    label: String,
    vertex_count: usize,
    index_count: usize,
    live: Rc<Cell<usize>>,
}

impl DebugMesh {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

impl Drop for DebugMesh {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
        tracing::trace!(id = self.id, label = %self.label, "debug mesh released");
    }
}

/// Headless backend that renders frames as text.
///
/// Useful for the CLI, logging, and exercising the render path without a
/// GPU. Each submitted frame is appended to [`DebugTextBackend::frames`].
#[derive(Debug, Default)]
pub struct DebugTextBackend {
    next_id: usize,
    live: Rc<Cell<usize>>,
    frames: Vec<String>,
}

impl DebugTextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes uploaded and not yet released.
    pub fn live_meshes(&self) -> usize {
        self.live.get()
    }

    /// Total meshes ever uploaded.
    pub fn uploads(&self) -> usize {
        self.next_id
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }
}

impl MeshUploader for DebugTextBackend {
    type Mesh = DebugMesh;
    type Error = RenderError;

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<DebugMesh, RenderError> {
        if mesh.indices().is_empty() {
            return Err(RenderError::EmptyMesh {
                label: label.to_string(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.set(self.live.get() + 1);
        Ok(DebugMesh {
            id,
            label: label.to_string(),
            vertex_count: mesh.vertex_count(),
            index_count: mesh.indices().len(),
            live: self.live.clone(),
        })
    }
}

impl GraphicsBackend for DebugTextBackend {
    fn submit(&mut self, frame: &Frame<'_, DebugMesh>) -> Result<(), RenderError> {
        let mut out = String::new();
        let eye = frame.camera_position;
        let light = &frame.lighting;
        out.push_str(&format!(
            "=== Frame {} (dt={:.3}) ===\n",
            self.frames.len(),
            frame.delta_time
        ));
        out.push_str(&format!("Camera: eye=({:.2}, {:.2}, {:.2})\n", eye.x, eye.y, eye.z));
        out.push_str(&format!(
            "Light: dir=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2}) ambient=({:.2}, {:.2}, {:.2})\n",
            light.direction.x,
            light.direction.y,
            light.direction.z,
            light.color.x,
            light.color.y,
            light.color.z,
            light.ambient.x,
            light.ambient.y,
            light.ambient.z
        ));
        out.push_str(&format!("Draws: {}\n", frame.draws.len()));

        for draw in &frame.draws {
            let mode = match draw.fill {
                FillMode::Solid => "solid",
                FillMode::Wireframe => "wireframe",
            };
            let t = draw.model.w_axis;
            // Shaded colour of an upward-facing surface.
            let lit = light.shade(Vec3::Y, draw.color);
            out.push_str(&format!(
                "  [{}] {} mesh#{} indices={} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2}) lit=({:.2}, {:.2}, {:.2})\n",
                draw.label,
                mode,
                draw.mesh.id,
                draw.index_count,
                t.x,
                t.y,
                t.z,
                draw.color.x,
                draw.color.y,
                draw.color.z,
                lit.x,
                lit.y,
                lit.z
            ));
        }

        self.frames.push(out);
        Ok(())
    }
}
