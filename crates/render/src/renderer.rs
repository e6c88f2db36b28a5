use crate::backend::{GraphicsBackend, RenderError};
use crate::camera::Camera;
use crate::frame::{DrawCall, FillMode, Frame};
use crate::lighting::Lighting;
use cisco_common::{EngineConfig, ProjectionConfig};
use cisco_scene::Scene;
use glam::Mat4;

/// Per-frame driver: owns the projection and lighting, derives the view from
/// the camera on every call, and hands the resulting [`Frame`] to a backend.
#[derive(Debug, Clone)]
pub struct Renderer {
    projection_config: ProjectionConfig,
    aspect: f32,
    projection: Mat4,
    lighting: Lighting,
    clear_color: [f64; 4],
}

impl Renderer {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_parts(
            config.projection,
            config.window.aspect(),
            Lighting::new(&config.lighting),
            config.clear_color.0,
        )
    }

    pub fn with_parts(
        projection_config: ProjectionConfig,
        aspect: f32,
        lighting: Lighting,
        clear_color: [f64; 4],
    ) -> Self {
        Self {
            projection_config,
            aspect,
            projection: perspective(&projection_config, aspect),
            lighting,
            clear_color,
        }
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    /// Recompute the projection for a new framebuffer size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.projection = perspective(&self.projection_config, self.aspect);
        tracing::debug!(width, height, aspect = self.aspect, "projection updated");
    }

    /// Build the draw list for the current scene and camera: the floor in
    /// wireframe first, then every object, solid, in insertion order.
    pub fn build_frame<'a, M>(&self, scene: &'a Scene<M>, camera: &Camera, delta_time: f32) -> Frame<'a, M> {
        let mut draws = Vec::with_capacity(scene.len() + 1);

        if let Some(floor) = scene.floor() {
            draws.push(DrawCall {
                label: "floor",
                mesh: floor.gpu(),
                layout: floor.mesh().layout(),
                index_count: floor.mesh().indices().len() as u32,
                model: Mat4::IDENTITY,
                color: floor.color(),
                fill: FillMode::Wireframe,
            });
        }

        for object in scene.objects() {
            draws.push(DrawCall {
                label: object.name(),
                mesh: object.gpu(),
                layout: object.mesh().layout(),
                index_count: object.mesh().indices().len() as u32,
                model: Mat4::from_translation(object.position()),
                color: object.color(),
                fill: FillMode::Solid,
            });
        }

        Frame {
            clear_color: self.clear_color,
            view: camera.view_matrix(),
            projection: self.projection,
            camera_position: camera.position(),
            lighting: self.lighting.uniforms(),
            delta_time,
            draws,
        }
    }

    /// Render one frame of `scene` as seen by `camera`.
    pub fn render<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        scene: &Scene<B::Mesh>,
        camera: &Camera,
        delta_time: f32,
    ) -> Result<(), RenderError> {
        let frame = self.build_frame(scene, camera, delta_time);
        tracing::trace!(draws = frame.draws.len(), delta_time, "submitting frame");
        backend.submit(&frame)
    }
}

/// Right-handed perspective with a 0..1 depth range.
fn perspective(config: &ProjectionConfig, aspect: f32) -> Mat4 {
    Mat4::perspective_rh(config.fov_y_degrees.to_radians(), aspect, config.near, config.far)
}
