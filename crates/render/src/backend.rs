use crate::frame::Frame;
use cisco_scene::MeshUploader;

/// Errors from a graphics backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("failed to request device: {0}")]
    Device(String),
    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: &'static str, message: String },
    #[error("pipeline `{label}` is invalid: {message}")]
    Pipeline { label: String, message: String },
    #[error("mesh `{label}` has no indices")]
    EmptyMesh { label: String },
    #[error("could not acquire frame: {0}")]
    Frame(String),
}

/// Draw side of the graphics boundary.
///
/// A backend uploads meshes (via [`MeshUploader`]) and executes frames:
/// clear, set camera and lighting uniforms, then issue each draw with its
/// model transform, colour and fill mode, with depth testing enabled.
pub trait GraphicsBackend: MeshUploader {
    fn submit(&mut self, frame: &Frame<'_, Self::Mesh>) -> Result<(), RenderError>;
}
