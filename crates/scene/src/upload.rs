use cisco_assets::MeshData;

/// Upload side of the graphics boundary.
///
/// An uploader turns CPU mesh data into a backend-owned handle. The handle
/// owns its GPU resources: dropping it releases them, exactly once.
pub trait MeshUploader {
    /// Backend handle for one uploaded mesh.
    type Mesh;
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<Self::Mesh, Self::Error>;
}
