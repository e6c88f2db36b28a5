use crate::upload::MeshUploader;
use cisco_assets::{MeshData, ObjError, floor_grid, load_obj};
use cisco_common::{ConfigError, GridConfig, ObjectConfig};
use glam::Vec3;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for an object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Errors from scene population.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ObjError,
    },
    #[error("invalid floor grid: {0}")]
    Grid(#[from] ConfigError),
    #[error("failed to upload `{label}`: {source}")]
    Upload {
        label: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("no object with id {0}")]
    UnknownObject(ObjectId),
}

/// A loaded mesh placed in the world.
#[derive(Debug)]
pub struct Object<M> {
    id: ObjectId,
    name: String,
    mesh: MeshData,
    position: Vec3,
    color: Vec3,
    gpu: M,
}

impl<M> Object<M> {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn has_texcoords(&self) -> bool {
        self.mesh.has_texcoords()
    }

    pub fn gpu(&self) -> &M {
        &self.gpu
    }
}

/// The uploaded floor grid.
#[derive(Debug)]
pub struct Floor<M> {
    mesh: MeshData,
    color: Vec3,
    gpu: M,
}

impl<M> Floor<M> {
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn gpu(&self) -> &M {
        &self.gpu
    }
}

/// The scene: one floor grid plus an ordered list of objects.
///
/// Insertion order is draw order. `M` is the backend's mesh handle; GPU
/// resources live exactly as long as the handle, so removing an object,
/// calling [`Scene::cleanup`] or dropping the scene releases them.
#[derive(Debug)]
pub struct Scene<M> {
    grid: GridConfig,
    default_color: Vec3,
    floor: Option<Floor<M>>,
    objects: Vec<Object<M>>,
}

impl<M> Scene<M> {
    /// An empty scene with no floor uploaded yet.
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            default_color: Vec3::new(0.9, 0.55, 0.3),
            floor: None,
            objects: Vec::new(),
        }
    }

    /// Create a scene and upload its floor.
    pub fn init<U>(uploader: &mut U, grid: GridConfig) -> Result<Self, SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        let mut scene = Self::new(grid);
        scene.init_floor(uploader)?;
        Ok(scene)
    }

    /// Colour given to objects added without an explicit one.
    pub fn with_default_color(mut self, color: Vec3) -> Self {
        self.default_color = color;
        self
    }

    /// Build the floor grid and upload it. Re-running replaces the previous
    /// floor and releases its resources.
    pub fn init_floor<U>(&mut self, uploader: &mut U) -> Result<(), SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        let mesh = floor_grid(&self.grid)?;
        let gpu = upload(uploader, "floor", &mesh)?;
        tracing::debug!(
            vertices = mesh.vertex_count(),
            indices = mesh.indices().len(),
            "floor uploaded"
        );
        self.floor = Some(Floor {
            mesh,
            color: self.grid.color,
            gpu,
        });
        Ok(())
    }

    /// Load an OBJ file, upload it and append it to the draw list.
    ///
    /// On failure the scene is left untouched.
    pub fn add_object<U>(
        &mut self,
        uploader: &mut U,
        path: impl AsRef<Path>,
        position: Vec3,
    ) -> Result<ObjectId, SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        self.load_object(uploader, path.as_ref(), position, self.default_color)
    }

    /// Upload an in-memory mesh and append it to the draw list.
    pub fn add_mesh<U>(
        &mut self,
        uploader: &mut U,
        name: impl Into<String>,
        mesh: MeshData,
        position: Vec3,
    ) -> Result<ObjectId, SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        self.push_object(uploader, name.into(), mesh, position, self.default_color)
    }

    /// Add every configured object, continuing past failures.
    ///
    /// Returns the errors of the objects that could not be added; each one
    /// left the scene unchanged.
    pub fn add_objects<U>(&mut self, uploader: &mut U, objects: &[ObjectConfig]) -> Vec<SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        let mut failures = Vec::new();
        for object in objects {
            let color = object.color.unwrap_or(self.default_color);
            if let Err(e) = self.load_object(uploader, &object.path, object.position, color) {
                failures.push(e);
            }
        }
        failures
    }

    fn load_object<U>(
        &mut self,
        uploader: &mut U,
        path: &Path,
        position: Vec3,
        color: Vec3,
    ) -> Result<ObjectId, SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        let mesh = load_obj(path).map_err(|source| SceneError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.push_object(uploader, name, mesh, position, color)
    }

    fn push_object<U>(
        &mut self,
        uploader: &mut U,
        name: String,
        mesh: MeshData,
        position: Vec3,
        color: Vec3,
    ) -> Result<ObjectId, SceneError>
    where
        U: MeshUploader<Mesh = M>,
    {
        let gpu = upload(uploader, &name, &mesh)?;
        let id = ObjectId::new();
        tracing::debug!(
            %id,
            name = %name,
            vertices = mesh.vertex_count(),
            position = ?position,
            "object added"
        );
        self.objects.push(Object {
            id,
            name,
            mesh,
            position,
            color,
            gpu,
        });
        Ok(id)
    }

    /// Remove an object and release its resources.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(SceneError::UnknownObject(id))?;
        let removed = self.objects.remove(index);
        tracing::debug!(%id, name = %removed.name, "object removed");
        Ok(())
    }

    pub fn set_color(&mut self, id: ObjectId, color: Vec3) -> Result<(), SceneError> {
        let object = self
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(SceneError::UnknownObject(id))?;
        object.color = color;
        Ok(())
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object<M>> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects in draw order.
    pub fn objects(&self) -> &[Object<M>] {
        &self.objects
    }

    pub fn floor(&self) -> Option<&Floor<M>> {
        self.floor.as_ref()
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Number of objects, not counting the floor.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Release every object and the floor. Safe to call more than once.
    pub fn cleanup(&mut self) {
        let released = self.objects.len() + usize::from(self.floor.is_some());
        self.objects.clear();
        self.floor = None;
        if released > 0 {
            tracing::debug!(released, "scene resources released");
        }
    }
}

fn upload<U: MeshUploader>(uploader: &mut U, label: &str, mesh: &MeshData) -> Result<U::Mesh, SceneError> {
    uploader
        .upload_mesh(label, mesh)
        .map_err(|e| SceneError::Upload {
            label: label.to_string(),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cisco_assets::parse_obj;
    use std::cell::Cell;
    use std::rc::Rc;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

    #[derive(Debug, thiserror::Error)]
    #[error("upload refused")]
    struct Refused;

    /// Handle that tracks how many uploads are still alive.
    #[derive(Debug)]
    struct FakeMesh {
        live: Rc<Cell<usize>>,
        label: String,
    }

    impl Drop for FakeMesh {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    #[derive(Default)]
    struct FakeUploader {
        live: Rc<Cell<usize>>,
        uploads: usize,
        refuse: bool,
    }

    impl MeshUploader for FakeUploader {
        type Mesh = FakeMesh;
        type Error = Refused;

        fn upload_mesh(&mut self, label: &str, _mesh: &MeshData) -> Result<FakeMesh, Refused> {
            if self.refuse {
                return Err(Refused);
            }
            self.uploads += 1;
            self.live.set(self.live.get() + 1);
            Ok(FakeMesh {
                live: self.live.clone(),
                label: label.to_string(),
            })
        }
    }

    fn triangle() -> MeshData {
        parse_obj(TRIANGLE).unwrap()
    }

    #[test]
    fn init_uploads_floor() {
        let mut up = FakeUploader::default();
        let scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let floor = scene.floor().unwrap();
        assert_eq!(floor.mesh().vertices().len(), 121 * 6);
        assert_eq!(floor.mesh().indices().len(), 600);
        assert_eq!(floor.gpu().label, "floor");
        assert!(scene.is_empty());
    }

    #[test]
    fn reinit_floor_releases_previous() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        scene.init_floor(&mut up).unwrap();
        assert_eq!(up.uploads, 2);
        assert_eq!(up.live.get(), 1);
        assert_eq!(scene.floor().unwrap().mesh().vertex_count(), 121);
    }

    #[test]
    fn objects_keep_insertion_order() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let a = scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        let b = scene.add_mesh(&mut up, "b", triangle(), Vec3::X).unwrap();
        let ids: Vec<_> = scene.objects().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(scene.object(b).unwrap().position(), Vec3::X);
    }

    #[test]
    fn missing_file_leaves_scene_unchanged() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();

        let err = scene
            .add_object(&mut up, "/does/not/exist.obj", Vec3::ZERO)
            .unwrap_err();
        assert!(matches!(err, SceneError::Load { .. }));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn failed_upload_leaves_scene_unchanged() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        up.refuse = true;
        let err = scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SceneError::Upload { ref label, .. } if label == "a"));
        assert!(scene.is_empty());
    }

    #[test]
    fn add_object_from_disk_names_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, TRIANGLE).unwrap();

        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let id = scene.add_object(&mut up, &path, Vec3::new(2.0, 0.0, 2.0)).unwrap();
        let object = scene.object(id).unwrap();
        assert_eq!(object.name(), "tri");
        assert_eq!(object.mesh().indices(), &[0, 1, 2]);
        assert!(!object.has_texcoords());
    }

    #[test]
    fn add_objects_reports_failures_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.obj");
        std::fs::write(&good, TRIANGLE).unwrap();

        let configs = vec![
            ObjectConfig {
                path: dir.path().join("missing.obj"),
                position: Vec3::ZERO,
                color: None,
            },
            ObjectConfig {
                path: good,
                position: Vec3::Y,
                color: Some(Vec3::X),
            },
        ];

        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let failures = scene.add_objects(&mut up, &configs);
        assert_eq!(failures.len(), 1);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.objects()[0].color(), Vec3::X);
    }

    #[test]
    fn configured_objects_without_colour_use_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, TRIANGLE).unwrap();

        let configs = vec![
            ObjectConfig {
                path: path.clone(),
                position: Vec3::ZERO,
                color: None,
            },
            ObjectConfig {
                path,
                position: Vec3::X,
                color: Some(Vec3::Y),
            },
        ];

        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default())
            .unwrap()
            .with_default_color(Vec3::Z);
        assert!(scene.add_objects(&mut up, &configs).is_empty());
        let colors: Vec<_> = scene.objects().iter().map(|o| o.color()).collect();
        assert_eq!(colors, vec![Vec3::Z, Vec3::Y]);
        assert_eq!(scene.objects()[1].position(), Vec3::X);
    }

    #[test]
    fn default_color_applies() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default())
            .unwrap()
            .with_default_color(Vec3::Z);
        let id = scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        assert_eq!(scene.object(id).unwrap().color(), Vec3::Z);
    }

    #[test]
    fn set_color_updates_known_objects_only() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let id = scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        scene.set_color(id, Vec3::X).unwrap();
        assert_eq!(scene.object(id).unwrap().color(), Vec3::X);

        scene.remove_object(id).unwrap();
        assert!(matches!(
            scene.set_color(id, Vec3::Y),
            Err(SceneError::UnknownObject(_))
        ));
    }

    #[test]
    fn remove_releases_resources() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        let id = scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        assert_eq!(up.live.get(), 2);
        scene.remove_object(id).unwrap();
        assert_eq!(up.live.get(), 1);
        assert!(matches!(
            scene.remove_object(id),
            Err(SceneError::UnknownObject(_))
        ));
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut up = FakeUploader::default();
        let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
        scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        scene.add_mesh(&mut up, "b", triangle(), Vec3::ZERO).unwrap();
        assert_eq!(up.live.get(), 3);

        scene.cleanup();
        assert_eq!(up.live.get(), 0);
        assert!(scene.floor().is_none());
        scene.cleanup();
        assert_eq!(up.live.get(), 0);
    }

    #[test]
    fn drop_releases_everything() {
        let mut up = FakeUploader::default();
        {
            let mut scene = Scene::init(&mut up, GridConfig::default()).unwrap();
            scene.add_mesh(&mut up, "a", triangle(), Vec3::ZERO).unwrap();
        }
        assert_eq!(up.live.get(), 0);
    }

    #[test]
    fn invalid_grid_fails_init() {
        let mut up = FakeUploader::default();
        let grid = GridConfig {
            cells: 0,
            ..GridConfig::default()
        };
        let err = Scene::init(&mut up, grid).unwrap_err();
        assert!(matches!(err, SceneError::Grid(_)));
        assert_eq!(up.uploads, 0);
    }

    #[test]
    fn object_id_display_is_short() {
        assert_eq!(ObjectId::new().to_string().len(), 8);
    }
}
