use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level engine configuration.
///
/// Every section is defaulted, so an empty YAML document is a valid config
/// that reproduces the stock demo: 800x600 window, camera at (0, 1, 3),
/// 45 degree projection and a 10x10 wireframe floor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub lighting: LightingConfig,
    pub grid: GridConfig,
    pub scene: SceneConfig,
    pub clear_color: ClearColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Cisco Engine".into(),
            width: 800,
            height: 600,
        }
    }
}

impl WindowConfig {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// First-person camera tuning. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// World units per second.
    pub speed: f32,
    pub sprint_multiplier: f32,
    /// Degrees per pointer pixel.
    pub sensitivity: f32,
    pub pitch_limit: f32,
    pub invert_y: bool,
    /// Cursor position assumed before the first pointer sample arrives.
    pub initial_cursor: [f64; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sprint_multiplier: 3.0,
            sensitivity: 0.1,
            pitch_limit: 89.0,
            invert_y: false,
            initial_cursor: [400.0, 300.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

/// Fixed directional light plus ambient term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Direction the light travels, not the direction towards it.
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, -0.5),
            color: Vec3::ONE,
            ambient: Vec3::splat(0.8),
        }
    }
}

/// Procedural floor grid: `cells` x `cells` quads centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cells: u32,
    pub spacing: f32,
    pub height: f32,
    pub color: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cells: 10,
            spacing: 1.0,
            height: -1.0,
            color: Vec3::ONE,
        }
    }
}

/// Largest floor grid accepted. Vertex and index counts stay far below the
/// 32-bit index limit.
pub const MAX_GRID_CELLS: u32 = 1024;

impl GridConfig {
    /// Vertices per side.
    pub fn side(&self) -> u32 {
        self.cells.saturating_add(1)
    }

    pub fn vertex_count(&self) -> usize {
        let side = self.side() as usize;
        side.saturating_mul(side)
    }

    pub fn index_count(&self) -> usize {
        let cells = self.cells as usize;
        cells.saturating_mul(cells).saturating_mul(6)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells == 0 {
            return Err(ConfigError::invalid("grid.cells", "must be at least 1"));
        }
        if self.cells > MAX_GRID_CELLS {
            return Err(ConfigError::invalid(
                "grid.cells",
                format!("must be at most {MAX_GRID_CELLS}, got {}", self.cells),
            ));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ConfigError::invalid(
                "grid.spacing",
                format!("must be positive, got {}", self.spacing),
            ));
        }
        if !self.height.is_finite() {
            return Err(ConfigError::invalid("grid.height", "must be finite"));
        }
        Ok(())
    }
}

/// Objects placed in the scene at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub default_color: Vec3,
    pub objects: Vec<ObjectConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_color: Vec3::new(0.9, 0.55, 0.3),
            objects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub color: Option<Vec3>,
}

impl std::str::FromStr for ObjectConfig {
    type Err = ConfigError;

    /// Parse `path` or `path@x,y,z`.
    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let (path, position) = match s.rsplit_once('@') {
            Some((path, coords)) => (path, parse_vec3(coords)?),
            None => (s, Vec3::ZERO),
        };
        if path.is_empty() {
            return Err(ConfigError::invalid("object.path", "must not be empty"));
        }
        Ok(Self {
            path: PathBuf::from(path),
            position,
            color: None,
        })
    }
}

fn parse_vec3(text: &str) -> Result<Vec3, ConfigError> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::invalid("object.position", format!("`{text}`: {e}")))?;
    match parts[..] {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(Vec3::new(x, y, z)),
        _ => Err(ConfigError::invalid(
            "object.position",
            format!("expected three finite numbers x,y,z, got `{text}`"),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor(pub [f64; 4]);

impl Default for ClearColor {
    fn default() -> Self {
        Self([0.1, 0.1, 0.15, 1.0])
    }
}

impl EngineConfig {
    /// Read a YAML config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::invalid(
                "window",
                format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }

        let cam = &self.camera;
        if !(cam.speed.is_finite() && cam.speed > 0.0) {
            return Err(ConfigError::invalid(
                "camera.speed",
                format!("must be positive and finite, got {}", cam.speed),
            ));
        }
        if !(cam.sprint_multiplier.is_finite() && cam.sprint_multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "camera.sprint_multiplier",
                format!("must be finite and at least 1, got {}", cam.sprint_multiplier),
            ));
        }
        if !(cam.sensitivity.is_finite() && cam.sensitivity > 0.0) {
            return Err(ConfigError::invalid(
                "camera.sensitivity",
                format!("must be positive and finite, got {}", cam.sensitivity),
            ));
        }
        if !cam.yaw.is_finite() {
            return Err(ConfigError::invalid("camera.yaw", "must be finite"));
        }
        if !cam.pitch.is_finite() {
            return Err(ConfigError::invalid("camera.pitch", "must be finite"));
        }
        if !(cam.pitch_limit > 0.0 && cam.pitch_limit < 90.0) {
            return Err(ConfigError::invalid(
                "camera.pitch_limit",
                format!("must be in (0, 90), got {}", cam.pitch_limit),
            ));
        }
        if !cam.position.is_finite() {
            return Err(ConfigError::invalid("camera.position", "must be finite"));
        }

        let proj = &self.projection;
        if !(proj.fov_y_degrees > 0.0 && proj.fov_y_degrees < 180.0) {
            return Err(ConfigError::invalid(
                "projection.fov_y_degrees",
                format!("must be in (0, 180), got {}", proj.fov_y_degrees),
            ));
        }
        if !(proj.near > 0.0) {
            return Err(ConfigError::invalid("projection.near", "must be positive"));
        }
        if !(proj.far > proj.near) {
            return Err(ConfigError::invalid(
                "projection.far",
                format!("must exceed near ({}), got {}", proj.near, proj.far),
            ));
        }

        if self.lighting.direction.length_squared() <= f32::EPSILON {
            return Err(ConfigError::invalid(
                "lighting.direction",
                "must be non-zero",
            ));
        }

        self.grid.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_spec_with_position() {
        let object: ObjectConfig = "models/teapot.obj@1,0.5,-2".parse().unwrap();
        assert_eq!(object.path, PathBuf::from("models/teapot.obj"));
        assert_eq!(object.position, Vec3::new(1.0, 0.5, -2.0));
        assert_eq!(object.color, None);
    }

    #[test]
    fn object_spec_without_position() {
        let object: ObjectConfig = "cube.obj".parse().unwrap();
        assert_eq!(object.position, Vec3::ZERO);
    }

    #[test]
    fn object_spec_rejects_bad_position() {
        assert!("cube.obj@1,2".parse::<ObjectConfig>().is_err());
        assert!("cube.obj@a,b,c".parse::<ObjectConfig>().is_err());
        assert!("@1,2,3".parse::<ObjectConfig>().is_err());
    }

    #[test]
    fn defaults_match_stock_demo() {
        let config = EngineConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.camera.position, Vec3::new(0.0, 1.0, 3.0));
        assert_eq!(config.camera.yaw, -90.0);
        assert_eq!(config.projection.fov_y_degrees, 45.0);
        assert_eq!(config.projection.far, 10.0);
        assert_eq!(config.grid.vertex_count(), 121);
        assert_eq!(config.grid.index_count(), 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_is_default() {
        let config = EngineConfig::from_yaml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = "grid:\n  cells: 4\ncamera:\n  speed: 5.0\n";
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.grid.cells, 4);
        assert_eq!(config.grid.spacing, 1.0);
        assert_eq!(config.camera.speed, 5.0);
        assert_eq!(config.camera.sensitivity, 0.1);
    }

    #[test]
    fn objects_parse_with_optional_fields() {
        let yaml = r#"
scene:
  objects:
    - path: obj/cube.obj
    - path: obj/cube.obj
      position: [2.0, 0.0, 2.0]
      color: [1.0, 0.0, 0.0]
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.scene.objects.len(), 2);
        assert_eq!(config.scene.objects[0].position, Vec3::ZERO);
        assert_eq!(config.scene.objects[0].color, None);
        assert_eq!(config.scene.objects[1].position, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn rejects_zero_grid() {
        let err = EngineConfig::from_yaml("grid:\n  cells: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid.cells", .. }));
    }

    #[test]
    fn oversized_grid_is_rejected_without_overflow() {
        let grid = GridConfig {
            cells: u32::MAX,
            ..GridConfig::default()
        };
        assert_eq!(grid.side(), u32::MAX);
        assert!(grid.index_count() > 0);
        assert!(grid.validate().is_err());

        for cells in [4294967295u32, 65534, MAX_GRID_CELLS + 1] {
            let yaml = format!("grid:\n  cells: {cells}\n");
            let err = EngineConfig::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "grid.cells", .. }));
        }
    }

    #[test]
    fn largest_grid_is_accepted() {
        let grid = GridConfig {
            cells: MAX_GRID_CELLS,
            ..GridConfig::default()
        };
        assert!(grid.validate().is_ok());
        assert!(grid.vertex_count() <= u32::MAX as usize);
    }

    #[test]
    fn rejects_non_finite_camera_values() {
        let cases = [
            ("camera:\n  yaw: .nan\n", "camera.yaw"),
            ("camera:\n  pitch: .nan\n", "camera.pitch"),
            ("camera:\n  yaw: .inf\n", "camera.yaw"),
            ("camera:\n  speed: .inf\n", "camera.speed"),
            ("camera:\n  sprint_multiplier: .inf\n", "camera.sprint_multiplier"),
            ("camera:\n  sensitivity: .inf\n", "camera.sensitivity"),
        ];
        for (yaml, expected) in cases {
            match EngineConfig::from_yaml(yaml) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{yaml}"),
                other => panic!("{yaml}: expected {expected} error, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let yaml = "projection:\n  near: 5.0\n  far: 1.0\n";
        let err = EngineConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "projection.far",
                ..
            }
        ));
    }

    #[test]
    fn rejects_pitch_limit_at_pole() {
        let mut config = EngineConfig::default();
        config.camera.pitch_limit = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_preserves_values() {
        let mut config = EngineConfig::default();
        config.grid.cells = 20;
        let text = config.to_yaml().unwrap();
        let back = EngineConfig::from_yaml(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "window:\n  title: Test\n").unwrap();
        let config = EngineConfig::load(tmp.path()).unwrap();
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 800);
    }
}
