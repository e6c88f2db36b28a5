//! Shared configuration for the cisco renderer.
//!
//! Everything tunable lives in [`EngineConfig`]: window size, camera feel,
//! projection, lighting, floor grid and the startup object list.

pub mod config;

pub use config::{
    CameraConfig, ClearColor, ConfigError, EngineConfig, GridConfig, LightingConfig,
    ObjectConfig, ProjectionConfig, SceneConfig, WindowConfig, MAX_GRID_CELLS,
};

pub fn crate_info() -> &'static str {
    "cisco-common v0.1.0"
}
