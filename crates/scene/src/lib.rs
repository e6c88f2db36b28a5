//! Scene: the floor grid and the loaded mesh objects drawn each frame.
//!
//! # Invariants
//! - Object order is insertion order is draw order.
//! - A failed add leaves the scene unchanged.
//! - GPU handles are owned; each is released exactly once.

mod scene;
mod upload;

pub use scene::{Floor, Object, ObjectId, Scene, SceneError};
pub use upload::MeshUploader;
