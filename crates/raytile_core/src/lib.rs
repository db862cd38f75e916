//! raytile core - renderer-agnostic scene data.
//!
//! This crate provides:
//!
//! - **Scene description**: the JSON scene format (`SceneDescription`)
//! - **Meshes**: raw triangle geometry loaded from OBJ files (`RawMesh`)
//! - **Textures**: decoded images for image-mapped materials (`TextureImage`)
//!
//! # Example
//!
//! ```ignore
//! use raytile_core::SceneDescription;
//!
//! let scene = SceneDescription::load("scenes/cornell.json")?;
//! println!("{} objects, {} lights", scene.objects.len(), scene.lights.len());
//! ```

pub mod mesh;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use mesh::{MeshError, RawMesh};
pub use scene::{
    AreaLightDescription, BoxDescription, CameraSettings, ImageSettings, LightDescription,
    MeshDescription, ObjectDescription, RectDescription, RectPlane, SceneDescription, SceneError,
};
pub use texture::{TextureError, TextureImage};
