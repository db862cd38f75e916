//! JSON scene description.
//!
//! The format mirrors the scene files the renderer has always accepted:
//! an `Image` block with output settings, a `Camera` block, and lists of
//! `Objects` and `Lights`. This module only parses and validates; turning a
//! description into intersectable geometry is the renderer's job.

use std::fs;
use std::path::{Path, PathBuf};

use raytile_math::{Placement, Vec3};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while reading a scene file.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    Invalid(String),
}

/// A complete scene file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SceneDescription {
    pub image: ImageSettings,
    pub camera: CameraSettings,
    /// Entries with an unrecognised `Type` are logged and dropped
    #[serde(default, deserialize_with = "known_objects")]
    pub objects: Vec<ObjectDescription>,
    /// Entries with an unrecognised `Type` or `Rect` are logged and dropped
    #[serde(default, deserialize_with = "known_lights")]
    pub lights: Vec<LightDescription>,

    /// Directory relative mesh paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Output image and sampling settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// Width and height terms of the camera aspect ratio; defaults to the
    /// image dimensions
    #[serde(rename = "Aspect_Ratio", default)]
    pub aspect_ratio: Option<[f32; 2]>,
    pub samples: u32,
    pub max_depth: u32,
    #[serde(default)]
    pub background: [f32; 3],
    /// Vertical field of view in degrees
    #[serde(rename = "fov", default = "default_fov")]
    pub fov: f32,
    /// Worker threads; 0 renders on the calling thread
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ImageSettings {
    pub fn aspect(&self) -> f32 {
        match self.aspect_ratio {
            Some([w, h]) => w / h,
            None => self.width as f32 / self.height as f32,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CameraSettings {
    pub look_from: [f32; 3],
    pub look_at: [f32; 3],
    #[serde(default = "default_vup")]
    pub vup: [f32; 3],
    #[serde(default)]
    pub aperture: f32,
    #[serde(default = "default_focus_distance")]
    pub focus_distance: f32,
    #[serde(rename = "time0", default)]
    pub time0: f32,
    #[serde(rename = "time1", default)]
    pub time1: f32,
}

/// One entry of the `Objects` list, tagged by its `Type` key.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "Type")]
pub enum ObjectDescription {
    Box(BoxDescription),
    #[serde(rename = "xy")]
    Xy(RectDescription),
    #[serde(rename = "xz")]
    Xz(RectDescription),
    #[serde(rename = "yz")]
    Yz(RectDescription),
    Object(MeshDescription),
}

/// Axis-aligned box from the origin to `Scale`, rotated about Y by
/// `Rotation[1]` degrees and moved to `Position`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoxDescription {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub color: [f32; 3],
}

/// Axis-aligned rectangle: `Position` is `[a0, a1, b0, b1, k]`, the bounds on
/// the two in-plane axes followed by the offset along the third.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RectDescription {
    pub position: [f32; 5],
    pub color: [f32; 3],
}

/// A triangle mesh loaded from an OBJ file and placed in the world.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshDescription {
    pub file_path: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    pub color: [f32; 3],
}

impl MeshDescription {
    pub fn placement(&self) -> Placement {
        Placement::new(
            Vec3::from_array(self.position),
            Vec3::from_array(self.rotation),
            Vec3::from_array(self.scale),
        )
    }
}

/// One entry of the `Lights` list.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "Type")]
pub enum LightDescription {
    Diffuse(AreaLightDescription),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AreaLightDescription {
    pub rect: RectPlane,
    pub position: [f32; 5],
    pub color: [f32; 3],
}

/// The plane an axis-aligned rectangle lies in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RectPlane {
    Xy,
    Xz,
    Yz,
}

impl SceneDescription {
    /// Read and validate a scene file. Relative mesh paths will resolve
    /// against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut scene = Self::from_json(&text)?;
        scene.base_dir = path.parent().map(Path::to_path_buf);

        log::info!(
            "Loaded scene {}: {} objects, {} lights",
            path.display(),
            scene.objects.len(),
            scene.lights.len()
        );
        Ok(scene)
    }

    /// Parse and validate scene JSON.
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        let scene: SceneDescription = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Reject settings that would make rendering meaningless.
    pub fn validate(&self) -> Result<(), SceneError> {
        let image = &self.image;
        if image.width == 0 || image.height == 0 {
            return Err(SceneError::Invalid(format!(
                "image dimensions must be non-zero, got {}x{}",
                image.width, image.height
            )));
        }
        if image.samples == 0 {
            return Err(SceneError::Invalid("Samples must be at least 1".to_string()));
        }
        let aspect = image.aspect();
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(SceneError::Invalid(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        if !(image.fov > 0.0 && image.fov < 180.0) {
            return Err(SceneError::Invalid(format!(
                "fov must be in (0, 180) degrees, got {}",
                image.fov
            )));
        }
        if self.camera.look_from == self.camera.look_at {
            return Err(SceneError::Invalid(
                "camera LookFrom and LookAt coincide".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a path from the scene file against its directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

const OBJECT_TYPES: &[&str] = &["Box", "xy", "xz", "yz", "Object"];
const LIGHT_TYPES: &[&str] = &["Diffuse"];
const RECT_PLANES: &[&str] = &["xy", "xz", "yz"];

fn known_objects<'de, D>(deserializer: D) -> Result<Vec<ObjectDescription>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_known(deserializer, "object", &[("Type", OBJECT_TYPES)])
}

fn known_lights<'de, D>(deserializer: D) -> Result<Vec<LightDescription>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_known(
        deserializer,
        "light",
        &[("Type", LIGHT_TYPES), ("Rect", RECT_PLANES)],
    )
}

/// Parse a list of tagged entries, skipping any whose tag keys hold a value
/// outside the accepted set. Entries with a known tag must still be
/// well-formed.
fn parse_known<'de, D, T>(
    deserializer: D,
    kind: &str,
    tags: &[(&str, &[&str])],
) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    let mut parsed = Vec::with_capacity(entries.len());

    'entries: for (index, entry) in entries.into_iter().enumerate() {
        for (key, accepted) in tags {
            let tag = entry.get(*key).and_then(Value::as_str).unwrap_or_default();
            if !accepted.contains(&tag) {
                log::warn!(
                    "Skipping {} {}: unknown {} {:?}",
                    kind,
                    index,
                    key,
                    entry.get(*key).unwrap_or(&Value::Null)
                );
                continue 'entries;
            }
        }
        parsed.push(serde_json::from_value(entry).map_err(D::Error::custom)?);
    }

    Ok(parsed)
}

fn default_fov() -> f32 {
    40.0
}

fn default_output() -> String {
    "output.png".to_string()
}

fn default_vup() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_focus_distance() -> f32 {
    10.0
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
