//! Image loading for image-mapped textures.
//!
//! Pixels are decoded once into linear float RGB so the renderer can sample
//! them without touching the image crate again.

use std::path::Path;

use raytile_math::Vec3;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to open texture {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture has no pixels: {0}")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A decoded image in linear RGB.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,

    /// Row-major, top row first, as stored in the file
    pixels: Vec<Vec3>,

    /// Original file path (for debugging)
    pub path: String,
}

impl TextureImage {
    /// Load and decode an image file.
    pub fn load<P: AsRef<Path>>(path: P) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| TextureError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.display().to_string()));
        }

        let pixels = rgb
            .pixels()
            .map(|p| {
                Vec3::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect();

        log::debug!("Loaded texture {} ({}x{})", path.display(), width, height);

        Ok(Self {
            width,
            height,
            pixels,
            path: path.display().to_string(),
        })
    }

    /// Build a texture from linear pixels, top row first.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> TextureResult<Self> {
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return Err(TextureError::Empty("<memory>".to_string()));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path: "<memory>".to_string(),
        })
    }

    /// Nearest-texel lookup. UV coordinates are clamped to [0, 1] with
    /// (0, 0) at the bottom-left of the image.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);

        self.pixels[(y * self.width + x) as usize]
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
