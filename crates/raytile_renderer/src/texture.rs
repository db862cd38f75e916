//! Textures: spatially varying colors sampled by materials.

use std::sync::Arc;

use rand::RngCore;
use raytile_core::TextureImage;
use raytile_math::Vec3;

use crate::material::Color;
use crate::perlin::Perlin;

/// Color lookup by surface coordinates and hit point.
pub trait Texture: Send + Sync {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color;
}

/// A single constant color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    color: Color,
}

impl SolidColor {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.color
    }
}

/// 3D checkerboard alternating between two textures.
#[derive(Clone)]
pub struct CheckerTexture {
    odd: Arc<dyn Texture>,
    even: Arc<dyn Texture>,
    /// Spatial frequency of the checks
    scale: f32,
}

impl CheckerTexture {
    pub fn new(odd: Arc<dyn Texture>, even: Arc<dyn Texture>, scale: f32) -> Self {
        Self { odd, even, scale }
    }

    pub fn from_colors(odd: Color, even: Color) -> Self {
        Self::new(
            Arc::new(SolidColor::new(odd)),
            Arc::new(SolidColor::new(even)),
            10.0,
        )
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        let sines = (self.scale * p.x).sin() * (self.scale * p.y).sin() * (self.scale * p.z).sin();
        if sines < 0.0 {
            self.odd.value(u, v, p)
        } else {
            self.even.value(u, v, p)
        }
    }
}

/// Marble-like pattern from Perlin turbulence.
#[derive(Clone)]
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    const TURBULENCE_DEPTH: u32 = 7;

    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f32, _v: f32, p: Vec3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.noise.turbulence(p, Self::TURBULENCE_DEPTH);
        Color::ONE * 0.5 * (1.0 + phase.sin())
    }
}

/// Image-mapped texture.
///
/// Without an image every lookup returns solid cyan so missing textures are
/// obvious in the render.
#[derive(Clone)]
pub struct ImageTexture {
    image: Option<Arc<TextureImage>>,
}

impl ImageTexture {
    pub fn new(image: Arc<TextureImage>) -> Self {
        Self { image: Some(image) }
    }

    /// Load from disk, falling back to the debug color when the file can't be read.
    pub fn load(path: &str) -> Self {
        match TextureImage::load(path) {
            Ok(image) => Self::new(Arc::new(image)),
            Err(e) => {
                log::warn!("{e}; using debug color");
                Self { image: None }
            }
        }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _p: Vec3) -> Color {
        match &self.image {
            Some(image) => image.sample(u, v),
            None => Color::new(0.0, 1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_solid_color() {
        let tex = SolidColor::new(Color::new(0.1, 0.2, 0.3));
        assert_eq!(tex.value(0.7, 0.2, Vec3::splat(5.0)), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_checker_alternates() {
        let odd = Color::new(1.0, 0.0, 0.0);
        let even = Color::new(0.0, 0.0, 1.0);
        let tex = CheckerTexture::from_colors(odd, even);

        // sin(10 * 0.1)^3 > 0
        assert_eq!(tex.value(0.0, 0.0, Vec3::splat(0.1)), even);
        // Flip the sign of one factor
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(-0.1, 0.1, 0.1)), odd);
    }

    #[test]
    fn test_noise_texture_in_unit_range() {
        let tex = NoiseTexture::new(4.0, &mut StdRng::seed_from_u64(4));
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.13, 1.0, i as f32 * 0.07);
            let c = tex.value(0.0, 0.0, p);
            assert!(c.x >= 0.0 && c.x <= 1.0);
            assert_eq!(c.x, c.y);
            assert_eq!(c.y, c.z);
        }
    }

    #[test]
    fn test_image_texture_samples_image() {
        let pixels = vec![
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 1.0, 0.0),
            Color::new(0.0, 0.0, 1.0),
            Color::new(1.0, 1.0, 1.0),
        ];
        let image = TextureImage::from_pixels(2, 2, pixels).unwrap();
        let tex = ImageTexture::new(Arc::new(image));

        // v = 1 is the top row of the image
        assert_eq!(tex.value(0.1, 0.9, Vec3::ZERO), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.value(0.9, 0.1, Vec3::ZERO), Color::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_missing_image_is_cyan() {
        let tex = ImageTexture::load("/definitely/not/here.png");
        assert_eq!(tex.value(0.5, 0.5, Vec3::ZERO), Color::new(0.0, 1.0, 1.0));
    }
}
