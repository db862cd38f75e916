//! 8-bit output buffer and the float-to-byte conversion that fills it.

use std::path::Path;

use image::RgbImage;

use crate::material::Color;

/// Packed RGB bytes, `width * height * 3` long.
///
/// Rows are stored bottom row first, the order the scheduler walks the
/// image in. [`Framebuffer::to_image`] flips them for top-down formats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Framebuffer {
    /// A black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * 3
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of pixel `x` in row `row` (0 is the bottom row).
    pub fn offset(&self, x: u32, row: u32) -> usize {
        row as usize * self.stride() + x as usize * 3
    }

    /// Pixel `x` of row `row` (0 is the bottom row).
    pub fn pixel(&self, x: u32, row: u32) -> [u8; 3] {
        let i = self.offset(x, row);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Convert to a top-down image.
    pub fn to_image(&self) -> RgbImage {
        let stride = self.stride();
        let mut flipped = Vec::with_capacity(self.data.len());
        if stride > 0 {
            for row in self.data.chunks_exact(stride).rev() {
                flipped.extend_from_slice(row);
            }
        }

        // Length is width * height * 3 by construction
        RgbImage::from_raw(self.width, self.height, flipped)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Encode to disk; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let path = path.as_ref();
        self.to_image().save(path)?;
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Average an accumulated color over `samples` and convert it to display
/// bytes: gamma 2.0, clamp to [0, 0.999], scale by 256 and truncate.
pub fn quantize(sum: Color, samples: u32) -> [u8; 3] {
    let scale = 1.0 / samples.max(1) as f32;
    let channel = |c: f32| (256.0 * linear_to_gamma(c * scale).clamp(0.0, 0.999)) as u8;
    [channel(sum.x), channel(sum.y), channel(sum.z)]
}
