//! Camera for ray generation.

use rand::RngCore;
use raytile_math::Vec3;

use crate::sampling::{gen_range, random_in_unit_disk};
use crate::Ray;

/// Thin-lens camera with a shutter interval.
///
/// Configure with the `with_*` methods, then call [`Camera::build`] before
/// generating rays. Viewport coordinates run from (0, 0) at the bottom-left
/// to (1, 1) at the top-right.
#[derive(Clone, Debug)]
pub struct Camera {
    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,         // Vertical field of view in degrees
    aspect_ratio: f32, // Width over height
    aperture: f32,     // Lens diameter, 0 for a pinhole
    focus_dist: f32,   // Distance from camera to plane of perfect focus

    // Shutter open/close times
    time0: f32,
    time1: f32,

    // Cached computed values (set by build())
    lower_left_corner: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 1.0,
            time0: 0.0,
            time1: 0.0,
            lower_left_corner: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            lens_radius: 0.0,
        }
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.aperture = aperture.max(0.0);
        self.focus_dist = focus_dist;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set the interval ray times are drawn from.
    pub fn with_shutter(mut self, time0: f32, time1: f32) -> Self {
        self.time0 = time0;
        self.time1 = time1;
        self
    }

    /// Compute the viewport. Must be called after the last `with_*` call.
    pub fn build(mut self) -> Self {
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = self.aspect_ratio * viewport_height;

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        self.horizontal = self.focus_dist * viewport_width * self.u;
        self.vertical = self.focus_dist * viewport_height * self.v;
        self.lower_left_corner = self.look_from
            - self.horizontal / 2.0
            - self.vertical / 2.0
            - self.focus_dist * self.w;

        self.lens_radius = self.aperture / 2.0;
        self
    }

    /// Generate a ray through viewport coordinates `(s, t)`, sampling the
    /// lens and the shutter interval.
    pub fn get_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let offset = if self.lens_radius > 0.0 {
            let rd = self.lens_radius * random_in_unit_disk(rng);
            self.u * rd.x + self.v * rd.y
        } else {
            Vec3::ZERO
        };

        let origin = self.look_from + offset;
        let target = self.lower_left_corner + s * self.horizontal + t * self.vertical;
        let time = if self.time1 > self.time0 {
            gen_range(rng, self.time0, self.time1)
        } else {
            self.time0
        };

        Ray::new(origin, target - origin, time)
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    /// Shutter open and close times.
    pub fn shutter(&self) -> (f32, f32) {
        (self.time0, self.time1)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
