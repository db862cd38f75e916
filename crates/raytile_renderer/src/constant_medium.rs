//! Participating media of constant density (smoke, fog).

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval, Vec3};

use crate::material::{Color, Isotropic};
use crate::sampling::gen_f32;
use crate::{HitRecord, Hittable, Material, Ray};

/// A volume filling a closed boundary shape.
///
/// A ray passing through the volume scatters at an exponentially
/// distributed distance; rays that make it out the other side miss.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Arc<dyn Material>,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self::with_phase(boundary, density, Arc::new(Isotropic::from_color(albedo)))
    }

    pub fn with_phase(
        boundary: Arc<dyn Hittable>,
        density: f32,
        phase_function: Arc<dyn Material>,
    ) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function,
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        // Where the ray enters and leaves the boundary, ignoring ray_t
        let entry = self.boundary.hit(ray, Interval::UNIVERSE, rng)?;
        let exit = self
            .boundary
            .hit(ray, Interval::new(entry.t + 0.0001, f32::INFINITY), rng)?;

        let t_enter = entry.t.max(ray_t.min).max(0.0);
        let t_exit = exit.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }

        let ray_length = ray.direction().length();
        let distance_inside = (t_exit - t_enter) * ray_length;
        let hit_distance = self.neg_inv_density * gen_f32(rng).ln();
        if hit_distance > distance_inside {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        // Normal and face are meaningless inside a volume
        Some(HitRecord {
            p: ray.at(t),
            normal: Vec3::X,
            material: self.phase_function.as_ref(),
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        })
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        self.boundary.bounding_box(time0, time1)
    }
}
