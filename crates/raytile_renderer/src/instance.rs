//! Placement wrappers that move an existing hittable without copying it.

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval, Vec3};

use crate::{HitRecord, Hittable, Ray};

/// Offsets a hittable by a fixed vector.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        Self { object, offset }
    }
}

impl Hittable for Translate {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        // Move the ray into object space instead of moving the object
        let moved = ray.offset(-self.offset);
        let mut rec = self.object.hit(&moved, ray_t, rng)?;
        rec.p += self.offset;
        Some(rec)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        self.object.bounding_box(time0, time1).translate(self.offset)
    }
}

/// Rotates a hittable about the Y axis.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    sin_theta: f32,
    cos_theta: f32,
}

impl RotateY {
    pub fn new(object: Arc<dyn Hittable>, degrees: f32) -> Self {
        let (sin_theta, cos_theta) = degrees.to_radians().sin_cos();
        Self {
            object,
            sin_theta,
            cos_theta,
        }
    }

    /// World space to object space.
    fn to_object(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x - self.sin_theta * v.z,
            v.y,
            self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }

    /// Object space to world space.
    fn to_world(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x + self.sin_theta * v.z,
            v.y,
            -self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }
}

impl Hittable for RotateY {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let rotated = Ray::new(
            self.to_object(ray.origin()),
            self.to_object(ray.direction()),
            ray.time(),
        );

        let mut rec = self.object.hit(&rotated, ray_t, rng)?;
        rec.p = self.to_world(rec.p);
        rec.normal = self.to_world(rec.normal);
        Some(rec)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        let inner = self.object.bounding_box(time0, time1);
        if inner == Aabb::EMPTY {
            return inner;
        }
        Aabb::enclosing(inner.corners().map(|corner| self.to_world(corner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cuboid, Lambertian, Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::from_color(Vec3::splat(0.5)))
    }

    #[test]
    fn test_translate_moves_hit_point() {
        let sphere: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::ZERO, 1.0, gray()));
        let moved = Translate::new(sphere, Vec3::new(10.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0);

        let ray = Ray::new_simple(Vec3::new(10.0, 0.0, 5.0), Vec3::NEG_Z);
        let rec = moved
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .unwrap();
        assert!((rec.p - Vec3::new(10.0, 0.0, 1.0)).length() < 1e-4);

        let miss = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(moved
            .hit(&miss, Interval::new(0.001, f32::INFINITY), &mut rng)
            .is_none());

        let bbox = moved.bounding_box(0.0, 1.0);
        assert!(bbox.x.contains(9.0) && bbox.x.contains(11.0));
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        // Thin slab along +X becomes a slab along -Z after +90 degrees
        let slab: Arc<dyn Hittable> = Arc::new(Cuboid::new(
            Vec3::new(0.0, -0.5, -0.5),
            Vec3::new(4.0, 0.5, 0.5),
            gray(),
        ));
        let rotated = RotateY::new(slab, 90.0);
        let mut rng = StdRng::seed_from_u64(0);
        let window = Interval::new(0.001, f32::INFINITY);

        let down_at_neg_z = Ray::new_simple(Vec3::new(0.0, 5.0, -3.0), Vec3::NEG_Y);
        let down_at_pos_x = Ray::new_simple(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y);

        let rec = rotated.hit(&down_at_neg_z, window, &mut rng).unwrap();
        assert!((rec.p.y - 0.5).abs() < 1e-4);
        assert!((rec.normal - Vec3::Y).length() < 1e-4);
        assert!(rotated.hit(&down_at_pos_x, window, &mut rng).is_none());

        let bbox = rotated.bounding_box(0.0, 1.0);
        assert!(bbox.z.min < -3.9 && bbox.z.max.abs() < 0.1);
        assert!(bbox.x.max < 0.6);
    }
}
