//! Axis-aligned rectangles and boxes.

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval, Vec3};

use crate::{HitRecord, Hittable, HittableList, Material, Ray};

/// Plane an [`AaRect`] lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

impl Plane {
    /// (first in-plane axis, second in-plane axis, normal axis)
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::Xy => (0, 1, 2),
            Plane::Xz => (0, 2, 1),
            Plane::Yz => (1, 2, 0),
        }
    }
}

/// A two-sided rectangle `[a0, a1] x [b0, b1]` at offset `k` along the
/// plane's normal axis.
pub struct AaRect {
    plane: Plane,
    a: Interval,
    b: Interval,
    k: f32,
    material: Arc<dyn Material>,
}

impl AaRect {
    pub fn new(plane: Plane, [a0, a1, b0, b1, k]: [f32; 5], material: Arc<dyn Material>) -> Self {
        Self {
            plane,
            a: Interval::new(a0.min(a1), a0.max(a1)),
            b: Interval::new(b0.min(b1), b0.max(b1)),
            k,
            material,
        }
    }

    pub fn xy(x0: f32, x1: f32, y0: f32, y1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(Plane::Xy, [x0, x1, y0, y1, k], material)
    }

    pub fn xz(x0: f32, x1: f32, z0: f32, z1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(Plane::Xz, [x0, x1, z0, z1, k], material)
    }

    pub fn yz(y0: f32, y1: f32, z0: f32, z1: f32, k: f32, material: Arc<dyn Material>) -> Self {
        Self::new(Plane::Yz, [y0, y1, z0, z1, k], material)
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }
}

impl Hittable for AaRect {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        _rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let (ia, ib, n) = self.plane.axes();
        let origin = ray.origin();
        let direction = ray.direction();

        let t = (self.k - origin[n]) / direction[n];
        if !t.is_finite() || !ray_t.contains(t) {
            return None;
        }

        let a = origin[ia] + t * direction[ia];
        let b = origin[ib] + t * direction[ib];
        if !self.a.contains(a) || !self.b.contains(b) {
            return None;
        }

        let mut outward_normal = Vec3::ZERO;
        outward_normal[n] = 1.0;

        let uv = (
            (a - self.a.min) / self.a.size(),
            (b - self.b.min) / self.b.size(),
        );
        Some(HitRecord::new(ray, t, outward_normal, self.material.as_ref(), uv))
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        let (ia, ib, n) = self.plane.axes();
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        (min[ia], max[ia]) = (self.a.min, self.a.max);
        (min[ib], max[ib]) = (self.b.min, self.b.max);
        (min[n], max[n]) = (self.k, self.k);

        // Aabb pads the zero-width normal axis
        Aabb::from_points(min, max)
    }
}

/// An axis-aligned box made of six rectangles.
pub struct Cuboid {
    min: Vec3,
    max: Vec3,
    sides: HittableList,
}

impl Cuboid {
    /// Box spanning the two corners, given in any order.
    pub fn new(p0: Vec3, p1: Vec3, material: Arc<dyn Material>) -> Self {
        let min = p0.min(p1);
        let max = p0.max(p1);

        let mut sides = HittableList::new();
        sides.add(Arc::new(AaRect::xy(min.x, max.x, min.y, max.y, max.z, material.clone())));
        sides.add(Arc::new(AaRect::xy(min.x, max.x, min.y, max.y, min.z, material.clone())));
        sides.add(Arc::new(AaRect::xz(min.x, max.x, min.z, max.z, max.y, material.clone())));
        sides.add(Arc::new(AaRect::xz(min.x, max.x, min.z, max.z, min.y, material.clone())));
        sides.add(Arc::new(AaRect::yz(min.y, max.y, min.z, max.z, max.x, material.clone())));
        sides.add(Arc::new(AaRect::yz(min.y, max.y, min.z, max.z, min.x, material)));

        Self { min, max, sides }
    }
}

impl Hittable for Cuboid {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.sides.hit(ray, ray_t, rng)
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        Aabb::from_points(self.min, self.max)
    }
}
