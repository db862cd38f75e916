//! The renderable world: every object, behind one acceleration structure.

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval};

use crate::{BvhNode, HitRecord, Hittable, HittableList, Ray};

/// Immutable collection of scene objects answering nearest-hit queries.
///
/// Shared read-only between all render threads.
pub struct Scene {
    root: BvhNode,
}

impl Scene {
    /// Build a scene whose objects are bounded over the shutter interval
    /// `[time0, time1]`.
    pub fn new(objects: Vec<Arc<dyn Hittable>>, time0: f32, time1: f32) -> Self {
        let count = objects.len();
        let root = BvhNode::new(objects, time0, time1);
        log::debug!("Scene BVH built over {} objects", count);
        Self { root }
    }

    pub fn from_list(list: HittableList, time0: f32, time1: f32) -> Self {
        Self::new(list.into_objects(), time0, time1)
    }

    /// Nearest intersection with a parameter inside `ray_t`.
    pub fn nearest_hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.root.hit(ray, ray_t, rng)
    }

    pub fn object_count(&self) -> usize {
        self.root.primitive_count()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.root, BvhNode::Empty)
    }
}

impl Hittable for Scene {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.nearest_hit(ray, ray_t, rng)
    }

    fn bounding_box(&self, time0: f32, time1: f32) -> Aabb {
        self.root.bounding_box(time0, time1)
    }
}
