//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the scene's objects. Each object is bounded once at
//! build time for the camera's shutter interval.

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval};

use crate::{HitRecord, Hittable, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf {
        objects: Vec<Arc<dyn Hittable>>,
        bbox: Aabb,
    },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects whose boxes cover
    /// `[time0, time1]`.
    pub fn new(objects: Vec<Arc<dyn Hittable>>, time0: f32, time1: f32) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }

        let mut entries: Vec<(Aabb, Arc<dyn Hittable>)> = objects
            .into_iter()
            .map(|object| (object.bounding_box(time0, time1), object))
            .collect();
        Self::build(&mut entries)
    }

    /// Recursive BVH construction.
    ///
    /// Simple median-split approach: sort objects by centroid on longest axis,
    /// split in half, recurse.
    fn build(entries: &mut [(Aabb, Arc<dyn Hittable>)]) -> Self {
        let bounds = entries
            .iter()
            .fold(Aabb::EMPTY, |acc, (bbox, _)| Aabb::surrounding(&acc, bbox));

        if entries.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                objects: entries.iter().map(|(_, object)| object.clone()).collect(),
                bbox: bounds,
            };
        }

        // Split along the axis where the centroids spread the most
        let axis = Aabb::enclosing(entries.iter().map(|(bbox, _)| bbox.centroid())).longest_axis();

        entries.sort_unstable_by(|(a, _), (b, _)| {
            a.centroid()[axis]
                .partial_cmp(&b.centroid()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let (left, right) = entries.split_at_mut(entries.len() / 2);

        BvhNode::Branch {
            left: Box::new(Self::build(left)),
            right: Box::new(Self::build(right)),
            bbox: bounds,
        }
    }

    /// Number of primitives stored in the leaves.
    pub fn primitive_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { objects, .. } => objects.len(),
            BvhNode::Branch { left, right, .. } => {
                left.primitive_count() + right.primitive_count()
            }
        }
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest: Option<HitRecord<'a>> = None;
                for obj in objects {
                    let window = ray_t.with_max(closest.map_or(ray_t.max, |rec| rec.t));
                    if let Some(rec) = obj.hit(ray, window, rng) {
                        closest = Some(rec);
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t, rng);

                // Only check right up to closest hit
                let right_max = hit_left.map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, ray_t.with_max(right_max), rng);

                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HittableList, Lambertian, Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use raytile_math::Vec3;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::from_color(Vec3::splat(0.5)))
    }

    fn spheres(count: usize) -> Vec<Arc<dyn Hittable>> {
        (0..count)
            .map(|i| {
                Arc::new(Sphere::new(Vec3::new(i as f32, 0.0, -5.0), 0.5, gray()))
                    as Arc<dyn Hittable>
            })
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(vec![], 0.0, 1.0);
        assert!(matches!(bvh, BvhNode::Empty));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::NEG_Z);
        assert!(bvh.hit(&ray, Interval::UNIVERSE, &mut rng).is_none());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let bvh = BvhNode::new(spheres(1), 0.0, 1.0);
        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(bvh
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .is_some());
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let bvh = BvhNode::new(spheres(10), 0.0, 1.0);
        assert!(matches!(bvh, BvhNode::Branch { .. }));
        assert_eq!(bvh.primitive_count(), 10);

        // Ray that hits sphere at x=5
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh
            .hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rng)
            .unwrap();

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);
    }

    #[test]
    fn test_bvh_agrees_with_linear_search() {
        let mut rng = StdRng::seed_from_u64(21);
        let objects: Vec<Arc<dyn Hittable>> = (0..60)
            .map(|i| {
                let center = Vec3::new(
                    (i % 7) as f32 * 1.3 - 4.0,
                    (i % 5) as f32 * 1.1 - 2.0,
                    -3.0 - (i % 11) as f32,
                );
                Arc::new(Sphere::new(center, 0.4, gray())) as Arc<dyn Hittable>
            })
            .collect();

        let bvh = BvhNode::new(objects.clone(), 0.0, 1.0);
        let mut list = HittableList::new();
        list.extend(objects);

        for i in 0..200 {
            let dir = Vec3::new((i % 20) as f32 * 0.05 - 0.5, (i / 20) as f32 * 0.05 - 0.25, -1.0);
            let ray = Ray::new_simple(Vec3::ZERO, dir);
            let window = Interval::new(0.001, f32::INFINITY);

            let a = bvh.hit(&ray, window, &mut rng).map(|r| r.t);
            let b = list.hit(&ray, window, &mut rng).map(|r| r.t);
            assert_eq!(a, b);
        }
    }
}
