//! Triangle primitive for ray tracing.
//!
//! Intersects the triangle's plane, then runs a three-edge sidedness test
//! against the precomputed normal. Triangles normally hold world-space
//! vertices; a triangle built with a non-identity [`Placement`] keeps its
//! vertices in object space and maps each ray into that frame instead.

use std::sync::Arc;

use rand::RngCore;
use raytile_math::{Aabb, Interval, Mat4, Mat4Ext, Placement, Vec3};
use thiserror::Error;

use crate::{HitRecord, Hittable, Material, Ray};

/// Errors raised while constructing geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Placement is not invertible (scale {scale:?})")]
    DegeneratePlacement { scale: Vec3 },
}

/// A triangle primitive.
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Unit normal of the (object-space) vertices, fixed at construction
    normal: Vec3,
    material: Arc<dyn Material>,
    placement: Placement,
    /// Cached matrices, both identity for world-space triangles
    to_local: Mat4,
    bbox: Aabb,
}

impl Triangle {
    /// Create a triangle from three world-space vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<dyn Material>) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize();
        let bbox = Aabb::enclosing([v0, v1, v2]);

        Self {
            v0,
            v1,
            v2,
            normal,
            material,
            placement: Placement::IDENTITY,
            to_local: Mat4::IDENTITY,
            bbox,
        }
    }

    /// Create a triangle from object-space vertices that is placed in the
    /// world per ray rather than by moving its vertices.
    pub fn with_placement(
        v0: Vec3,
        v1: Vec3,
        v2: Vec3,
        material: Arc<dyn Material>,
        placement: Placement,
    ) -> Result<Self, GeometryError> {
        if !placement.is_invertible() {
            return Err(GeometryError::DegeneratePlacement {
                scale: placement.scale,
            });
        }

        let mut triangle = Self::new(v0, v1, v2, material);
        if !placement.is_identity() {
            let to_world = placement.to_matrix();
            triangle.bbox = to_world.transform_aabb(&triangle.bbox);
            triangle.to_local = to_world.inverse();
            triangle.placement = placement;
        }
        Ok(triangle)
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unit normal in the triangle's own frame.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Barycentric weights of `p` (assumed to lie in the plane) for `v1`
    /// and `v2`, or `None` when `p` is outside any edge.
    fn barycentric(&self, p: Vec3) -> Option<(f32, f32)> {
        let n = self.normal;
        let area = (self.v1 - self.v0).cross(self.v2 - self.v0).dot(n);

        let w0 = (self.v2 - self.v1).cross(p - self.v1).dot(n);
        let w1 = (self.v0 - self.v2).cross(p - self.v2).dot(n);
        let w2 = (self.v1 - self.v0).cross(p - self.v0).dot(n);

        if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
            return None;
        }
        Some((w1 / area, w2 / area))
    }
}

impl Hittable for Triangle {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        _rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let placed = !self.placement.is_identity();

        // An affine map leaves the ray parameter unchanged, so t found in the
        // local frame is valid for the world ray as well.
        let local = if placed {
            Ray::new(
                self.to_local.transform_point3(ray.origin()),
                self.to_local.transform_vector3(ray.direction()),
                ray.time(),
            )
        } else {
            *ray
        };

        let denom = local.direction().dot(self.normal);
        let t = (self.v0 - local.origin()).dot(self.normal) / denom;
        // Parallel rays and degenerate triangles produce inf/NaN here
        if !t.is_finite() || !ray_t.contains(t) {
            return None;
        }

        let uv = self.barycentric(local.at(t))?;

        let outward_normal = if placed {
            self.to_local.transform_normal(self.normal)
        } else {
            self.normal
        };
        Some(HitRecord::new(
            ray,
            t,
            outward_normal,
            self.material.as_ref(),
            uv,
        ))
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lambertian;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::from_color(Vec3::splat(0.5)))
    }

    fn unit_triangle() -> Triangle {
        // Triangle in XY plane at z=-1, facing +Z
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            gray(),
        )
    }

    fn window() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rng = StdRng::seed_from_u64(0);

        let rec = tri.hit(&ray, window(), &mut rng).unwrap();
        assert!((rec.t - 1.0).abs() < 0.001);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = unit_triangle();
        let mut rng = StdRng::seed_from_u64(0);

        let away = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        let beside = Ray::new_simple(Vec3::new(0.9, 0.9, 0.0), Vec3::NEG_Z);
        assert!(tri.hit(&away, window(), &mut rng).is_none());
        assert!(tri.hit(&beside, window(), &mut rng).is_none());
    }

    #[test]
    fn test_parallel_ray_is_no_hit() {
        let tri = unit_triangle();
        let mut rng = StdRng::seed_from_u64(0);

        let in_plane = Ray::new_simple(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        let above_plane = Ray::new_simple(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(tri.hit(&in_plane, window(), &mut rng).is_none());
        assert!(tri.hit(&above_plane, window(), &mut rng).is_none());
    }

    #[test]
    fn test_every_edge_is_checked_for_both_windings() {
        let ccw = unit_triangle();
        let cw = Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            gray(),
        );
        let mut rng = StdRng::seed_from_u64(0);

        // Just outside each of the three edges, then just inside the centroid
        let outside = [
            Vec3::new(0.0, -1.1, 0.0),
            Vec3::new(0.6, 0.3, 0.0),
            Vec3::new(-0.6, 0.3, 0.0),
        ];
        for tri in [&ccw, &cw] {
            for start in outside {
                let ray = Ray::new_simple(start, Vec3::NEG_Z);
                assert!(tri.hit(&ray, window(), &mut rng).is_none(), "{start:?}");
            }
            let center = Ray::new_simple(Vec3::new(0.0, -1.0 / 3.0, 0.0), Vec3::NEG_Z);
            assert!(tri.hit(&center, window(), &mut rng).is_some());
        }
    }

    #[test]
    fn test_barycentric_uv() {
        let tri = unit_triangle();
        let mut rng = StdRng::seed_from_u64(0);

        // Aim at v1 and v2 directly
        let at_v1 = Ray::new_simple(Vec3::new(0.999, -0.999, 0.0), Vec3::NEG_Z);
        let at_v2 = Ray::new_simple(Vec3::new(0.0, 0.999, 0.0), Vec3::NEG_Z);

        let rec = tri.hit(&at_v1, window(), &mut rng).unwrap();
        assert!((rec.u - 1.0).abs() < 0.01 && rec.v.abs() < 0.01);
        let rec = tri.hit(&at_v2, window(), &mut rng).unwrap();
        assert!(rec.u.abs() < 0.01 && (rec.v - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_normal_is_unit_length() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 1.0),
            Vec3::new(0.0, 5.0, 2.0),
            gray(),
        );
        assert!((tri.normal().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_placed_triangle_matches_baked_triangle() {
        let placement = Placement::new(
            Vec3::new(1.0, 2.0, -4.0),
            Vec3::new(0.0, 30.0, 10.0),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let [a, b, c] = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];

        let placed = Triangle::with_placement(a, b, c, gray(), placement).unwrap();
        let baked = Triangle::new(
            placement.apply(a),
            placement.apply(b),
            placement.apply(c),
            gray(),
        );

        let mut rng = StdRng::seed_from_u64(0);
        let target = placement.apply(Vec3::new(0.1, -0.2, 0.0));
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), target - Vec3::new(0.0, 0.0, 5.0));

        let p = placed.hit(&ray, window(), &mut rng).unwrap();
        let q = baked.hit(&ray, window(), &mut rng).unwrap();
        assert!((p.t - q.t).abs() < 1e-4);
        assert!((p.p - q.p).length() < 1e-3);
        assert!((p.normal - q.normal).length() < 1e-4);
        assert_eq!(p.front_face, q.front_face);

        let bbox = placed.bounding_box(0.0, 1.0);
        for v in baked.vertices() {
            assert!(bbox.x.contains(v.x) && bbox.y.contains(v.y) && bbox.z.contains(v.z));
        }
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let placement = Placement::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        let result = Triangle::with_placement(Vec3::ZERO, Vec3::X, Vec3::Y, gray(), placement);
        assert!(matches!(
            result,
            Err(GeometryError::DegeneratePlacement { .. })
        ));
    }

    #[test]
    fn test_identity_placement_stays_world_space() {
        let tri =
            Triangle::with_placement(Vec3::ZERO, Vec3::X, Vec3::Y, gray(), Placement::IDENTITY)
                .unwrap();
        assert!(tri.placement().is_identity());
        assert_eq!(tri.vertices(), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }
}
