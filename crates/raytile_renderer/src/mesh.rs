//! Baking raw meshes into world-space triangles.

use std::path::Path;
use std::sync::Arc;

use rand::RngCore;
use rayon::prelude::*;
use raytile_core::{MeshError, RawMesh};
use raytile_math::{Aabb, Interval, Placement};

use crate::{HitRecord, Hittable, Material, Ray, Triangle};

/// Triangles of one placed mesh, all sharing a single material.
///
/// The order of `triangles` follows the face order of the source mesh.
pub struct TriangleMesh {
    triangles: Vec<Arc<Triangle>>,
    bbox: Aabb,
}

impl TriangleMesh {
    /// Load an OBJ file and bake it with `placement`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        material: Arc<dyn Material>,
        placement: &Placement,
    ) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let raw = RawMesh::load_obj(path).map_err(|e| {
            log::error!("Skipping mesh {}: {}", path.display(), e);
            e
        })?;
        build_mesh(&raw, material, placement)
    }

    pub fn triangles(&self) -> &[Arc<Triangle>] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The triangles as individual scene objects, so an acceleration
    /// structure can split the mesh.
    pub fn into_objects(self) -> Vec<Arc<dyn Hittable>> {
        self.triangles
            .into_iter()
            .map(|t| t as Arc<dyn Hittable>)
            .collect()
    }
}

impl Hittable for TriangleMesh {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }

        let mut closest: Option<HitRecord<'a>> = None;
        for triangle in &self.triangles {
            let window = ray_t.with_max(closest.map_or(ray_t.max, |rec| rec.t));
            if let Some(rec) = triangle.hit(ray, window, rng) {
                closest = Some(rec);
            }
        }
        closest
    }

    fn bounding_box(&self, _time0: f32, _time1: f32) -> Aabb {
        self.bbox
    }
}

/// Bake `raw` into world space: every vertex is scaled, rotated and then
/// translated by `placement`. The resulting triangles carry an identity
/// placement of their own.
///
/// Fails without producing any geometry when a face references a vertex
/// outside the vertex table, or when `placement` has a zero scale component.
pub fn build_mesh(
    raw: &RawMesh,
    material: Arc<dyn Material>,
    placement: &Placement,
) -> Result<TriangleMesh, MeshError> {
    if !placement.is_invertible() {
        let e = MeshError::DegeneratePlacement {
            scale: placement.scale,
        };
        log::error!("Mesh build failed: {}", e);
        return Err(e);
    }

    let triangles = (0..raw.triangle_count())
        .into_par_iter()
        .map(|face| -> Result<Arc<Triangle>, MeshError> {
            let [a, b, c] = raw.triangle(face)?;
            Ok(Arc::new(Triangle::new(
                placement.apply(a),
                placement.apply(b),
                placement.apply(c),
                material.clone(),
            )))
        })
        .collect::<Result<Vec<_>, MeshError>>()
        .map_err(|e| {
            log::error!("Mesh build failed: {}", e);
            e
        })?;

    let bbox = triangles.iter().fold(Aabb::EMPTY, |acc, t| {
        Aabb::surrounding(&acc, &t.bounding_box(0.0, 0.0))
    });

    log::debug!("Built mesh with {} triangles", triangles.len());
    Ok(TriangleMesh { triangles, bbox })
}
