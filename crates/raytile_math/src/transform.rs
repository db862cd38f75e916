// Placement and transform helpers.
//
// A `Placement` is the scale -> rotate -> translate triple that scene files use
// to position loaded geometry. It converts to glam matrices; `Mat4Ext` adds the
// bounding-box helper glam does not provide.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal. `self` must be the world-to-local matrix of
    /// the surface; the normal is carried by its transpose (the inverse
    /// transpose of local-to-world) so non-uniform scale keeps it perpendicular.
    fn transform_normal(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb::enclosing(aabb.corners().map(|corner| self.transform_point3(corner)))
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.transpose().transform_vector3(normal).normalize()
    }
}

/// Position, Euler rotation (degrees, XYZ order) and per-axis scale.
///
/// Applied to a point in the fixed order scale, then rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when every scale component is finite and non-zero, i.e. the
    /// placement can be inverted.
    pub fn is_invertible(&self) -> bool {
        self.scale.is_finite()
            && self.scale.x != 0.0
            && self.scale.y != 0.0
            && self.scale.z != 0.0
            && self.rotation.is_finite()
            && self.position.is_finite()
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Local-to-world matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }

    /// Apply the placement to a single point.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.rotation_quat() * (point * self.scale) + self.position
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}
