//! Math types shared by the raytile crates.
//!
//! Vector and matrix types come straight from glam; this crate adds the
//! handful of ray tracing specific types on top.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{Mat4Ext, Placement};
