//! Raytile renderer - CPU path tracing
//!
//! A Monte Carlo path tracer: primitives and materials, a BVH over the
//! scene, and a scheduler that splits the image into column tiles rendered
//! on their own threads.

mod builder;
mod bvh;
mod camera;
mod constant_medium;
mod framebuffer;
mod hittable;
mod instance;
mod integrator;
mod material;
mod mesh;
mod perlin;
mod presets;
mod rect;
pub mod sampling;
mod scene;
mod scheduler;
mod sphere;
mod texture;
mod triangle;

pub use builder::{build_camera, build_job, build_objects, render_config, RenderJob};
pub use bvh::BvhNode;
pub use camera::Camera;
pub use constant_medium::ConstantMedium;
pub use framebuffer::{linear_to_gamma, quantize, Framebuffer};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use instance::{RotateY, Translate};
pub use integrator::{estimate_radiance, T_MIN};
pub use material::{
    Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterResult,
};
pub use mesh::{build_mesh, TriangleMesh};
pub use perlin::Perlin;
pub use presets::Preset;
pub use rect::{AaRect, Cuboid, Plane};
pub use scene::Scene;
pub use scheduler::{
    partition_columns, render, render_sequential, LogProgress, ProgressSink, RenderConfig,
    RenderError, RenderStats, Tile,
};
pub use sphere::{MovingSphere, Sphere};
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture};
pub use triangle::{GeometryError, Triangle};

pub use raytile_math::{Aabb, Interval, Ray, Vec3};
