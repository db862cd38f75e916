//! Turning a parsed scene file into something the scheduler can render.

use std::path::PathBuf;
use std::sync::Arc;

use raytile_core::{
    BoxDescription, CameraSettings, ImageSettings, LightDescription, MeshDescription,
    ObjectDescription, RectDescription, RectPlane, SceneDescription,
};
use raytile_math::Vec3;

use crate::{
    AaRect, Camera, Cuboid, DiffuseLight, Framebuffer, Hittable, HittableList, Lambertian,
    Material, Plane, RenderConfig, RotateY, Scene, Translate, TriangleMesh,
};

/// Everything needed for one render.
pub struct RenderJob {
    pub scene: Scene,
    pub camera: Camera,
    pub config: RenderConfig,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

impl RenderJob {
    /// A black framebuffer of the job's size.
    pub fn framebuffer(&self) -> Framebuffer {
        Framebuffer::new(self.width, self.height)
    }
}

/// Build the scene, camera and render settings described by `desc`.
///
/// Meshes that fail to load are logged and left out; the rest of the scene
/// still renders.
pub fn build_job(desc: &SceneDescription) -> RenderJob {
    let camera = build_camera(&desc.camera, &desc.image);
    let (time0, time1) = camera.shutter();
    let objects = build_objects(desc);
    log::info!("Scene has {} top-level objects", objects.len());

    RenderJob {
        scene: Scene::from_list(objects, time0, time1),
        camera,
        config: render_config(&desc.image),
        width: desc.image.width,
        height: desc.image.height,
        output: PathBuf::from(&desc.image.output),
    }
}

pub fn build_camera(camera: &CameraSettings, image: &ImageSettings) -> Camera {
    Camera::new()
        .with_position(
            Vec3::from_array(camera.look_from),
            Vec3::from_array(camera.look_at),
            Vec3::from_array(camera.vup),
        )
        .with_lens(image.fov, camera.aperture, camera.focus_distance)
        .with_aspect_ratio(image.aspect())
        .with_shutter(camera.time0, camera.time1)
        .build()
}

pub fn render_config(image: &ImageSettings) -> RenderConfig {
    RenderConfig {
        samples_per_pixel: image.samples,
        max_depth: image.max_depth,
        background: Vec3::from_array(image.background),
        threads: image.threads,
        seed: image.seed,
    }
}

/// Every object and light of the description, in file order.
pub fn build_objects(desc: &SceneDescription) -> HittableList {
    let mut objects = HittableList::new();

    for object in &desc.objects {
        match object {
            ObjectDescription::Box(b) => objects.add(placed_box(b)),
            ObjectDescription::Xy(r) => objects.add(rect(Plane::Xy, r)),
            ObjectDescription::Xz(r) => objects.add(rect(Plane::Xz, r)),
            ObjectDescription::Yz(r) => objects.add(rect(Plane::Yz, r)),
            ObjectDescription::Object(m) => objects.extend(mesh(desc, m)),
        }
    }

    for light in &desc.lights {
        match light {
            LightDescription::Diffuse(l) => {
                let emit: Arc<dyn Material> =
                    Arc::new(DiffuseLight::from_color(Vec3::from_array(l.color)));
                objects.add(Arc::new(AaRect::new(plane(l.rect), l.position, emit)));
            }
        }
    }

    objects
}

fn lambertian(color: [f32; 3]) -> Arc<dyn Material> {
    Arc::new(Lambertian::from_color(Vec3::from_array(color)))
}

fn plane(rect: RectPlane) -> Plane {
    match rect {
        RectPlane::Xy => Plane::Xy,
        RectPlane::Xz => Plane::Xz,
        RectPlane::Yz => Plane::Yz,
    }
}

fn rect(plane: Plane, desc: &RectDescription) -> Arc<dyn Hittable> {
    Arc::new(AaRect::new(plane, desc.position, lambertian(desc.color)))
}

/// Box from the origin to `Scale`, turned about Y, then moved into place.
fn placed_box(desc: &BoxDescription) -> Arc<dyn Hittable> {
    let cuboid: Arc<dyn Hittable> = Arc::new(Cuboid::new(
        Vec3::ZERO,
        Vec3::from_array(desc.scale),
        lambertian(desc.color),
    ));
    let rotated: Arc<dyn Hittable> = Arc::new(RotateY::new(cuboid, desc.rotation[1]));
    Arc::new(Translate::new(rotated, Vec3::from_array(desc.position)))
}

fn mesh(desc: &SceneDescription, m: &MeshDescription) -> Vec<Arc<dyn Hittable>> {
    let path = desc.resolve_path(&m.file_path);
    match TriangleMesh::load(&path, lambertian(m.color), &m.placement()) {
        Ok(mesh) => {
            log::debug!("Added {} triangles from {}", mesh.len(), path.display());
            mesh.into_objects()
        }
        // Already logged by the loader
        Err(_) => Vec::new(),
    }
}
