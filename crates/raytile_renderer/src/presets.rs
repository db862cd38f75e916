//! Built-in scenes that need no scene file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use rand::RngCore;
use raytile_math::Vec3;

use crate::material::Color;
use crate::sampling::{gen_f32, gen_range, random_vec3};
use crate::{
    AaRect, BvhNode, Camera, CheckerTexture, ConstantMedium, Cuboid, Dielectric, DiffuseLight,
    Hittable, HittableList, ImageTexture, Lambertian, Material, Metal, MovingSphere, NoiseTexture,
    RenderConfig, RenderJob, RotateY, Scene, Sphere, Translate,
};

/// Equirectangular texture used by the globe scenes, looked up relative to
/// the working directory.
pub const EARTH_MAP: &str = "earthmap.jpg";

/// A named built-in scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Ground plane covered in small random spheres around three large ones
    RandomSpheres,
    /// Two checkered spheres touching at the origin
    TwoSpheres,
    TwoPerlinSpheres,
    /// A globe textured with [`EARTH_MAP`]
    Earth,
    /// Two marble spheres lit by a single rectangle
    SimpleLight,
    CornellBox,
    /// Cornell box with the two blocks replaced by smoke
    CornellSmoke,
    /// Every primitive, material and texture in one scene
    FinalScene,
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::RandomSpheres,
        Preset::TwoSpheres,
        Preset::TwoPerlinSpheres,
        Preset::Earth,
        Preset::SimpleLight,
        Preset::CornellBox,
        Preset::CornellSmoke,
        Preset::FinalScene,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::RandomSpheres => "random-spheres",
            Preset::TwoSpheres => "two-spheres",
            Preset::TwoPerlinSpheres => "two-perlin-spheres",
            Preset::Earth => "earth",
            Preset::SimpleLight => "simple-light",
            Preset::CornellBox => "cornell-box",
            Preset::CornellSmoke => "cornell-smoke",
            Preset::FinalScene => "final-scene",
        }
    }

    /// Build the scene. `rng` drives the random placement and the noise
    /// textures, so a seeded generator gives the same scene every time.
    pub fn build(&self, rng: &mut dyn RngCore) -> RenderJob {
        let view = match self {
            Preset::RandomSpheres => View {
                look_from: Vec3::new(13.0, 2.0, 3.0),
                look_at: Vec3::ZERO,
                vfov: 20.0,
                aperture: 0.1,
                size: (600, 400),
                samples: 100,
                background: Color::new(0.70, 0.80, 1.00),
            },
            Preset::TwoSpheres | Preset::TwoPerlinSpheres | Preset::Earth => View {
                look_from: Vec3::new(13.0, 2.0, 3.0),
                look_at: Vec3::ZERO,
                vfov: 20.0,
                aperture: 0.0,
                size: (600, 400),
                samples: 100,
                background: Color::new(0.70, 0.80, 1.00),
            },
            Preset::SimpleLight => View {
                look_from: Vec3::new(26.0, 3.0, 6.0),
                look_at: Vec3::new(0.0, 2.0, 0.0),
                vfov: 20.0,
                aperture: 0.0,
                size: (640, 360),
                samples: 400,
                background: Color::ZERO,
            },
            Preset::CornellBox | Preset::CornellSmoke => View {
                look_from: Vec3::new(278.0, 278.0, -800.0),
                look_at: Vec3::new(278.0, 278.0, 0.0),
                vfov: 40.0,
                aperture: 0.0,
                size: (600, 600),
                samples: 200,
                background: Color::ZERO,
            },
            Preset::FinalScene => View {
                look_from: Vec3::new(478.0, 278.0, -600.0),
                look_at: Vec3::new(278.0, 278.0, 0.0),
                vfov: 40.0,
                aperture: 0.0,
                size: (800, 800),
                samples: 1000,
                background: Color::ZERO,
            },
        };

        let objects = match self {
            Preset::RandomSpheres => random_spheres(rng),
            Preset::TwoSpheres => two_spheres(),
            Preset::TwoPerlinSpheres => two_perlin_spheres(rng),
            Preset::Earth => earth(ImageTexture::load(EARTH_MAP)),
            Preset::SimpleLight => simple_light(rng),
            Preset::CornellBox => cornell_box(),
            Preset::CornellSmoke => cornell_smoke(),
            Preset::FinalScene => final_scene(rng, ImageTexture::load(EARTH_MAP)),
        };

        let (width, height) = view.size;
        let camera = Camera::new()
            .with_position(view.look_from, view.look_at, Vec3::Y)
            .with_lens(view.vfov, view.aperture, 10.0)
            .with_aspect_ratio(width as f32 / height as f32)
            .with_shutter(0.0, 1.0)
            .build();

        RenderJob {
            scene: Scene::from_list(objects, 0.0, 1.0),
            camera,
            config: RenderConfig {
                samples_per_pixel: view.samples,
                background: view.background,
                ..RenderConfig::default()
            },
            width,
            height,
            output: PathBuf::from(format!("{}.png", self.name())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(Preset::name).collect();
                format!("unknown preset '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

struct View {
    look_from: Vec3,
    look_at: Vec3,
    vfov: f32,
    aperture: f32,
    size: (u32, u32),
    samples: u32,
    background: Color,
}

fn random_spheres(rng: &mut dyn RngCore) -> HittableList {
    let mut world = HittableList::new();

    let checker = Arc::new(CheckerTexture::from_colors(
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    ));
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::new(checker)),
    )));

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(rng),
                0.2,
                b as f32 + 0.9 * gen_f32(rng),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let sphere: Arc<dyn Hittable> = if choose_mat < 0.8 {
                // diffuse, bouncing during the shutter interval
                let albedo = random_vec3(rng, 0.0, 1.0) * random_vec3(rng, 0.0, 1.0);
                let center1 = center + Vec3::new(0.0, gen_range(rng, 0.0, 0.5), 0.0);
                Arc::new(MovingSphere::new(
                    (center, 0.0),
                    (center1, 1.0),
                    0.2,
                    Arc::new(Lambertian::from_color(albedo)),
                ))
            } else if choose_mat < 0.95 {
                // metal
                let albedo = random_vec3(rng, 0.5, 1.0);
                let fuzz = gen_range(rng, 0.0, 0.5);
                Arc::new(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz))))
            } else {
                // glass
                Arc::new(Sphere::new(center, 0.2, Arc::new(Dielectric::new(1.5))))
            };
            world.add(sphere);
        }
    }

    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Arc::new(Dielectric::new(1.5)),
    )));
    world.add(Arc::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Lambertian::from_color(Color::new(0.4, 0.2, 0.1))),
    )));
    world.add(Arc::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)),
    )));

    world
}

fn two_spheres() -> HittableList {
    let checker: Arc<dyn Material> = Arc::new(Lambertian::new(Arc::new(
        CheckerTexture::from_colors(Color::new(0.2, 0.3, 0.1), Color::new(0.9, 0.9, 0.9)),
    )));

    let mut objects = HittableList::new();
    objects.add(Arc::new(Sphere::new(Vec3::new(0.0, -10.0, 0.0), 10.0, checker.clone())));
    objects.add(Arc::new(Sphere::new(Vec3::new(0.0, 10.0, 0.0), 10.0, checker)));
    objects
}

fn two_perlin_spheres(rng: &mut dyn RngCore) -> HittableList {
    let marble: Arc<dyn Material> =
        Arc::new(Lambertian::new(Arc::new(NoiseTexture::new(4.0, rng))));

    let mut objects = HittableList::new();
    objects.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        marble.clone(),
    )));
    objects.add(Arc::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 2.0, marble)));
    objects
}

fn earth(map: ImageTexture) -> HittableList {
    let surface = Arc::new(Lambertian::new(Arc::new(map)));
    let mut objects = HittableList::new();
    objects.add(Arc::new(Sphere::new(Vec3::ZERO, 2.0, surface)));
    objects
}

fn simple_light(rng: &mut dyn RngCore) -> HittableList {
    let mut objects = HittableList::new();

    let marble: Arc<dyn Material> =
        Arc::new(Lambertian::new(Arc::new(NoiseTexture::new(4.0, rng))));
    objects.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        marble.clone(),
    )));
    objects.add(Arc::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 2.0, marble)));

    let light = Arc::new(DiffuseLight::from_color(Color::splat(4.0)));
    objects.add(Arc::new(AaRect::xy(3.0, 5.0, 1.0, 3.0, -2.0, light)));

    objects
}

/// Walls, ceiling light and the two white blocks of the Cornell box.
/// Blocks are returned separately so the smoke variant can fill them.
fn cornell_shell(light_rect: [f32; 4], light_power: f32) -> (HittableList, [Arc<dyn Hittable>; 2]) {
    let red: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.73, 0.73, 0.73)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.12, 0.45, 0.15)));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::splat(light_power)));

    let mut objects = HittableList::new();
    let [x0, x1, z0, z1] = light_rect;
    objects.add(Arc::new(AaRect::yz(0.0, 555.0, 0.0, 555.0, 555.0, green)));
    objects.add(Arc::new(AaRect::yz(0.0, 555.0, 0.0, 555.0, 0.0, red)));
    objects.add(Arc::new(AaRect::xz(x0, x1, z0, z1, 554.0, light)));
    objects.add(Arc::new(AaRect::xz(0.0, 555.0, 0.0, 555.0, 0.0, white.clone())));
    objects.add(Arc::new(AaRect::xz(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())));
    objects.add(Arc::new(AaRect::xy(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())));

    let block = |size: Vec3, degrees: f32, offset: Vec3| -> Arc<dyn Hittable> {
        let cuboid: Arc<dyn Hittable> = Arc::new(Cuboid::new(Vec3::ZERO, size, white.clone()));
        let rotated: Arc<dyn Hittable> = Arc::new(RotateY::new(cuboid, degrees));
        Arc::new(Translate::new(rotated, offset))
    };
    let tall = block(Vec3::new(165.0, 330.0, 165.0), 15.0, Vec3::new(265.0, 0.0, 295.0));
    let short = block(Vec3::new(165.0, 165.0, 165.0), -18.0, Vec3::new(130.0, 0.0, 65.0));

    (objects, [tall, short])
}

fn cornell_box() -> HittableList {
    let (mut objects, blocks) = cornell_shell([213.0, 343.0, 227.0, 332.0], 15.0);
    objects.extend(blocks);
    objects
}

fn cornell_smoke() -> HittableList {
    let (mut objects, [tall, short]) = cornell_shell([113.0, 443.0, 127.0, 432.0], 7.0);
    objects.add(Arc::new(ConstantMedium::new(tall, 0.01, Color::ZERO)));
    objects.add(Arc::new(ConstantMedium::new(short, 0.01, Color::ONE)));
    objects
}

fn final_scene(rng: &mut dyn RngCore, map: ImageTexture) -> HittableList {
    let mut objects = HittableList::new();

    // Floor of boxes with random heights
    let ground: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.48, 0.83, 0.53)));
    let boxes_per_side = 20;
    let w = 100.0;
    let mut floor: Vec<Arc<dyn Hittable>> = Vec::with_capacity(boxes_per_side * boxes_per_side);
    for i in 0..boxes_per_side {
        for j in 0..boxes_per_side {
            let x0 = -1000.0 + i as f32 * w;
            let z0 = -1000.0 + j as f32 * w;
            let y1 = gen_range(rng, 1.0, 101.0);
            floor.push(Arc::new(Cuboid::new(
                Vec3::new(x0, 0.0, z0),
                Vec3::new(x0 + w, y1, z0 + w),
                ground.clone(),
            )));
        }
    }
    objects.add(Arc::new(BvhNode::new(floor, 0.0, 1.0)));

    let light = Arc::new(DiffuseLight::from_color(Color::splat(7.0)));
    objects.add(Arc::new(AaRect::xz(123.0, 423.0, 147.0, 412.0, 554.0, light)));

    let center0 = Vec3::new(400.0, 400.0, 200.0);
    objects.add(Arc::new(MovingSphere::new(
        (center0, 0.0),
        (center0 + Vec3::new(30.0, 0.0, 0.0), 1.0),
        50.0,
        Arc::new(Lambertian::from_color(Color::new(0.7, 0.3, 0.1))),
    )));
    objects.add(Arc::new(Sphere::new(
        Vec3::new(260.0, 150.0, 45.0),
        50.0,
        Arc::new(Dielectric::new(1.5)),
    )));
    objects.add(Arc::new(Sphere::new(
        Vec3::new(0.0, 150.0, 145.0),
        50.0,
        Arc::new(Metal::new(Color::new(0.8, 0.8, 0.9), 1.0)),
    )));

    // Glass ball filled with blue fog, and thin mist over the whole scene
    let boundary: Arc<dyn Hittable> = Arc::new(Sphere::new(
        Vec3::new(360.0, 150.0, 145.0),
        70.0,
        Arc::new(Dielectric::new(1.5)),
    ));
    objects.add(boundary.clone());
    objects.add(Arc::new(ConstantMedium::new(boundary, 0.2, Color::new(0.2, 0.4, 0.9))));
    let mist: Arc<dyn Hittable> = Arc::new(Sphere::new(
        Vec3::ZERO,
        5000.0,
        Arc::new(Dielectric::new(1.5)),
    ));
    objects.add(Arc::new(ConstantMedium::new(mist, 0.0001, Color::ONE)));

    objects.add(Arc::new(Sphere::new(
        Vec3::new(400.0, 200.0, 400.0),
        100.0,
        Arc::new(Lambertian::new(Arc::new(map))),
    )));
    objects.add(Arc::new(Sphere::new(
        Vec3::new(220.0, 280.0, 300.0),
        80.0,
        Arc::new(Lambertian::new(Arc::new(NoiseTexture::new(0.1, rng)))),
    )));

    // Cluster of small white spheres, turned and moved as one
    let white: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::splat(0.73)));
    let cluster: Vec<Arc<dyn Hittable>> = (0..1000)
        .map(|_| -> Arc<dyn Hittable> {
            Arc::new(Sphere::new(random_vec3(rng, 0.0, 165.0), 10.0, white.clone()))
        })
        .collect();
    let cluster: Arc<dyn Hittable> = Arc::new(BvhNode::new(cluster, 0.0, 1.0));
    let cluster: Arc<dyn Hittable> = Arc::new(RotateY::new(cluster, 15.0));
    objects.add(Arc::new(Translate::new(cluster, Vec3::new(-100.0, 270.0, 395.0))));

    objects
}
