//! Unidirectional path tracing.

use rand::RngCore;
use raytile_math::Interval;

use crate::material::Color;
use crate::{Ray, Scene};

/// Lower bound on hit distances, so a scattered ray does not immediately
/// re-hit the surface it left.
pub const T_MIN: f32 = 0.001;

/// Estimate the radiance arriving along `ray`.
///
/// Follows at most `max_depth` surface interactions. A path that runs out of
/// depth contributes black, a path that escapes the scene picks up
/// `background`. There is no light sampling or Russian roulette: emission is
/// only collected where a path happens to hit an emitter.
///
/// Equivalent to `emitted + attenuation * estimate(scattered, depth - 1)`,
/// unrolled into a loop carrying the product of attenuations.
pub fn estimate_radiance(
    ray: &Ray,
    background: Color,
    scene: &Scene,
    max_depth: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..max_depth {
        let Some(rec) = scene.nearest_hit(&ray, Interval::new(T_MIN, f32::INFINITY), rng) else {
            return radiance + throughput * background;
        };

        radiance += throughput * rec.material.emitted(rec.u, rec.v, rec.p);

        match rec.material.scatter(&ray, &rec, rng) {
            Some(scatter) => {
                throughput *= scatter.attenuation;
                ray = scatter.scattered;
            }
            None => return radiance,
        }
    }

    radiance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AaRect, DiffuseLight, Hittable, Lambertian, Material, Metal, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use raytile_math::Vec3;
    use std::sync::Arc;

    fn scene_of(objects: Vec<Arc<dyn Hittable>>) -> Scene {
        Scene::new(objects, 0.0, 1.0)
    }

    fn toward_origin() -> Ray {
        Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = scene_of(vec![Arc::new(Sphere::new(
            Vec3::new(100.0, 0.0, 0.0),
            1.0,
            Arc::new(Lambertian::from_color(Vec3::ONE)),
        ))]);
        let background = Color::new(0.7, 0.8, 1.0);
        let mut rng = StdRng::seed_from_u64(0);

        for depth in [1, 5, 50] {
            let c = estimate_radiance(&toward_origin(), background, &scene, depth, &mut rng);
            assert_eq!(c, background);
        }
    }

    #[test]
    fn test_zero_depth_is_black() {
        let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::splat(4.0)));
        let scene = scene_of(vec![Arc::new(Sphere::new(Vec3::ZERO, 1.0, light))]);
        let mut rng = StdRng::seed_from_u64(0);

        let hit = estimate_radiance(&toward_origin(), Color::ONE, &scene, 0, &mut rng);
        let miss = estimate_radiance(
            &Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::Z),
            Color::ONE,
            &scene,
            0,
            &mut rng,
        );
        assert_eq!(hit, Color::ZERO);
        assert_eq!(miss, Color::ZERO);
    }

    #[test]
    fn test_emitter_returns_emission_at_any_depth() {
        let emit = Color::new(3.0, 2.0, 1.0);
        let scene = scene_of(vec![Arc::new(AaRect::xy(
            -1.0,
            1.0,
            -1.0,
            1.0,
            0.0,
            Arc::new(DiffuseLight::from_color(emit)),
        ))]);
        let mut rng = StdRng::seed_from_u64(0);

        for depth in [1, 2, 50] {
            let c = estimate_radiance(&toward_origin(), Color::splat(9.0), &scene, depth, &mut rng);
            assert_eq!(c, emit);
        }
    }

    #[test]
    fn test_mirror_attenuates_background() {
        // Perfect mirror facing the camera sends the ray straight back out
        let scene = scene_of(vec![Arc::new(AaRect::xy(
            -1.0,
            1.0,
            -1.0,
            1.0,
            0.0,
            Arc::new(Metal::new(Color::splat(0.5), 0.0)),
        ))]);
        let mut rng = StdRng::seed_from_u64(0);
        let background = Color::new(0.2, 0.4, 0.8);

        let c = estimate_radiance(&toward_origin(), background, &scene, 10, &mut rng);
        assert!((c - background * 0.5).length() < 1e-6);

        // One bounce allowed: the reflected ray has no depth left
        let c = estimate_radiance(&toward_origin(), background, &scene, 1, &mut rng);
        assert_eq!(c, Color::ZERO);
    }
}
