//! Gradient (Perlin) noise.

use rand::seq::SliceRandom;
use rand::RngCore;
use raytile_math::Vec3;

use crate::sampling::random_unit_vector;

const POINT_COUNT: usize = 256;

/// Lattice of random gradients with three independent permutation tables.
#[derive(Clone)]
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let gradients = (0..POINT_COUNT).map(|_| random_unit_vector(rng)).collect();

        Self {
            gradients,
            perm_x: Self::generate_perm(rng),
            perm_y: Self::generate_perm(rng),
            perm_z: Self::generate_perm(rng),
        }
    }

    fn generate_perm(rng: &mut dyn RngCore) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
        perm.shuffle(rng);
        perm
    }

    /// Smooth noise in roughly [-1, 1].
    pub fn noise(&self, p: Vec3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;
        let (i, j, k) = (floor.x as i32, floor.y as i32, floor.z as i32);

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    let idx = self.perm_x[wrap(i + di as i32)]
                        ^ self.perm_y[wrap(j + dj as i32)]
                        ^ self.perm_z[wrap(k + dk as i32)];
                    *cell = self.gradients[idx];
                }
            }
        }

        trilinear(&c, frac)
    }

    /// Sum of `depth` octaves of noise, each at double frequency and half weight.
    pub fn turbulence(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

#[inline]
fn wrap(i: i32) -> usize {
    (i & (POINT_COUNT as i32 - 1)) as usize
}

fn trilinear(c: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    // Hermite smoothing
    let s = frac * frac * (Vec3::splat(3.0) - 2.0 * frac);
    let mut accum = 0.0;

    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight = Vec3::new(frac.x - fi, frac.y - fj, frac.z - fk);
                accum += (fi * s.x + (1.0 - fi) * (1.0 - s.x))
                    * (fj * s.y + (1.0 - fj) * (1.0 - s.y))
                    * (fk * s.z + (1.0 - fk) * (1.0 - s.z))
                    * gradient.dot(weight);
            }
        }
    }

    accum
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_noise_is_zero_on_lattice_points() {
        let perlin = Perlin::new(&mut StdRng::seed_from_u64(1));
        for p in [Vec3::ZERO, Vec3::new(3.0, -2.0, 7.0), Vec3::splat(-300.0)] {
            assert!(perlin.noise(p).abs() < 1e-5);
        }
    }

    #[test]
    fn test_noise_is_bounded_and_varies() {
        let perlin = Perlin::new(&mut StdRng::seed_from_u64(2));
        let samples: Vec<f32> = (0..500)
            .map(|i| perlin.noise(Vec3::new(i as f32 * 0.37, i as f32 * 0.11, 0.5)))
            .collect();

        assert!(samples.iter().all(|n| n.abs() <= 1.5));
        assert!(samples.iter().any(|n| n.abs() > 0.05));
    }

    #[test]
    fn test_turbulence_is_non_negative() {
        let perlin = Perlin::new(&mut StdRng::seed_from_u64(3));
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.7, -(i as f32) * 0.3, 1.3);
            assert!(perlin.turbulence(p, 7) >= 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_lattice() {
        let a = Perlin::new(&mut StdRng::seed_from_u64(9));
        let b = Perlin::new(&mut StdRng::seed_from_u64(9));
        let p = Vec3::new(1.25, 2.5, -0.75);
        assert_eq!(a.noise(p), b.noise(p));
    }
}
