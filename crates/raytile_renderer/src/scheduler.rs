//! Tile-parallel rendering.
//!
//! The image is cut into vertical column tiles, one OS thread per tile, plus
//! one thread that reports how many tiles are left. Each worker owns the
//! byte ranges of its columns in every row, so framebuffer writes need no
//! locking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;

use crate::framebuffer::{quantize, Framebuffer};
use crate::integrator::estimate_radiance;
use crate::material::Color;
use crate::sampling::gen_f32;
use crate::{Camera, Scene};

/// How often the progress thread looks at the tile counter.
const PROGRESS_POLL: Duration = Duration::from_millis(50);

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Background color when ray doesn't hit anything
    pub background: Color,
    /// Worker threads, one column tile each
    pub threads: usize,
    /// Base seed for the per-tile generators; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 50,
            background: Color::ZERO,
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
            seed: None,
        }
    }
}

/// Errors that abort a render before any pixel is written.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Thread count must be at least 1")]
    InvalidThreadCount,

    #[error("Image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Samples per pixel must be at least 1")]
    NoSamples,

    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("A render thread panicked")]
    WorkerPanicked,
}

/// Summary of a finished render.
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    pub tiles: usize,
    /// Camera rays traced
    pub samples: u64,
    pub elapsed: Duration,
}

/// A vertical strip of columns `[x0, x1)` spanning the full image height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub index: usize,
    pub x0: u32,
    pub x1: u32,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }
}

/// Split `[0, width)` into `count` column tiles. Every tile is
/// `width / count` wide except the last, which also takes the remainder.
///
/// `count` must be in `1..=width`.
pub fn partition_columns(width: u32, count: usize) -> Vec<Tile> {
    let count = count.max(1) as u32;
    let base = width / count;

    (0..count)
        .map(|i| Tile {
            index: i as usize,
            x0: i * base,
            x1: if i + 1 == count { width } else { (i + 1) * base },
        })
        .collect()
}

/// Receives the tiles-remaining count while a render runs.
pub trait ProgressSink: Send + Sync {
    /// Called whenever the remaining count changes, starting with `total`.
    fn update(&self, remaining: usize, total: usize);

    /// Called once, after every tile is done.
    fn finish(&self) {}
}

/// Reports progress through the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, remaining: usize, total: usize) {
        log::info!("Tiles remaining: {}/{}", remaining, total);
    }
}

/// Shared read-only inputs of every tile.
struct TileContext<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    config: &'a RenderConfig,
    width: u32,
    height: u32,
}

/// Decrements the tiles-remaining counter when a worker ends, including by
/// panic, so the progress thread always terminates.
struct TileDone<'a>(&'a AtomicUsize);

impl Drop for TileDone<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Render `scene` into `framebuffer` on `config.threads` worker threads.
///
/// Blocks until every worker and the progress thread have joined. With a
/// fixed `config.seed` and thread count the output is bit-identical across
/// runs.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    framebuffer: &mut Framebuffer,
    progress: &dyn ProgressSink,
) -> Result<RenderStats, RenderError> {
    if config.threads == 0 {
        return Err(RenderError::InvalidThreadCount);
    }
    let (width, height) = validate(config, framebuffer)?;

    let threads = if config.threads > width as usize {
        log::warn!(
            "{} threads requested for a {} pixel wide image; using {}",
            config.threads,
            width,
            width
        );
        width as usize
    } else {
        config.threads
    };

    let tiles = partition_columns(width, threads);
    let total = tiles.len();
    log::info!(
        "Rendering {}x{} at {} spp, depth {}, on {} tiles",
        width,
        height,
        config.samples_per_pixel,
        config.max_depth,
        total
    );

    let ctx = TileContext {
        scene,
        camera,
        config,
        width,
        height,
    };
    let start = Instant::now();
    let segments = carve_rows(framebuffer, &tiles);

    let remaining = AtomicUsize::new(total);

    thread::scope(|s| -> Result<(), RenderError> {
        let remaining = &remaining;
        let ctx = &ctx;

        let watcher = thread::Builder::new()
            .name("progress".to_string())
            .spawn_scoped(s, move || watch_progress(remaining, total, progress))?;

        let mut workers = Vec::with_capacity(total);
        let mut spawn_error = None;

        for (tile, mut rows) in tiles.iter().copied().zip(segments) {
            if spawn_error.is_some() {
                remaining.fetch_sub(1, Ordering::SeqCst);
                continue;
            }

            let spawned = thread::Builder::new()
                .name(format!("tile-{}", tile.index))
                .spawn_scoped(s, move || {
                    let _done = TileDone(remaining);
                    let mut rng = tile_rng(ctx.config.seed, tile.index);
                    render_tile(ctx, tile, &mut rows, &mut rng);
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::error!("Could not spawn thread for tile {}: {}", tile.index, e);
                    remaining.fetch_sub(1, Ordering::SeqCst);
                    spawn_error = Some(e);
                }
            }
        }

        let mut panicked = false;
        for worker in workers {
            panicked |= worker.join().is_err();
        }
        panicked |= watcher.join().is_err();

        if let Some(e) = spawn_error {
            return Err(RenderError::Spawn(e));
        }
        if panicked {
            return Err(RenderError::WorkerPanicked);
        }
        Ok(())
    })?;

    Ok(finish_stats(total, width, height, config, start))
}

/// Render on the calling thread as a single tile.
pub fn render_sequential(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    framebuffer: &mut Framebuffer,
    progress: &dyn ProgressSink,
) -> Result<RenderStats, RenderError> {
    let (width, height) = validate(config, framebuffer)?;
    log::info!(
        "Rendering {}x{} at {} spp, depth {}, single-threaded",
        width,
        height,
        config.samples_per_pixel,
        config.max_depth
    );

    let ctx = TileContext {
        scene,
        camera,
        config,
        width,
        height,
    };
    let tile = Tile {
        index: 0,
        x0: 0,
        x1: width,
    };
    let start = Instant::now();

    progress.update(1, 1);
    let mut rows: Vec<&mut [u8]> = framebuffer
        .as_bytes_mut()
        .chunks_exact_mut(width as usize * 3)
        .collect();
    let mut rng = tile_rng(config.seed, 0);
    render_tile(&ctx, tile, &mut rows, &mut rng);
    progress.update(0, 1);
    progress.finish();

    Ok(finish_stats(1, width, height, config, start))
}

fn validate(config: &RenderConfig, framebuffer: &Framebuffer) -> Result<(u32, u32), RenderError> {
    let (width, height) = (framebuffer.width(), framebuffer.height());
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyImage { width, height });
    }
    if config.samples_per_pixel == 0 {
        return Err(RenderError::NoSamples);
    }
    Ok((width, height))
}

fn finish_stats(
    tiles: usize,
    width: u32,
    height: u32,
    config: &RenderConfig,
    start: Instant,
) -> RenderStats {
    let stats = RenderStats {
        tiles,
        samples: width as u64 * height as u64 * config.samples_per_pixel as u64,
        elapsed: start.elapsed(),
    };
    log::info!(
        "Render finished in {:.2}s ({} camera rays)",
        stats.elapsed.as_secs_f64(),
        stats.samples
    );
    stats
}

/// Split every row of `framebuffer` into per-tile byte segments. Entry `k`
/// holds tile `k`'s segment of each row, bottom row first.
fn carve_rows<'a>(framebuffer: &'a mut Framebuffer, tiles: &[Tile]) -> Vec<Vec<&'a mut [u8]>> {
    let stride = framebuffer.stride();
    let height = framebuffer.height() as usize;

    let mut segments: Vec<Vec<&mut [u8]>> = tiles
        .iter()
        .map(|_| Vec::with_capacity(height))
        .collect();
    for row in framebuffer.as_bytes_mut().chunks_exact_mut(stride) {
        let mut rest = row;
        for (tile, rows) in tiles.iter().zip(segments.iter_mut()) {
            let (segment, tail) = std::mem::take(&mut rest).split_at_mut(tile.width() as usize * 3);
            rows.push(segment);
            rest = tail;
        }
    }
    segments
}

fn tile_rng(seed: Option<u64>, tile_index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(tile_index as u64)),
        None => StdRng::from_entropy(),
    }
}

fn watch_progress(remaining: &AtomicUsize, total: usize, sink: &dyn ProgressSink) {
    sink.update(total, total);

    let mut last = total;
    while last > 0 {
        thread::sleep(PROGRESS_POLL);
        let now = remaining.load(Ordering::SeqCst);
        if now != last {
            sink.update(now, total);
            last = now;
        }
    }
    sink.finish();
}

/// Trace every sample of every pixel in `tile`. `rows[j]` holds the tile's
/// bytes of row `j`, counted from the bottom.
fn render_tile(ctx: &TileContext, tile: Tile, rows: &mut [&mut [u8]], rng: &mut dyn RngCore) {
    let spp = ctx.config.samples_per_pixel;
    // A one-pixel axis would divide by zero
    let u_denom = ctx.width.saturating_sub(1).max(1) as f32;
    let v_denom = ctx.height.saturating_sub(1).max(1) as f32;

    for (j, row) in rows.iter_mut().enumerate() {
        for (dx, pixel) in row.chunks_exact_mut(3).enumerate() {
            let i = tile.x0 + dx as u32;
            let mut sum = Color::ZERO;

            for _ in 0..spp {
                let u = (i as f32 + gen_f32(rng)) / u_denom;
                let v = (j as f32 + gen_f32(rng)) / v_denom;
                let ray = ctx.camera.get_ray(u, v, rng);
                sum += estimate_radiance(
                    &ray,
                    ctx.config.background,
                    ctx.scene,
                    ctx.config.max_depth,
                    rng,
                );
            }

            pixel.copy_from_slice(&quantize(sum, spp));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::T_MIN;
    use crate::{AaRect, DiffuseLight, Hittable, Lambertian, Sphere};
    use raytile_math::{Interval, Vec3};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<usize>>,
        finished: AtomicUsize,
    }

    impl ProgressSink for Recorder {
        fn update(&self, remaining: usize, _total: usize) {
            self.updates.lock().unwrap().push(remaining);
        }

        fn finish(&self) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(threads: usize, samples: u32, seed: Option<u64>) -> RenderConfig {
        RenderConfig {
            samples_per_pixel: samples,
            max_depth: 10,
            background: Color::ZERO,
            threads,
            seed,
        }
    }

    fn look_down_z(aspect: f32) -> Camera {
        Camera::new()
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(60.0, 0.0, 1.0)
            .with_aspect_ratio(aspect)
            .build()
    }

    /// A diffuse sphere in front of a large area light.
    fn backlit_sphere() -> Scene {
        let objects: Vec<Arc<dyn Hittable>> = vec![
            Arc::new(Sphere::new(
                Vec3::new(0.0, 0.0, -3.0),
                1.0,
                Arc::new(Lambertian::from_color(Vec3::splat(0.7))),
            )),
            Arc::new(AaRect::xy(
                -10.0,
                10.0,
                -10.0,
                10.0,
                -6.0,
                Arc::new(DiffuseLight::from_color(Vec3::splat(1.0))),
            )),
        ];
        Scene::new(objects, 0.0, 0.0)
    }

    #[test]
    fn test_partition_covers_width_exactly_once() {
        for width in 1..=64u32 {
            for count in 1..=width as usize {
                let tiles = partition_columns(width, count);
                assert_eq!(tiles.len(), count);
                assert_eq!(tiles[0].x0, 0);
                assert_eq!(tiles.last().unwrap().x1, width);
                for pair in tiles.windows(2) {
                    assert_eq!(pair[0].x1, pair[1].x0);
                }
                assert!(tiles.iter().all(|t| t.width() >= 1));
            }
        }
    }

    #[test]
    fn test_last_tile_takes_remainder() {
        let tiles = partition_columns(10, 3);
        let widths: Vec<u32> = tiles.iter().map(Tile::width).collect();
        assert_eq!(widths, vec![3, 3, 4]);
    }

    #[test]
    fn test_tile_byte_ranges_are_disjoint() {
        let (width, height) = (13u32, 4u32);
        let tiles = partition_columns(width, 5);
        let fb = Framebuffer::new(width, height);

        let mut seen = HashSet::new();
        for tile in &tiles {
            for row in 0..height {
                for x in tile.x0..tile.x1 {
                    let base = fb.offset(x, row);
                    for byte in base..base + 3 {
                        assert!(seen.insert(byte), "byte {byte} written twice");
                    }
                }
            }
        }
        assert_eq!(seen.len(), fb.as_bytes().len());
    }

    #[test]
    fn test_carved_segments_match_tiles() {
        let (width, height) = (13u32, 4u32);
        let tiles = partition_columns(width, 5);
        let mut fb = Framebuffer::new(width, height);

        {
            let segments = carve_rows(&mut fb, &tiles);
            assert_eq!(segments.len(), tiles.len());
            for (tile, rows) in tiles.iter().zip(segments) {
                assert_eq!(rows.len(), height as usize);
                for (row, segment) in rows.into_iter().enumerate() {
                    assert_eq!(segment.len(), tile.width() as usize * 3);
                    // Stamp every pixel with its tile, row and column
                    for (dx, pixel) in segment.chunks_exact_mut(3).enumerate() {
                        pixel.copy_from_slice(&[tile.index as u8 + 1, row as u8, tile.x0 as u8 + dx as u8]);
                    }
                }
            }
        }

        for tile in &tiles {
            for row in 0..height {
                for x in tile.x0..tile.x1 {
                    assert_eq!(fb.pixel(x, row), [tile.index as u8 + 1, row as u8, x as u8]);
                }
            }
        }
    }

    #[test]
    fn test_zero_threads_rejected() {
        let scene = backlit_sphere();
        let mut fb = Framebuffer::new(4, 4);
        let result = render(&scene, &look_down_z(1.0), &config(0, 1, Some(1)), &mut fb, &LogProgress);
        assert!(matches!(result, Err(RenderError::InvalidThreadCount)));
    }

    #[test]
    fn test_empty_image_rejected() {
        let scene = backlit_sphere();
        let mut fb = Framebuffer::new(0, 4);
        let result = render(&scene, &look_down_z(1.0), &config(2, 1, Some(1)), &mut fb, &LogProgress);
        assert!(matches!(result, Err(RenderError::EmptyImage { .. })));

        let mut fb = Framebuffer::new(4, 4);
        let result = render(&scene, &look_down_z(1.0), &config(2, 0, Some(1)), &mut fb, &LogProgress);
        assert!(matches!(result, Err(RenderError::NoSamples)));
    }

    #[test]
    fn test_progress_counts_down_to_zero() {
        let scene = backlit_sphere();
        let mut fb = Framebuffer::new(8, 4);
        let recorder = Recorder::default();

        let stats = render(&scene, &look_down_z(2.0), &config(4, 2, Some(3)), &mut fb, &recorder).unwrap();

        let updates = recorder.updates.lock().unwrap().clone();
        assert_eq!(updates.first(), Some(&4));
        assert_eq!(updates.last(), Some(&0));
        assert!(updates.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(recorder.finished.load(Ordering::SeqCst), 1);
        assert_eq!(stats.tiles, 4);
        assert_eq!(stats.samples, 8 * 4 * 2);
    }

    #[test]
    fn test_more_threads_than_columns_is_clamped() {
        let scene = backlit_sphere();
        let mut fb = Framebuffer::new(3, 2);
        let stats = render(&scene, &look_down_z(1.5), &config(16, 1, Some(5)), &mut fb, &LogProgress).unwrap();
        assert_eq!(stats.tiles, 3);
    }

    #[test]
    fn test_same_seed_same_image() {
        let scene = backlit_sphere();
        let camera = look_down_z(1.0);
        let cfg = config(3, 8, Some(42));

        let mut a = Framebuffer::new(12, 12);
        let mut b = Framebuffer::new(12, 12);
        render(&scene, &camera, &cfg, &mut a, &LogProgress).unwrap();
        render(&scene, &camera, &cfg, &mut b, &LogProgress).unwrap();

        assert_eq!(a, b);
        assert!(a.as_bytes().iter().any(|&byte| byte > 0));
    }

    #[test]
    fn test_single_pixel_image() {
        let scene = backlit_sphere();
        let mut fb = Framebuffer::new(1, 1);
        render(&scene, &look_down_z(1.0), &config(1, 4, Some(9)), &mut fb, &LogProgress).unwrap();
        render_sequential(&scene, &look_down_z(1.0), &config(0, 4, Some(9)), &mut fb, &LogProgress)
            .unwrap();
    }

    #[test]
    fn test_sequential_matches_one_thread() {
        let scene = backlit_sphere();
        let camera = look_down_z(1.0);

        let mut threaded = Framebuffer::new(6, 5);
        let mut sequential = Framebuffer::new(6, 5);
        render(&scene, &camera, &config(1, 4, Some(8)), &mut threaded, &LogProgress).unwrap();
        render_sequential(&scene, &camera, &config(1, 4, Some(8)), &mut sequential, &LogProgress)
            .unwrap();

        assert_eq!(threaded, sequential);
    }

    /// Normal where the ray through viewport point `(u, v)` first meets the
    /// sphere of [`backlit_sphere`], if it meets the sphere before anything else.
    fn sphere_normal(scene: &Scene, camera: &Camera, u: f32, v: f32) -> Option<Vec3> {
        let mut rng = StdRng::seed_from_u64(0);
        let ray = camera.get_ray(u, v, &mut rng);
        scene
            .nearest_hit(&ray, Interval::new(T_MIN, f32::INFINITY), &mut rng)
            .filter(|rec| rec.p.z > -4.5)
            .map(|rec| rec.normal)
    }

    #[test]
    fn test_silhouette_brighter_than_center() {
        let _ = env_logger::builder().is_test(true).try_init();

        let scene = backlit_sphere();
        let camera = look_down_z(1.0);
        let size = 16u32;
        let mut fb = Framebuffer::new(size, size);
        render(&scene, &camera, &config(4, 256, Some(7)), &mut fb, &LogProgress).unwrap();

        // Viewport coordinates match the sample mapping: pixel i covers
        // [i, i + 1] / (size - 1)
        let denom = (size - 1) as f32;
        let (mut inner, mut rim) = (Vec::new(), Vec::new());
        for row in 0..size {
            for x in 0..size {
                let (u0, v0) = (x as f32 / denom, row as f32 / denom);
                let (u1, v1) = ((x + 1) as f32 / denom, (row + 1) as f32 / denom);
                let corners = [(u0, v0), (u1, v0), (u0, v1), (u1, v1)];
                // Only pixels whose whole footprint lies on the sphere
                if !corners
                    .iter()
                    .all(|&(u, v)| sphere_normal(&scene, &camera, u, v).is_some())
                {
                    continue;
                }
                let Some(normal) = sphere_normal(&scene, &camera, (u0 + u1) / 2.0, (v0 + v1) / 2.0)
                else {
                    continue;
                };

                let [r, g, b] = fb.pixel(x, row);
                let luma = (r as f32 + g as f32 + b as f32) / 3.0;
                if normal.z > 0.97 {
                    inner.push(luma);
                } else if normal.z < 0.8 {
                    rim.push(luma);
                }
            }
        }

        assert!(!inner.is_empty());
        assert!(rim.len() >= 8, "only {} rim pixels", rim.len());
        // Rim pixels never see the emitter directly
        assert!(rim.iter().all(|&luma| luma < 250.0));

        let mean = |values: &[f32]| values.iter().sum::<f32>() / values.len() as f32;
        assert!(
            mean(&rim) > mean(&inner) + 30.0,
            "rim {} vs inner {}",
            mean(&rim),
            mean(&inner)
        );
    }
}
