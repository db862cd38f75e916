use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::SeedableRng;

use raytile_core::SceneDescription;
use raytile_renderer::{build_job, render, render_sequential, Preset, ProgressSink, RenderJob};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Tile-parallel path tracer
#[derive(Parser, Debug)]
#[command(name = "raytile", version, about)]
#[command(group(ArgGroup::new("input").required(true).args(["scene", "preset"])))]
struct Args {
    /// JSON scene description
    scene: Option<PathBuf>,

    /// Render a built-in scene instead of a file
    /// (random-spheres, two-spheres, two-perlin-spheres, earth, simple-light,
    /// cornell-box, cornell-smoke, final-scene)
    #[arg(long)]
    preset: Option<Preset>,

    /// Output image; the format follows the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads, one column tile each; 0 renders on the main thread
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Samples per pixel
    #[arg(short, long)]
    samples: Option<u32>,

    /// Maximum bounces per path
    #[arg(long)]
    max_depth: Option<u32>,

    /// Fixed seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

impl Args {
    /// Build the job from the scene file or preset, then apply overrides.
    fn job(&self) -> Result<RenderJob> {
        let mut job = match (&self.scene, self.preset) {
            (Some(path), _) => {
                let desc = SceneDescription::load(path)
                    .with_context(|| format!("Failed to load scene {}", path.display()))?;
                build_job(&desc)
            }
            (None, Some(preset)) => {
                log::info!("Building preset {}", preset);
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                preset.build(&mut rng)
            }
            (None, None) => anyhow::bail!("Either a scene file or --preset is required"),
        };

        if let Some(output) = &self.output {
            job.output = output.clone();
        }
        if let Some(threads) = self.threads {
            job.config.threads = threads;
        }
        if let Some(samples) = self.samples {
            job.config.samples_per_pixel = samples;
        }
        if let Some(max_depth) = self.max_depth {
            job.config.max_depth = max_depth;
        }
        if self.seed.is_some() {
            job.config.seed = self.seed;
        }

        Ok(job)
    }
}

/// Tiles-remaining bar on stderr.
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} tiles")
        {
            bar.set_style(style);
        }
        Self(bar)
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, remaining: usize, total: usize) {
        self.0.set_length(total as u64);
        self.0.set_position(total.saturating_sub(remaining) as u64);
    }

    fn finish(&self) {
        self.0.finish();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();

    let job = args.job()?;
    let mut framebuffer = job.framebuffer();
    let progress = BarProgress::new();

    let stats = if job.config.threads == 0 {
        render_sequential(&job.scene, &job.camera, &job.config, &mut framebuffer, &progress)
    } else {
        render(&job.scene, &job.camera, &job.config, &mut framebuffer, &progress)
    }
    .context("Render failed")?;

    framebuffer
        .save(&job.output)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;

    println!(
        "Wrote {} ({}x{}, {} tiles, {:.2}s)",
        job.output.display(),
        job.width,
        job.height,
        stats.tiles,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_requires_scene_or_preset() {
        assert!(Args::try_parse_from(["raytile"]).is_err());
        assert!(Args::try_parse_from(["raytile", "scene.json", "--preset", "cornell-box"]).is_err());
        assert!(Args::try_parse_from(["raytile", "--preset", "teapot"]).is_err());
    }

    #[test]
    fn test_preset_overrides() {
        let args = Args::try_parse_from([
            "raytile",
            "--preset",
            "cornell-box",
            "--threads",
            "3",
            "--samples",
            "2",
            "--max-depth",
            "4",
            "--seed",
            "9",
            "-o",
            "box.png",
        ])
        .unwrap();
        assert_eq!(args.preset, Some(Preset::CornellBox));

        let job = args.job().unwrap();
        assert_eq!(job.config.threads, 3);
        assert_eq!(job.config.samples_per_pixel, 2);
        assert_eq!(job.config.max_depth, 4);
        assert_eq!(job.config.seed, Some(9));
        assert_eq!(job.output, PathBuf::from("box.png"));
    }

    #[test]
    fn test_missing_scene_file_is_an_error() {
        let args = Args::try_parse_from(["raytile", "/nonexistent/scene.json"]).unwrap();
        assert!(args.job().is_err());
    }
}
