use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use serde::Serialize;
use terrascape_camera::Direction;
use terrascape_noise::raw_height;
use terrascape_scene::{RecordingBackend, Scene, SceneConfig};
use terrascape_terrain::lighting::shade_fragment;
use terrascape_terrain::{Biome, face_normal};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terrascape-cli", about = "Headless terrascape tooling")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective scene settings
    Info,
    /// Print the effective configuration as YAML
    DumpConfig,
    /// Sample the terrain height at one world-space point
    Sample {
        #[arg(short, long, allow_hyphen_values = true)]
        x: f32,
        #[arg(short, long, allow_hyphen_values = true)]
        z: f32,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Shade the terrain once and report its statistics
    Mesh {
        /// Terrain origin X (camera X)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: f32,
        /// Terrain origin Z (camera Z)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        z: f32,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render frames against a recording backend and print the command stream
    Frame {
        /// Number of frames to record
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Seconds of forward flight between frames
        #[arg(long, default_value = "0")]
        step: f32,
    },
}

#[derive(Serialize)]
struct SampleReport {
    x: f32,
    z: f32,
    raw: f32,
    height: f32,
    biome: &'static str,
    /// Lit surface colour with the configured light, terrain origin at zero.
    lit: [f32; 3],
}

#[derive(Serialize)]
struct MeshReport {
    triangles: usize,
    vertices: usize,
    min_height: f32,
    max_height: f32,
    biomes: Vec<(&'static str, usize)>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    let config = match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Edge length of the small triangle used to estimate the surface normal.
const NORMAL_STEP: f32 = 0.01;

fn sample(config: &SceneConfig, x: f32, z: f32) -> anyhow::Result<SampleReport> {
    let noise = config.noise.build()?;
    let light = config.light.build()?;
    let height = noise.sample(x, z);
    let biome = Biome::from_height(height);

    let at = |dx: f32, dz: f32| Vec3::new(x + dx, noise.sample(x + dx, z + dz), z + dz);
    let normal = face_normal([at(0.0, 0.0), at(0.0, NORMAL_STEP), at(NORMAL_STEP, 0.0)]);
    let lit = shade_fragment(
        normal,
        at(0.0, 0.0),
        biome.albedo(),
        light.position(),
        light.color().to_vec3(),
    );

    Ok(SampleReport {
        x,
        z,
        raw: raw_height(noise.seed(), x, z, &noise),
        height,
        biome: biome.label(),
        lit: lit.to_array(),
    })
}

fn mesh_report(config: &SceneConfig, origin: Vec2) -> anyhow::Result<MeshReport> {
    let mesh = config.terrain.build()?;
    let noise = config.noise.build()?;
    let heights = mesh.lattice_heights(&noise, origin);
    let min_height = heights.iter().copied().fold(f32::INFINITY, f32::min);
    let max_height = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let histogram = mesh.biome_histogram(&noise, origin);
    Ok(MeshReport {
        triangles: mesh.grid().triangle_count(),
        vertices: mesh.grid().vertex_count(),
        min_height,
        max_height,
        biomes: Biome::ALL
            .iter()
            .map(|b| (b.label(), histogram.get(*b)))
            .collect(),
    })
}

fn record_frames(config: &SceneConfig, frames: u32, step: f32) -> anyhow::Result<Vec<String>> {
    let mut backend = RecordingBackend::new();
    let mut scene = Scene::new(&mut backend, config)?;
    let mut camera = config.camera.build()?;
    camera.set_aspect_ratio(1280, 720);

    for frame in 0..frames {
        if frame > 0 && step > 0.0 {
            camera.move_in(Direction::Forward, step);
        }
        let stats = scene.render(&mut backend, &camera)?;
        tracing::debug!(frame, reshaded = stats.reshaded, "recorded frame");
    }

    Ok(backend.commands().iter().map(ToString::to_string).collect())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("terrascape-cli v{}", env!("CARGO_PKG_VERSION"));
            let t = &config.terrain;
            println!(
                "terrain: {}x{} subdivisions={} triangles={}",
                t.width,
                t.height,
                t.subdivisions,
                2 * t.subdivisions as u64 * t.subdivisions as u64
            );
            let n = &config.noise;
            println!(
                "noise: seed={} amplitude={} frequency={} gain={} lacunarity={} fudge={}",
                n.seed, n.amplitude, n.frequency, n.gain, n.lacunarity, n.fudge
            );
            let l = &config.light;
            println!(
                "light: position=({}, {}, {}) color=({}, {}, {})",
                l.position.x, l.position.y, l.position.z, l.color.r, l.color.g, l.color.b
            );
            let w = &config.water;
            println!("water: level={} opacity={}", w.level, w.opacity);
            let c = &config.camera;
            println!(
                "camera: position=({}, {}, {}) fov={} speed={} sensitivity={}",
                c.position.x, c.position.y, c.position.z, c.fov_degrees, c.speed, c.sensitivity
            );
        }
        Commands::DumpConfig => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Sample { x, z, json } => {
            let report = sample(&config, x, z)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "({}, {}): raw={:.6} height={:.6} biome={} lit=({:.3}, {:.3}, {:.3})",
                    report.x,
                    report.z,
                    report.raw,
                    report.height,
                    report.biome,
                    report.lit[0],
                    report.lit[1],
                    report.lit[2]
                );
            }
        }
        Commands::Mesh { x, z, json } => {
            let report = mesh_report(&config, Vec2::new(x, z))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "triangles={} vertices={}",
                    report.triangles, report.vertices
                );
                println!(
                    "height range: [{:.4}, {:.4}]",
                    report.min_height, report.max_height
                );
                for (label, count) in &report.biomes {
                    println!("  {label}: {count}");
                }
            }
        }
        Commands::Frame { frames, step } => {
            for line in record_frames(&config, frames, step)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.terrain.subdivisions = 4;
        config
    }

    #[test]
    fn sample_matches_noise_parameters() {
        let config = SceneConfig::default();
        let report = sample(&config, 1.5, -2.0).unwrap();
        let noise = config.noise.build().unwrap();
        assert_eq!(report.height, noise.sample(1.5, -2.0));
        assert_eq!(report.biome, Biome::from_height(report.height).label());
    }

    #[test]
    fn sample_lit_colour_is_at_least_ambient() {
        let config = SceneConfig::default();
        let report = sample(&config, 0.25, 0.75).unwrap();
        let albedo = Biome::from_height(report.height).albedo();
        for (lit, base) in report.lit.iter().zip(albedo.to_array()) {
            assert!(lit.is_finite());
            assert!(*lit >= 0.3 * base - 1e-6);
        }
    }

    #[test]
    fn mesh_report_counts_every_triangle() {
        let report = mesh_report(&small_config(), Vec2::ZERO).unwrap();
        assert_eq!(report.triangles, 32);
        assert_eq!(report.vertices, 96);
        let total: usize = report.biomes.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 32);
        assert!(report.min_height <= report.max_height);
    }

    #[test]
    fn frame_dry_run_draws_terrain_then_water() {
        let lines = record_frames(&small_config(), 2, 0.5).unwrap();
        assert_eq!(lines.iter().filter(|l| l.starts_with("begin frame")).count(), 2);
        assert_eq!(lines.iter().filter(|l| l.starts_with("update ")).count(), 2);
        let draws: Vec<_> = lines.iter().filter(|l| l.starts_with("draw ")).collect();
        assert_eq!(draws.len(), 4);
    }

    #[test]
    fn stationary_camera_reuses_terrain_upload() {
        let lines = record_frames(&small_config(), 3, 0.0).unwrap();
        assert_eq!(lines.iter().filter(|l| l.starts_with("update ")).count(), 1);
    }
}
