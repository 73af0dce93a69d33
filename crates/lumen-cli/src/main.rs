//! lumen CLI - render scenes with the path tracer.
//!
//! Loads a scene description (or the built-in demo), renders it on the
//! CPU or GPU backend and writes the result as PAM or PNG.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lumen_render::{pam, ComputeBackend, CpuBackend, Image, Renderer};
use lumen_scene::{Scene, SceneDescription};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Stochastic path tracer for spheres and planes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene to an image file
    Render {
        /// Scene description (.toml or .json); the demo scene if omitted
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Output file (format determined by extension: .pam, .png)
        #[arg(short, long, default_value = "render.pam")]
        output: PathBuf,
        /// Image width override
        #[arg(long)]
        width: Option<u32>,
        /// Image height override
        #[arg(long)]
        height: Option<u32>,
        /// Samples per pixel override
        #[arg(long)]
        samples: Option<u32>,
        /// Bounce depth override
        #[arg(long)]
        depth: Option<u32>,
        /// Where the workers run
        #[arg(long, value_enum, default_value_t = Backend::Cpu)]
        backend: Backend,
        /// CPU worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the built-in demo scene description
    Scene {
        /// Output syntax
        #[arg(long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },
    /// Display the header of a PAM image
    Info {
        /// Path to the .pam file
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Cpu,
    Gpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Toml,
    Json,
}

struct Overrides {
    width: Option<u32>,
    height: Option<u32>,
    samples: Option<u32>,
    depth: Option<u32>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LUMEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            scene,
            output,
            width,
            height,
            samples,
            depth,
            backend,
            threads,
        } => {
            let overrides = Overrides {
                width,
                height,
                samples,
                depth,
            };
            render(scene.as_deref(), &output, overrides, backend, threads)?;
        }
        Commands::Scene { format } => {
            let desc = SceneDescription::demo();
            let text = match format {
                Format::Toml => desc.to_toml()?,
                Format::Json => desc.to_json()?,
            };
            println!("{text}");
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
    }

    Ok(())
}

fn load_scene(path: Option<&Path>, overrides: &Overrides) -> Result<Scene> {
    let mut desc = match path {
        Some(path) => SceneDescription::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneDescription::demo(),
    };
    if let Some(width) = overrides.width {
        desc.render.width = width;
    }
    if let Some(height) = overrides.height {
        desc.render.height = height;
    }
    if let Some(samples) = overrides.samples {
        desc.render.samples_per_pixel = samples;
    }
    if let Some(depth) = overrides.depth {
        desc.render.max_depth = depth;
    }
    Ok(desc.build()?)
}

fn render(
    scene_path: Option<&Path>,
    output: &Path,
    overrides: Overrides,
    backend: Backend,
    threads: Option<usize>,
) -> Result<()> {
    // Fail on a bad extension before spending time rendering.
    output::OutputFormat::from_path(output)?;

    let start = Instant::now();
    let scene = load_scene(scene_path, &overrides)?;
    info!(
        spheres = scene.spheres.len(),
        planes = scene.planes.len(),
        width = scene.params.width,
        height = scene.params.height,
        samples = scene.params.samples_per_pixel,
        depth = scene.params.max_depth,
        backend = ?backend,
        "scene loaded"
    );

    let frame = match backend {
        Backend::Cpu => {
            let cpu = match threads {
                Some(n) => CpuBackend::with_threads(n)?,
                None => CpuBackend::new(),
            };
            render_with(cpu, &scene)?
        }
        Backend::Gpu => render_gpu(&scene)?,
    };

    output::save(&frame, output)?;
    info!(
        output = %output.display(),
        total_ms = start.elapsed().as_secs_f64() * 1e3,
        "image written"
    );
    Ok(())
}

#[cfg(feature = "gpu")]
fn render_gpu(scene: &Scene) -> Result<Image> {
    let gpu = lumen_render::GpuBackend::new()?;
    info!(adapter = gpu.adapter_name(), "using accelerator");
    render_with(gpu, scene)
}

#[cfg(not(feature = "gpu"))]
fn render_gpu(_scene: &Scene) -> Result<Image> {
    anyhow::bail!("GPU backend not enabled. Rebuild with --features gpu")
}

fn render_with<B: ComputeBackend>(backend: B, scene: &Scene) -> Result<Image> {
    let mut renderer = Renderer::new(backend, scene.params, &scene.spheres, &scene.planes)?;
    let mut frame = Image::new(scene.params.width, scene.params.height)?;
    let report = renderer.render(&mut frame)?;
    if let Some(diagnostic) = &report.diagnostic {
        warn!(%diagnostic, "render completed with a device fault; image may be incomplete");
    }
    info!(
        render_ms = report.elapsed.as_secs_f64() * 1e3,
        "render pass finished"
    );
    Ok(frame)
}

fn show_info(file: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("opening {}", file.display()))?,
    );
    let header = pam::read_header(reader)?;

    println!("File: {}", file.display());
    println!("Size: {}x{}", header.width, header.height);
    println!("Depth: {}", header.depth);
    println!("Maxval: {}", header.maxval);
    println!(
        "Tuple type: {}",
        header.tupltype.as_deref().unwrap_or("(unspecified)")
    );
    match header.payload_len() {
        Some(len) => println!("Payload: {len} bytes"),
        None => println!("Payload: too large to address"),
    }

    Ok(())
}
