use anyhow::Context;
use cisco_assets::load_obj;
use cisco_common::{EngineConfig, ObjectConfig};
use cisco_input::{Action, InputState};
use cisco_render::{Camera, DebugTextBackend, Renderer};
use cisco_scene::Scene;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cisco-cli", about = "Headless tools for the cisco renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Parse an OBJ file and print its statistics
    Mesh {
        path: PathBuf,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render frames through the text backend, walking the camera forward
    Frames {
        /// Number of frames to render
        #[arg(short = 'n', long, default_value = "3")]
        count: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// YAML engine config
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// OBJ file to place in the scene; repeatable
        #[arg(short, long = "object", value_name = "PATH[@X,Y,Z]")]
        objects: Vec<ObjectConfig>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("cisco-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", cisco_common::crate_info());
            println!("assets: {}", cisco_assets::crate_info());
            println!("render: {}", cisco_render::crate_info());
            let config = EngineConfig::default();
            println!(
                "defaults: window={}x{} fov={} grid={} cells",
                config.window.width,
                config.window.height,
                config.projection.fov_y_degrees,
                config.grid.cells
            );
        }
        Commands::Mesh { path, json } => {
            let mesh = load_obj(&path).with_context(|| format!("failed to load {}", path.display()))?;
            let stats = mesh.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Mesh: {}", path.display());
                println!("  layout:    {:?}", stats.layout);
                println!("  vertices:  {}", stats.vertex_count);
                println!("  triangles: {}", stats.triangle_count);
                println!("  indices:   {}", stats.index_count);
                if let Some(bounds) = stats.bounds {
                    println!(
                        "  bounds:    ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
                    );
                }
            }
        }
        Commands::Frames {
            count,
            dt,
            config,
            objects,
        } => {
            let mut config = match &config {
                Some(path) => EngineConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            config.scene.objects.extend(objects);

            let mut backend = DebugTextBackend::new();
            let mut scene = Scene::init(&mut backend, config.grid)?
                .with_default_color(config.scene.default_color);
            for error in scene.add_objects(&mut backend, &config.scene.objects) {
                tracing::error!("{error}");
            }

            let renderer = Renderer::new(&config);
            let mut camera = Camera::new(&config.camera);
            let mut input = InputState::new();
            input.press(Action::MoveForward);

            for _ in 0..count {
                renderer.render(&mut backend, &scene, &camera, dt)?;
                camera.update(&input, dt);
            }
            for frame in backend.frames() {
                print!("{frame}");
            }

            scene.cleanup();
            tracing::debug!(live = backend.live_meshes(), "scene released");
        }
    }

    Ok(())
}
