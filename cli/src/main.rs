//! Headless model inspector.
//!
//! Loads a model the way the browser viewer does, frames it, and prints the
//! camera, the parts and (optionally) the exploded layout and a pick result.
//!
//! Usage: cargo run -p partview-cli -- <model.glb> [--explode] [--pick X,Y]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use partview::{NodeId, Viewer, ViewerConfig};

#[derive(Parser)]
#[command(name = "partview-cli")]
#[command(about = "Load a model, frame it and report its parts")]
#[command(version)]
struct Cli {
    /// Model file (.glb, .gltf, .step)
    model: PathBuf,

    /// Explode the model and print where each part ends up
    #[arg(long)]
    explode: bool,

    /// Pick the part under a viewport pixel, e.g. 400,300
    #[arg(long, value_parser = parse_point)]
    pick: Option<(f32, f32)>,

    /// Viewport size in pixels, e.g. 1280x720
    #[arg(long, value_parser = parse_size, default_value = "800x600")]
    size: (u32, u32),

    /// JSON viewer config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or("expected WIDTHxHEIGHT")?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => ViewerConfig::from_path(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let (width, height) = cli.size;
    if width == 0 || height == 0 {
        bail!("Viewport size must be non-zero");
    }

    let mut viewer = Viewer::new(config, width, height);
    let root = viewer
        .load_model_path(&cli.model)
        .with_context(|| format!("Failed to load {}", cli.model.display()))?;

    println!("{}", viewer.status());
    print_camera(&viewer);
    println!();
    print_parts(&viewer, root);

    if let Some((x, y)) = cli.pick {
        println!();
        match viewer.click(x, y, false) {
            Some(node) => println!("Picked at ({}, {}): {}", x, y, node_label(&viewer, node)),
            None => println!("Picked at ({}, {}): nothing", x, y),
        }
    }

    if cli.explode {
        viewer.toggle_explode();
        println!();
        println!("Exploded:");
        print_parts(&viewer, root);
    }

    Ok(())
}

fn print_camera(viewer: &Viewer) {
    let camera = viewer.camera();
    println!("Camera:");
    println!(
        "  Eye:    ({:.3}, {:.3}, {:.3})",
        camera.eye.x, camera.eye.y, camera.eye.z
    );
    println!(
        "  Target: ({:.3}, {:.3}, {:.3})",
        camera.target.x, camera.target.y, camera.target.z
    );
    println!("  Near/Far: {:.4} / {:.1}", camera.znear, camera.zfar);
}

fn print_parts(viewer: &Viewer, root: NodeId) {
    let scene = viewer.scene();
    let Some(root_node) = scene.get_node(root) else {
        return;
    };

    println!("Parts: {}", root_node.children().len());
    for &child in root_node.children() {
        let Some(node) = scene.get_node(child) else {
            continue;
        };
        let position = node.position();
        let size = scene
            .nodes_bounding(child)
            .map(|b| b.size())
            .map(|s| format!("{:.3} x {:.3} x {:.3}", s.x, s.y, s.z))
            .unwrap_or_else(|| "empty".to_string());
        println!(
            "  {:<24} at ({:.3}, {:.3}, {:.3})  size {}",
            node_label(viewer, child),
            position.x,
            position.y,
            position.z,
            size
        );
    }
}

fn node_label(viewer: &Viewer, node: NodeId) -> String {
    match viewer.scene().get_node(node).and_then(|n| n.name.as_deref()) {
        Some(name) => format!("#{} {}", node, name),
        None => format!("#{}", node),
    }
}
