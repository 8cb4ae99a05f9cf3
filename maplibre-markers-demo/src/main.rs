use std::{num::ParseFloatError, time::Duration};

use clap::{Parser, Subcommand};
use maplibre_markers::{
    coords::{LngLat, ZoomLevel},
    EaseType, MarkerId, MarkerManager, Scene,
};

#[derive(Parser)]
#[command(name = "maplibre-markers-demo", about = "Builds a styled marker and prints its mesh")]
struct Cli {
    /// Styling document of the marker
    #[arg(short, long, default_value = r##"{"style": "lines", "color": "#3388ff", "width": "4px"}"##)]
    styling: String,
    /// Zoom level to build the mesh at
    #[arg(short, long, default_value_t = 12)]
    zoom: u8,
    /// Scene configuration file (JSON)
    #[arg(long)]
    scene: Option<std::path::PathBuf>,
    #[command(subcommand)]
    geometry: Geometry,
}

#[derive(Subcommand)]
enum Geometry {
    /// A single point, optionally eased to a second position
    Point {
        #[arg(value_parser = parse_lng_lat)]
        position: LngLat,
        #[arg(long, value_parser = parse_lng_lat)]
        ease_to: Option<LngLat>,
        /// Ease duration in milliseconds
        #[arg(long, default_value_t = 500)]
        duration: u64,
    },
    /// A polyline through two or more positions
    Polyline {
        #[arg(value_parser = parse_lng_lat, num_args = 2..)]
        positions: Vec<LngLat>,
    },
    /// A polygon; `--rings` gives the vertex count of each ring
    Polygon {
        #[arg(value_parser = parse_lng_lat, num_args = 3..)]
        positions: Vec<LngLat>,
        #[arg(long, value_delimiter = ',')]
        rings: Vec<usize>,
    },
}

fn parse_lng_lat(s: &str) -> Result<LngLat, String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lng,lat`, got `{}`", s))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e: ParseFloatError| e.to_string());
    Ok(LngLat::new(parse(lng)?, parse(lat)?))
}

fn load_scene(cli: &Cli) -> Scene {
    let Some(path) = &cli.scene else {
        return Scene::default();
    };
    match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| Scene::from_json(&text).map_err(|e| e.to_string()))
    {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Failed to load scene {}: {}", path.display(), e);
            Scene::default()
        }
    }
}

fn print_marker(manager: &MarkerManager, id: MarkerId) {
    let Some(marker) = manager.marker(id) else {
        return;
    };
    let bounds = marker.bounds();
    println!("marker {}", marker.id());
    println!("  bounds: {:?}", bounds);
    println!("  extent: {:.3} m", marker.extent());
    match marker.mesh() {
        Some(mesh) => println!(
            "  mesh: style {} at zoom {}, {} vertices, {} indices",
            mesh.style_id,
            mesh.zoom,
            mesh.mesh.vertex_count(),
            mesh.mesh.usable_indices
        ),
        None => println!("  mesh: none"),
    }
    if let Some(ease) = marker.ease() {
        println!(
            "  ease: {} -> {} over {:?} ({:?})",
            ease.start, ease.end, ease.duration, ease.ease_type
        );
    }
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let mut manager = MarkerManager::new(load_scene(&cli));
    manager.update(ZoomLevel::from(cli.zoom));

    let id = manager.add(&cli.styling);
    let result = match &cli.geometry {
        Geometry::Point {
            position,
            ease_to,
            duration,
        } => manager.set_point(id, *position).and_then(|_| match ease_to {
            Some(target) => manager.set_point_eased(
                id,
                *target,
                Duration::from_millis(*duration),
                EaseType::Cubic,
            ),
            None => Ok(()),
        }),
        Geometry::Polyline { positions } => manager.set_polyline(id, positions),
        Geometry::Polygon { positions, rings } => {
            let rings = if rings.is_empty() {
                vec![positions.len()]
            } else {
                rings.clone()
            };
            manager.set_polygon(id, positions, &rings)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
    print_marker(&manager, id);
}
