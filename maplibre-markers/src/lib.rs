//! # Maplibre-markers
//!
//! Dynamic styling and mesh building for map markers.
//!
//! A [`MarkerManager`] owns markers: points, polylines and polygons given in geographic
//! coordinates and styled by a small JSON document. The manager projects the geometry into a
//! marker-local frame, evaluates the styling (including zoom stops and expressions) and
//! tessellates a GPU-ready mesh with Lyon. Meshes are rebuilt whenever the styling, the
//! geometry or the zoom level changes.
//!
//! ### Example
//!
//! ```
//! use maplibre_markers::{coords::{LngLat, ZoomLevel}, MarkerManager, Scene};
//!
//! let mut manager = MarkerManager::new(Scene::default());
//! let marker = manager.add(r##"{"style": "lines", "color": "#3388ff", "width": "4px"}"##);
//! manager
//!     .set_polyline(marker, &[LngLat::new(-74.0, 40.7), LngLat::new(-73.9, 40.8)])
//!     .unwrap();
//! manager.update(ZoomLevel::new(12));
//!
//! let mesh = manager.marker(marker).and_then(|m| m.mesh()).unwrap();
//! assert_eq!(mesh.zoom, ZoomLevel::new(12));
//! ```

pub mod coords;
pub mod error;
pub mod geometry;
pub mod marker;
pub mod scene;
pub mod settings;
pub mod style;
pub mod tessellation;
pub mod util;

pub use marker::{manager::MarkerManager, Ease, EaseType, Marker, MarkerId, MarkerMesh};
pub use scene::Scene;
