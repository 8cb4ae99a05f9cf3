//! Owns markers, compiles their styling and keeps their meshes in sync with the zoom.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use cgmath::Point2;
use log::{debug, error, warn};

use crate::{
    coords::{LngLat, MapProjection, ZoomLevel},
    error::MarkerError,
    geometry::{Feature, GeometryType, Line, Point},
    marker::{Ease, EaseType, Marker, MarkerId, MarkerMesh},
    scene::{Scene, SceneId},
    style::{
        builder::StyleBuilder, context::StyleContext, draw_rule::DrawRule, param::StyleParamKey,
        parser::parse_styling,
    },
    util::math::{bounds_from_points, Aabb2},
};

static NEXT_MANAGER_ID: AtomicU32 = AtomicU32::new(1);

/// Name of the draw rule of every marker. Markers select their builder through the `style`
/// parameter.
const MARKER_RULE_NAME: &str = "marker";

/// Everything a build needs besides the marker itself.
struct BuildContext {
    style_builders: HashMap<String, Box<dyn StyleBuilder>>,
    style_context: StyleContext,
    scene_id: SceneId,
}

impl BuildContext {
    fn new(scene: &Scene) -> Self {
        let mut style_context = StyleContext::new();
        style_context.init_functions(scene);
        Self {
            style_builders: scene
                .styles()
                .iter()
                .map(|style| (style.name().to_string(), style.create_builder()))
                .collect(),
            style_context,
            scene_id: scene.id(),
        }
    }

    /// Builds the mesh of `marker` at `zoom`. Returns `true` if a mesh was attached.
    ///
    /// Whenever no mesh can be built the previous mesh stays attached.
    fn build(&mut self, marker: &mut Marker, zoom: ZoomLevel) -> bool {
        let (Some(rule), Some(feature)) = (marker.draw_rule(), marker.feature()) else {
            return false;
        };

        if rule.scene_id() != self.scene_id {
            warn!(
                "Marker {} was styled against another scene and needs to be restyled",
                marker.id()
            );
            return false;
        }

        let style_name = rule.style_name();
        let Some(builder) = self.style_builders.get_mut(style_name) else {
            warn!("Invalid style {}", style_name);
            return false;
        };

        self.style_context.set_keyword_zoom(zoom);
        let Some(evaluated) = self.style_context.evaluate_rule(rule, feature) else {
            debug!("Marker {} is not drawn at zoom {}", marker.id(), zoom);
            return false;
        };

        builder.setup(zoom, marker.scale());
        if let Err(e) = builder.add_feature(feature, &evaluated) {
            error!("Building marker {} failed: {}", marker.id(), e);
            return false;
        }
        let mesh = builder.build();
        let style_id = builder.style_id();

        marker.set_mesh(MarkerMesh {
            style_id,
            zoom,
            mesh,
        });
        marker.set_draw_order(evaluated.order());
        marker.set_interactive(evaluated.bool(StyleParamKey::Interactive).unwrap_or(false));
        true
    }
}

/// Owns all markers of a map.
///
/// Markers are kept in insertion order. A marker is rebuilt whenever its geometry or styling
/// changes and whenever [`MarkerManager::update`] moves to a zoom it was not built for.
pub struct MarkerManager {
    id: u32,
    next_serial: u32,
    markers: Vec<Marker>,
    zoom: ZoomLevel,
    scene: Scene,
    projection: Arc<dyn MapProjection>,
    build_context: BuildContext,
    /// Number of scene functions already compiled into the style context.
    function_watermark: usize,
}

impl MarkerManager {
    pub fn new(scene: Scene) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            next_serial: 0,
            markers: Vec::new(),
            zoom: ZoomLevel::default(),
            projection: scene.projection().clone(),
            build_context: BuildContext::new(&scene),
            function_watermark: scene.functions().len(),
            scene,
        }
    }

    /// Binds the manager to `scene`. Existing markers keep their meshes but are not rebuilt
    /// until they are restyled.
    pub fn set_scene(&mut self, scene: Scene) {
        self.projection = scene.projection().clone();
        self.function_watermark = scene.functions().len();
        self.build_context = BuildContext::new(&scene);
        self.scene = scene;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    /// Creates a marker styled with `styling`. Styling errors are logged and leave the marker
    /// without a draw rule.
    pub fn add(&mut self, styling: &str) -> MarkerId {
        self.next_serial += 1;
        let id = MarkerId::new(self.id, self.next_serial);
        self.markers.push(Marker::new(id));

        if let Err(e) = self.set_styling(id, styling) {
            warn!("Marker {} has invalid styling: {}", id, e);
        }
        id
    }

    /// Replaces the draw rule of a marker and rebuilds it at the current zoom.
    pub fn set_styling(&mut self, id: MarkerId, styling: &str) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        let params = parse_styling(styling, &mut self.scene)?;
        self.compile_new_functions();

        let rule = DrawRule::new(MARKER_RULE_NAME, self.scene.id(), params);
        let marker = &mut self.markers[index];
        marker.set_styling(styling.to_string(), rule);
        self.build_context.build(marker, self.zoom);
        Ok(())
    }

    /// Moves a marker to a single point. The point mesh is only built when the marker did not
    /// carry a built point before.
    pub fn set_point(&mut self, id: MarkerId, lng_lat: LngLat) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        check_finite(&[lng_lat])?;

        let meters = self.projection.lon_lat_to_meters(lng_lat);
        let marker = &mut self.markers[index];
        marker.set_bounds(Aabb2::degenerate(meters.into()));
        marker.set_ease(None);

        let has_point = marker.mesh().is_some()
            && marker
                .feature()
                .map_or(false, |f| f.geometry_type() == GeometryType::Points);
        if !has_point {
            marker.set_feature(Feature::point());
            self.build_context.build(marker, self.zoom);
        }
        Ok(())
    }

    /// Records an animation of a point marker towards `lng_lat`.
    pub fn set_point_eased(
        &mut self,
        id: MarkerId,
        lng_lat: LngLat,
        duration: Duration,
        ease_type: EaseType,
    ) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        check_finite(&[lng_lat])?;

        let marker = &mut self.markers[index];
        if marker
            .feature()
            .map_or(true, |f| f.geometry_type() != GeometryType::Points)
        {
            return Err(MarkerError::NoPointFeature);
        }

        let destination = self.projection.lon_lat_to_meters(lng_lat);
        let ease = Ease::new(marker.origin(), destination, duration, ease_type);
        marker.set_ease(Some(ease));
        Ok(())
    }

    pub fn set_polyline(&mut self, id: MarkerId, coordinates: &[LngLat]) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        if coordinates.len() < 2 {
            return Err(MarkerError::InvalidGeometry(
                "a polyline needs at least two coordinates",
            ));
        }
        check_finite(coordinates)?;

        let bounds = self.project_bounds(coordinates)?;
        let marker = &mut self.markers[index];
        marker.set_bounds(bounds);
        marker.set_ease(None);

        let line = to_local(self.projection.as_ref(), marker, coordinates);
        marker.set_feature(Feature::line(line));
        self.build_context.build(marker, self.zoom);
        Ok(())
    }

    /// Sets a polygon from flattened rings. `ring_counts[i]` is the vertex count of ring `i`;
    /// the first ring is the outer boundary.
    pub fn set_polygon(
        &mut self,
        id: MarkerId,
        coordinates: &[LngLat],
        ring_counts: &[usize],
    ) -> Result<(), MarkerError> {
        let index = self.index_of(id)?;
        if ring_counts.is_empty() {
            return Err(MarkerError::InvalidGeometry("a polygon needs at least one ring"));
        }
        let total = ring_counts
            .iter()
            .try_fold(0usize, |acc, &count| acc.checked_add(count));
        if coordinates.is_empty() || total != Some(coordinates.len()) {
            return Err(MarkerError::InvalidGeometry(
                "ring counts do not match the coordinates",
            ));
        }
        check_finite(coordinates)?;

        let bounds = self.project_bounds(coordinates)?;
        let marker = &mut self.markers[index];
        marker.set_bounds(bounds);
        marker.set_ease(None);

        let mut rings = Vec::with_capacity(ring_counts.len());
        let mut start = 0;
        for count in ring_counts {
            rings.push(to_local(
                self.projection.as_ref(),
                marker,
                &coordinates[start..start + count],
            ));
            start += count;
        }
        marker.set_feature(Feature::polygon(rings));
        self.build_context.build(marker, self.zoom);
        Ok(())
    }

    /// Rebuilds every marker not built for `zoom`. Returns `true` if any mesh was built.
    pub fn update(&mut self, zoom: ZoomLevel) -> bool {
        if zoom == self.zoom {
            return false;
        }

        let mut rebuilt = false;
        for marker in &mut self.markers {
            if marker.built_zoom() != Some(zoom) {
                rebuilt |= self.build_context.build(marker, zoom);
            }
        }
        self.zoom = zoom;
        rebuilt
    }

    pub fn remove(&mut self, id: MarkerId) -> bool {
        match self.index_of(id) {
            Ok(index) => {
                self.markers.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn remove_all(&mut self) {
        self.markers.clear();
    }

    /// All markers in insertion order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        let index = self.index_of(id).ok()?;
        self.markers.get(index)
    }

    fn index_of(&self, id: MarkerId) -> Result<usize, MarkerError> {
        if id.manager() != self.id {
            return Err(MarkerError::InvalidMarker);
        }
        // Serials grow with insertion order, so the collection stays sorted by serial.
        self.markers
            .binary_search_by_key(&id.serial(), |marker| marker.id().serial())
            .map_err(|_| MarkerError::InvalidMarker)
    }

    fn compile_new_functions(&mut self) {
        let functions = self.scene.functions();
        for source in &functions[self.function_watermark.min(functions.len())..] {
            if let Err(e) = self.build_context.style_context.add_function(source) {
                error!("{}", e);
            }
        }
        self.function_watermark = functions.len();
    }

    /// World bounds of the geographic bounding box of `coordinates`.
    fn project_bounds(&self, coordinates: &[LngLat]) -> Result<Aabb2<f64>, MarkerError> {
        let lng_lat_bounds = bounds_from_points(
            coordinates
                .iter()
                .map(|c| Point2::new(c.longitude, c.latitude)),
        )
        .ok_or(MarkerError::InvalidGeometry("no coordinates"))?;

        let min = self.projection.lon_lat_to_meters(LngLat::new(
            lng_lat_bounds.min.x,
            lng_lat_bounds.min.y,
        ));
        let max = self.projection.lon_lat_to_meters(LngLat::new(
            lng_lat_bounds.max.x,
            lng_lat_bounds.max.y,
        ));
        Ok(Aabb2::new(min.into(), max.into()))
    }
}

/// Projects `coordinates` into the local space of `marker`.
fn to_local(projection: &dyn MapProjection, marker: &Marker, coordinates: &[LngLat]) -> Line {
    coordinates
        .iter()
        .map(|c| marker.world_to_local(projection.lon_lat_to_meters(*c)))
        .collect::<Vec<Point>>()
}

fn check_finite(coordinates: &[LngLat]) -> Result<(), MarkerError> {
    if coordinates.iter().all(LngLat::is_finite) {
        Ok(())
    } else {
        Err(MarkerError::InvalidGeometry("coordinates must be finite"))
    }
}
