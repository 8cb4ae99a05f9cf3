//! User-addressable map overlays and their built meshes.

use std::{f64::consts::PI, fmt, time::Duration};

use cgmath::Point2;

use crate::{
    coords::{WorldCoords, ZoomLevel},
    geometry::{Feature, Point},
    style::{builder::StyleId, draw_rule::DrawRule},
    tessellation::Mesh,
    util::math::Aabb2,
};

pub mod manager;

/// Stable handle of a [`Marker`]. Handles are never reused by the manager which issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId {
    manager: u32,
    serial: u32,
}

impl MarkerId {
    pub(crate) fn new(manager: u32, serial: u32) -> Self {
        Self { manager, serial }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub(crate) fn manager(&self) -> u32 {
        self.manager
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.manager, self.serial)
    }
}

/// A built mesh tagged with the style and zoom it was built for.
#[derive(Clone, Debug)]
pub struct MarkerMesh {
    pub style_id: StyleId,
    pub zoom: ZoomLevel,
    pub mesh: Mesh,
}

/// Easing curves for animated repositioning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EaseType {
    Linear,
    #[default]
    Cubic,
    Quint,
    Sine,
}

impl EaseType {
    /// Maps linear progress `t` in `0.0..=1.0` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EaseType::Linear => t,
            EaseType::Cubic => (-2.0 * t + 3.0) * t * t,
            EaseType::Quint => (6.0 * t * t - 15.0 * t + 10.0) * t * t * t,
            EaseType::Sine => 0.5 - 0.5 * (PI * t).cos(),
        }
    }
}

/// Animation of a point marker from its current position to a destination.
///
/// The manager only records the animation; advancing time is up to the animator.
#[derive(Clone, Debug, PartialEq)]
pub struct Ease {
    pub start: WorldCoords,
    pub end: WorldCoords,
    pub duration: Duration,
    pub ease_type: EaseType,
}

impl Ease {
    pub fn new(start: WorldCoords, end: WorldCoords, duration: Duration, ease_type: EaseType) -> Self {
        Self {
            start,
            end,
            duration,
            ease_type,
        }
    }

    /// Linear progress after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn position_at(&self, elapsed: Duration) -> WorldCoords {
        let t = self.ease_type.apply(self.progress(elapsed));
        WorldCoords::new(
            self.start.x + (self.end.x - self.start.x) * t,
            self.start.y + (self.end.y - self.start.y) * t,
        )
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

/// One geometry, one draw rule and the mesh built from them.
///
/// Mesh coordinates are local to the marker: `(world - origin) * scale` where the origin is
/// the south-west corner of the bounds and `scale` is `1 / extent`.
#[derive(Debug)]
pub struct Marker {
    id: MarkerId,
    styling: String,
    feature: Option<Feature>,
    draw_rule: Option<DrawRule>,
    mesh: Option<MarkerMesh>,
    bounds: Aabb2<f64>,
    draw_order: i32,
    interactive: bool,
    ease: Option<Ease>,
}

impl Marker {
    pub(crate) fn new(id: MarkerId) -> Self {
        Self {
            id,
            styling: String::new(),
            feature: None,
            draw_rule: None,
            mesh: None,
            bounds: Aabb2::degenerate(Point2::new(0.0, 0.0)),
            draw_order: 0,
            interactive: false,
            ease: None,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// The styling text of the current draw rule.
    pub fn styling(&self) -> &str {
        &self.styling
    }

    pub fn feature(&self) -> Option<&Feature> {
        self.feature.as_ref()
    }

    pub fn draw_rule(&self) -> Option<&DrawRule> {
        self.draw_rule.as_ref()
    }

    pub fn mesh(&self) -> Option<&MarkerMesh> {
        self.mesh.as_ref()
    }

    /// Zoom the current mesh was built for.
    pub fn built_zoom(&self) -> Option<ZoomLevel> {
        self.mesh.as_ref().map(|mesh| mesh.zoom)
    }

    /// Bounds in world meters.
    pub fn bounds(&self) -> Aabb2<f64> {
        self.bounds
    }

    pub fn origin(&self) -> WorldCoords {
        self.bounds.min.into()
    }

    pub fn extent(&self) -> f64 {
        self.bounds.diagonal()
    }

    /// Factor from world meters to local units. Markers without extent use 1.
    pub fn scale(&self) -> f64 {
        let extent = self.extent();
        if extent > 0.0 {
            1.0 / extent
        } else {
            1.0
        }
    }

    pub fn draw_order(&self) -> i32 {
        self.draw_order
    }

    /// Whether the marker takes part in feature picking. Set by the last successful build.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn ease(&self) -> Option<&Ease> {
        self.ease.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn world_to_local(&self, meters: WorldCoords) -> Point {
        let origin = self.origin();
        let scale = self.scale();
        Point::new(
            ((meters.x - origin.x) * scale) as f32,
            ((meters.y - origin.y) * scale) as f32,
            0.0,
        )
    }

    pub fn local_to_world(&self, point: Point) -> WorldCoords {
        let origin = self.origin();
        let scale = self.scale();
        WorldCoords::new(
            origin.x + point.x as f64 / scale,
            origin.y + point.y as f64 / scale,
        )
    }

    pub(crate) fn set_styling(&mut self, styling: String, draw_rule: DrawRule) {
        self.styling = styling;
        self.draw_rule = Some(draw_rule);
    }

    pub(crate) fn set_feature(&mut self, feature: Feature) {
        self.feature = Some(feature);
    }

    pub(crate) fn set_bounds(&mut self, bounds: Aabb2<f64>) {
        self.bounds = bounds;
    }

    pub(crate) fn set_mesh(&mut self, mesh: MarkerMesh) {
        self.mesh = Some(mesh);
    }

    pub(crate) fn set_draw_order(&mut self, draw_order: i32) {
        self.draw_order = draw_order;
    }

    pub(crate) fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub(crate) fn set_ease(&mut self, ease: Option<Ease>) {
        self.ease = ease;
    }
}
