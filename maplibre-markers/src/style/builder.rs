//! Styles and the mesh builders they create.

use serde::{Deserialize, Serialize};

use crate::{
    coords::{meters_per_pixel, ZoomLevel},
    error::BuildError,
    geometry::Feature,
    settings::TessellationSettings,
    style::{
        draw_rule::EvaluatedRule, point::PointBuilder, polygon::PolygonBuilder,
        polyline::PolylineBuilder,
    },
    tessellation::Mesh,
};

pub type StyleId = u32;

/// A style registered in a scene. Builders are created once per manager and reused for
/// every marker using the style.
pub trait Style: Send + Sync {
    fn name(&self) -> &str;

    fn id(&self) -> StyleId;

    fn create_builder(&self) -> Box<dyn StyleBuilder>;
}

/// Turns features and their evaluated rules into a mesh.
///
/// A build is `setup`, any number of `add_feature` calls and a final `build`. Builders are not
/// meant to be shared between threads while a build is in flight.
pub trait StyleBuilder {
    /// Resets the builder for a new mesh. `local_scale` maps world meters to the
    /// marker-local units of the features that follow.
    fn setup(&mut self, zoom: ZoomLevel, local_scale: f64);

    fn add_feature(&mut self, feature: &Feature, rule: &EvaluatedRule) -> Result<(), BuildError>;

    /// Takes the mesh built since the last `setup`.
    fn build(&mut self) -> Mesh;

    fn style_id(&self) -> StyleId;
}

/// Size of one screen pixel in marker-local units.
pub(crate) fn units_per_pixel(zoom: ZoomLevel, local_scale: f64) -> f32 {
    (meters_per_pixel(zoom) * local_scale) as f32
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Polygons,
    Lines,
    Points,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Polygons, StyleKind::Lines, StyleKind::Points];

    pub fn name(self) -> &'static str {
        match self {
            StyleKind::Polygons => "polygons",
            StyleKind::Lines => "lines",
            StyleKind::Points => "points",
        }
    }
}

/// A named style using one of the built-in builders.
pub struct BaseStyle {
    name: String,
    id: StyleId,
    kind: StyleKind,
    settings: TessellationSettings,
}

impl BaseStyle {
    pub fn new(
        name: impl Into<String>,
        id: StyleId,
        kind: StyleKind,
        settings: TessellationSettings,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            kind,
            settings,
        }
    }

    pub fn kind(&self) -> StyleKind {
        self.kind
    }
}

impl Style for BaseStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> StyleId {
        self.id
    }

    fn create_builder(&self) -> Box<dyn StyleBuilder> {
        let settings = self.settings.clone();
        match self.kind {
            StyleKind::Polygons => Box::new(PolygonBuilder::new(self.id, settings)),
            StyleKind::Lines => Box::new(PolylineBuilder::new(self.id, settings)),
            StyleKind::Points => Box::new(PointBuilder::new(self.id, settings)),
        }
    }
}
