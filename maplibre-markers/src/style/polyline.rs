//! Builder for the `lines` style.

use log::debug;
use lyon::{
    path::Path,
    tessellation::{
        BuffersBuilder, LineCap, LineJoin, StrokeOptions, StrokeTessellator, VertexBuffers,
    },
};

use crate::{
    coords::ZoomLevel,
    error::BuildError,
    geometry::{Feature, GeometryType},
    settings::TessellationSettings,
    style::{
        builder::{units_per_pixel, StyleBuilder, StyleId},
        draw_rule::EvaluatedRule,
        param::{Rgba, StyleParamKey},
    },
    tessellation::{
        path_collector::PathCollector, IndexDataType, Mesh, MeshVertex, VertexConstructor,
    },
};

pub(crate) const DEFAULT_COLOR: Rgba = [1.0, 1.0, 1.0, 1.0];
pub(crate) const DEFAULT_OUTLINE_COLOR: Rgba = [0.0, 0.0, 0.0, 1.0];

/// Parameters of a single stroke pass, widths already in local units.
pub(crate) struct Stroke {
    pub width: f32,
    pub color: Rgba,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

pub(crate) fn stroke_path(
    tessellator: &mut StrokeTessellator,
    buffer: &mut VertexBuffers<MeshVertex, IndexDataType>,
    path: &Path,
    tolerance: f32,
    stroke: &Stroke,
) -> Result<(), BuildError> {
    let options = StrokeOptions::tolerance(tolerance)
        .with_line_width(stroke.width)
        .with_line_cap(stroke.cap)
        .with_line_join(stroke.join)
        .with_miter_limit(stroke.miter_limit.max(StrokeOptions::MINIMUM_MITER_LIMIT));

    tessellator.tessellate_path(
        path,
        &options,
        &mut BuffersBuilder::new(buffer, VertexConstructor { color: stroke.color }),
    )?;
    Ok(())
}

/// Strokes line features. Widths are given in pixels and converted to local units at the
/// zoom the builder was set up for.
pub struct PolylineBuilder {
    style_id: StyleId,
    settings: TessellationSettings,
    units_per_pixel: f32,
    tessellator: StrokeTessellator,
    buffer: VertexBuffers<MeshVertex, IndexDataType>,
}

impl PolylineBuilder {
    pub fn new(style_id: StyleId, settings: TessellationSettings) -> Self {
        Self {
            style_id,
            settings,
            units_per_pixel: 1.0,
            tessellator: StrokeTessellator::new(),
            buffer: VertexBuffers::new(),
        }
    }
}

impl StyleBuilder for PolylineBuilder {
    fn setup(&mut self, zoom: ZoomLevel, local_scale: f64) {
        self.units_per_pixel = units_per_pixel(zoom, local_scale);
        self.buffer = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &EvaluatedRule) -> Result<(), BuildError> {
        if feature.geometry_type() != GeometryType::Lines {
            debug!("lines style skips {:?} feature", feature.geometry_type());
            return Ok(());
        }

        let width = rule
            .number(StyleParamKey::Width)
            .unwrap_or(self.settings.line_width);
        if width <= 0.0 {
            return Ok(());
        }

        let mut collector = PathCollector::default();
        feature.process(&mut collector)?;
        let (path, _) = collector.finish();

        let upp = self.units_per_pixel;
        let tolerance = (self.settings.tolerance * upp).max(f32::EPSILON);
        let cap = rule.cap().unwrap_or(LineCap::Butt);
        let join = rule.join().unwrap_or(LineJoin::Miter);
        let miter_limit = rule
            .number(StyleParamKey::MiterLimit)
            .unwrap_or(self.settings.miter_limit);

        let outline_width = rule.number(StyleParamKey::OutlineWidth).unwrap_or(0.0);
        if outline_width > 0.0 {
            let outline = Stroke {
                width: (width + 2.0 * outline_width) * upp,
                color: rule
                    .color(StyleParamKey::OutlineColor)
                    .unwrap_or(DEFAULT_OUTLINE_COLOR),
                cap,
                join,
                miter_limit,
            };
            stroke_path(&mut self.tessellator, &mut self.buffer, &path, tolerance, &outline)?;
        }

        let stroke = Stroke {
            width: width * upp,
            color: rule.color(StyleParamKey::Color).unwrap_or(DEFAULT_COLOR),
            cap,
            join,
            miter_limit,
        };
        stroke_path(&mut self.tessellator, &mut self.buffer, &path, tolerance, &stroke)
    }

    fn build(&mut self) -> Mesh {
        Mesh::from(std::mem::replace(&mut self.buffer, VertexBuffers::new()))
    }

    fn style_id(&self) -> StyleId {
        self.style_id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        coords::ZoomLevel,
        geometry::{Feature, Point},
        settings::TessellationSettings,
        style::{
            builder::StyleBuilder,
            draw_rule::EvaluatedRule,
            param::{StyleParamKey, StyleParamValue},
            polyline::PolylineBuilder,
        },
    };

    fn line() -> Feature {
        Feature::line(vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)])
    }

    fn rule(params: &[(StyleParamKey, StyleParamValue)]) -> EvaluatedRule {
        EvaluatedRule::new(params.iter().cloned().collect::<HashMap<_, _>>())
    }

    fn build(rule: &EvaluatedRule) -> crate::tessellation::Mesh {
        let mut builder = PolylineBuilder::new(1, TessellationSettings::default());
        builder.setup(ZoomLevel::new(0), 1e-6);
        builder.add_feature(&line(), rule).unwrap();
        builder.build()
    }

    #[test]
    fn test_line_is_stroked() {
        let mesh = build(&rule(&[(
            StyleParamKey::Color,
            StyleParamValue::Color([1.0, 0.0, 0.0, 1.0]),
        )]));
        assert!(!mesh.is_empty());
        assert!(mesh
            .buffer
            .vertices
            .iter()
            .all(|v| v.color == [1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_zero_width_builds_nothing() {
        let mesh = build(&rule(&[(StyleParamKey::Width, StyleParamValue::Number(0.0))]));
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_outline_adds_a_stroke() {
        let plain = build(&rule(&[]));
        let outlined = build(&rule(&[(
            StyleParamKey::OutlineWidth,
            StyleParamValue::Number(1.0),
        )]));
        assert_eq!(outlined.usable_indices, plain.usable_indices * 2);
    }

    #[test]
    fn test_polygons_are_skipped() {
        let mut builder = PolylineBuilder::new(1, TessellationSettings::default());
        builder.setup(ZoomLevel::new(0), 1.0);
        let polygon = Feature::polygon(vec![vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        ]]);
        builder.add_feature(&polygon, &rule(&[])).unwrap();
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_width_scales_with_zoom() {
        let extent = |zoom: u8| {
            let mut builder = PolylineBuilder::new(1, TessellationSettings::default());
            builder.setup(ZoomLevel::new(zoom), 1e-6);
            builder.add_feature(&line(), &rule(&[])).unwrap();
            let mesh = builder.build();
            mesh.buffer
                .vertices
                .iter()
                .map(|v| v.position[1])
                .fold(f32::MIN, f32::max)
        };
        assert!(extent(1) < extent(0));
    }
}
