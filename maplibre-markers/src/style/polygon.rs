//! Builder for the `polygons` style.

use log::debug;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, LineCap, LineJoin, StrokeTessellator,
    VertexBuffers,
};

use crate::{
    coords::ZoomLevel,
    error::BuildError,
    geometry::{Feature, GeometryType},
    settings::TessellationSettings,
    style::{
        builder::{units_per_pixel, StyleBuilder, StyleId},
        draw_rule::EvaluatedRule,
        param::StyleParamKey,
        polyline::{stroke_path, Stroke, DEFAULT_COLOR, DEFAULT_OUTLINE_COLOR},
    },
    tessellation::{
        path_collector::PathCollector, IndexDataType, Mesh, MeshVertex, VertexConstructor,
    },
};

/// Fills polygon features. Rings after the first cut holes through the even-odd rule.
pub struct PolygonBuilder {
    style_id: StyleId,
    settings: TessellationSettings,
    units_per_pixel: f32,
    fill_tessellator: FillTessellator,
    stroke_tessellator: StrokeTessellator,
    buffer: VertexBuffers<MeshVertex, IndexDataType>,
}

impl PolygonBuilder {
    pub fn new(style_id: StyleId, settings: TessellationSettings) -> Self {
        Self {
            style_id,
            settings,
            units_per_pixel: 1.0,
            fill_tessellator: FillTessellator::new(),
            stroke_tessellator: StrokeTessellator::new(),
            buffer: VertexBuffers::new(),
        }
    }
}

impl StyleBuilder for PolygonBuilder {
    fn setup(&mut self, zoom: ZoomLevel, local_scale: f64) {
        self.units_per_pixel = units_per_pixel(zoom, local_scale);
        self.buffer = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &EvaluatedRule) -> Result<(), BuildError> {
        if feature.geometry_type() != GeometryType::Polygons {
            debug!("polygons style skips {:?} feature", feature.geometry_type());
            return Ok(());
        }

        let mut collector = PathCollector::default();
        feature.process(&mut collector)?;
        let (path, _) = collector.finish();

        let tolerance = (self.settings.tolerance * self.units_per_pixel).max(f32::EPSILON);
        let color = rule.color(StyleParamKey::Color).unwrap_or(DEFAULT_COLOR);
        self.fill_tessellator.tessellate_path(
            &path,
            &FillOptions::tolerance(tolerance).with_fill_rule(FillRule::EvenOdd),
            &mut BuffersBuilder::new(&mut self.buffer, VertexConstructor { color }),
        )?;

        let outline_width = rule.number(StyleParamKey::OutlineWidth).unwrap_or(0.0);
        if outline_width > 0.0 {
            let outline = Stroke {
                width: outline_width * self.units_per_pixel,
                color: rule
                    .color(StyleParamKey::OutlineColor)
                    .unwrap_or(DEFAULT_OUTLINE_COLOR),
                cap: LineCap::Butt,
                join: rule.join().unwrap_or(LineJoin::Miter),
                miter_limit: rule
                    .number(StyleParamKey::MiterLimit)
                    .unwrap_or(self.settings.miter_limit),
            };
            stroke_path(
                &mut self.stroke_tessellator,
                &mut self.buffer,
                &path,
                tolerance,
                &outline,
            )?;
        }

        Ok(())
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
        geometry::{Feature, Line, Point},
        settings::TessellationSettings,
        style::{
            builder::StyleBuilder,
            draw_rule::EvaluatedRule,
            param::{StyleParamKey, StyleParamValue},
            polygon::PolygonBuilder,
        },
    };

    fn square(min: f32, max: f32) -> Line {
        vec![
            Point::new(min, min, 0.0),
            Point::new(max, min, 0.0),
            Point::new(max, max, 0.0),
            Point::new(min, max, 0.0),
        ]
    }

    fn builder() -> PolygonBuilder {
        let mut builder = PolygonBuilder::new(7, TessellationSettings::default());
        builder.setup(ZoomLevel::new(10), 1e-4);
        builder
    }

    #[test]
    fn test_unit_square_fills_two_triangles() {
        let mut builder = builder();
        builder
            .add_feature(
                &Feature::polygon(vec![square(0.0, 1.0)]),
                &EvaluatedRule::default(),
            )
            .unwrap();
        let mesh = builder.build();

        assert_eq!(mesh.usable_indices, 6);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(builder.style_id(), 7);
    }

    #[test]
    fn test_inner_ring_is_a_hole() {
        let mut builder = builder();
        builder
            .add_feature(
                &Feature::polygon(vec![square(0.0, 1.0), square(0.25, 0.75)]),
                &EvaluatedRule::default(),
            )
            .unwrap();
        let mesh = builder.build();

        // A square with a square hole needs 8 triangles.
        assert_eq!(mesh.usable_indices, 24);
    }

    #[test]
    fn test_outline_is_stroked() {
        let mut builder = builder();
        let rule = EvaluatedRule::new(HashMap::from([(
            StyleParamKey::OutlineWidth,
            StyleParamValue::Number(2.0),
        )]));
        builder
            .add_feature(&Feature::polygon(vec![square(0.0, 1.0)]), &rule)
            .unwrap();
        assert!(builder.build().usable_indices > 6);
    }

    #[test]
    fn test_build_resets_buffers() {
        let mut builder = builder();
        builder
            .add_feature(
                &Feature::polygon(vec![square(0.0, 1.0)]),
                &EvaluatedRule::default(),
            )
            .unwrap();
        assert!(!builder.build().is_empty());
        assert!(builder.build().is_empty());
    }
}
