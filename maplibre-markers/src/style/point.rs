//! Builder for the `points` style.

use log::debug;
use lyon::tessellation::VertexBuffers;

use crate::{
    coords::ZoomLevel,
    error::BuildError,
    geometry::{Feature, GeometryType},
    settings::TessellationSettings,
    style::{
        builder::{units_per_pixel, StyleBuilder, StyleId},
        draw_rule::EvaluatedRule,
        param::StyleParamKey,
        polyline::DEFAULT_COLOR,
    },
    tessellation::{path_collector::PathCollector, IndexDataType, Mesh, MeshVertex},
};

const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const QUAD_INDICES: [IndexDataType; 6] = [0, 1, 2, 0, 2, 3];

/// Emits one screen-sized quad per point. The corner direction is stored in the vertex
/// normal.
pub struct PointBuilder {
    style_id: StyleId,
    settings: TessellationSettings,
    units_per_pixel: f32,
    buffer: VertexBuffers<MeshVertex, IndexDataType>,
}

impl PointBuilder {
    pub fn new(style_id: StyleId, settings: TessellationSettings) -> Self {
        Self {
            style_id,
            settings,
            units_per_pixel: 1.0,
            buffer: VertexBuffers::new(),
        }
    }
}

impl StyleBuilder for PointBuilder {
    fn setup(&mut self, zoom: ZoomLevel, local_scale: f64) {
        self.units_per_pixel = units_per_pixel(zoom, local_scale);
        self.buffer = VertexBuffers::new();
    }

    fn add_feature(&mut self, feature: &Feature, rule: &EvaluatedRule) -> Result<(), BuildError> {
        if feature.geometry_type() != GeometryType::Points {
            debug!("points style skips {:?} feature", feature.geometry_type());
            return Ok(());
        }

        let size = rule
            .number(StyleParamKey::Size)
            .unwrap_or(self.settings.point_size);
        if size <= 0.0 {
            return Ok(());
        }
        let half = size * self.units_per_pixel / 2.0;
        let color = rule.color(StyleParamKey::Color).unwrap_or(DEFAULT_COLOR);

        let mut collector = PathCollector::default();
        feature.process(&mut collector)?;
        let (_, points) = collector.finish();

        for point in points {
            let base = self.buffer.vertices.len() as IndexDataType;
            self.buffer
                .vertices
                .extend(CORNERS.iter().map(|corner| MeshVertex {
                    position: [point.x + corner[0] * half, point.y + corner[1] * half],
                    normal: *corner,
                    color,
                }));
            self.buffer
                .indices
                .extend(QUAD_INDICES.iter().map(|index| base + index));
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

    use approx::assert_abs_diff_eq;

    use crate::{
        coords::{meters_per_pixel, ZoomLevel},
        geometry::Feature,
        settings::TessellationSettings,
        style::{
            builder::StyleBuilder,
            draw_rule::EvaluatedRule,
            param::{StyleParamKey, StyleParamValue},
            point::PointBuilder,
        },
    };

    #[test]
    fn test_point_becomes_quad() {
        let zoom = ZoomLevel::new(14);
        let mut builder = PointBuilder::new(3, TessellationSettings::default());
        builder.setup(zoom, 1.0);
        let rule = EvaluatedRule::new(HashMap::from([(
            StyleParamKey::Size,
            StyleParamValue::Number(10.0),
        )]));
        builder.add_feature(&Feature::point(), &rule).unwrap();
        let mesh = builder.build();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.usable_indices, 6);
        let half = (10.0 * meters_per_pixel(zoom) / 2.0) as f32;
        assert_abs_diff_eq!(mesh.buffer.vertices[2].position[0], half, epsilon = 1e-3);
    }

    #[test]
    fn test_lines_are_skipped() {
        let mut builder = PointBuilder::new(3, TessellationSettings::default());
        builder.setup(ZoomLevel::new(0), 1.0);
        builder
            .add_feature(&Feature::line(vec![]), &EvaluatedRule::default())
            .unwrap();
        assert!(builder.build().is_empty());
    }
}
