//! In-memory shape of a feature in marker-local coordinates.

use std::collections::HashMap;

use cgmath::Point3;
use geozero::GeomProcessor;

/// A vertex in marker-local space.
pub type Point = Point3<f32>;
/// A polyline, or a single ring of a polygon.
pub type Line = Vec<Point>;
/// A list of rings. The first ring is the outer boundary.
pub type Polygon = Vec<Line>;

/// Properties of a feature which style expressions can read with `["get", name]`.
pub type Properties = HashMap<String, serde_json::Value>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Points,
    Lines,
    Polygons,
}

/// The shape of a feature. Exactly one geometry kind exists per feature.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Points(Vec<Point>),
    Lines(Vec<Line>),
    Polygons(Vec<Polygon>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Points(_) => GeometryType::Points,
            Geometry::Lines(_) => GeometryType::Lines,
            Geometry::Polygons(_) => GeometryType::Polygons,
        }
    }
}

/// A single shape plus the properties styling operates on.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    /// A feature with a single point at the local origin.
    pub fn point() -> Self {
        Self::new(Geometry::Points(vec![Point::new(0.0, 0.0, 0.0)]))
    }

    pub fn line(line: Line) -> Self {
        Self::new(Geometry::Lines(vec![line]))
    }

    pub fn polygon(polygon: Polygon) -> Self {
        Self::new(Geometry::Polygons(vec![polygon]))
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    /// Streams the geometry into `processor` as untagged geozero events.
    ///
    /// Points are reported as a multipoint, lines as a multilinestring and polygons as a
    /// multipolygon, so processors always see one collection per feature.
    pub fn process<P: GeomProcessor>(&self, processor: &mut P) -> geozero::error::Result<()> {
        match &self.geometry {
            Geometry::Points(points) => {
                processor.multipoint_begin(points.len(), 0)?;
                for (idx, point) in points.iter().enumerate() {
                    processor.xy(point.x as f64, point.y as f64, idx)?;
                }
                processor.multipoint_end(0)
            }
            Geometry::Lines(lines) => {
                processor.multilinestring_begin(lines.len(), 0)?;
                for (idx, line) in lines.iter().enumerate() {
                    process_line(processor, line, false, idx)?;
                }
                processor.multilinestring_end(0)
            }
            Geometry::Polygons(polygons) => {
                processor.multipolygon_begin(polygons.len(), 0)?;
                for (idx, polygon) in polygons.iter().enumerate() {
                    processor.polygon_begin(false, polygon.len(), idx)?;
                    for (ring_idx, ring) in polygon.iter().enumerate() {
                        process_line(processor, ring, false, ring_idx)?;
                    }
                    processor.polygon_end(false, idx)?;
                }
                processor.multipolygon_end(0)
            }
        }
    }
}

fn process_line<P: GeomProcessor>(
    processor: &mut P,
    line: &Line,
    tagged: bool,
    idx: usize,
) -> geozero::error::Result<()> {
    processor.linestring_begin(tagged, line.len(), idx)?;
    for (vertex_idx, point) in line.iter().enumerate() {
        processor.xy(point.x as f64, point.y as f64, vertex_idx)?;
    }
    processor.linestring_end(tagged, idx)
}

#[cfg(test)]
mod tests {
    use geozero::GeomProcessor;

    use crate::geometry::{Feature, GeometryType, Point};

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl GeomProcessor for EventLog {
        fn xy(&mut self, x: f64, y: f64, _idx: usize) -> geozero::error::Result<()> {
            self.events.push(format!("xy({x},{y})"));
            Ok(())
        }

        fn linestring_begin(
            &mut self,
            _tagged: bool,
            size: usize,
            _idx: usize,
        ) -> geozero::error::Result<()> {
            self.events.push(format!("line({size})"));
            Ok(())
        }

        fn polygon_begin(
            &mut self,
            _tagged: bool,
            size: usize,
            _idx: usize,
        ) -> geozero::error::Result<()> {
            self.events.push(format!("polygon({size})"));
            Ok(())
        }
    }

    #[test]
    fn test_point_feature_is_at_origin() {
        let feature = Feature::point();
        assert_eq!(feature.geometry_type(), GeometryType::Points);

        let mut log = EventLog::default();
        feature.process(&mut log).unwrap();
        assert_eq!(log.events, vec!["xy(0,0)"]);
    }

    #[test]
    fn test_polygon_events() {
        let feature = Feature::polygon(vec![
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
            ],
            vec![Point::new(0.5, 0.5, 0.0)],
        ]);

        let mut log = EventLog::default();
        feature.process(&mut log).unwrap();
        assert_eq!(
            log.events,
            vec![
                "polygon(2)",
                "line(3)",
                "xy(0,0)",
                "xy(1,0)",
                "xy(1,1)",
                "line(1)",
                "xy(0.5,0.5)",
            ]
        );
    }
}
