//! Collects geozero geometry events into lyon paths.

use geozero::GeomProcessor;
use lyon::{
    geom,
    path::{path::Builder, Path},
};

type GeoResult<T> = geozero::error::Result<T>;

/// Turns the events of one [`crate::geometry::Feature`] into a lyon [`Path`] and a list of
/// points. Lines become open sub-paths, polygon rings become closed sub-paths.
pub struct PathCollector {
    path_builder: Builder,
    path_open: bool,
    in_multipoint: bool,
    in_polygon: bool,

    pub points: Vec<geom::Point<f32>>,
}

impl Default for PathCollector {
    fn default() -> Self {
        Self {
            path_builder: Path::builder(),
            path_open: false,
            in_multipoint: false,
            in_polygon: false,
            points: Vec::new(),
        }
    }
}

impl PathCollector {
    fn end(&mut self, close: bool) {
        if self.path_open {
            self.path_builder.end(close);
            self.path_open = false;
        }
    }

    /// Finishes the collected path. Open sub-paths are closed when they belong to a polygon.
    pub fn finish(mut self) -> (Path, Vec<geom::Point<f32>>) {
        let close = self.in_polygon;
        self.end(close);
        (self.path_builder.build(), self.points)
    }
}

impl GeomProcessor for PathCollector {
    fn xy(&mut self, x: f64, y: f64, _idx: usize) -> GeoResult<()> {
        let point = geom::point(x as f32, y as f32);

        if self.in_multipoint {
            self.points.push(point);
        } else if !self.path_open {
            self.path_builder.begin(point);
            self.path_open = true;
        } else {
            self.path_builder.line_to(point);
        }
        Ok(())
    }

    fn point_begin(&mut self, _idx: usize) -> GeoResult<()> {
        self.in_multipoint = true;
        Ok(())
    }

    fn point_end(&mut self, _idx: usize) -> GeoResult<()> {
        self.in_multipoint = false;
        Ok(())
    }

    fn multipoint_begin(&mut self, _size: usize, _idx: usize) -> GeoResult<()> {
        self.in_multipoint = true;
        Ok(())
    }

    fn multipoint_end(&mut self, _idx: usize) -> GeoResult<()> {
        self.in_multipoint = false;
        Ok(())
    }

    fn linestring_end(&mut self, _tagged: bool, _idx: usize) -> GeoResult<()> {
        let close = self.in_polygon;
        self.end(close);
        Ok(())
    }

    fn polygon_begin(&mut self, _tagged: bool, _size: usize, _idx: usize) -> GeoResult<()> {
        self.in_polygon = true;
        Ok(())
    }

    fn polygon_end(&mut self, _tagged: bool, _idx: usize) -> GeoResult<()> {
        self.end(true);
        self.in_polygon = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lyon::path::PathEvent;

    use crate::{
        geometry::{Feature, Geometry, Point},
        tessellation::path_collector::PathCollector,
    };

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
    }

    fn closes(path: &lyon::path::Path) -> Vec<bool> {
        path.iter()
            .filter_map(|event| match event {
                PathEvent::End { close, .. } => Some(close),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_polygon_rings_are_closed() {
        let feature = Feature::polygon(vec![square(), square()]);
        let mut collector = PathCollector::default();
        feature.process(&mut collector).unwrap();
        let (path, points) = collector.finish();

        assert!(points.is_empty());
        assert_eq!(closes(&path), vec![true, true]);
    }

    #[test]
    fn test_lines_stay_open() {
        let feature = Feature::line(square());
        let mut collector = PathCollector::default();
        feature.process(&mut collector).unwrap();
        let (path, _) = collector.finish();

        assert_eq!(closes(&path), vec![false]);
    }

    #[test]
    fn test_points_are_collected() {
        let feature = Feature::new(Geometry::Points(square()));
        let mut collector = PathCollector::default();
        feature.process(&mut collector).unwrap();
        let (path, points) = collector.finish();

        assert_eq!(points.len(), 4);
        assert_eq!(path.iter().count(), 0);
    }
}
