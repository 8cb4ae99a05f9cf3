use std::{cmp::Ordering, fmt};

use cgmath::{BaseFloat, BaseNum, Point2};

pub(crate) fn min<S: PartialOrd + Copy>(lhs: S, rhs: S) -> S {
    match lhs.partial_cmp(&rhs) {
        Some(Ordering::Less) | Some(Ordering::Equal) | None => lhs,
        _ => rhs,
    }
}

pub(crate) fn max<S: PartialOrd + Copy>(lhs: S, rhs: S) -> S {
    match lhs.partial_cmp(&rhs) {
        Some(Ordering::Greater) | Some(Ordering::Equal) | None => lhs,
        _ => rhs,
    }
}

/// A two-dimensional AABB, aka a rectangle.
#[derive(Clone, Copy, PartialEq)]
pub struct Aabb2<S> {
    /// Minimum point of the AABB
    pub min: Point2<S>,
    /// Maximum point of the AABB
    pub max: Point2<S>,
}

impl<S: BaseNum> Aabb2<S> {
    /// Construct a new axis-aligned bounding box from two points.
    #[inline]
    pub fn new(p1: Point2<S>, p2: Point2<S>) -> Aabb2<S> {
        Aabb2 {
            min: Point2::new(min(p1.x, p2.x), min(p1.y, p2.y)),
            max: Point2::new(max(p1.x, p2.x), max(p1.y, p2.y)),
        }
    }

    /// A zero-area box located at `point`.
    #[inline]
    pub fn degenerate(point: Point2<S>) -> Aabb2<S> {
        Aabb2 {
            min: point,
            max: point,
        }
    }

    /// Grows the box so that it contains `point`.
    pub fn expand(&mut self, point: Point2<S>) {
        self.min = Point2::new(min(self.min.x, point.x), min(self.min.y, point.y));
        self.max = Point2::new(max(self.max.x, point.x), max(self.max.y, point.y));
    }

    pub fn width(&self) -> S {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> S {
        self.max.y - self.min.y
    }
}

impl<S: BaseFloat> Aabb2<S> {
    /// Length of the diagonal from `min` to `max`.
    pub fn diagonal(&self) -> S {
        self.width().hypot(self.height())
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == S::zero() && self.height() == S::zero()
    }
}

impl<S: BaseNum> fmt::Debug for Aabb2<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} - {:?}]", self.min, self.max)
    }
}

/// Smallest box containing all `points`, or `None` for an empty iterator.
pub fn bounds_from_points<S, I>(mut points: I) -> Option<Aabb2<S>>
where
    S: BaseNum,
    I: Iterator<Item = Point2<S>>,
{
    let first = points.next()?;
    let mut bounds = Aabb2::degenerate(first);
    for point in points {
        bounds.expand(point);
    }
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use crate::util::math::{bounds_from_points, Aabb2};

    #[test]
    fn test_new_orders_corners() {
        let aabb = Aabb2::new(Point2::new(3.0, -1.0), Point2::new(-2.0, 4.0));
        assert_eq!(aabb.min, Point2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = bounds_from_points(
            [
                Point2::new(1.0, 1.0),
                Point2::new(-1.0, 5.0),
                Point2::new(4.0, 2.0),
            ]
            .into_iter(),
        )
        .unwrap();
        assert_eq!(bounds.min, Point2::new(-1.0, 1.0));
        assert_eq!(bounds.max, Point2::new(4.0, 5.0));
        assert_eq!(bounds.diagonal(), 5.0_f64.hypot(4.0));
    }

    #[test]
    fn test_bounds_from_no_points() {
        assert!(bounds_from_points(std::iter::empty::<Point2<f64>>()).is_none());
    }

    #[test]
    fn test_degenerate() {
        let aabb = Aabb2::degenerate(Point2::new(2.0, 3.0));
        assert!(aabb.is_degenerate());
        assert_eq!(aabb.diagonal(), 0.0);
    }
}
