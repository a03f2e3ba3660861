use crate::error::{ArgumentError, GeometryError, Result};
use crate::flatten::FlattenSpec;
use crate::geometry::{DirectedPoint, OffsetProfile, Polyline};
use crate::math::{heading_vector, left_normal, Point2, TOLERANCE};

use super::ContinuousCurve;

/// A straight segment from an oriented start point.
#[derive(Debug, Clone, Copy)]
pub struct Straight {
    start: DirectedPoint,
    length: f64,
}

impl Straight {
    /// Creates a straight segment of `length` along the start heading.
    ///
    /// # Errors
    ///
    /// Returns an error if `length` is not strictly positive.
    pub fn new(start: DirectedPoint, length: f64) -> Result<Self> {
        if length <= 0.0 {
            return Err(ArgumentError::NonPositive {
                parameter: "length",
                value: length,
            }
            .into());
        }
        Ok(Self { start, length })
    }

    /// Creates the straight segment between two points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn between(start: Point2, end: Point2) -> Result<Self> {
        let chord = end - start;
        let length = chord.norm();
        if length < TOLERANCE {
            return Err(GeometryError::ZeroChord.into());
        }
        Ok(Self {
            start: DirectedPoint::new(start, chord.y.atan2(chord.x)),
            length,
        })
    }
}

impl ContinuousCurve for Straight {
    fn start(&self) -> DirectedPoint {
        self.start
    }

    fn end(&self) -> DirectedPoint {
        self.start.translated(self.length)
    }

    fn start_curvature(&self) -> f64 {
        0.0
    }

    fn end_curvature(&self) -> f64 {
        0.0
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn point_at(&self, fraction: f64) -> Point2 {
        self.start
            .translated(fraction.clamp(0.0, 1.0) * self.length)
            .point
    }

    fn direction_at(&self, _fraction: f64) -> f64 {
        self.start.direction
    }

    /// A straight segment gains nothing from subdivision; any strategy
    /// yields the 2-point chord.
    fn flatten(&self, _spec: &FlattenSpec) -> Result<Polyline> {
        Polyline::new(vec![self.start.point, self.end().point])
    }

    /// The offset of a straight segment under a piecewise-linear profile
    /// is exactly piecewise linear, so it is subdivided at the profile
    /// keys instead of by the flattening strategy.
    fn flatten_offset(&self, offsets: &OffsetProfile, _spec: &FlattenSpec) -> Result<Polyline> {
        let normal = left_normal(heading_vector(self.start.direction));
        let points = offsets
            .entries()
            .iter()
            .map(|&(f, o)| self.point_at(f) + normal * o)
            .collect();
        Polyline::cleaned(points)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::ContinuousCurve;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-12;

    #[test]
    fn end_point_translated_along_heading() {
        let s = Straight::new(DirectedPoint::from_xy(1.0, 2.0, FRAC_PI_2), 5.0).unwrap();
        let end = s.end();
        assert!((end.point.x - 1.0).abs() < TOL);
        assert!((end.point.y - 7.0).abs() < TOL);
    }

    #[test]
    fn non_positive_length_rejected() {
        assert!(Straight::new(DirectedPoint::from_xy(0.0, 0.0, 0.0), 0.0).is_err());
        assert!(Straight::new(DirectedPoint::from_xy(0.0, 0.0, 0.0), -1.0).is_err());
    }

    #[test]
    fn between_coincident_rejected() {
        let p = Point2::new(1.0, 1.0);
        assert!(Straight::between(p, p).is_err());
    }

    #[test]
    fn flatten_always_two_points() {
        let s = Straight::between(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)).unwrap();
        let line = s.flatten(&FlattenSpec::FixedCount(16)).unwrap();
        assert_eq!(line.point_count(), 2);
        assert!((line.last().x - 10.0).abs() < TOL);
    }

    #[test]
    fn zero_offset_reproduces_line() {
        let s = Straight::between(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)).unwrap();
        let line = s
            .flatten_offset(&OffsetProfile::constant(0.0), &FlattenSpec::FixedCount(4))
            .unwrap();
        assert_eq!(line.point_count(), 2);
        assert!((line.first().y).abs() < TOL);
        assert!((line.last().x - 10.0).abs() < TOL);
    }

    #[test]
    fn constant_offset_translates_left() {
        let s = Straight::between(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)).unwrap();
        let line = s
            .flatten_offset(&OffsetProfile::constant(2.0), &FlattenSpec::FixedCount(4))
            .unwrap();
        assert_eq!(line.point_count(), 2);
        assert!((line.first().y - 2.0).abs() < TOL);
        assert!((line.last().y - 2.0).abs() < TOL);
    }

    #[test]
    fn varying_offset_subdivides_at_keys() {
        let s = Straight::between(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)).unwrap();
        let profile = OffsetProfile::new(vec![(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]).unwrap();
        let line = s
            .flatten_offset(&profile, &FlattenSpec::FixedCount(1))
            .unwrap();
        assert_eq!(line.point_count(), 3);
        assert!((line.point(1).unwrap().x - 5.0).abs() < TOL);
        assert!((line.point(1).unwrap().y - 1.0).abs() < TOL);
    }
}
