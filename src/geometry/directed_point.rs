use crate::math::{heading_vector, normalize_angle, Point2};

/// An oriented point: a 2D position plus a heading angle in radians.
///
/// The heading is stored as given (any range) and normalized to (−π, π]
/// only where comparisons require it. Represents the directed start or end
/// of a curve segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedPoint {
    pub point: Point2,
    pub direction: f64,
}

impl DirectedPoint {
    /// Creates a directed point from a position and a heading.
    #[must_use]
    pub fn new(point: Point2, direction: f64) -> Self {
        Self { point, direction }
    }

    /// Creates a directed point from raw coordinates and a heading.
    #[must_use]
    pub fn from_xy(x: f64, y: f64, direction: f64) -> Self {
        Self::new(Point2::new(x, y), direction)
    }

    /// Returns the point translated by `distance` along its heading,
    /// keeping the heading.
    #[must_use]
    pub fn translated(&self, distance: f64) -> Self {
        Self::new(self.point + heading_vector(self.direction) * distance, self.direction)
    }

    /// Returns the heading normalized to (−π, π].
    #[must_use]
    pub fn normalized_direction(&self) -> f64 {
        normalize_angle(self.direction)
    }

    /// Returns the same position with the heading turned by π.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.point, normalize_angle(self.direction + std::f64::consts::PI))
    }
}
