//! Continuous parametric curves over the fraction domain [0, 1].

pub mod bezier;
pub mod clothoid;
pub mod straight;

pub use bezier::BezierCubic;
pub use clothoid::Clothoid;
pub use straight::Straight;

use crate::error::{GeometryError, Result};
use crate::flatten::{self, FlattenSpec};
use crate::math::{heading_vector, left_normal, normalize_angle, Point2, TOLERANCE};

use super::{DirectedPoint, OffsetProfile, Polyline};

/// A continuous curve parametrized by length fraction.
///
/// The curve runs from `start()` to `end()`; `direction_at(1.0)` is
/// consistent with `end().direction` and `length()` is strictly positive.
/// Positive curvature turns left in the direction of travel.
pub trait ContinuousCurve {
    fn start(&self) -> DirectedPoint;

    fn end(&self) -> DirectedPoint;

    fn start_curvature(&self) -> f64;

    fn end_curvature(&self) -> f64;

    fn length(&self) -> f64;

    /// Returns the point at fraction `fraction` of the curve, clamped to
    /// [0, 1].
    fn point_at(&self, fraction: f64) -> Point2;

    /// Returns the tangent heading at fraction `fraction`, clamped to
    /// [0, 1].
    fn direction_at(&self, fraction: f64) -> f64;

    /// Flattens the curve into a polyline per `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid spec or when the flattener cannot
    /// satisfy it.
    fn flatten(&self, spec: &FlattenSpec) -> Result<Polyline> {
        let points = flatten::flatten(|f| self.point_at(f), |f| self.direction_at(f), spec)?;
        Polyline::cleaned(points)
    }

    /// Flattens the curve displaced laterally by `offsets` (positive =
    /// left) into a polyline per `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid spec or when the flattener cannot
    /// satisfy it.
    fn flatten_offset(&self, offsets: &OffsetProfile, spec: &FlattenSpec) -> Result<Polyline> {
        derived_offset(self, offsets, spec)
    }
}

/// Flattens the lateral offset of `curve` by sampling the displaced point
/// and tilt-corrected direction, for curves without a closed-form offset.
pub(crate) fn derived_offset<C: ContinuousCurve + ?Sized>(
    curve: &C,
    offsets: &OffsetProfile,
    spec: &FlattenSpec,
) -> Result<Polyline> {
    let length = curve.length();
    let point = |f: f64| {
        let direction = curve.direction_at(f);
        curve.point_at(f) + left_normal(heading_vector(direction)) * offsets.at(f)
    };
    // The lateral drift of the offset tilts the tangent.
    let direction = |f: f64| curve.direction_at(f) + (offsets.slope_at(f) / length).atan();
    let points = flatten::flatten(point, direction, spec)?;
    Polyline::cleaned(points)
}

/// A continuous curve of any supported kind.
#[derive(Debug, Clone)]
pub enum Curve {
    Straight(Straight),
    Bezier(BezierCubic),
    Clothoid(Clothoid),
}

impl Curve {
    /// Builds the simplest curve connecting two oriented points: a
    /// straight segment when both headings align with the chord, otherwise
    /// an arc or clothoid from the two-point fit.
    ///
    /// # Errors
    ///
    /// Returns an error when the points coincide or the fit fails.
    pub fn between(start: DirectedPoint, end: DirectedPoint) -> Result<Self> {
        let chord = end.point - start.point;
        if chord.norm() < TOLERANCE {
            return Err(GeometryError::ZeroChord.into());
        }
        let omega = chord.y.atan2(chord.x);
        let phi1 = normalize_angle(start.direction - omega);
        let phi2 = normalize_angle(omega - end.direction);
        if phi1.abs() < clothoid::ANGLE_TOLERANCE && phi2.abs() < clothoid::ANGLE_TOLERANCE {
            Ok(Self::Straight(Straight::between(start.point, end.point)?))
        } else {
            Ok(Self::Clothoid(Clothoid::between(start, end)?))
        }
    }
}

impl ContinuousCurve for Curve {
    fn start(&self) -> DirectedPoint {
        match self {
            Self::Straight(c) => c.start(),
            Self::Bezier(c) => c.start(),
            Self::Clothoid(c) => c.start(),
        }
    }

    fn end(&self) -> DirectedPoint {
        match self {
            Self::Straight(c) => c.end(),
            Self::Bezier(c) => c.end(),
            Self::Clothoid(c) => c.end(),
        }
    }

    fn start_curvature(&self) -> f64 {
        match self {
            Self::Straight(c) => c.start_curvature(),
            Self::Bezier(c) => c.start_curvature(),
            Self::Clothoid(c) => c.start_curvature(),
        }
    }

    fn end_curvature(&self) -> f64 {
        match self {
            Self::Straight(c) => c.end_curvature(),
            Self::Bezier(c) => c.end_curvature(),
            Self::Clothoid(c) => c.end_curvature(),
        }
    }

    fn length(&self) -> f64 {
        match self {
            Self::Straight(c) => c.length(),
            Self::Bezier(c) => c.length(),
            Self::Clothoid(c) => c.length(),
        }
    }

    fn point_at(&self, fraction: f64) -> Point2 {
        match self {
            Self::Straight(c) => c.point_at(fraction),
            Self::Bezier(c) => c.point_at(fraction),
            Self::Clothoid(c) => c.point_at(fraction),
        }
    }

    fn direction_at(&self, fraction: f64) -> f64 {
        match self {
            Self::Straight(c) => c.direction_at(fraction),
            Self::Bezier(c) => c.direction_at(fraction),
            Self::Clothoid(c) => c.direction_at(fraction),
        }
    }

    fn flatten(&self, spec: &FlattenSpec) -> Result<Polyline> {
        match self {
            Self::Straight(c) => c.flatten(spec),
            Self::Bezier(c) => c.flatten(spec),
            Self::Clothoid(c) => c.flatten(spec),
        }
    }

    fn flatten_offset(&self, offsets: &OffsetProfile, spec: &FlattenSpec) -> Result<Polyline> {
        match self {
            Self::Straight(c) => c.flatten_offset(offsets, spec),
            Self::Bezier(c) => c.flatten_offset(offsets, spec),
            Self::Clothoid(c) => c.flatten_offset(offsets, spec),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn between_collinear_yields_straight() {
        let a = DirectedPoint::from_xy(0.0, 0.0, 0.0);
        let b = DirectedPoint::from_xy(10.0, 0.0, 0.0);
        let c = Curve::between(a, b).unwrap();
        assert!(matches!(c, Curve::Straight(_)));
        assert!((c.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn between_quarter_turn_yields_clothoid_family() {
        let a = DirectedPoint::from_xy(10.0, 0.0, FRAC_PI_2);
        let b = DirectedPoint::from_xy(0.0, 10.0, std::f64::consts::PI);
        let c = Curve::between(a, b).unwrap();
        assert!(matches!(c, Curve::Clothoid(_)));
    }

    #[test]
    fn between_coincident_points_rejected() {
        let a = DirectedPoint::from_xy(1.0, 1.0, 0.0);
        assert!(Curve::between(a, a).is_err());
    }
}
