//! Adaptive flattening of continuous curves into point sequences.
//!
//! The flattener only sees a curve through two closures, one mapping a
//! length fraction to a point and one mapping it to a tangent heading, so
//! the same routine serves plain curves and laterally offset curves.

use std::collections::BTreeMap;

use crate::error::{ArgumentError, NumericError, Result};
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::{cross_2d, normalize_angle, Point2, TOLERANCE};

/// Splitting an interval more than this many times without meeting the
/// criteria indicates an inconsistent point/direction pair.
const MAX_DEPTH: u32 = 50;

/// Criteria controlling how finely a curve is flattened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlattenSpec {
    /// Exactly this many segments at equidistant fractions (yielding one
    /// more point than segments).
    FixedCount(usize),
    /// Split until the midpoint of every interval is within this distance
    /// of its chord.
    MaxDeviation(f64),
    /// Split until the tangent heading at every interval start deviates
    /// from the chord heading by at most this angle (radians).
    MaxAngle(f64),
    /// Both criteria combined.
    MaxDeviationAndAngle { max_deviation: f64, max_angle: f64 },
}

impl FlattenSpec {
    fn validate(&self) -> Result<()> {
        match *self {
            Self::FixedCount(n) => {
                if n == 0 {
                    return Err(ArgumentError::NonPositive {
                        parameter: "count",
                        value: 0.0,
                    }
                    .into());
                }
            }
            Self::MaxDeviation(d) => {
                if d <= 0.0 {
                    return Err(ArgumentError::NonPositive {
                        parameter: "max_deviation",
                        value: d,
                    }
                    .into());
                }
            }
            Self::MaxAngle(a) => {
                if a <= 0.0 {
                    return Err(ArgumentError::NonPositive {
                        parameter: "max_angle",
                        value: a,
                    }
                    .into());
                }
            }
            Self::MaxDeviationAndAngle {
                max_deviation,
                max_angle,
            } => {
                if max_deviation <= 0.0 {
                    return Err(ArgumentError::NonPositive {
                        parameter: "max_deviation",
                        value: max_deviation,
                    }
                    .into());
                }
                if max_angle <= 0.0 {
                    return Err(ArgumentError::NonPositive {
                        parameter: "max_angle",
                        value: max_angle,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn max_deviation(&self) -> Option<f64> {
        match *self {
            Self::MaxDeviation(d) | Self::MaxDeviationAndAngle { max_deviation: d, .. } => Some(d),
            _ => None,
        }
    }

    fn max_angle(&self) -> Option<f64> {
        match *self {
            Self::MaxAngle(a) | Self::MaxDeviationAndAngle { max_angle: a, .. } => Some(a),
            _ => None,
        }
    }
}

/// Flattens a curve given by `point_at` and `direction_at` (both over the
/// fraction domain [0, 1]) according to `spec`.
///
/// Endpoints are always sampled exactly; interior points are inserted by
/// bisecting intervals whose chord violates the criteria. An interval is
/// also split when the curve crosses its own chord, which a midpoint
/// deviation test alone would miss.
///
/// # Errors
///
/// Returns an error for an invalid spec, or when an interval must be split
/// beyond the depth limit (the point and direction data disagree, e.g. a
/// discontinuous curve).
pub fn flatten<P, D>(point_at: P, direction_at: D, spec: &FlattenSpec) -> Result<Vec<Point2>>
where
    P: Fn(f64) -> Point2,
    D: Fn(f64) -> f64,
{
    spec.validate()?;

    if let FlattenSpec::FixedCount(n) = *spec {
        #[allow(clippy::cast_precision_loss)]
        let points = (0..=n).map(|i| point_at(i as f64 / n as f64)).collect();
        return Ok(points);
    }

    // Accepted points keyed by the bit pattern of their fraction; for
    // fractions in [0, 1] the bit order matches the numeric order.
    let mut accepted: BTreeMap<u64, Point2> = BTreeMap::new();
    accepted.insert(0.0_f64.to_bits(), point_at(0.0));
    accepted.insert(1.0_f64.to_bits(), point_at(1.0));

    let mut stack: Vec<(f64, f64, u32)> = vec![(0.0, 1.0, 0)];
    while let Some((t0, t1, depth)) = stack.pop() {
        let a = accepted[&t0.to_bits()];
        let b = accepted[&t1.to_bits()];
        let tm = 0.5 * (t0 + t1);
        let pm = point_at(tm);

        if !needs_split(&point_at, &direction_at, t0, t1, a, b, pm, spec) {
            continue;
        }
        if depth >= MAX_DEPTH {
            return Err(NumericError::InconsistentDirection.into());
        }
        accepted.insert(tm.to_bits(), pm);
        stack.push((t0, tm, depth + 1));
        stack.push((tm, t1, depth + 1));
    }

    Ok(accepted.into_values().collect())
}

#[allow(clippy::too_many_arguments)]
fn needs_split<P, D>(
    point_at: &P,
    direction_at: &D,
    t0: f64,
    t1: f64,
    a: Point2,
    b: Point2,
    pm: Point2,
    spec: &FlattenSpec,
) -> bool
where
    P: Fn(f64) -> Point2,
    D: Fn(f64) -> f64,
{
    let chord = b - a;

    if let Some(max_deviation) = spec.max_deviation() {
        if point_to_segment_dist(pm, a, b) > max_deviation {
            return true;
        }
        // An S-shaped interval can put the midpoint back on the chord;
        // probe the quarter points for a sign change across it. A chord
        // shorter than the bound cannot hide such a crossing.
        if chord.norm() > max_deviation {
            let q1 = point_at(t0 + 0.25 * (t1 - t0));
            let q3 = point_at(t0 + 0.75 * (t1 - t0));
            let s1 = cross_2d(chord, q1 - a);
            let s3 = cross_2d(chord, q3 - a);
            if s1 * s3 < -TOLERANCE {
                return true;
            }
        }
    }

    if let Some(max_angle) = spec.max_angle() {
        let chord_angle = chord.y.atan2(chord.x);
        if normalize_angle(direction_at(t0) - chord_angle).abs() > max_angle {
            return true;
        }
    }

    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::distance_2d::point_to_polyline_dist;
    use std::f64::consts::{FRAC_PI_2, PI};

    // Quarter circle of radius 10 from (10, 0) to (0, 10).
    fn arc_point(f: f64) -> Point2 {
        let a = f * FRAC_PI_2;
        Point2::new(10.0 * a.cos(), 10.0 * a.sin())
    }

    fn arc_direction(f: f64) -> f64 {
        f * FRAC_PI_2 + FRAC_PI_2
    }

    #[test]
    fn fixed_count_yields_one_more_point() {
        let pts = flatten(arc_point, arc_direction, &FlattenSpec::FixedCount(8)).unwrap();
        assert_eq!(pts.len(), 9);
        assert!((pts[0].x - 10.0).abs() < 1e-12);
        assert!((pts[8].y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_count_zero_rejected() {
        assert!(flatten(arc_point, arc_direction, &FlattenSpec::FixedCount(0)).is_err());
    }

    #[test]
    fn non_positive_criteria_rejected() {
        assert!(flatten(arc_point, arc_direction, &FlattenSpec::MaxDeviation(0.0)).is_err());
        assert!(flatten(arc_point, arc_direction, &FlattenSpec::MaxAngle(-0.1)).is_err());
    }

    #[test]
    fn max_deviation_bound_holds() {
        let eps = 0.05;
        let pts = flatten(arc_point, arc_direction, &FlattenSpec::MaxDeviation(eps)).unwrap();
        assert!(pts.len() >= 3);
        // Every dense sample must lie within eps of the polyline.
        for i in 0..=200 {
            let p = arc_point(f64::from(i) / 200.0);
            let d = point_to_polyline_dist(p, &pts);
            assert!(d <= eps + 1e-9, "sample {i} off by {d}");
        }
    }

    #[test]
    fn tighter_deviation_gives_more_points() {
        let coarse = flatten(arc_point, arc_direction, &FlattenSpec::MaxDeviation(0.5))
            .unwrap()
            .len();
        let fine = flatten(arc_point, arc_direction, &FlattenSpec::MaxDeviation(0.01))
            .unwrap()
            .len();
        assert!(fine > coarse, "fine={fine} coarse={coarse}");
    }

    #[test]
    fn max_angle_bound_holds() {
        let max_angle = 0.1;
        let pts = flatten(arc_point, arc_direction, &FlattenSpec::MaxAngle(max_angle)).unwrap();
        // On a circular arc the chord/tangent angle equals half the swept
        // angle, so the span per segment is bounded by 2 * max_angle; the
        // quarter circle needs at least ceil(pi/2 / 0.2) = 8 segments.
        assert!(pts.len() > 8, "{} points", pts.len());
    }

    #[test]
    fn straight_curve_needs_no_interior_points() {
        let pts = flatten(
            |f| Point2::new(10.0 * f, 0.0),
            |_| 0.0,
            &FlattenSpec::MaxDeviationAndAngle {
                max_deviation: 0.01,
                max_angle: 0.01,
            },
        )
        .unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn short_chord_skips_crossing_probe() {
        // A chord below the deviation bound needs only the endpoint and
        // midpoint evaluations, no quarter-point probes.
        let calls = std::cell::Cell::new(0_u32);
        let point = |f: f64| {
            calls.set(calls.get() + 1);
            Point2::new(0.005 * f, 0.0)
        };
        let pts = flatten(point, |_| 0.0, &FlattenSpec::MaxDeviation(0.01)).unwrap();
        assert_eq!(pts.len(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn chord_crossing_s_curve_is_split() {
        // Cubic-ish S whose midpoint lies exactly on the chord.
        let point = |f: f64| Point2::new(10.0 * f, (f * 2.0 * PI).sin());
        let dir = |f: f64| ((f * 2.0 * PI).cos() * 2.0 * PI / 10.0).atan();
        let pts = flatten(point, dir, &FlattenSpec::MaxDeviation(0.2)).unwrap();
        assert!(pts.len() > 3, "{} points", pts.len());
        for i in 0..=200 {
            let p = point(f64::from(i) / 200.0);
            assert!(point_to_polyline_dist(p, &pts) <= 0.2 + 1e-6);
        }
    }

    #[test]
    fn inconsistent_curve_hits_depth_guard() {
        // A jump discontinuity with a flat reported heading never meets an
        // angle criterion.
        let point = |f: f64| {
            if f < 0.5 {
                Point2::new(0.0, 0.0)
            } else {
                Point2::new(1.0, 1.0)
            }
        };
        let r = flatten(point, |_| 0.0, &FlattenSpec::MaxAngle(0.1));
        assert!(r.is_err());
    }
}
