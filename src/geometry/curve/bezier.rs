use std::sync::OnceLock;

use crate::error::{ArgumentError, GeometryError, Result};
use crate::flatten::FlattenSpec;
use crate::geometry::{DirectedPoint, OffsetProfile, Polyline};
use crate::math::{cross_2d, Point2, Vector2, TOLERANCE};
use crate::offset::bezier_offset;

use super::{derived_offset, ContinuousCurve};

/// Segment count for the fixed-resolution length approximation; there is
/// no closed form for cubic Bézier arc length.
const LENGTH_SEGMENTS: usize = 1000;

/// What a split parameter of a Bézier curve marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitKind {
    /// A stationary point of one coordinate.
    Root,
    /// A curvature sign change.
    Inflection,
    /// A caller-requested cross-section.
    CrossSection,
}

/// A cubic Bézier curve with the standard Bernstein parametrization.
///
/// The curve parameter doubles as the length fraction for the
/// [`ContinuousCurve`] queries; it is not arc-length uniform.
#[derive(Debug, Clone)]
pub struct BezierCubic {
    points: [Point2; 4],
    length: OnceLock<f64>,
    split_params: OnceLock<Vec<(f64, SplitKind)>>,
}

impl BezierCubic {
    /// Creates a cubic Bézier from its four control points.
    ///
    /// # Errors
    ///
    /// Returns an error when a start or end tangent is undefined
    /// (coincident first or last control-point pair).
    pub fn new(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Result<Self> {
        if (p1 - p0).norm() < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "start tangent is undefined: first two control points coincide".into(),
            )
            .into());
        }
        if (p3 - p2).norm() < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "end tangent is undefined: last two control points coincide".into(),
            )
            .into());
        }
        Ok(Self::from_points([p0, p1, p2, p3]))
    }

    pub(crate) fn from_points(points: [Point2; 4]) -> Self {
        Self {
            points,
            length: OnceLock::new(),
            split_params: OnceLock::new(),
        }
    }

    /// Returns the control points.
    #[must_use]
    pub fn points(&self) -> &[Point2; 4] {
        &self.points
    }

    /// Evaluates the first derivative with respect to the curve parameter.
    #[must_use]
    pub fn derivative_at(&self, t: f64) -> Vector2 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        ((p1 - p0) * (u * u) + (p2 - p1) * (2.0 * u * t) + (p3 - p2) * (t * t)) * 3.0
    }

    /// Evaluates the second derivative with respect to the curve
    /// parameter.
    #[must_use]
    pub fn second_derivative_at(&self, t: f64) -> Vector2 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        ((p2 - p1 * 2.0 + p0.coords) * u + (p3 - p2 * 2.0 + p1.coords) * t) * 6.0
    }

    /// Returns the signed curvature at parameter `t` (positive = left).
    #[must_use]
    pub fn curvature_at(&self, t: f64) -> f64 {
        let d1 = self.derivative_at(t);
        let d2 = self.second_derivative_at(t);
        cross_2d(d1, d2) / d1.norm().powi(3)
    }

    /// Splits the curve at parameter `t` by de Casteljau subdivision into
    /// two cubics covering `[0, t]` and `[t, 1]` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if `t` lies outside `[0, 1]`.
    pub fn split(&self, t: f64) -> Result<(Self, Self)> {
        if !(0.0..=1.0).contains(&t) {
            return Err(ArgumentError::OutOfRange {
                parameter: "t",
                value: t,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        let [p0, p1, p2, p3] = self.points;
        let lerp = |a: Point2, b: Point2| a + (b - a) * t;
        let q1 = lerp(p0, p1);
        let m = lerp(p1, p2);
        let s1 = lerp(p2, p3);
        let q2 = lerp(q1, m);
        let r2 = lerp(m, s1);
        let c = lerp(q2, r2);
        Ok((
            Self::from_points([p0, q1, q2, c]),
            Self::from_points([c, r2, s1, p3]),
        ))
    }

    /// Returns the parameters strictly inside (0, 1) where one coordinate
    /// is stationary, solved per axis from the quadratic derivative.
    #[must_use]
    pub fn derivative_roots(&self) -> Vec<f64> {
        let [p0, p1, p2, p3] = self.points;
        let mut roots = Vec::new();
        for (d0, d1, d2) in [
            (p1.x - p0.x, p2.x - p1.x, p3.x - p2.x),
            (p1.y - p0.y, p2.y - p1.y, p3.y - p2.y),
        ] {
            let a = d0 - 2.0 * d1 + d2;
            let b = 2.0 * (d1 - d0);
            let c = d0;
            roots.extend(solve_quadratic(a, b, c).into_iter().flatten());
        }
        retain_interior_sorted(roots)
    }

    /// Returns the parameters strictly inside (0, 1) where the curvature
    /// changes sign.
    ///
    /// Derived in the chord-aligned frame (start at the origin, end on the
    /// x-axis), where the inflection condition reduces to a quadratic.
    #[must_use]
    pub fn inflections(&self) -> Vec<f64> {
        let [p0, p1, p2, p3] = self.points;
        let chord = p3 - p0;
        if chord.norm() < TOLERANCE {
            // No stable aligned frame for a closed curve.
            return Vec::new();
        }
        let angle = chord.y.atan2(chord.x);
        let (sin, cos) = angle.sin_cos();
        let align = |p: Point2| {
            let v = p - p0;
            Point2::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
        };
        let a1 = align(p1);
        let a2 = align(p2);
        let a3 = align(p3);

        let a = a2.x * a1.y;
        let b = a3.x * a1.y;
        let c = a1.x * a2.y;
        let d = a3.x * a2.y;
        let v1 = 18.0 * (-3.0 * a + 2.0 * b + 3.0 * c - d);
        let v2 = 18.0 * (3.0 * a - b - 3.0 * c);
        let v3 = 18.0 * (c - a);

        let roots: Vec<f64> = solve_quadratic(v1, v2, v3).into_iter().flatten().collect();
        retain_interior_sorted(roots)
    }

    /// Returns (computing once) the sorted root and inflection parameters
    /// used as mandatory split points when offsetting.
    pub(crate) fn offset_split_params(&self) -> &[(f64, SplitKind)] {
        self.split_params.get_or_init(|| {
            let mut params: Vec<(f64, SplitKind)> = self
                .derivative_roots()
                .into_iter()
                .map(|t| (t, SplitKind::Root))
                .chain(
                    self.inflections()
                        .into_iter()
                        .map(|t| (t, SplitKind::Inflection)),
                )
                .collect();
            params.sort_by(|a, b| a.0.total_cmp(&b.0));
            params.dedup_by(|a, b| (a.0 - b.0).abs() < TOLERANCE);
            params
        })
    }
}

impl ContinuousCurve for BezierCubic {
    fn start(&self) -> DirectedPoint {
        let d = self.points[1] - self.points[0];
        DirectedPoint::new(self.points[0], d.y.atan2(d.x))
    }

    fn end(&self) -> DirectedPoint {
        let d = self.points[3] - self.points[2];
        DirectedPoint::new(self.points[3], d.y.atan2(d.x))
    }

    fn start_curvature(&self) -> f64 {
        self.curvature_at(0.0)
    }

    fn end_curvature(&self) -> f64 {
        self.curvature_at(1.0)
    }

    fn length(&self) -> f64 {
        *self.length.get_or_init(|| {
            #[allow(clippy::cast_precision_loss)]
            let at = |i: usize| self.point_at(i as f64 / LENGTH_SEGMENTS as f64);
            (1..=LENGTH_SEGMENTS)
                .map(|i| (at(i) - at(i - 1)).norm())
                .sum()
        })
    }

    fn point_at(&self, fraction: f64) -> Point2 {
        let t = fraction.clamp(0.0, 1.0);
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        let coords = p0.coords * (u * u * u)
            + p1.coords * (3.0 * u * u * t)
            + p2.coords * (3.0 * u * t * t)
            + p3.coords * (t * t * t);
        Point2::from(coords)
    }

    fn direction_at(&self, fraction: f64) -> f64 {
        let d = self.derivative_at(fraction.clamp(0.0, 1.0));
        d.y.atan2(d.x)
    }

    fn flatten_offset(&self, offsets: &OffsetProfile, spec: &FlattenSpec) -> Result<Polyline> {
        // The fixed-count strategy has a closed construction in the
        // continuous domain; the error-bound strategies fall back to
        // sampling the displaced curve.
        match *spec {
            FlattenSpec::FixedCount(count) => bezier_offset::offset_bezier(self, offsets, count),
            _ => derived_offset(self, offsets, spec),
        }
    }
}

/// Solves `a·t² + b·t + c = 0`, degrading to the linear case when the
/// leading coefficient vanishes.
fn solve_quadratic(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return [None, None];
        }
        return [Some(-c / b), None];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return [None, None];
    }
    let sq = disc.sqrt();
    [Some((-b + sq) / (2.0 * a)), Some((-b - sq) / (2.0 * a))]
}

fn retain_interior_sorted(mut roots: Vec<f64>) -> Vec<f64> {
    roots.retain(|&t| t > TOLERANCE && t < 1.0 - TOLERANCE);
    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() < TOLERANCE);
    roots
}
