use std::sync::OnceLock;

use crate::error::{ArgumentError, GeometryError, Result};
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::intersect_2d::{line_line_intersect, line_line_point};
use crate::math::{left_normal, Point2, Vector2, TOLERANCE};

use super::DirectedPoint;

/// Tolerance for treating the end of one polyline and the start of the
/// next as coincident when concatenating.
const JOIN_TOLERANCE: f64 = 1e-6;

/// Fallback behavior for [`Polyline::project_fractional`] when no segment
/// yields a valid helper-line association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionFallback {
    /// Orthogonal projection onto the nearest segment.
    Orthogonal,
    /// Projection onto the infinite extension of the nearest end segment;
    /// returns a fraction below 0 or above 1.
    NearestEndpoint,
    /// Report failure as `f64::NAN`.
    NaN,
}

/// Per-segment helper data for fractional projection: the direction of
/// the bisector helper line at the segment start, and the intersection of
/// the two helper lines if they are not parallel.
#[derive(Debug, Clone)]
struct SegmentHelper {
    dir_start: Vector2,
    center: Option<Point2>,
}

/// An immutable ordered sequence of at least 2 distinct points with cached
/// cumulative arc length.
///
/// No two consecutive points are equal; [`Polyline::new`] rejects violating
/// input and [`Polyline::cleaned`] de-duplicates it instead. All queries are
/// pure; lazily computed fields (centroid, projection helpers) are
/// initialized at most once and never change the logical value.
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<Point2>,
    /// Cumulative length at each vertex; `cumulative[0] == 0`.
    cumulative: Vec<f64>,
    centroid: OnceLock<Point2>,
    helpers: OnceLock<Vec<SegmentHelper>>,
}

impl Polyline {
    /// Creates a polyline from the given points.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 2 points are given or two consecutive
    /// points coincide within the global tolerance.
    pub fn new(points: Vec<Point2>) -> Result<Self> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                needed: 2,
                got: points.len(),
            }
            .into());
        }
        for (i, pair) in points.windows(2).enumerate() {
            if (pair[1] - pair[0]).norm() < TOLERANCE {
                return Err(GeometryError::DuplicatePoint { index: i + 1 }.into());
            }
        }
        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for pair in points.windows(2) {
            let prev = cumulative[cumulative.len() - 1];
            cumulative.push(prev + (pair[1] - pair[0]).norm());
        }
        Ok(Self {
            points,
            cumulative,
            centroid: OnceLock::new(),
            helpers: OnceLock::new(),
        })
    }

    /// Creates a polyline after dropping consecutive near-duplicate points.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 2 distinct points remain.
    pub fn cleaned(points: Vec<Point2>) -> Result<Self> {
        let mut deduped: Vec<Point2> = Vec::with_capacity(points.len());
        for p in points {
            if deduped
                .last()
                .is_none_or(|last| (p - last).norm() >= TOLERANCE)
            {
                deduped.push(p);
            }
        }
        Self::new(deduped)
    }

    /// Returns the number of points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the first point.
    #[must_use]
    pub fn first(&self) -> Point2 {
        self.points[0]
    }

    /// Returns the last point.
    #[must_use]
    pub fn last(&self) -> Point2 {
        self.points[self.points.len() - 1]
    }

    /// Returns the point at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn point(&self, index: usize) -> Result<Point2> {
        self.points.get(index).copied().ok_or_else(|| {
            ArgumentError::IndexOutOfRange {
                index,
                count: self.points.len(),
            }
            .into()
        })
    }

    /// Returns all points.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Returns the total length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    /// Returns the arithmetic mean of the vertices.
    #[must_use]
    pub fn centroid(&self) -> Point2 {
        *self.centroid.get_or_init(|| {
            let mut sum = Vector2::zeros();
            for p in &self.points {
                sum += p.coords;
            }
            #[allow(clippy::cast_precision_loss)]
            Point2::from(sum / self.points.len() as f64)
        })
    }

    /// Returns the oriented point at `position` along the line.
    ///
    /// The position is linearly interpolated between the bracketing
    /// vertices and the heading is the bracketing segment's direction.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` lies outside `[0, length]`.
    pub fn directed_point_at_length(&self, position: f64) -> Result<DirectedPoint> {
        if position < -TOLERANCE || position > self.length() + TOLERANCE {
            return Err(ArgumentError::OutOfRange {
                parameter: "position",
                value: position,
                min: 0.0,
                max: self.length(),
            }
            .into());
        }
        Ok(self.at_length_unchecked(position.clamp(0.0, self.length())))
    }

    /// Returns the oriented point at `position`, extrapolating linearly
    /// along the first/last segment for positions outside `[0, length]`.
    #[must_use]
    pub fn directed_point_at_length_extended(&self, position: f64) -> DirectedPoint {
        self.at_length_unchecked(position)
    }

    /// Returns the oriented point at length fraction `fraction`.
    ///
    /// # Errors
    ///
    /// Returns an error if `fraction` lies outside `[0, 1]`.
    pub fn directed_point_at_fraction(&self, fraction: f64) -> Result<DirectedPoint> {
        if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&fraction) {
            return Err(ArgumentError::OutOfRange {
                parameter: "fraction",
                value: fraction,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        Ok(self.at_length_unchecked(fraction.clamp(0.0, 1.0) * self.length()))
    }

    /// Returns the oriented point at length fraction `fraction`,
    /// extrapolating beyond the ends.
    #[must_use]
    pub fn directed_point_at_fraction_extended(&self, fraction: f64) -> DirectedPoint {
        self.at_length_unchecked(fraction * self.length())
    }

    fn at_length_unchecked(&self, position: f64) -> DirectedPoint {
        let i = self.segment_index_at(position);
        let a = self.points[i];
        let b = self.points[i + 1];
        let seg = b - a;
        let seg_len = seg.norm();
        let t = (position - self.cumulative[i]) / seg_len;
        DirectedPoint::new(a + seg * t, seg.y.atan2(seg.x))
    }

    /// Returns the index of the segment containing `position`, clamping to
    /// the first/last segment outside the domain.
    fn segment_index_at(&self, position: f64) -> usize {
        let mut i = match self
            .cumulative
            .binary_search_by(|c| c.partial_cmp(&position).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        if i > self.points.len() - 2 {
            i = self.points.len() - 2;
        }
        i
    }

    /// Extracts the sub-line between lengths `from` and `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from >= to`, `from < 0` or `to > length`.
    pub fn extract(&self, from: f64, to: f64) -> Result<Self> {
        if from < -TOLERANCE {
            return Err(ArgumentError::OutOfRange {
                parameter: "from",
                value: from,
                min: 0.0,
                max: self.length(),
            }
            .into());
        }
        if to > self.length() + TOLERANCE {
            return Err(ArgumentError::OutOfRange {
                parameter: "to",
                value: to,
                min: 0.0,
                max: self.length(),
            }
            .into());
        }
        if from >= to {
            return Err(ArgumentError::Invalid(format!(
                "extract range is empty: from {from} to {to}"
            ))
            .into());
        }
        let from = from.max(0.0);
        let to = to.min(self.length());

        let mut points = Vec::new();
        points.push(self.at_length_unchecked(from).point);
        for (i, &c) in self.cumulative.iter().enumerate() {
            if c > from + TOLERANCE && c < to - TOLERANCE {
                points.push(self.points[i]);
            }
        }
        points.push(self.at_length_unchecked(to).point);
        Self::cleaned(points)
    }

    /// Returns the sub-line from the start up to `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` is non-positive or beyond the length.
    pub fn truncated(&self, position: f64) -> Result<Self> {
        self.extract(0.0, position)
    }

    /// Returns a new polyline with the points in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        // The point sequence is valid by construction.
        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for pair in points.windows(2) {
            let prev = cumulative[cumulative.len() - 1];
            cumulative.push(prev + (pair[1] - pair[0]).norm());
        }
        Self {
            points,
            cumulative,
            centroid: OnceLock::new(),
            helpers: OnceLock::new(),
        }
    }

    /// Concatenates two or more polylines.
    ///
    /// The last point of each line must coincide with the first point of
    /// the next within a small join tolerance; the duplicate join point is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if no lines are given or consecutive lines do not
    /// join up.
    pub fn concat(lines: &[&Self]) -> Result<Self> {
        let Some(first) = lines.first() else {
            return Err(GeometryError::TooFewPoints { needed: 1, got: 0 }.into());
        };
        let mut points: Vec<Point2> = first.points.clone();
        for (i, line) in lines.iter().enumerate().skip(1) {
            let gap = (line.first() - points[points.len() - 1]).norm();
            if gap > JOIN_TOLERANCE {
                return Err(GeometryError::Degenerate(format!(
                    "line {i} does not connect to its predecessor (gap {gap:.3e})"
                ))
                .into());
            }
            points.extend_from_slice(&line.points[1..]);
        }
        Self::cleaned(points)
    }

    /// Maps a point to a length fraction along the line using the
    /// bisector-helper-line partition ("fractional projection").
    ///
    /// Each interior vertex carries a helper line through the intersection
    /// of the unit-offset parallels of its two adjacent segments (with a
    /// direction-vector fallback when they are parallel); a query point is
    /// associated with the segment whose helper lines bracket it, then
    /// projected along the ray from the segment's helper-line intersection.
    /// If no segment yields a valid association, `fallback` decides the
    /// result; [`ProjectionFallback::NearestEndpoint`] can return fractions
    /// below 0 or above 1.
    #[must_use]
    pub fn project_fractional(&self, point: Point2, fallback: ProjectionFallback) -> f64 {
        let helpers = self.projection_helpers();
        let mut best: Option<(f64, f64)> = None;

        for (i, helper) in helpers.iter().enumerate() {
            let a = self.points[i];
            let b = self.points[i + 1];
            let Some(m) = Self::association_parameter(point, a, b, helper) else {
                continue;
            };
            if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&m) {
                continue;
            }
            let dist = point_to_segment_dist(point, a, b);
            if best.is_none_or(|(_, d)| dist < d) {
                let seg_len = self.cumulative[i + 1] - self.cumulative[i];
                let fraction = (self.cumulative[i] + m.clamp(0.0, 1.0) * seg_len) / self.length();
                best = Some((fraction, dist));
            }
        }

        match best {
            Some((fraction, _)) => fraction,
            None => self.project_fallback(point, fallback),
        }
    }

    /// Returns the parameter on segment `a`→`b` hit by the projection line
    /// through `point`, or `None` when the geometry is too degenerate.
    fn association_parameter(
        point: Point2,
        a: Point2,
        b: Point2,
        helper: &SegmentHelper,
    ) -> Option<f64> {
        let seg = b - a;
        if let Some(center) = helper.center {
            let ray = point - center;
            if ray.norm() < TOLERANCE {
                return None;
            }
            let (t, _) = line_line_intersect(a, seg, center, ray)?;
            Some(t)
        } else {
            // Parallel helper lines: project along the shared direction.
            let (t, _) = line_line_intersect(a, seg, point, helper.dir_start)?;
            Some(t)
        }
    }

    fn project_fallback(&self, point: Point2, fallback: ProjectionFallback) -> f64 {
        match fallback {
            ProjectionFallback::NaN => f64::NAN,
            ProjectionFallback::Orthogonal => {
                let mut best = (0.0, f64::INFINITY);
                for i in 0..self.points.len() - 1 {
                    let a = self.points[i];
                    let b = self.points[i + 1];
                    let seg = b - a;
                    let len_sq = seg.norm_squared();
                    let t = ((point - a).dot(&seg) / len_sq).clamp(0.0, 1.0);
                    let dist = (point - (a + seg * t)).norm();
                    if dist < best.1 {
                        let seg_len = self.cumulative[i + 1] - self.cumulative[i];
                        best = ((self.cumulative[i] + t * seg_len) / self.length(), dist);
                    }
                }
                best.0
            }
            ProjectionFallback::NearestEndpoint => {
                let to_first = (point - self.first()).norm();
                let to_last = (point - self.last()).norm();
                if to_first <= to_last {
                    let a = self.points[0];
                    let seg = self.points[1] - a;
                    let t = (point - a).dot(&seg) / seg.norm_squared();
                    t * seg.norm() / self.length()
                } else {
                    let n = self.points.len();
                    let a = self.points[n - 2];
                    let seg = self.points[n - 1] - a;
                    let t = (point - a).dot(&seg) / seg.norm_squared();
                    (self.cumulative[n - 2] + t * seg.norm()) / self.length()
                }
            }
        }
    }

    /// Builds (once) the per-segment helper lines for fractional
    /// projection.
    fn projection_helpers(&self) -> &[SegmentHelper] {
        self.helpers.get_or_init(|| {
            let n = self.points.len();
            let seg_dir = |i: usize| (self.points[i + 1] - self.points[i]).normalize();

            // Helper direction per vertex.
            let mut dirs: Vec<Vector2> = Vec::with_capacity(n);
            dirs.push(left_normal(seg_dir(0)));
            for j in 1..n - 1 {
                let d1 = seg_dir(j - 1);
                let d2 = seg_dir(j);
                let o1 = self.points[j - 1] + left_normal(d1);
                let o2 = self.points[j] + left_normal(d2);
                let dir = match line_line_point(o1, d1, o2, d2) {
                    Some(h) => {
                        let v = h - self.points[j];
                        if v.norm() < TOLERANCE {
                            left_normal(d1)
                        } else {
                            v.normalize()
                        }
                    }
                    None => {
                        // Parallel segments: bisect by averaging.
                        let sum = d1 + d2;
                        if sum.norm() < TOLERANCE {
                            left_normal(d1)
                        } else {
                            left_normal(sum.normalize())
                        }
                    }
                };
                dirs.push(dir);
            }
            dirs.push(left_normal(seg_dir(n - 2)));

            (0..n - 1)
                .map(|i| {
                    let center =
                        line_line_point(self.points[i], dirs[i], self.points[i + 1], dirs[i + 1]);
                    SegmentHelper {
                        dir_start: dirs[i],
                        center,
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-9;

    fn l_shape() -> Polyline {
        Polyline::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_single_point() {
        assert!(Polyline::new(vec![Point2::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn rejects_consecutive_duplicates() {
        let r = Polyline::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn cleaned_deduplicates() {
        let p = Polyline::cleaned(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ])
        .unwrap();
        assert_eq!(p.point_count(), 3);
    }

    #[test]
    fn length_and_cumulative() {
        let p = l_shape();
        assert!((p.length() - 20.0).abs() < TOL);
    }

    #[test]
    fn point_index_out_of_range() {
        assert!(l_shape().point(3).is_err());
        assert!(l_shape().point(2).is_ok());
    }

    #[test]
    fn at_length_interpolates() {
        let p = l_shape();
        let dp = p.directed_point_at_length(5.0).unwrap();
        assert!((dp.point.x - 5.0).abs() < TOL);
        assert!(dp.point.y.abs() < TOL);
        assert!(dp.direction.abs() < TOL);

        let dp = p.directed_point_at_length(15.0).unwrap();
        assert!((dp.point.x - 10.0).abs() < TOL);
        assert!((dp.point.y - 5.0).abs() < TOL);
        assert!((dp.direction - FRAC_PI_2).abs() < TOL);
    }

    #[test]
    fn at_length_rejects_outside_domain() {
        assert!(l_shape().directed_point_at_length(-1.0).is_err());
        assert!(l_shape().directed_point_at_length(20.5).is_err());
    }

    #[test]
    fn at_length_extended_extrapolates() {
        let p = l_shape();
        let dp = p.directed_point_at_length_extended(-2.0);
        assert!((dp.point.x + 2.0).abs() < TOL);
        assert!(dp.point.y.abs() < TOL);

        let dp = p.directed_point_at_length_extended(25.0);
        assert!((dp.point.x - 10.0).abs() < TOL);
        assert!((dp.point.y - 15.0).abs() < TOL);
    }

    #[test]
    fn at_fraction() {
        let p = l_shape();
        let dp = p.directed_point_at_fraction(0.5).unwrap();
        assert!((dp.point.x - 10.0).abs() < TOL);
        assert!(dp.point.y.abs() < TOL);
        assert!(p.directed_point_at_fraction(1.5).is_err());
    }

    #[test]
    fn extract_mid_range() {
        let p = l_shape();
        let sub = p.extract(5.0, 15.0).unwrap();
        assert_eq!(sub.point_count(), 3);
        assert!((sub.first().x - 5.0).abs() < TOL);
        assert!((sub.last().y - 5.0).abs() < TOL);
        assert!((sub.length() - 10.0).abs() < TOL);
    }

    #[test]
    fn extract_rejects_bad_ranges() {
        let p = l_shape();
        assert!(p.extract(5.0, 5.0).is_err());
        assert!(p.extract(8.0, 5.0).is_err());
        assert!(p.extract(-1.0, 5.0).is_err());
        assert!(p.extract(0.0, 21.0).is_err());
    }

    #[test]
    fn truncated_keeps_start() {
        let p = l_shape().truncated(10.0).unwrap();
        assert!((p.length() - 10.0).abs() < TOL);
        assert!((p.last().x - 10.0).abs() < TOL);
    }

    #[test]
    fn reversed_roundtrip() {
        let p = l_shape();
        let r = p.reversed();
        assert!((r.first().x - 10.0).abs() < TOL);
        assert!((r.first().y - 10.0).abs() < TOL);
        assert!((r.length() - p.length()).abs() < TOL);
    }

    #[test]
    fn concat_joins_and_drops_duplicate() {
        let a = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).unwrap();
        let b = Polyline::new(vec![Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)]).unwrap();
        let joined = Polyline::concat(&[&a, &b]).unwrap();
        assert_eq!(joined.point_count(), 3);
        assert!((joined.length() - 2.0).abs() < TOL);
    }

    #[test]
    fn concat_rejects_gap() {
        let a = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).unwrap();
        let b = Polyline::new(vec![Point2::new(5.0, 0.0), Point2::new(6.0, 0.0)]).unwrap();
        assert!(Polyline::concat(&[&a, &b]).is_err());
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let c = l_shape().centroid();
        assert!((c.x - 20.0 / 3.0).abs() < TOL);
        assert!((c.y - 10.0 / 3.0).abs() < TOL);
    }

    // ── fractional projection ──

    #[test]
    fn projection_on_straight_line() {
        let p = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]).unwrap();
        let f = p.project_fractional(Point2::new(3.0, 2.0), ProjectionFallback::NaN);
        assert!((f - 0.3).abs() < 1e-9, "f={f}");
    }

    #[test]
    fn projection_near_corner_uses_bisector() {
        let p = l_shape();
        // A point on the outside bisector of the 90° corner should map to
        // the corner itself (fraction 0.5) rather than jump segments.
        let f = p.project_fractional(Point2::new(12.0, -2.0), ProjectionFallback::NaN);
        assert!((f - 0.5).abs() < 1e-9, "f={f}");
    }

    #[test]
    fn projection_inside_first_segment() {
        let p = l_shape();
        // The first segment's helper lines meet at (0, 10); the ray from
        // there through (4, 1) hits the segment at x = 40/9, so the
        // fraction is 2/9 rather than the orthogonal 0.2.
        let f = p.project_fractional(Point2::new(4.0, 1.0), ProjectionFallback::NaN);
        assert!((f - 2.0 / 9.0).abs() < 1e-9, "f={f}");
    }

    #[test]
    fn projection_beyond_end_nan_fallback() {
        let p = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]).unwrap();
        let f = p.project_fractional(Point2::new(15.0, 1.0), ProjectionFallback::NaN);
        assert!(f.is_nan(), "f={f}");
    }

    #[test]
    fn projection_beyond_end_endpoint_fallback() {
        let p = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]).unwrap();
        let f = p.project_fractional(Point2::new(15.0, 1.0), ProjectionFallback::NearestEndpoint);
        assert!((f - 1.5).abs() < 1e-9, "f={f}");
    }

    #[test]
    fn projection_before_start_endpoint_fallback() {
        let p = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]).unwrap();
        let f = p.project_fractional(Point2::new(-5.0, 1.0), ProjectionFallback::NearestEndpoint);
        assert!((f + 0.5).abs() < 1e-9, "f={f}");
    }

    #[test]
    fn projection_orthogonal_fallback() {
        let p = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]).unwrap();
        let f = p.project_fractional(Point2::new(15.0, 1.0), ProjectionFallback::Orthogonal);
        assert!((f - 1.0).abs() < 1e-9, "f={f}");
    }
}
