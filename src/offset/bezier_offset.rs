//! Continuous-domain offsetting of cubic Bézier curves.
//!
//! The curve is split at coordinate roots, inflections, and the offset
//! profile's interior keys; each sub-segment then has a consistent turn
//! direction and monotone coordinates, so a locally valid offset can be
//! rebuilt from a radial displacement about the intersection of the
//! endpoint normals.

use crate::error::{ArgumentError, Result};
use crate::geometry::curve::bezier::{BezierCubic, SplitKind};
use crate::geometry::curve::ContinuousCurve;
use crate::geometry::{OffsetProfile, Polyline};
use crate::math::intersect_2d::line_line_point;
use crate::math::{left_normal, Point2, TOLERANCE};

/// Builds the polyline of `curve` displaced laterally per `offsets`
/// (positive = left), flattened with `count` segments in total distributed
/// proportionally over the sub-segments.
///
/// # Errors
///
/// Returns an error when `count` is zero or the result degenerates.
pub(crate) fn offset_bezier(
    curve: &BezierCubic,
    offsets: &OffsetProfile,
    count: usize,
) -> Result<Polyline> {
    if count == 0 {
        return Err(ArgumentError::NonPositive {
            parameter: "count",
            value: 0.0,
        }
        .into());
    }

    let mut params: Vec<(f64, SplitKind)> = curve.offset_split_params().to_vec();
    for f in offsets.interior_fractions() {
        if params.iter().all(|&(t, _)| (t - f).abs() >= TOLERANCE) {
            params.push((f, SplitKind::CrossSection));
        }
    }
    params.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Cut the curve into sub-segments at the gathered parameters.
    let mut segments: Vec<(f64, f64, BezierCubic)> = Vec::new();
    let mut rest = curve.clone();
    let mut t_prev = 0.0;
    for &(t, _) in &params {
        let local = (t - t_prev) / (1.0 - t_prev);
        let (head, tail) = rest.split(local)?;
        segments.push((t_prev, t, head));
        rest = tail;
        t_prev = t;
    }
    segments.push((t_prev, 1.0, rest));

    // Running side of the curvature center, seeded from the first
    // segment and flipped at each inflection.
    let mut center_left = {
        let first = &segments[0].2;
        let [q0, q1, ..] = *first.points();
        match segment_center(first) {
            Some(c) => (c - q0).dot(&left_normal((q1 - q0).normalize())) > 0.0,
            None => true,
        }
    };

    let mut out: Vec<Point2> = Vec::new();
    #[allow(clippy::cast_precision_loss)]
    for (i, (t_lo, t_hi, segment)) in segments.iter().enumerate() {
        if i > 0 && params[i - 1].1 == SplitKind::Inflection {
            center_left = !center_left;
        }
        let shifted = offset_segment(segment, offsets.at(*t_lo), offsets.at(*t_hi), center_left);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let share = (((t_hi - t_lo) * count as f64).ceil() as usize).max(1);
        let from = usize::from(!out.is_empty());
        for k in from..=share {
            out.push(shifted.point_at(k as f64 / share as f64));
        }
    }
    Polyline::cleaned(out)
}

/// Intersection of the two endpoint normal lines; `None` when the end
/// tangents are parallel.
fn segment_center(segment: &BezierCubic) -> Option<Point2> {
    let [q0, q1, q2, q3] = *segment.points();
    let n_start = left_normal((q1 - q0).normalize());
    let n_end = left_normal((q3 - q2).normalize());
    line_line_point(q0, n_start, q3, n_end)
}

/// Rebuilds one sub-segment at the requested start/end offsets.
///
/// End control points move radially along the ray through the center; the
/// interior control points are recovered by intersecting the tangent line
/// at each shifted endpoint with the ray from the center through the
/// original interior control point, which preserves the end tangent
/// directions exactly.
fn offset_segment(segment: &BezierCubic, o_start: f64, o_end: f64, center_left: bool) -> BezierCubic {
    let [q0, q1, q2, q3] = *segment.points();
    let tan_start = (q1 - q0).normalize();
    let tan_end = (q3 - q2).normalize();

    let Some(center) = segment_center(segment) else {
        // Parallel end normals: plain lateral translation.
        let n_start = left_normal(tan_start);
        let n_end = left_normal(tan_end);
        return BezierCubic::from_points([
            q0 + n_start * o_start,
            q1 + n_start * o_start,
            q2 + n_end * o_end,
            q3 + n_end * o_end,
        ]);
    };

    let sign = if center_left { 1.0 } else { -1.0 };
    let e0 = q0 + (center - q0).normalize() * (o_start * sign);
    let e3 = q3 + (center - q3).normalize() * (o_end * sign);

    let n1 = line_line_point(e0, tan_start, center, q1 - center)
        .unwrap_or(e0 + tan_start * (q1 - q0).norm());
    let n2 = line_line_point(e3, tan_end, center, q2 - center)
        .unwrap_or(e3 - tan_end * (q3 - q2).norm());
    BezierCubic::from_points([e0, n1, n2, e3])
}
