use super::{cross_2d, Point2, Vector2, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not
/// parallel.
#[must_use]
pub fn line_line_intersect(p1: Point2, d1: Vector2, p2: Point2, d2: Vector2) -> Option<(f64, f64)> {
    let cross = cross_2d(d1, d2);
    if cross.abs() < TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Intersection point of two lines, if not parallel.
#[must_use]
pub fn line_line_point(p1: Point2, d1: Vector2, p2: Point2, d2: Vector2) -> Option<Point2> {
    line_line_intersect(p1, d1, p2, d2).map(|(t, _)| p1 + d1 * t)
}
