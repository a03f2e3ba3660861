pub mod distance_2d;
pub mod fresnel;
pub mod intersect_2d;

use std::f64::consts::{PI, TAU};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Normalizes an angle to the half-open interval (−π, π].
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Returns the unit vector pointing along `angle` (radians).
#[must_use]
pub fn heading_vector(angle: f64) -> Vector2 {
    Vector2::new(angle.cos(), angle.sin())
}

/// Returns the left-hand unit normal of a unit direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: Vector2, b: Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_angle_range() {
        assert!((normalize_angle(0.0)).abs() < TOLERANCE);
        assert!((normalize_angle(PI) - PI).abs() < TOLERANCE);
        assert!((normalize_angle(-PI) - PI).abs() < TOLERANCE);
        assert!((normalize_angle(3.0 * PI) - PI).abs() < TOLERANCE);
        assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < TOLERANCE);
        assert!((normalize_angle(-0.25) + 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn left_normal_rotates_ccw() {
        let n = left_normal(Vector2::new(1.0, 0.0));
        assert!((n.x).abs() < TOLERANCE);
        assert!((n.y - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn cross_2d_sign() {
        assert!(cross_2d(Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)) > 0.0);
        assert!(cross_2d(Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0)) < 0.0);
    }
}
