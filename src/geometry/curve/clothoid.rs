use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::OnceLock;

use crate::error::{ArgumentError, GeometryError, NumericError, Result};
use crate::geometry::DirectedPoint;
use crate::math::fresnel::fresnel;
use crate::math::{heading_vector, left_normal, normalize_angle, Point2, Vector2, TOLERANCE};

use super::ContinuousCurve;

/// Angles below a tenth of a degree are treated as aligned when
/// classifying the two-point fit.
pub(crate) const ANGLE_TOLERANCE: f64 = TAU / 3600.0;

const SOLVER_TOLERANCE: f64 = 1e-8;
const MAX_SOLVER_ITERATIONS: usize = 100;
/// Hard cap for the bracket expansion of the shape parameter.
const MAX_BRACKET: f64 = 1e4;

/// A curve of linearly varying curvature fitted between two oriented
/// points, or built from a scale parameter and two curvatures.
///
/// The constant-curvature fit (a circular arc) is kept as a branch of the
/// same type so that all downstream length and curvature logic is shared.
/// The two-point fit stores the supplied end point; the small residual
/// between it and the analytic end point is absorbed by a correction shift
/// computed once on first evaluation and blended in proportionally to the
/// fraction, so `point_at(0)` and `point_at(1)` reproduce the inputs
/// exactly.
#[derive(Debug, Clone)]
pub struct Clothoid {
    start: DirectedPoint,
    end: DirectedPoint,
    form: Form,
    shift: OnceLock<Vector2>,
}

#[derive(Debug, Clone)]
enum Form {
    Arc(ArcForm),
    Spiral(SpiralForm),
}

#[derive(Debug, Clone, Copy)]
struct ArcForm {
    /// Positive radius; the sign of `sweep` carries the turn direction.
    radius: f64,
    /// Swept angle, positive = left.
    sweep: f64,
}

/// The canonical Fresnel spiral `(C(t), S(t))` mapped into the world by a
/// similarity transform plus two discrete corrections.
#[derive(Debug, Clone, Copy)]
struct SpiralForm {
    /// Similarity scale λ; the conventional clothoid parameter is
    /// A = λ/√π.
    scale: f64,
    /// Fresnel parameter interval; `t1 < t2`.
    t1: f64,
    t2: f64,
    /// Signed curvature-angle bounds α(t1), α(t2) driving the fraction
    /// mapping.
    alpha_min: f64,
    alpha_max: f64,
    /// World position of the canonical origin.
    origin: Point2,
    /// Heading of the canonical x-axis in the world.
    rho: f64,
    /// Traversal runs from t2 down to t1.
    opposite: bool,
    /// The world curve is the mirror image of the canonical spiral.
    reflected: bool,
}

impl SpiralForm {
    fn basis(&self) -> (Vector2, Vector2) {
        let tangent = heading_vector(self.rho);
        let normal = if self.reflected {
            -left_normal(tangent)
        } else {
            left_normal(tangent)
        };
        (tangent, normal)
    }

    /// Maps a length fraction to the Fresnel parameter via the signed
    /// curvature angle α(t) = sign(t)·πt²/2.
    fn t_at(&self, fraction: f64) -> f64 {
        let span = self.alpha_max - self.alpha_min;
        let alpha = if self.opposite {
            self.alpha_max - fraction * span
        } else {
            self.alpha_min + fraction * span
        };
        alpha.signum() * (2.0 * alpha.abs() / PI).sqrt()
    }

    fn point(&self, t: f64) -> Point2 {
        let (tangent, normal) = self.basis();
        let (c, s) = fresnel(t);
        self.origin + (tangent * c + normal * s) * self.scale
    }

    fn direction(&self, t: f64) -> f64 {
        let tau = FRAC_PI_2 * t * t;
        let heading = if self.reflected {
            self.rho - tau
        } else {
            self.rho + tau
        };
        if self.opposite {
            heading + PI
        } else {
            heading
        }
    }

    fn curvature(&self, t: f64) -> f64 {
        let mut sigma = if self.reflected { -1.0 } else { 1.0 };
        if self.opposite {
            sigma = -sigma;
        }
        sigma * PI * t / self.scale
    }
}

impl Clothoid {
    /// Fits a clothoid (or its constant-curvature arc degeneration)
    /// between two oriented points.
    ///
    /// # Errors
    ///
    /// Returns an error when the points coincide, when both headings align
    /// with the chord (a straight segment, see [`super::Curve::between`]),
    /// or when the shape solver fails under both the C- and S-shape
    /// hypotheses.
    pub fn between(start: DirectedPoint, end: DirectedPoint) -> Result<Self> {
        let chord = end.point - start.point;
        let d = chord.norm();
        if d < TOLERANCE {
            return Err(GeometryError::ZeroChord.into());
        }
        let omega = chord.y.atan2(chord.x);
        let phi1 = normalize_angle(start.direction - omega);
        let phi2 = normalize_angle(omega - end.direction);

        if phi1.abs() < ANGLE_TOLERANCE && phi2.abs() < ANGLE_TOLERANCE {
            return Err(GeometryError::Degenerate(
                "both headings align with the chord; use a straight segment".into(),
            )
            .into());
        }
        if (phi2 - phi1).abs() < ANGLE_TOLERANCE {
            return Ok(Self::arc(start, end, d, phi1));
        }
        Self::spiral(start, end, d, omega, phi1, phi2)
    }

    /// Builds a spiral from a start point, the clothoid parameter `a`, and
    /// the start/end curvatures; the length follows as `a²·|Δcurvature|`.
    ///
    /// # Errors
    ///
    /// Returns an error when `a` is not strictly positive or the
    /// curvatures are equal (zero length).
    pub fn with_curvatures(
        start: DirectedPoint,
        a: f64,
        start_curvature: f64,
        end_curvature: f64,
    ) -> Result<Self> {
        if a <= 0.0 {
            return Err(ArgumentError::NonPositive {
                parameter: "a",
                value: a,
            }
            .into());
        }
        if (end_curvature - start_curvature).abs() < TOLERANCE {
            return Err(ArgumentError::Invalid(
                "start and end curvature are equal; the curve has zero length".into(),
            )
            .into());
        }
        let sqrt_pi = PI.sqrt();
        let scale = a * sqrt_pi;
        // The canonical spiral runs in the increasing-curvature direction;
        // a decreasing input is realized as its mirror image.
        let reflected = start_curvature > end_curvature;
        let (t1, t2) = if reflected {
            (-start_curvature * a / sqrt_pi, -end_curvature * a / sqrt_pi)
        } else {
            (start_curvature * a / sqrt_pi, end_curvature * a / sqrt_pi)
        };
        let tau1 = FRAC_PI_2 * t1 * t1;
        let rho = if reflected {
            start.direction + tau1
        } else {
            start.direction - tau1
        };

        let mut form = SpiralForm {
            scale,
            t1,
            t2,
            alpha_min: alpha_of(t1),
            alpha_max: alpha_of(t2),
            origin: Point2::origin(),
            rho,
            opposite: false,
            reflected,
        };
        let (tangent, normal) = form.basis();
        let (c1, s1) = fresnel(t1);
        form.origin = start.point - (tangent * c1 + normal * s1) * scale;

        let end = DirectedPoint::new(form.point(t2), form.direction(t2));
        Ok(Self {
            start,
            end,
            form: Form::Spiral(form),
            shift: OnceLock::new(),
        })
    }

    fn arc(start: DirectedPoint, end: DirectedPoint, d: f64, phi1: f64) -> Self {
        // Negative r puts the center on the left (a left turn).
        let r = 0.5 * d / phi1.sin();
        let left = r < 0.0;
        let mut sweep = normalize_angle(end.direction - start.direction);
        if left && sweep < 0.0 {
            sweep += TAU;
        }
        if !left && sweep > 0.0 {
            sweep -= TAU;
        }
        Self {
            start,
            end,
            form: Form::Arc(ArcForm {
                radius: r.abs(),
                sweep,
            }),
            shift: OnceLock::new(),
        }
    }

    fn spiral(
        start: DirectedPoint,
        end: DirectedPoint,
        d: f64,
        omega: f64,
        phi1: f64,
        phi2: f64,
    ) -> Result<Self> {
        let (mut phi1, mut phi2) = (phi1, phi2);

        // Normalize so |phi2| >= |phi1|, solving the reversed curve if
        // needed.
        let opposite = phi2.abs() < phi1.abs();
        if opposite {
            let (a, b) = (-phi2, -phi1);
            phi1 = a;
            phi2 = b;
        }
        // Normalize so phi2 > 0; when it already is, the canonical
        // (left-winding) spiral must be mirrored.
        let reflected = phi2 >= 0.0;
        if !reflected {
            phi1 = -phi1;
            phi2 = -phi2;
        }

        let t_total = t_of_alpha(phi1 + phi2);
        let (c_tot, s_tot) = fresnel(t_total);
        let h = s_tot * phi1.cos() - c_tot * phi1.sin();
        let c_shaped = phi1 > 0.0 && h < 0.0;

        // One retry under the alternate shape hypothesis before giving up.
        let (theta, c_shaped) = match solve_shape(phi1, phi2, c_shaped) {
            Ok(theta) => (theta, c_shaped),
            Err(_) => (solve_shape(phi1, phi2, !c_shaped)?, !c_shaped),
        };

        let (t1, t2) = shape_interval(theta, phi1, phi2, c_shaped);
        let (c1, s1) = fresnel(t1);
        let (c2, s2) = fresnel(t2);
        let scale = d / (c2 - c1).hypot(s2 - s1);

        let gamma = theta + phi1;
        let omega_r = if opposite {
            normalize_angle(omega + PI)
        } else {
            omega
        };
        let rho = if reflected {
            omega_r + gamma
        } else {
            omega_r - gamma
        };

        let mut form = SpiralForm {
            scale,
            t1,
            t2,
            alpha_min: alpha_of(t1),
            alpha_max: alpha_of(t2),
            origin: Point2::origin(),
            rho,
            opposite,
            reflected,
        };
        let (tangent, normal) = form.basis();
        let t_start = if opposite { t2 } else { t1 };
        let (ca, sa) = fresnel(t_start);
        form.origin = start.point - (tangent * ca + normal * sa) * scale;

        // The correction shift absorbs numerical noise only; an analytic
        // end point far from the supplied one means the solver landed on a
        // wrong root.
        let t_end = if opposite { t1 } else { t2 };
        if (end.point - form.point(t_end)).norm() > d * 1e-2 {
            return Err(NumericError::NoConvergence {
                stage: "clothoid shape fit",
                iterations: MAX_SOLVER_ITERATIONS,
            }
            .into());
        }

        Ok(Self {
            start,
            end,
            form: Form::Spiral(form),
            shift: OnceLock::new(),
        })
    }

    /// Returns true for the constant-curvature (arc) branch.
    #[must_use]
    pub fn is_arc(&self) -> bool {
        matches!(self.form, Form::Arc(_))
    }

    /// Returns the radius for the arc branch.
    #[must_use]
    pub fn radius(&self) -> Option<f64> {
        match &self.form {
            Form::Arc(arc) => Some(arc.radius),
            Form::Spiral(_) => None,
        }
    }

    /// Returns the clothoid parameter A for the spiral branch.
    #[must_use]
    pub fn scale_parameter(&self) -> Option<f64> {
        match &self.form {
            Form::Arc(_) => None,
            Form::Spiral(spiral) => Some(spiral.scale / PI.sqrt()),
        }
    }

    /// Residual between the supplied end point and the analytic one,
    /// computed once and blended in proportionally to the fraction.
    fn shift(&self) -> Vector2 {
        *self
            .shift
            .get_or_init(|| self.end.point - self.raw_point_at(1.0))
    }

    fn raw_point_at(&self, fraction: f64) -> Point2 {
        match &self.form {
            Form::Arc(arc) => {
                let side = if arc.sweep > 0.0 { 1.0 } else { -1.0 };
                let center = self.start.point
                    + left_normal(heading_vector(self.start.direction)) * (arc.radius * side);
                let v = self.start.point - center;
                let angle = arc.sweep * fraction;
                let (sin, cos) = angle.sin_cos();
                center + Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
            }
            Form::Spiral(spiral) => spiral.point(spiral.t_at(fraction)),
        }
    }
}

impl ContinuousCurve for Clothoid {
    fn start(&self) -> DirectedPoint {
        self.start
    }

    fn end(&self) -> DirectedPoint {
        self.end
    }

    fn start_curvature(&self) -> f64 {
        match &self.form {
            Form::Arc(arc) => arc.sweep.signum() / arc.radius,
            Form::Spiral(spiral) => spiral.curvature(spiral.t_at(0.0)),
        }
    }

    fn end_curvature(&self) -> f64 {
        match &self.form {
            Form::Arc(arc) => arc.sweep.signum() / arc.radius,
            Form::Spiral(spiral) => spiral.curvature(spiral.t_at(1.0)),
        }
    }

    fn length(&self) -> f64 {
        match &self.form {
            Form::Arc(arc) => arc.radius * arc.sweep.abs(),
            Form::Spiral(spiral) => spiral.scale * (spiral.t2 - spiral.t1),
        }
    }

    fn point_at(&self, fraction: f64) -> Point2 {
        let f = fraction.clamp(0.0, 1.0);
        self.raw_point_at(f) + self.shift() * f
    }

    fn direction_at(&self, fraction: f64) -> f64 {
        let f = fraction.clamp(0.0, 1.0);
        match &self.form {
            Form::Arc(arc) => self.start.direction + arc.sweep * f,
            Form::Spiral(spiral) => spiral.direction(spiral.t_at(f)),
        }
    }
}

/// Signed curvature angle swept from the canonical origin to `t`.
fn alpha_of(t: f64) -> f64 {
    t.signum() * FRAC_PI_2 * t * t
}

/// Inverse of [`alpha_of`] for non-negative angles.
fn t_of_alpha(alpha: f64) -> f64 {
    (2.0 * alpha.max(0.0) / PI).sqrt()
}

/// The Fresnel interval implied by a shape parameter: a C-shaped segment
/// keeps one curvature sign, an S-shaped one crosses zero.
fn shape_interval(theta: f64, phi1: f64, phi2: f64, c_shaped: bool) -> (f64, f64) {
    let t2 = t_of_alpha(theta + phi1 + phi2);
    let t1 = if c_shaped {
        t_of_alpha(theta)
    } else {
        -t_of_alpha(theta)
    };
    (t1, t2)
}

/// Chord-angle residual of the candidate interval; the fit is exact where
/// this crosses zero.
fn fit_residual(theta: f64, phi1: f64, phi2: f64, c_shaped: bool) -> f64 {
    let (t1, t2) = shape_interval(theta, phi1, phi2, c_shaped);
    let (c1, s1) = fresnel(t1);
    let (c2, s2) = fresnel(t2);
    let (sin, cos) = (theta + phi1).sin_cos();
    (s2 - s1) * cos - (c2 - c1) * sin
}

/// Solves `fit_residual = 0` for the shape parameter with a bracketed
/// secant iteration, falling back to bisection when a secant step leaves
/// the bracket.
fn solve_shape(phi1: f64, phi2: f64, c_shaped: bool) -> Result<f64> {
    // Antisymmetric deflections collapse the Fresnel interval to zero
    // length at theta = 0, where the residual vanishes identically; that
    // root carries no geometry, so start the bracket just past it.
    let degenerate_at_zero = {
        let (t1, t2) = shape_interval(0.0, phi1, phi2, c_shaped);
        t2 - t1 < TOLERANCE
    };
    let mut lo = if degenerate_at_zero {
        SOLVER_TOLERANCE
    } else {
        0.0
    };
    let mut f_lo = fit_residual(lo, phi1, phi2, c_shaped);
    if f_lo.abs() < SOLVER_TOLERANCE {
        if !degenerate_at_zero {
            return Ok(lo);
        }
        return Err(NumericError::NoBracket {
            stage: "clothoid shape fit",
        }
        .into());
    }
    let mut hi = (phi1 + phi2).max(0.1);
    let mut f_hi = fit_residual(hi, phi1, phi2, c_shaped);
    while f_lo * f_hi > 0.0 {
        hi *= 2.0;
        if hi > MAX_BRACKET {
            return Err(NumericError::NoBracket {
                stage: "clothoid shape fit",
            }
            .into());
        }
        f_hi = fit_residual(hi, phi1, phi2, c_shaped);
    }

    let (mut x0, mut f0) = (lo, f_lo);
    let (mut x1, mut f1) = (hi, f_hi);
    for _ in 0..MAX_SOLVER_ITERATIONS {
        let secant = x1 - f1 * (x1 - x0) / (f1 - f0);
        let x2 = if secant.is_finite() && secant > lo && secant < hi {
            secant
        } else {
            0.5 * (lo + hi)
        };
        let f2 = fit_residual(x2, phi1, phi2, c_shaped);
        if f2.abs() < SOLVER_TOLERANCE || (x2 - x1).abs() < SOLVER_TOLERANCE {
            return Ok(x2);
        }
        if f_lo * f2 < 0.0 {
            hi = x2;
        } else {
            lo = x2;
            f_lo = f2;
        }
        (x0, f0) = (x1, f1);
        (x1, f1) = (x2, f2);
    }
    Err(NumericError::NoConvergence {
        stage: "clothoid shape fit",
        iterations: MAX_SOLVER_ITERATIONS,
    }
    .into())
}
