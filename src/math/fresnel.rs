//! Fresnel integrals C(t) and S(t).
//!
//! Rational minimax approximations after Cephes `fresnl`: a polynomial
//! ratio in t⁴ on the central interval, an asymptotic auxiliary-function
//! expansion elsewhere, and the limit value (0.5, 0.5) for very large t.

use std::f64::consts::{FRAC_PI_2, PI};

/// S(x) numerator, |x| < 2.5625.
const SN: [f64; 6] = [
    -2.991_819_194_010_198_5e3,
    7.088_400_452_577_385_8e5,
    -6.297_414_862_058_625_0e7,
    2.548_908_805_733_763_6e9,
    -4.429_795_180_596_978_0e10,
    3.180_162_978_765_678_2e11,
];

/// S(x) denominator, |x| < 2.5625 (leading coefficient 1 implied).
const SD: [f64; 6] = [
    2.813_762_688_899_943_2e2,
    4.558_478_108_065_325_8e4,
    5.173_438_887_700_964_0e6,
    4.193_202_458_981_112_3e8,
    2.244_117_956_453_409_2e10,
    6.073_663_894_900_846_4e11,
];

/// C(x) numerator, |x| < 2.5625.
const CN: [f64; 6] = [
    -4.988_431_145_735_735_5e-8,
    9.504_280_628_298_596_0e-6,
    -6.451_914_356_839_650_5e-4,
    1.888_433_193_967_038_5e-2,
    -2.055_259_009_550_138_9e-1,
    9.999_999_999_999_999_9e-1,
];

/// C(x) denominator, |x| < 2.5625.
const CD: [f64; 7] = [
    3.999_829_689_724_959_8e-12,
    9.154_392_157_746_574_8e-10,
    1.250_018_624_795_988_2e-7,
    1.222_627_890_241_790_3e-5,
    8.680_295_429_417_843_0e-4,
    4.121_420_907_221_997_9e-2,
    1.0,
];

/// Auxiliary function f(u) numerator.
const FN: [f64; 10] = [
    4.215_435_550_436_775_4e-1,
    1.434_079_197_807_588_8e-1,
    1.152_209_550_735_857_6e-2,
    3.450_179_397_825_740_3e-4,
    4.636_137_492_878_673_2e-6,
    3.055_689_837_902_576_0e-8,
    1.023_045_141_649_072_3e-10,
    1.720_107_432_681_618_3e-13,
    1.342_832_762_330_627_6e-16,
    3.763_297_112_699_878_9e-20,
];

/// Auxiliary function f(u) denominator (leading coefficient 1 implied).
const FD: [f64; 10] = [
    7.515_863_983_533_789_5e-1,
    1.168_889_258_591_913_8e-1,
    6.440_515_265_088_586_1e-3,
    1.559_344_091_641_530_2e-4,
    1.846_275_673_489_305_5e-6,
    1.126_992_247_639_990_4e-8,
    3.601_400_295_893_713_7e-11,
    5.887_545_336_215_784_1e-14,
    4.520_014_340_741_297_0e-17,
    1.254_432_370_900_112_6e-20,
];

/// Auxiliary function g(u) numerator.
const GN: [f64; 11] = [
    5.044_420_736_433_832_7e-1,
    1.971_028_335_255_234_1e-1,
    1.876_485_840_925_752_5e-2,
    6.840_793_809_153_931_0e-4,
    1.151_388_261_118_842_8e-5,
    9.828_524_436_884_222_4e-8,
    4.453_444_158_617_501_4e-10,
    1.082_680_411_390_208_7e-12,
    1.375_554_606_332_618_0e-15,
    8.363_544_356_306_774_2e-19,
    1.869_587_101_627_832_4e-22,
];

/// Auxiliary function g(u) denominator (leading coefficient 1 implied).
const GD: [f64; 11] = [
    1.474_957_599_251_283_2e0,
    3.377_489_891_200_199_7e-1,
    2.536_037_414_203_388_0e-2,
    8.146_791_071_843_061_8e-4,
    1.275_450_756_677_291_2e-5,
    1.043_145_896_575_719_9e-7,
    4.606_807_281_465_204_3e-10,
    1.102_732_150_662_402_7e-12,
    1.387_965_312_595_788_7e-15,
    8.391_588_162_831_187_0e-19,
    1.869_587_101_627_832_4e-22,
];

/// Evaluates a polynomial in `x` with coefficients in descending order.
fn polevl(x: f64, coef: &[f64]) -> f64 {
    coef.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Evaluates a polynomial in `x` with an implied leading coefficient of 1.
fn p1evl(x: f64, coef: &[f64]) -> f64 {
    coef.iter().fold(1.0, |acc, &c| acc * x + c)
}

/// Evaluates the Fresnel integrals, returning `(C(t), S(t))`.
///
/// C(t) = ∫₀ᵗ cos(πu²/2) du and S(t) = ∫₀ᵗ sin(πu²/2) du. Both are odd
/// functions; negative input negates both outputs. Accurate to roughly
/// 1e-15 relative in the central domain.
#[must_use]
pub fn fresnel(t: f64) -> (f64, f64) {
    let x = t.abs();
    let x2 = x * x;

    let (cc, ss) = if x2 < 2.5625 {
        let u = x2 * x2;
        let ss = x * x2 * polevl(u, &SN) / p1evl(u, &SD);
        let cc = x * polevl(u, &CN) / polevl(u, &CD);
        (cc, ss)
    } else if x > 36974.0 {
        (0.5, 0.5)
    } else {
        // Asymptotic expansion with auxiliary functions f and g.
        let t1 = PI * x2;
        let u = 1.0 / (t1 * t1);
        let f = 1.0 - u * polevl(u, &FN) / p1evl(u, &FD);
        let g = (1.0 / t1) * polevl(u, &GN) / p1evl(u, &GD);

        let w = FRAC_PI_2 * x2;
        let c = w.cos();
        let s = w.sin();
        let pix = PI * x;
        let cc = 0.5 + (f * s - g * c) / pix;
        let ss = 0.5 - (f * c + g * s) / pix;
        (cc, ss)
    };

    if t < 0.0 {
        (-cc, -ss)
    } else {
        (cc, ss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tabulated reference values (Abramowitz & Stegun, table 7.7).
    const REFERENCE: [(f64, f64, f64); 6] = [
        (0.5, 0.492_344_23, 0.064_732_43),
        (1.0, 0.779_893_40, 0.438_259_15),
        (1.5, 0.445_261_18, 0.697_504_96),
        (2.0, 0.488_253_41, 0.343_415_68),
        (2.5, 0.457_413_01, 0.619_181_77),
        (5.0, 0.563_631_19, 0.499_191_38),
    ];

    #[test]
    fn reference_values() {
        for &(t, c_ref, s_ref) in &REFERENCE {
            let (c, s) = fresnel(t);
            assert!((c - c_ref).abs() < 1e-7, "C({t}) = {c}, expected {c_ref}");
            assert!((s - s_ref).abs() < 1e-7, "S({t}) = {s}, expected {s_ref}");
        }
    }

    #[test]
    fn zero() {
        let (c, s) = fresnel(0.0);
        assert!(c.abs() < 1e-15);
        assert!(s.abs() < 1e-15);
    }

    #[test]
    fn odd_symmetry() {
        for &(t, _, _) in &REFERENCE {
            let (cp, sp) = fresnel(t);
            let (cn, sn) = fresnel(-t);
            assert!((cp + cn).abs() < 1e-15);
            assert!((sp + sn).abs() < 1e-15);
        }
    }

    #[test]
    fn asymptotic_limit() {
        let (c, s) = fresnel(40000.0);
        assert!((c - 0.5).abs() < 1e-12, "C = {c}");
        assert!((s - 0.5).abs() < 1e-12, "S = {s}");
    }

    #[test]
    fn continuous_at_branch_boundary() {
        // 2.5625 = 1.6² is the switch between the power series and the
        // asymptotic expansion.
        let (c0, s0) = fresnel(1.6 - 1e-9);
        let (c1, s1) = fresnel(1.6 + 1e-9);
        assert!((c0 - c1).abs() < 1e-7, "C jump: {c0} vs {c1}");
        assert!((s0 - s1).abs() < 1e-7, "S jump: {s0} vs {s1}");
    }
}
