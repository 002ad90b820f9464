//! Special mathematical functions.
//!
//! Numerical approximations backing the exact binomial tail and the
//! normal-approximation intervals reported alongside Monte Carlo estimates.

/// 1/√(2π) ≈ 0.3989422804014327
const FRAC_1_SQRT_2PI: f64 = 0.3989422804014326779399460599343818684758586311649;

/// Approximation of the standard normal CDF Φ(x) = P(Z ≤ x) for Z ~ N(0,1).
///
/// # Algorithm
/// Abramowitz & Stegun formula 26.2.17, polynomial approximation with
/// Horner evaluation.
///
/// Reference: Abramowitz & Stegun (1964), *Handbook of Mathematical
/// Functions*, formula 26.2.17, p. 932.
///
/// # Accuracy
/// Maximum absolute error < 7.5 × 10⁻⁸.
///
/// # Examples
/// ```
/// use u_dicetail::special::standard_normal_cdf;
/// assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!((standard_normal_cdf(1.96) - 0.975).abs() < 1e-3);
/// ```
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }

    // Φ(-x) = 1 - Φ(x)
    let abs_x = x.abs();
    let k = 1.0 / (1.0 + 0.2316419 * abs_x);
    let phi = FRAC_1_SQRT_2PI * (-0.5 * abs_x * abs_x).exp();
    let poly = k
        * (0.319381530
            + k * (-0.356563782 + k * (1.781477937 + k * (-1.821255978 + k * 1.330274429))));

    let cdf_abs = 1.0 - phi * poly;
    if x >= 0.0 {
        cdf_abs
    } else {
        1.0 - cdf_abs
    }
}

/// Approximation of the inverse standard normal CDF (quantile function).
///
/// Given a probability `p ∈ (0, 1)`, returns `z` such that `Φ(z) = p`.
/// Used to turn a confidence level into the half-width multiplier of a
/// normal-approximation interval.
///
/// # Algorithm
/// Abramowitz & Stegun formula 26.2.23, rational approximation.
///
/// # Accuracy
/// Maximum absolute error < 4.5 × 10⁻⁴.
///
/// # Returns
/// - `f64::NAN` if `p` is outside `[0, 1]` or NaN.
/// - `f64::NEG_INFINITY` if `p == 0.0`, `f64::INFINITY` if `p == 1.0`.
///
/// # Examples
/// ```
/// use u_dicetail::special::inverse_normal_cdf;
/// assert!((inverse_normal_cdf(0.975) - 1.96).abs() < 0.01);
/// ```
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let (q, sign) = if p > 0.5 { (1.0 - p, 1.0) } else { (p, -1.0) };
    let t = (-2.0 * q.ln()).sqrt();

    const C0: f64 = 2.515517;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    let z = t - (C0 + C1 * t + C2 * t * t) / (1.0 + D1 * t + D2 * t * t + D3 * t * t * t);
    sign * z
}

/// Lanczos approximation of ln Γ(x).
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0.
///
/// # Examples
/// ```
/// use u_dicetail::special::ln_gamma;
/// // Γ(5) = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Γ(x)Γ(1−x) = π / sin(πx)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Log of the Beta function: `ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b)`.
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Binomial coefficient C(n, k) as `f64`.
///
/// # Algorithm
/// Multiplicative formula over the shorter side, `C(n, k) = Π (n−k+i)/i`
/// for i = 1..=min(k, n−k). Every partial product is itself a binomial
/// coefficient, so the result is exact while it stays below 2⁵³.
///
/// # Returns
/// `0.0` when `k > n`.
///
/// # Examples
/// ```
/// use u_dicetail::special::binomial_coefficient;
/// assert_eq!(binomial_coefficient(5, 3), 10.0);
/// assert_eq!(binomial_coefficient(52, 5), 2_598_960.0);
/// assert_eq!(binomial_coefficient(3, 5), 0.0);
/// ```
pub fn binomial_coefficient(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut c = 1.0_f64;
    for i in 1..=k {
        c = c * (n - k + i) as f64 / i as f64;
    }
    c.round()
}

/// Natural log of the binomial coefficient, ln C(n, k).
///
/// Finite for every `k ≤ n`, including the range where [`binomial_coefficient`]
/// overflows `f64`. Returns `-∞` when `k > n`.
///
/// # Examples
/// ```
/// use u_dicetail::special::ln_binomial_coefficient;
/// assert!((ln_binomial_coefficient(5, 3) - 10.0_f64.ln()).abs() < 1e-12);
/// assert!(ln_binomial_coefficient(2000, 1000).is_finite());
/// ```
pub fn ln_binomial_coefficient(n: u32, k: u32) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    let n = n as f64;
    let k = k as f64;
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

// ============================================================================
// Regularized Incomplete Beta Function
// ============================================================================

/// Regularized incomplete beta function I_x(a, b).
///
/// # Definition
/// ```text
/// I_x(a, b) = B(x; a, b) / B(a, b)
/// ```
///
/// For integer arguments this is the binomial upper tail:
/// `P(X ≥ k) = I_p(k, m − k + 1)` for X ~ Binomial(m, p), 1 ≤ k ≤ m.
///
/// # Algorithm
/// Continued fraction representation (Lentz's method) with the
/// symmetry relation I_x(a,b) = 1 − I_{1−x}(b,a) chosen for convergence.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.4.
///
/// # Accuracy
/// Relative error < 1e-10 for typical parameter ranges.
///
/// # Examples
/// ```
/// use u_dicetail::special::regularized_incomplete_beta;
/// assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
/// assert_eq!(regularized_incomplete_beta(1.0, 2.0, 3.0), 1.0);
/// assert!((regularized_incomplete_beta(0.5, 1.0, 1.0) - 0.5).abs() < 1e-10);
/// ```
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_prefix = a * x.ln() + b * (1.0 - x).ln() - ln_beta(a, b);
    let cf = beta_cf(x, a, b);
    (ln_prefix.exp() / a) * cf
}

/// Continued fraction for the incomplete beta function (Lentz's algorithm).
///
/// Needs O(√max(a, b)) iterations, so the cap grows with the arguments.
fn beta_cf(x: f64, a: f64, b: f64) -> f64 {
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-30;
    let max_iter = 200 + 10 * a.max(b).sqrt() as usize;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - (a + b) * x / (a + 1.0));
    let mut h = d;

    for m in 1..=max_iter {
        let m_f = m as f64;
        let num_even = m_f * (b - m_f) * x / ((a + 2.0 * m_f - 1.0) * (a + 2.0 * m_f));
        d = 1.0 / guard(1.0 + num_even * d);
        c = guard(1.0 + num_even / c);
        h *= d * c;

        let num_odd =
            -(a + m_f) * (a + b + m_f) * x / ((a + 2.0 * m_f) * (a + 2.0 * m_f + 1.0));
        d = 1.0 / guard(1.0 + num_odd * d);
        c = guard(1.0 + num_odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn cdf_in_zero_one(x in -6.0_f64..6.0) {
            let c = standard_normal_cdf(x);
            prop_assert!((0.0..=1.0).contains(&c), "CDF({x}) = {c} out of [0,1]");
        }

        #[test]
        fn inverse_roundtrip(p in 0.001_f64..0.999) {
            let z = inverse_normal_cdf(p);
            let err = (standard_normal_cdf(z) - p).abs();
            prop_assert!(err < 0.005, "roundtrip error {} for p={}", err, p);
        }

        #[test]
        fn inc_beta_in_01(x in 0.01_f64..0.99, a in 0.5_f64..10.0, b in 0.5_f64..10.0) {
            let result = regularized_incomplete_beta(x, a, b);
            prop_assert!(
                (0.0..=1.0).contains(&result),
                "I_{x}({a},{b}) = {result} out of [0,1]"
            );
        }

        #[test]
        fn inc_beta_complementary(x in 0.01_f64..0.99, a in 0.5_f64..10.0, b in 0.5_f64..10.0) {
            let ix = regularized_incomplete_beta(x, a, b);
            let i1x = regularized_incomplete_beta(1.0 - x, b, a);
            prop_assert!(
                (ix + i1x - 1.0).abs() < 1e-8,
                "complementary: {ix} + {i1x} != 1"
            );
        }

        #[test]
        fn binomial_row_sums_to_power_of_two(n in 0_u32..50) {
            let sum: f64 = (0..=n).map(|k| binomial_coefficient(n, k)).sum();
            prop_assert_eq!(sum, 2.0_f64.powi(n as i32));
        }
    }
}
