//! The binomial distribution and the exact dice tail.
//!
//! The number of target faces among `m` fair dice is Binomial(m, 1/6),
//! so the probability that a repetition succeeds is the upper tail
//!
//! ```text
//! P(X ≥ n) = Σ_{k=n}^{m} C(m,k) (1/6)^k (5/6)^(m−k)
//! ```
//!
//! This module evaluates that tail two independent ways (direct
//! summation and the regularized incomplete beta identity) and serves as
//! ground truth for the Monte Carlo estimator. Direct summation covers
//! up to [`DIRECT_SUM_MAX_TRIALS`] dice; larger `m` use the beta identity,
//! which stays finite for any `u32` count.
//!
//! | Quantity | Formula |
//! |---|---|
//! | Mean | m·p |
//! | Variance | m·p·(1−p) |
//! | P(X ≥ k), 1 ≤ k ≤ m | I_p(k, m−k+1) |

use crate::special;
use crate::stats::kahan_sum;

/// Probability that a single fair die shows the target face.
pub const FACE_PROBABILITY: f64 = 1.0 / 6.0;

/// Largest trial count for which [`Binomial::survival_by_sum`] sums PMF
/// terms. Above it the tail comes from the incomplete beta identity.
pub const DIRECT_SUM_MAX_TRIALS: u32 = 1000;

/// Error type for invalid distribution parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    /// Parameters violate distribution constraints.
    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),
}

// ============================================================================
// Binomial Distribution
// ============================================================================

/// Binomial distribution: number of successes in `trials` independent
/// Bernoulli(p) experiments.
///
/// # Examples
/// ```
/// use u_dicetail::distributions::Binomial;
/// let b = Binomial::new(5, 1.0 / 6.0).unwrap();
/// assert!((b.mean() - 5.0 / 6.0).abs() < 1e-15);
/// assert!((b.survival(3) - 0.035493827).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Binomial {
    trials: u32,
    p: f64,
}

impl Binomial {
    /// Creates a new binomial distribution.
    ///
    /// # Errors
    /// Returns `Err` if `p` is not a finite value in `[0, 1]`.
    pub fn new(trials: u32, p: f64) -> Result<Self, DistributionError> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(DistributionError::InvalidParameters(format!(
                "Binomial requires 0 <= p <= 1, got p={p}"
            )));
        }
        Ok(Self { trials, p })
    }

    /// Distribution of target faces among `draws` fair dice.
    pub fn dice(draws: u32) -> Self {
        Self {
            trials: draws,
            p: FACE_PROBABILITY,
        }
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn mean(&self) -> f64 {
        self.trials as f64 * self.p
    }

    pub fn variance(&self) -> f64 {
        self.trials as f64 * self.p * (1.0 - self.p)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// PMF: P(X = k) = C(m,k) p^k (1−p)^(m−k). Zero for `k > m`.
    ///
    /// Up to [`DIRECT_SUM_MAX_TRIALS`] trials the product is formed
    /// directly; beyond that it is evaluated in log space, where C(m,k)
    /// would overflow and p^k underflow.
    pub fn pmf(&self, k: u32) -> f64 {
        if k > self.trials {
            return 0.0;
        }
        let m = self.trials;
        if self.p == 0.0 {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        if self.p == 1.0 {
            return if k == m { 1.0 } else { 0.0 };
        }
        if m <= DIRECT_SUM_MAX_TRIALS {
            // C(1000, 500) < f64::MAX and the powers are at most 1
            return special::binomial_coefficient(m, k)
                * self.p.powi(k as i32)
                * (1.0 - self.p).powi((m - k) as i32);
        }
        let ln_pmf = special::ln_binomial_coefficient(m, k)
            + k as f64 * self.p.ln()
            + (m - k) as f64 * (-self.p).ln_1p();
        ln_pmf.exp()
    }

    /// CDF: P(X ≤ k), clamped to [0, 1].
    pub fn cdf(&self, k: u32) -> f64 {
        if k >= self.trials {
            return 1.0;
        }
        (1.0 - self.survival(k + 1)).clamp(0.0, 1.0)
    }

    /// Survival function P(X ≥ k) via the incomplete beta identity.
    ///
    /// Returns `1.0` for `k == 0` and `0.0` for `k > m`.
    pub fn survival(&self, k: u32) -> f64 {
        if k == 0 {
            return 1.0;
        }
        if k > self.trials {
            return 0.0;
        }
        let a = k as f64;
        let b = (self.trials - k + 1) as f64;
        special::regularized_incomplete_beta(self.p, a, b).clamp(0.0, 1.0)
    }

    /// P(X ≥ k) by compensated summation of the PMF terms.
    ///
    /// Terms are generated by the ratio recurrence
    /// `pmf(j+1) = pmf(j) · (m−j)/(j+1) · p/(1−p)`, walking outward from
    /// the larger of `k` and the mode so the starting term never
    /// underflows. Serves as an independent check on
    /// [`Binomial::survival`] up to [`DIRECT_SUM_MAX_TRIALS`] trials and
    /// delegates to it above that.
    pub fn survival_by_sum(&self, k: u32) -> f64 {
        if k == 0 {
            return 1.0;
        }
        if k > self.trials {
            return 0.0;
        }
        if self.trials > DIRECT_SUM_MAX_TRIALS {
            return self.survival(k);
        }
        if self.p == 0.0 {
            return 0.0;
        }
        if self.p == 1.0 {
            return 1.0;
        }

        let m = self.trials;
        let ratio = self.p / (1.0 - self.p);
        let mode = (((m as f64 + 1.0) * self.p).floor() as u32).min(m);
        let start = mode.max(k);
        let peak = self.pmf(start);

        let mut terms = Vec::with_capacity((m - k + 1) as usize);
        terms.push(peak);
        let mut term = peak;
        for j in start..m {
            term *= (m - j) as f64 / (j + 1) as f64 * ratio;
            terms.push(term);
        }
        let mut term = peak;
        for j in (k + 1..=start).rev() {
            term *= j as f64 / ((m - j + 1) as f64 * ratio);
            terms.push(term);
        }
        kahan_sum(&terms).clamp(0.0, 1.0)
    }
}

/// Exact probability that at least `threshold` of `draws` fair dice show
/// the target face.
///
/// # Returns
/// `1.0` when `threshold == 0`, `0.0` when `threshold > draws`. Always
/// finite, whatever `draws` is.
///
/// # Examples
/// ```
/// use u_dicetail::distributions::dice_tail_probability;
/// assert_eq!(dice_tail_probability(5, 0), 1.0);
/// assert!((dice_tail_probability(4, 4) - 6.0_f64.powi(-4)).abs() < 1e-15);
/// assert!((dice_tail_probability(5, 3) - 0.03549).abs() < 1e-5);
/// ```
pub fn dice_tail_probability(draws: u32, threshold: u32) -> f64 {
    Binomial::dice(draws).survival_by_sum(threshold)
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn survival_in_01(m in 1_u32..60, k in 0_u32..70, p in 0.0_f64..=1.0) {
            let b = Binomial::new(m, p).unwrap();
            let s = b.survival(k);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn survival_non_increasing(m in 1_u32..40, p in 0.01_f64..0.99) {
            let b = Binomial::new(m, p).unwrap();
            let mut prev = 1.0;
            for k in 0..=m + 1 {
                let s = b.survival_by_sum(k);
                prop_assert!(s <= prev + 1e-12, "tail increased at k={k}");
                prev = s;
            }
        }

        #[test]
        fn beta_and_sum_agree(m in 1_u32..30, k in 1_u32..30, p in 0.05_f64..0.95) {
            prop_assume!(k <= m);
            let b = Binomial::new(m, p).unwrap();
            prop_assert!((b.survival(k) - b.survival_by_sum(k)).abs() < 1e-8);
        }
    }
}
