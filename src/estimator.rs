//! Monte Carlo estimation of P(at least n of m dice show a six).
//!
//! One estimation run repeats the following `N` times: throw `m` fair dice,
//! count the sixes, and record a success when the count reaches the
//! threshold `n`. The estimate is `successes / N`.
//!
//! # Accuracy
//!
//! Each repetition is a Bernoulli(p) experiment with p the exact binomial
//! tail, so the estimate has variance p(1−p)/N and standard error
//! √(p̂(1−p̂)/N). Compare against
//! [`dice_tail_probability`](crate::distributions::dice_tail_probability)
//! for ground truth.
//!
//! # Random sources
//!
//! - [`estimate_probability`] / [`run_estimate`] take any infallible
//!   [`Rng`] and draw in batches through a [`DieRoller`].
//! - [`try_estimate_probability`] / [`try_run_estimate`] take a fallible
//!   [`TryRngCore`] (e.g. an OS entropy source) and abort the whole run on
//!   the first source failure.
//!
//! In both cases the arguments are validated before the first draw.

use rand::{Rng, TryRngCore};
use tracing::debug;

use crate::distributions::dice_tail_probability;
use crate::random::{self, DieRoller, TARGET_FACE};
use crate::special::inverse_normal_cdf;

/// Errors raised by an estimation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimateError {
    /// Repetition count, draw count, or threshold out of range. Raised
    /// before any random draw is consumed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The random source failed mid-run. No partial result is produced.
    #[error("random source failure: {0}")]
    RandomSource(String),
}

impl EstimateError {
    /// Returns `true` for [`EstimateError::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, EstimateError::InvalidArgument(_))
    }
}

// ============================================================================
// Trial parameters
// ============================================================================

/// Validated parameters of one estimation run.
///
/// Invariants: `trials ≥ 1`, `draws ≥ 1`, `threshold ≤ draws`.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::TrialParams;
/// let params = TrialParams::new(1000, 5, 3).unwrap();
/// assert_eq!(params.draws(), 5);
/// assert!(TrialParams::new(1000, 3, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialParams {
    trials: u64,
    draws: u32,
    threshold: u32,
}

impl TrialParams {
    /// Validates and builds the parameter triple.
    ///
    /// # Errors
    /// [`EstimateError::InvalidArgument`] if `trials == 0`, `draws == 0`,
    /// or `threshold > draws`.
    pub fn new(trials: u64, draws: u32, threshold: u32) -> Result<Self, EstimateError> {
        if trials == 0 {
            return Err(EstimateError::InvalidArgument(
                "number of repetitions must be at least 1, got 0".into(),
            ));
        }
        if draws == 0 {
            return Err(EstimateError::InvalidArgument(
                "draws per repetition must be at least 1, got 0".into(),
            ));
        }
        if threshold > draws {
            return Err(EstimateError::InvalidArgument(format!(
                "success threshold {threshold} exceeds draws per repetition {draws}"
            )));
        }
        Ok(Self {
            trials,
            draws,
            threshold,
        })
    }

    /// Number of repetitions `N`.
    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Dice thrown per repetition `m`.
    pub fn draws(&self) -> u32 {
        self.draws
    }

    /// Minimum number of sixes for a success `n`.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Exact success probability of one repetition.
    pub fn exact_probability(&self) -> f64 {
        dice_tail_probability(self.draws, self.threshold)
    }
}

/// Builds parameters from signed integers, as they arrive from untyped
/// sources. Negative values are rejected like any other out-of-range value.
impl TryFrom<(i64, i64, i64)> for TrialParams {
    type Error = EstimateError;

    fn try_from((trials, draws, threshold): (i64, i64, i64)) -> Result<Self, Self::Error> {
        if trials < 1 {
            return Err(EstimateError::InvalidArgument(format!(
                "number of repetitions must be at least 1, got {trials}"
            )));
        }
        if draws < 1 {
            return Err(EstimateError::InvalidArgument(format!(
                "draws per repetition must be at least 1, got {draws}"
            )));
        }
        if threshold < 0 {
            return Err(EstimateError::InvalidArgument(format!(
                "success threshold must be non-negative, got {threshold}"
            )));
        }
        let draws = u32::try_from(draws).map_err(|_| {
            EstimateError::InvalidArgument(format!("draws per repetition {draws} is too large"))
        })?;
        // threshold > u32::MAX also exceeds draws, so report it that way
        let threshold = u32::try_from(threshold).unwrap_or(u32::MAX);
        Self::new(trials as u64, draws, threshold)
    }
}

// ============================================================================
// Success accumulator
// ============================================================================

/// Counter of successful repetitions, owned by a single run (or a single
/// chunk of a parallel run).
///
/// Every repetition is recorded exactly once, so `successes ≤ trials`
/// holds by construction. Partial counters combine by summation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuccessCounter {
    successes: u64,
    trials: u64,
}

impl SuccessCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one repetition.
    #[inline]
    pub fn record(&mut self, success: bool) {
        self.trials += 1;
        self.successes += success as u64;
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Combines two partial counts. Associative and commutative.
    pub fn merge(self, other: Self) -> Self {
        Self {
            successes: self.successes + other.successes,
            trials: self.trials + other.trials,
        }
    }

    /// Consumes the counter into the final estimate.
    pub fn into_estimate(self) -> Estimate {
        Estimate {
            successes: self.successes,
            trials: self.trials,
        }
    }
}

// ============================================================================
// Estimate
// ============================================================================

/// Outcome of a Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    successes: u64,
    trials: u64,
}

impl Estimate {
    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Estimated probability `successes / trials`, in `[0, 1]`.
    ///
    /// `NaN` only for an estimate built from zero repetitions, which no
    /// validated run produces.
    pub fn probability(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }

    /// Empirical standard error √(p̂(1−p̂)/N).
    ///
    /// Zero when every or no repetition succeeded.
    pub fn standard_error(&self) -> f64 {
        let p = self.probability();
        (p * (1.0 - p) / self.trials as f64).sqrt()
    }

    /// Two-sided normal-approximation (Wald) interval at `level`, clamped
    /// to `[0, 1]`.
    ///
    /// Returns `None` unless `0 < level < 1`.
    ///
    /// # Examples
    /// ```
    /// use u_dicetail::estimator::{run_estimate, TrialParams};
    /// use u_dicetail::random::create_rng;
    /// let params = TrialParams::new(10_000, 5, 3).unwrap();
    /// let est = run_estimate(&params, &mut create_rng(3));
    /// let (lo, hi) = est.confidence_interval(0.95).unwrap();
    /// assert!(lo <= est.probability() && est.probability() <= hi);
    /// ```
    pub fn confidence_interval(&self, level: f64) -> Option<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return None;
        }
        let z = inverse_normal_cdf(0.5 + level / 2.0);
        let p = self.probability();
        let half = z * self.standard_error();
        Some(((p - half).max(0.0), (p + half).min(1.0)))
    }

    /// Deviation from a reference probability in units of the reference's
    /// own standard error √(p(1−p)/N).
    ///
    /// For a degenerate reference (0 or 1) the result is `0.0` on an exact
    /// match and infinite otherwise.
    pub fn z_score(&self, reference: f64) -> f64 {
        let p = self.probability();
        let se = (reference * (1.0 - reference) / self.trials as f64).sqrt();
        if se == 0.0 {
            if p == reference {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            (p - reference) / se
        }
    }
}

// ============================================================================
// Runs
// ============================================================================

/// Runs the simulation for already validated parameters.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::{run_estimate, TrialParams};
/// use u_dicetail::random::create_rng;
/// let params = TrialParams::new(1000, 4, 0).unwrap();
/// let est = run_estimate(&params, &mut create_rng(42));
/// assert_eq!(est.probability(), 1.0);
/// ```
pub fn run_estimate<R: Rng + ?Sized>(params: &TrialParams, rng: &mut R) -> Estimate {
    let mut roller = DieRoller::new(params.draws as usize);
    let mut counter = SuccessCounter::new();
    for _ in 0..params.trials {
        let hits = roller.count_target(rng);
        counter.record(hits >= params.threshold);
    }
    let estimate = counter.into_estimate();
    debug!(
        trials = params.trials,
        draws = params.draws,
        threshold = params.threshold,
        successes = estimate.successes,
        "monte carlo run complete"
    );
    estimate
}

/// Estimates P(at least `threshold` of `draws` dice show a six) from
/// `trials` repetitions.
///
/// # Errors
/// [`EstimateError::InvalidArgument`] if `trials == 0`, `draws == 0`, or
/// `threshold > draws`. Validation happens before the first draw, so a
/// rejected call leaves `rng` untouched.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::estimate_probability;
/// use u_dicetail::random::create_rng;
/// let mut rng = create_rng(7);
/// let p = estimate_probability(100_000, 5, 3, &mut rng).unwrap();
/// assert!((p - 0.03549).abs() < 0.005);
/// ```
pub fn estimate_probability<R: Rng + ?Sized>(
    trials: u64,
    draws: u32,
    threshold: u32,
    rng: &mut R,
) -> Result<f64, EstimateError> {
    let params = TrialParams::new(trials, draws, threshold)?;
    Ok(run_estimate(&params, rng).probability())
}

/// Like [`run_estimate`], for a random source that can fail.
///
/// Draws one die at a time through [`random::try_roll_die`].
///
/// # Errors
/// [`EstimateError::RandomSource`] on the first source failure; the
/// repetitions completed so far are discarded.
pub fn try_run_estimate<R: TryRngCore + ?Sized>(
    params: &TrialParams,
    rng: &mut R,
) -> Result<Estimate, EstimateError> {
    let mut counter = SuccessCounter::new();
    for _ in 0..params.trials {
        let mut hits = 0u32;
        for _ in 0..params.draws {
            let face = random::try_roll_die(rng)
                .map_err(|e| EstimateError::RandomSource(e.to_string()))?;
            if face == TARGET_FACE {
                hits += 1;
            }
        }
        counter.record(hits >= params.threshold);
    }
    let estimate = counter.into_estimate();
    debug!(
        trials = params.trials,
        draws = params.draws,
        threshold = params.threshold,
        successes = estimate.successes,
        "monte carlo run complete (fallible source)"
    );
    Ok(estimate)
}

/// Like [`estimate_probability`], for a random source that can fail.
///
/// # Errors
/// - [`EstimateError::InvalidArgument`] before any draw, as in
///   [`estimate_probability`].
/// - [`EstimateError::RandomSource`] if the source fails mid-run.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::try_estimate_probability;
/// use rand::rngs::OsRng;
/// let p = try_estimate_probability(100, 2, 0, &mut OsRng).unwrap();
/// assert_eq!(p, 1.0);
/// ```
pub fn try_estimate_probability<R: TryRngCore + ?Sized>(
    trials: u64,
    draws: u32,
    threshold: u32,
    rng: &mut R,
) -> Result<f64, EstimateError> {
    let params = TrialParams::new(trials, draws, threshold)?;
    Ok(try_run_estimate(&params, rng)?.probability())
}

// ============================================================================
// Tests
// ============================================================================
