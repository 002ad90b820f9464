//! Repeated estimation runs for statistical averaging.
//!
//! Runs the estimator `R` times, each replication on its own stream
//! derived from a base seed, and summarizes the spread of the estimates.
//! The spread measures run-to-run variability directly, independent of
//! the binomial standard-error formula.

use rayon::prelude::*;
use tracing::info;

use crate::estimator::{run_estimate, EstimateError, TrialParams};
use crate::parallel::estimate_parallel;
use crate::random::{create_rng, stream_seed};
use crate::stats;

/// How each replication executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Replications run one after another, each single-threaded.
    #[default]
    Sequential,
    /// Each replication runs through [`estimate_parallel`].
    Parallel,
}

/// Summary of `count` replicated estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single replication.
    pub std_dev: Option<f64>,
    /// Standard error of `mean`; `None` for a single replication.
    pub std_error: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Estimates in replication order.
    pub estimates: Vec<f64>,
}

impl ReplicationSummary {
    fn from_estimates(estimates: Vec<f64>) -> Self {
        // estimates are finite probabilities and non-empty
        let mean = stats::mean(&estimates).unwrap_or(f64::NAN);
        let min = stats::min(&estimates).unwrap_or(f64::NAN);
        let max = stats::max(&estimates).unwrap_or(f64::NAN);
        Self {
            count: estimates.len(),
            mean,
            std_dev: stats::std_dev(&estimates),
            std_error: stats::standard_error(&estimates),
            min,
            max,
            estimates,
        }
    }
}

/// Runs `replications` independent estimates and summarizes them.
///
/// Replication `r` uses seed `stream_seed(seed, r)`, so the summary is
/// reproducible for a given `(params, replications, seed, execution)`.
///
/// # Errors
/// [`EstimateError::InvalidArgument`] if `replications == 0`.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::TrialParams;
/// use u_dicetail::replicate::{replicate, Execution};
/// let params = TrialParams::new(20_000, 5, 3).unwrap();
/// let summary = replicate(&params, 8, 1, Execution::Sequential).unwrap();
/// assert_eq!(summary.count, 8);
/// assert!(summary.min <= summary.mean && summary.mean <= summary.max);
/// ```
pub fn replicate(
    params: &TrialParams,
    replications: usize,
    seed: u64,
    execution: Execution,
) -> Result<ReplicationSummary, EstimateError> {
    if replications == 0 {
        return Err(EstimateError::InvalidArgument(
            "replication count must be at least 1, got 0".into(),
        ));
    }

    let estimates: Vec<f64> = match execution {
        Execution::Sequential => (0..replications as u64)
            .map(|r| run_estimate(params, &mut create_rng(stream_seed(seed, r))).probability())
            .collect(),
        Execution::Parallel => (0..replications as u64)
            .map(|r| estimate_parallel(params, stream_seed(seed, r)).probability())
            .collect(),
    };

    let summary = ReplicationSummary::from_estimates(estimates);
    info!(
        replications,
        ?execution,
        mean = summary.mean,
        std_dev = ?summary.std_dev,
        "replications complete"
    );
    Ok(summary)
}

/// Runs `replications` single-threaded estimates concurrently, one per
/// rayon task, and summarizes them.
///
/// Produces the same summary as [`replicate`] with
/// [`Execution::Sequential`]; only the wall-clock time differs.
///
/// # Errors
/// [`EstimateError::InvalidArgument`] if `replications == 0`.
pub fn replicate_concurrent(
    params: &TrialParams,
    replications: usize,
    seed: u64,
) -> Result<ReplicationSummary, EstimateError> {
    if replications == 0 {
        return Err(EstimateError::InvalidArgument(
            "replication count must be at least 1, got 0".into(),
        ));
    }
    let estimates: Vec<f64> = (0..replications as u64)
        .into_par_iter()
        .map(|r| run_estimate(params, &mut create_rng(stream_seed(seed, r))).probability())
        .collect();

    let summary = ReplicationSummary::from_estimates(estimates);
    info!(
        replications,
        execution = "Concurrent",
        mean = summary.mean,
        std_dev = ?summary.std_dev,
        "replications complete"
    );
    Ok(summary)
}
