//! Parallel Monte Carlo runs on the rayon pool.
//!
//! Repetitions are split into fixed-size chunks. Chunk `i` is driven by its
//! own generator seeded with [`stream_seed`]`(seed, i)` and fills a private
//! [`SuccessCounter`]; the partial counts are summed at the end.
//!
//! Chunk boundaries depend only on `N`, never on the number of worker
//! threads, so a given `(params, seed)` yields the same estimate on any
//! pool size. Set `RAYON_NUM_THREADS` to control the pool.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::estimator::{Estimate, SuccessCounter, TrialParams};
use crate::random::{create_rng, stream_seed, DieRoller};

/// Repetitions per work unit.
pub const CHUNK_SIZE: u64 = 16_384;

/// Runs `params.trials()` repetitions across the rayon pool.
///
/// # Examples
/// ```
/// use u_dicetail::estimator::TrialParams;
/// use u_dicetail::parallel::estimate_parallel;
/// let params = TrialParams::new(100_000, 4, 4).unwrap();
/// let a = estimate_parallel(&params, 42);
/// let b = estimate_parallel(&params, 42);
/// assert_eq!(a, b);
/// ```
pub fn estimate_parallel(params: &TrialParams, seed: u64) -> Estimate {
    let trials = params.trials();
    let chunks = trials.div_ceil(CHUNK_SIZE);

    let counter = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(trials - start);
            run_chunk(params, stream_seed(seed, chunk), len)
        })
        .reduce(SuccessCounter::new, SuccessCounter::merge);

    let estimate = counter.into_estimate();
    debug!(
        trials,
        chunks,
        draws = params.draws(),
        threshold = params.threshold(),
        successes = estimate.successes(),
        "parallel monte carlo run complete"
    );
    estimate
}

fn run_chunk(params: &TrialParams, seed: u64, len: u64) -> SuccessCounter {
    let mut rng = create_rng(seed);
    let mut roller = DieRoller::new(params.draws() as usize);
    let mut counter = SuccessCounter::new();
    for _ in 0..len {
        counter.record(roller.count_target(&mut rng) >= params.threshold());
    }
    trace!(seed, len, successes = counter.successes(), "chunk done");
    counter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::dice_tail_probability;

    #[test]
    fn test_counts_every_repetition() {
        for trials in [1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 7] {
            let params = TrialParams::new(trials, 2, 1).unwrap();
            assert_eq!(estimate_parallel(&params, 1).trials(), trials);
        }
    }

    #[test]
    fn test_deterministic_across_pool_sizes() {
        let params = TrialParams::new(5 * CHUNK_SIZE + 123, 5, 2).unwrap();
        let run_on = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| estimate_parallel(&params, 77))
        };
        assert_eq!(run_on(1), run_on(4));
    }

    #[test]
    fn test_seed_changes_estimate() {
        let params = TrialParams::new(100_000, 5, 2).unwrap();
        assert_ne!(
            estimate_parallel(&params, 1).successes(),
            estimate_parallel(&params, 2).successes()
        );
    }

    #[test]
    fn test_zero_threshold_is_certain() {
        let params = TrialParams::new(50_000, 3, 0).unwrap();
        assert_eq!(estimate_parallel(&params, 9).probability(), 1.0);
    }

    #[test]
    fn test_all_sixes_converges() {
        // m = n = 3: p = 1/216, N = 10^6, se ≈ 7.4e-5
        let params = TrialParams::new(1_000_000, 3, 3).unwrap();
        let est = estimate_parallel(&params, 2025);
        let exact = dice_tail_probability(3, 3);
        assert!(
            est.z_score(exact).abs() < 5.0,
            "estimate {} vs exact {exact}",
            est.probability()
        );
    }
}
