//! # u-dicetail
//!
//! Monte Carlo estimation of the probability that at least `n` of `m`
//! fair six-sided dice show a six, with the exact binomial tail as ground
//! truth.
//!
//! ## Modules
//!
//! - [`estimator`] — Validated parameters, the estimation run, and its result
//! - [`parallel`] — Chunked, deterministic multi-threaded runs (rayon)
//! - [`replicate`] — Repeated runs summarized for statistical averaging
//! - [`distributions`] — Binomial distribution and the exact dice tail
//! - [`random`] — Seeded generators, stream seeds, die draws
//! - [`special`] — Incomplete beta, ln Γ, normal CDF and quantile
//! - [`stats`] — Kahan/Welford descriptive statistics
//!
//! ## Quick start
//!
//! ```
//! use u_dicetail::distributions::dice_tail_probability;
//! use u_dicetail::estimator::estimate_probability;
//! use u_dicetail::random::create_rng;
//!
//! let mut rng = create_rng(42);
//! let estimate = estimate_probability(200_000, 5, 3, &mut rng).unwrap();
//! let exact = dice_tail_probability(5, 3);
//! assert!((estimate - exact).abs() < 0.003);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Validate before drawing**: invalid arguments never consume randomness
//! - **Local random streams**: each run owns its die sampler, and
//!   parallel chunks own independently seeded generators
//! - **Property-based testing**: statistical invariants verified via proptest

pub mod distributions;
pub mod estimator;
pub mod parallel;
pub mod random;
pub mod replicate;
pub mod special;
pub mod stats;
