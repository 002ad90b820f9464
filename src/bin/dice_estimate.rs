//! Dice tail estimator CLI
//!
//! Estimates P(at least n of m dice show a six) by simulation and prints it
//! next to the exact binomial tail.
//!
//! # Example
//!
//! ```bash
//! # 10^6 repetitions of 5 dice, success at 3 or more sixes
//! dice-estimate -N 1000000 -m 5 -n 3 --seed 42
//!
//! # Same on all cores, averaged over 10 replications
//! dice-estimate -N 1000000 -m 5 -n 3 --parallel --replications 10
//! ```

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use u_dicetail::estimator::{run_estimate, Estimate, EstimateError, TrialParams};
use u_dicetail::parallel::estimate_parallel;
use u_dicetail::random::create_rng;
use u_dicetail::replicate::{replicate, Execution};
use u_dicetail::special::standard_normal_cdf;

/// Monte Carlo estimate of the probability that at least n of m dice show a six.
#[derive(Parser, Debug)]
#[command(name = "dice-estimate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of repetitions (N)
    #[arg(short = 'N', long, default_value = "1000000", allow_negative_numbers = true)]
    trials: i64,

    /// Dice thrown per repetition (m)
    #[arg(short = 'm', long, default_value = "5", allow_negative_numbers = true)]
    draws: i64,

    /// Minimum number of sixes for a repetition to succeed (n)
    #[arg(short = 'n', long, default_value = "3", allow_negative_numbers = true)]
    threshold: i64,

    /// Base seed. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Independent runs to average over
    #[arg(short = 'r', long, default_value = "1")]
    replications: usize,

    /// Spread each run over the rayon pool (RAYON_NUM_THREADS)
    #[arg(long)]
    parallel: bool,

    /// Confidence level of the reported interval
    #[arg(long, default_value = "0.95")]
    confidence: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,u_dicetail=info,dice_estimate=info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ EstimateError::InvalidArgument(_)) => {
            error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), EstimateError> {
    let params = TrialParams::try_from((args.trials, args.draws, args.threshold))?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let execution = if args.parallel {
        Execution::Parallel
    } else {
        Execution::Sequential
    };
    let exact = params.exact_probability();

    info!(
        trials = params.trials(),
        draws = params.draws(),
        threshold = params.threshold(),
        seed,
        ?execution,
        replications = args.replications,
        "starting estimate"
    );

    let started = Instant::now();
    if args.replications == 1 {
        let estimate = match execution {
            Execution::Sequential => run_estimate(&params, &mut create_rng(seed)),
            Execution::Parallel => estimate_parallel(&params, seed),
        };
        print_single(&estimate, exact, args.confidence);
    } else {
        let summary = replicate(&params, args.replications, seed, execution)?;
        println!("replications:   {}", summary.count);
        println!("mean estimate:  {:.6}", summary.mean);
        if let Some(sd) = summary.std_dev {
            println!("std dev:        {sd:.6}");
        }
        if let Some(se) = summary.std_error {
            println!("std error:      {se:.6}");
        }
        println!("range:          [{:.6}, {:.6}]", summary.min, summary.max);
        println!("exact:          {exact:.6}");
    }
    println!("elapsed:        {:.3?}", started.elapsed());
    Ok(())
}

fn print_single(estimate: &Estimate, exact: f64, confidence: f64) {
    let z = estimate.z_score(exact);
    println!(
        "estimate:       {:.6} ({} / {})",
        estimate.probability(),
        estimate.successes(),
        estimate.trials()
    );
    println!("std error:      {:.6}", estimate.standard_error());
    match estimate.confidence_interval(confidence) {
        Some((lo, hi)) => println!("{:.0}% interval:   [{lo:.6}, {hi:.6}]", confidence * 100.0),
        None => println!("interval:       unavailable for level {confidence}"),
    }
    println!("exact:          {exact:.6}");
    if z.is_finite() {
        let p_value = 2.0 * (1.0 - standard_normal_cdf(z.abs()));
        println!("z-score:        {z:.3} (two-sided p = {p_value:.3})");
    } else {
        println!("z-score:        {z}");
    }
}
