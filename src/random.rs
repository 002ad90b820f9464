//! Random number generation and die draws.
//!
//! Provides seeded RNG construction, independent per-stream seed
//! derivation, batched die draws for infallible generators, and an
//! unbiased single-draw path for fallible entropy sources.
//!
//! # Reproducibility
//!
//! For reproducible experiments, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform.

use rand::distr::{Distribution, Uniform};
use rand::{Rng, TryRngCore};

/// Number of faces on the die.
pub const FACES: u8 = 6;

/// The face whose occurrences are counted.
pub const TARGET_FACE: u8 = 6;

/// Largest 32-bit word accepted by [`try_roll_die`].
///
/// `ACCEPT_MAX + 1` is the largest multiple of 6 that fits in `u32`, so
/// every face is backed by the same number of words.
const ACCEPT_MAX: u32 = u32::MAX - (u32::MAX % FACES as u32 + 1) % FACES as u32;

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++) for high performance.
/// The sequence is deterministic for a given seed on the same platform.
///
/// # Examples
/// ```
/// use u_dicetail::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Derives the seed of stream `index` from a base seed.
///
/// Applies the SplitMix64 finalizer to `base + (index + 1)·γ`, where γ is
/// the 64-bit golden-ratio increment. Adjacent indices map to seeds that
/// share no obvious bit structure, so generators built from them behave
/// as independent streams.
///
/// Reference: Steele, Lea & Flood (2014), "Fast Splittable Pseudorandom
/// Number Generators", *OOPSLA*.
///
/// # Examples
/// ```
/// use u_dicetail::random::stream_seed;
/// assert_eq!(stream_seed(7, 3), stream_seed(7, 3));
/// assert_ne!(stream_seed(7, 3), stream_seed(7, 4));
/// ```
pub fn stream_seed(base: u64, index: u64) -> u64 {
    const GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(GAMMA));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Die thrower for infallible generators.
///
/// Holds one [`Uniform`] sampler over `1..=6`, so a repetition of `m`
/// draws costs no per-draw sampler setup. [`DieRoller::count_target`]
/// counts while sampling and needs no storage; the face buffer behind
/// [`DieRoller::roll`] is allocated on first use and then reused.
///
/// # Examples
/// ```
/// use u_dicetail::random::{create_rng, DieRoller};
/// let mut roller = DieRoller::new(5);
/// let mut rng = create_rng(42);
/// let faces = roller.roll(&mut rng);
/// assert_eq!(faces.len(), 5);
/// assert!(faces.iter().all(|&f| (1..=6).contains(&f)));
/// ```
#[derive(Debug, Clone)]
pub struct DieRoller {
    face: Uniform<u8>,
    draws: usize,
    buffer: Vec<u8>,
}

impl DieRoller {
    /// Creates a roller that throws `draws` dice per call.
    pub fn new(draws: usize) -> Self {
        Self {
            face: Uniform::new_inclusive(1, FACES).expect("1..=FACES is a non-empty range"),
            draws,
            buffer: Vec::new(),
        }
    }

    /// Number of dice thrown per call.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Throws all dice and returns the faces.
    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[u8] {
        self.buffer.resize(self.draws, 0);
        for slot in self.buffer.iter_mut() {
            *slot = self.face.sample(rng);
        }
        &self.buffer
    }

    /// Throws all dice and returns how many show [`TARGET_FACE`].
    ///
    /// Consumes the generator exactly as [`DieRoller::roll`] does.
    pub fn count_target<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        let mut hits = 0u32;
        for _ in 0..self.draws {
            if self.face.sample(rng) == TARGET_FACE {
                hits += 1;
            }
        }
        hits
    }
}

/// Draws one die face from a fallible source.
///
/// # Algorithm
/// Rejection sampling on 32-bit words: words above [`ACCEPT_MAX`] are
/// discarded, the rest are reduced modulo 6. The rejection probability is
/// 4/2³², so the expected number of words per draw is 1 + O(10⁻⁹).
///
/// # Errors
/// Returns the source's own error as soon as it fails; no face is produced.
///
/// # Examples
/// ```
/// use u_dicetail::random::{create_rng, try_roll_die};
/// let mut rng = create_rng(1);
/// let face = try_roll_die(&mut rng).unwrap();
/// assert!((1..=6).contains(&face));
/// ```
pub fn try_roll_die<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<u8, R::Error> {
    loop {
        let word = rng.try_next_u32()?;
        if word <= ACCEPT_MAX {
            return Ok((word % FACES as u32) as u8 + 1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rng_deterministic() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);
        let vals1: Vec<f64> = (0..10).map(|_| rng1.random()).collect();
        let vals2: Vec<f64> = (0..10).map(|_| rng2.random()).collect();
        assert_eq!(vals1, vals2);
    }

    #[test]
    fn test_accept_max_is_multiple_boundary() {
        assert_eq!((ACCEPT_MAX as u64 + 1) % FACES as u64, 0);
        assert!(u32::MAX as u64 - (ACCEPT_MAX as u64) < FACES as u64);
    }

    #[test]
    fn test_stream_seed_distinct() {
        let seeds: Vec<u64> = (0..1000).map(|i| stream_seed(42, i)).collect();
        let mut sorted = seeds.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), seeds.len());
    }

    #[test]
    fn test_stream_seed_depends_on_base() {
        assert_ne!(stream_seed(1, 0), stream_seed(2, 0));
    }

    #[test]
    fn test_roller_zero_draws() {
        let mut roller = DieRoller::new(0);
        let mut rng = create_rng(0);
        assert!(roller.roll(&mut rng).is_empty());
        assert_eq!(roller.count_target(&mut rng), 0);
    }

    #[test]
    fn test_count_target_needs_no_buffer() {
        let mut roller = DieRoller::new(10_000);
        let mut rng = create_rng(5);
        let hits = roller.count_target(&mut rng);
        assert!(hits > 1_400 && hits < 1_950, "hits {hits}");
        assert_eq!(roller.buffer.capacity(), 0);

        assert_eq!(roller.roll(&mut rng).len(), 10_000);
        assert_eq!(roller.draws(), 10_000);
    }

    #[test]
    fn test_huge_roller_constructs_without_allocating() {
        let roller = DieRoller::new(u32::MAX as usize);
        assert_eq!(roller.draws(), u32::MAX as usize);
        assert_eq!(roller.buffer.capacity(), 0);
    }

    #[test]
    fn test_roller_face_frequencies() {
        let mut roller = DieRoller::new(60);
        let mut rng = create_rng(2024);
        let mut counts = [0u32; 6];
        for _ in 0..1000 {
            for &f in roller.roll(&mut rng) {
                counts[(f - 1) as usize] += 1;
            }
        }
        // 60_000 draws, expected 10_000 per face, sd ≈ 91
        for (face, &c) in counts.iter().enumerate() {
            assert!(
                (c as i64 - 10_000).abs() < 500,
                "face {} drawn {c} times",
                face + 1
            );
        }
    }

    #[test]
    fn test_count_target_matches_roll() {
        let mut a = DieRoller::new(12);
        let mut b = DieRoller::new(12);
        let mut rng_a = create_rng(9);
        let mut rng_b = create_rng(9);
        for _ in 0..100 {
            let expected = a.roll(&mut rng_a).iter().filter(|&&f| f == 6).count() as u32;
            assert_eq!(b.count_target(&mut rng_b), expected);
        }
    }

    #[test]
    fn test_try_roll_die_frequencies() {
        let mut rng = create_rng(77);
        let mut counts = [0u32; 6];
        for _ in 0..60_000 {
            let f = try_roll_die(&mut rng).unwrap();
            counts[(f - 1) as usize] += 1;
        }
        for &c in &counts {
            assert!((c as i64 - 10_000).abs() < 500, "count {c}");
        }
    }

    /// Source that yields a fixed word sequence, then fails.
    struct Scripted {
        words: Vec<u32>,
    }

    #[derive(Debug)]
    struct Drained;

    impl std::fmt::Display for Drained {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("drained")
        }
    }

    impl std::error::Error for Drained {}

    impl TryRngCore for Scripted {
        type Error = Drained;

        fn try_next_u32(&mut self) -> Result<u32, Drained> {
            if self.words.is_empty() {
                Err(Drained)
            } else {
                Ok(self.words.remove(0))
            }
        }

        fn try_next_u64(&mut self) -> Result<u64, Drained> {
            let lo = self.try_next_u32()? as u64;
            let hi = self.try_next_u32()? as u64;
            Ok(hi << 32 | lo)
        }

        fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Drained> {
            for b in dst.iter_mut() {
                *b = self.try_next_u32()? as u8;
            }
            Ok(())
        }
    }

    #[test]
    fn test_try_roll_die_rejects_top_words() {
        let mut src = Scripted {
            words: vec![u32::MAX, ACCEPT_MAX + 1, 5],
        };
        assert_eq!(try_roll_die(&mut src).unwrap(), 6);
        assert!(src.words.is_empty());
    }

    #[test]
    fn test_try_roll_die_maps_residues() {
        let mut src = Scripted {
            words: vec![0, 1, 2, 3, 4, 5, 6, ACCEPT_MAX],
        };
        let faces: Vec<u8> = (0..8).map(|_| try_roll_die(&mut src).unwrap()).collect();
        assert_eq!(faces, vec![1, 2, 3, 4, 5, 6, 1, 6]);
    }

    #[test]
    fn test_try_roll_die_propagates_failure() {
        let mut src = Scripted { words: vec![] };
        assert!(try_roll_die(&mut src).is_err());
    }
}
