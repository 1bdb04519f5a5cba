//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through a PeriodRng seeded from the hash of the
//! period's seed string:
//!
//!   "<base seed>|<effective period key>|<segment id>|<period offset>"
//!
//! This means:
//!   - The same request tuple always reproduces the same stream.
//!   - Each period's stream is independent, so cumulative views reuse
//!     exactly the numbers their constituent months produce on their own.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the UTF-16 code units of `s`.
///
/// Order sensitive and stable across platforms. Not cryptographic.
pub fn hash_to_seed(s: &str) -> u32 {
    s.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Build the seed string for one generated period.
pub fn period_seed_string(base_seed: &str, period_key: &str, segment_id: &str, offset: i32) -> String {
    format!("{base_seed}|{period_key}|{segment_id}|{offset}")
}

/// The uniform stream threaded through every sampling step of one period.
pub struct PeriodRng {
    pub seed: u32,
    inner: Pcg64Mcg,
}

impl PeriodRng {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(u64::from(seed)),
        }
    }

    /// Hash `seed_string` and seed a stream from it.
    pub fn from_seed_string(seed_string: &str) -> Self {
        Self::new(hash_to_seed(seed_string))
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Roll an index in [0, n).
    pub fn index_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        (self.inner.next_u64() % n as u64) as usize
    }

    /// Roll an integer in [lo, hi].
    pub fn range_inclusive(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        lo + self.index_below(hi - lo + 1)
    }
}
