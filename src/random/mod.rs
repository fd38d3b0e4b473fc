//! Randomness is always injected: a model owns the generator it draws from, so a run is
//! reproducible whenever its generator is. Named streams (see [`define_rng!`]) derive their
//! generator from a base seed plus a hash of the stream name, so independent concerns seeded
//! from the same base seed do not share a sequence.
mod macros;

pub use macros::define_rng;

use log::trace;

use crate::hashing::hash_str;
use crate::rand::{Rng, SeedableRng};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

/// Creates the generator for the stream `R` seeded from `base_seed`.
pub fn rng_from_seed<R: RngId>(base_seed: u64) -> R::RngType {
    trace!(
        "creating new RNG (seed={}) for stream {}",
        base_seed,
        R::get_name()
    );
    R::RngType::seed_from_u64(base_seed.wrapping_add(hash_str(R::get_name())))
}

/// Runs a single trial that succeeds with probability `p`.
///
/// `p` is compared against a uniform draw from `[0, 1)` and is deliberately not validated:
/// `p >= 1` always succeeds and `p <= 0` (or NaN) never does. Keeping `p` in range is the
/// caller's responsibility.
pub fn toss<R: Rng>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}
