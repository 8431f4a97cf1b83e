use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// One SplitMix64 output step.
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed of the independent stream `stream` derived from the run seed.
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    splitmix64(seed ^ splitmix64(stream))
}

pub fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(stream_seed(seed, stream))
}

/// Largest accepted run seed; seeds are recorded in TOML summaries, whose integers are `i64`.
pub const MAX_SEED: u64 = i64::MAX as u64;

/// A run seed for simulations that did not ask for one.
pub fn fresh_seed() -> u64 {
    rand::thread_rng().r#gen::<u64>() & MAX_SEED
}

/// Uniform deviate in the open interval (0, 1).
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(Open01)
}
