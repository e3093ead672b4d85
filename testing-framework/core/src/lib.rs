pub mod ledger;
pub mod nodes;
pub mod sampling;
pub mod scenario;
pub mod topology;

use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;
pub use testing_framework_config::{IS_DEBUG_TRACING, adjust_timeout};

/// Deterministic generator for one named stream of a scenario seed.
///
/// Every random decision in a run draws from its own stream, so adding draws
/// to one phase never shifts the values another phase sees.
#[must_use]
pub fn seeded_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}
