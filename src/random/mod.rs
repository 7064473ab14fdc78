//! Seeded random number streams.
//!
//! Every stochastic decision in the engine draws from a named stream held by an [`RngStore`].
//! A stream is identified by a zero-sized type declared with [`define_rng!`](crate::define_rng)
//! and is seeded with `base_seed + hash_str(name)` the first time it is used, so two stores
//! built from the same base seed produce identical draws on every stream regardless of the
//! order in which the streams are first touched.
mod context_ext;
mod macros;

use std::any::{Any, TypeId};

use log::trace;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;

use crate::hashing::{hash_str, HashMap};
use crate::rand::SeedableRng;

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng + 'static;
    fn get_name() -> &'static str;
}

// This is a wrapper that allows for different types of random number
// generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

/// Holds the base seed and the lazily created streams keyed by their [`RngId`].
pub struct RngStore {
    base_seed: u64,
    rng_holders: HashMap<TypeId, RngHolder>,
}

impl RngStore {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        RngStore {
            base_seed,
            rng_holders: HashMap::default(),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Sets a new base seed. Existing streams are dropped so they get re-seeded the next
    /// time they are used.
    pub fn reseed(&mut self, base_seed: u64) {
        trace!("reseeding random streams with base seed {base_seed}");
        self.base_seed = base_seed;
        self.rng_holders.clear();
    }

    /// Gets a mutable reference to the stream associated with the given [`RngId`],
    /// creating it if this is the first use.
    pub(crate) fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                trace!(
                    "creating new RNG (seed={}) for stream {}",
                    base_seed,
                    R::get_name()
                );
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("stream registered under a different generator type")
    }
}

impl Default for RngStore {
    fn default() -> Self {
        RngStore::new(0)
    }
}
