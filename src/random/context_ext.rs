use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::seq::{IndexedRandom, SliceRandom};
use crate::rand::Rng;
use crate::random::{RngId, RngStore};

// This is a trait extension on anything that owns an `RngStore` (the model
// and the store itself) for random number generation functionality.
pub trait ContextRandomExt {
    fn rng_store(&mut self) -> &mut RngStore;

    /// Re-seeds every stream from `base_seed`.
    fn init_random(&mut self, base_seed: u64) {
        self.rng_store().reseed(base_seed);
    }

    /// Gets a random sample from the stream associated with the given [`RngId`] by
    /// applying the specified sampler function.
    fn sample<R: RngId, T>(
        &mut self,
        _rng_type: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        sampler(self.rng_store().get_rng::<R>())
    }

    /// Gets a random sample within the range provided by `range`
    /// using the stream associated with the given [`RngId`].
    fn sample_range<R: RngId, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Gets a random boolean value which is true with probability `p`
    /// using the stream associated with the given [`RngId`].
    /// `p` must lie in `[0, 1]`.
    fn sample_bool<R: RngId>(&mut self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random_bool(p))
    }

    /// Picks one element of `items` uniformly, or `None` if `items` is empty.
    fn sample_choice<R: RngId, T: Copy>(&mut self, rng_id: R, items: &[T]) -> Option<T>
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| items.choose(rng).copied())
    }

    /// Shuffles `items` in place into a uniformly random permutation.
    fn shuffle<R: RngId, T>(&mut self, rng_id: R, items: &mut [T])
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| items.shuffle(rng));
    }
}

impl ContextRandomExt for RngStore {
    fn rng_store(&mut self) -> &mut RngStore {
        self
    }
}
