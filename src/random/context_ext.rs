use std::any::TypeId;
use std::cell::RefMut;

use log::trace;

use crate::context::Context;
use crate::hashing::hash_str;
use crate::rand::SeedableRng;
use crate::random::{RngHolder, RngId, RngPlugin};

/// Borrows the generator for stream `R`, seeding it on first use from the base seed plus a
/// hash of the stream's name.
///
/// # Panics
///
/// Panics if `init_random` was not called yet, or if the same stream is borrowed twice at
/// once (e.g. by sampling from `R` inside a sampler closure for `R`).
fn get_rng<R: RngId + 'static>(context: &Context) -> RefMut<'_, R::RngType> {
    let data_container = context
        .get_data(RngPlugin)
        .expect("random streams used before `init_random` was called");

    let rng_holders = data_container
        .rng_holders
        .try_borrow_mut()
        .unwrap_or_else(|_| panic!("random stream {} is already borrowed", R::get_name()));
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                let seed = data_container
                    .base_seed
                    .wrapping_add(hash_str(R::get_name()));
                trace!("seeding random stream {} with {seed}", R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(seed)),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("random stream holds the generator type of its id")
    })
}

pub trait ContextRandomExt {
    /// Sets the base seed of every stream in this context. Streams already in use are
    /// dropped and reseeded lazily on their next draw.
    fn init_random(&mut self, base_seed: u64);

    /// Runs `sampler` against the generator of stream `R`. Every draw in the simulation goes
    /// through here so that each concern consumes only its own stream.
    ///
    /// Panics if `init_random` was not called yet.
    fn sample<R: RngId + 'static, T>(
        &self,
        rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random streams with base seed {base_seed}");
        let data_container = self.get_data_mut(RngPlugin);
        data_container.base_seed = base_seed;
        data_container.rng_holders.get_mut().clear();
    }

    fn sample<R: RngId + 'static, T>(
        &self,
        _rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        let mut rng = get_rng::<R>(self);
        sampler(&mut rng)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::define_rng;
    use crate::rand::{Rng, RngCore};
    use crate::random::{sample_multiple_from_known_length, ClampedNormal, ContextRandomExt};

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn draws_advance_the_stream() {
        let mut context = Context::new();
        context.init_random(42);

        assert_ne!(
            context.sample(FooRng, RngCore::next_u64),
            context.sample(FooRng, RngCore::next_u64)
        );
    }

    #[test]
    fn streams_have_different_seeds() {
        let mut context = Context::new();
        context.init_random(42);

        assert_ne!(
            context.sample(FooRng, RngCore::next_u64),
            context.sample(BarRng, RngCore::next_u64)
        );
    }

    #[test]
    fn reinitializing_reseeds() {
        let mut context = Context::new();
        context.init_random(42);
        let first = context.sample(FooRng, RngCore::next_u64);
        let second = context.sample(FooRng, RngCore::next_u64);

        context.init_random(42);
        assert_eq!(first, context.sample(FooRng, RngCore::next_u64));
        assert_eq!(second, context.sample(FooRng, RngCore::next_u64));

        context.init_random(88);
        assert_ne!(first, context.sample(FooRng, RngCore::next_u64));
    }

    #[test]
    fn streams_are_independent() {
        let mut context = Context::new();
        context.init_random(7);
        let expected = context.sample(FooRng, RngCore::next_u64);

        // Drawing from another stream in between does not change FooRng's sequence.
        context.init_random(7);
        for _ in 0..10 {
            context.sample(BarRng, RngCore::next_u64);
        }
        assert_eq!(expected, context.sample(FooRng, RngCore::next_u64));
    }

    #[test]
    fn samplers_get_the_generator() {
        let mut context = Context::new();
        context.init_random(3);
        let distribution = ClampedNormal::new(6.0, 6.0);
        let count = context.sample(FooRng, |rng| distribution.sample_count(rng));
        assert!((3..=9).contains(&count));

        let picked = context.sample(BarRng, |rng| {
            sample_multiple_from_known_length(rng, 0..20usize, 4)
        });
        assert_eq!(picked.unwrap().len(), 4);
        assert!(context.sample(FooRng, |rng| rng.random_bool(1.0)));
    }

    #[test]
    #[should_panic(expected = "init_random")]
    fn sample_without_init_panics() {
        let context = Context::new();
        context.sample(FooRng, RngCore::next_u64);
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn nested_draws_from_one_stream_panic() {
        let mut context = Context::new();
        context.init_random(1);
        context.sample(FooRng, |_| context.sample(FooRng, RngCore::next_u64));
    }
}
