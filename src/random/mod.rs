//! Seeded, named random number streams.
//!
//! Every source of randomness in a run is keyed by an [`RngId`] type declared with
//! [`define_rng!`]. All streams derive from one base seed set by
//! [`ContextRandomExt::init_random`], offset by a hash of the stream's name, so
//! drawing more values from one stream never perturbs another. Two runs with the same
//! base seed and the same configuration make identical draws.
mod clamped_normal;
mod context_ext;
mod sampling_algorithms;

use std::any::{Any, TypeId};
use std::cell::RefCell;

pub use clamped_normal::ClampedNormal;
pub use context_ext::ContextRandomExt;
pub use sampling_algorithms::sample_multiple_from_known_length;

use crate::rand::SeedableRng;
use crate::{define_data_plugin, HashMap};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

// This is a wrapper that allows for future support for different types of
// random number generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

struct RngData {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

// Registers a data container which stores:
// * base_seed: A base seed for all rngs
// * rng_holders: A map of rngs, keyed by their RngId. Note that this is
//   stored in a RefCell to allow for mutable borrow without requiring a
//   mutable borrow of the Context itself.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: 0,
        rng_holders: RefCell::new(HashMap::default()),
    }
);

/// Defines a unique key type for an independent random stream. The stream's seed is the
/// run's base seed offset by a hash of the type's name, so names must be unique.
#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        #[derive(Copy, Clone)]
        struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($random_id)
            }
        }

        // Two streams with the same name would share a seed; make that a link error.
        $crate::paste::paste! {
            #[doc(hidden)]
            #[no_mangle]
            #[allow(non_upper_case_globals)]
            pub static [<rng_name_duplication_guard_ $random_id>]: () = ();
        }
    };
}
pub use define_rng;
