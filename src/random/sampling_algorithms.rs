//! Uniform sampling without replacement from iterators of known length, so callers can draw
//! households and contacts straight from iterators over ids.

use crate::error::ContagionError;
use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Sample `requested` random elements uniformly without replacement from a container of
/// known length. The selected elements are returned in iteration order.
///
/// # Errors
///
/// Returns [`ContagionError::ExhaustedCandidates`] if `requested` exceeds the number of
/// elements. Callers bound their requests by the candidate count, so this indicates a
/// logic fault rather than a recoverable condition.
pub fn sample_multiple_from_known_length<I, R, T>(
    rng: &mut R,
    iter: I,
    requested: usize,
) -> Result<Vec<T>, ContagionError>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    let available = iter.len();
    if requested > available {
        return Err(ContagionError::ExhaustedCandidates {
            requested,
            available,
        });
    }
    if requested == 0 {
        return Ok(Vec::new());
    }

    let mut indexes = choose_range(rng, available, requested).into_vec();
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter();
    let mut next_idx = index_iterator.next();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        if Some(idx) == next_idx {
            selected.push(item);
            next_idx = index_iterator.next();
            if next_idx.is_none() {
                break;
            }
        }
    }

    Ok(selected)
}
