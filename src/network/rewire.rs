//! Daily ambient edge rewiring.
//!
//! Ambient edges have no memory across days. Each day the edges sampled the day before are
//! removed and a fresh set is drawn: every participating individual draws a desired ambient
//! degree around the effective contact target and, if it has fewer ambient edges than that so
//! far, connects to uniformly chosen individuals it is not yet connected to.
use log::{debug, trace};
use serde::Serialize;

use crate::error::ContagionError;
use crate::network::edge::{ordered_pair, EdgeKind};
use crate::network::network::ContactNetwork;
use crate::parameters::Parameters;
use crate::population::{HealthStatus, IndividualId, Population};
use crate::rand::Rng;
use crate::random::{sample_multiple_from_known_length, ClampedNormal};

/// The ambient edges created by one rewiring step, as `(smaller, larger)` id pairs in the
/// order they were added. The driver hands this back to the next day's rewiring so that
/// exactly these edges are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AmbientEdges {
    pairs: Vec<(IndividualId, IndividualId)>,
}

impl AmbientEdges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, a: IndividualId, b: IndividualId) {
        self.pairs.push(ordered_pair(a, b));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &(IndividualId, IndividualId)> + '_ {
        self.pairs.iter()
    }

    #[must_use]
    pub fn contains(&self, a: IndividualId, b: IndividualId) -> bool {
        self.pairs.contains(&ordered_pair(a, b))
    }

    /// The pairs sorted ascending, for comparing edge sets.
    #[must_use]
    pub fn sorted(&self) -> Vec<(IndividualId, IndividualId)> {
        let mut pairs = self.pairs.clone();
        pairs.sort_unstable();
        pairs
    }
}

/// Who takes part in ambient mixing, and how much.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientPolicy {
    /// Contact target after isolation has been applied.
    pub effective_degree: f64,
    /// Hard cap on the desired degree of one individual.
    pub max_degree: usize,
    /// Keep Infected individuals out of ambient mixing.
    pub isolate_infected: bool,
}

impl AmbientPolicy {
    #[must_use]
    pub fn from_parameters(parameters: &Parameters) -> Self {
        AmbientPolicy {
            effective_degree: parameters.effective_contact_degree(),
            max_degree: parameters.max_ambient_degree,
            isolate_infected: parameters.isolate_infected,
        }
    }

    /// Whether an individual in `status` may initiate or receive ambient edges. The dead never
    /// do.
    #[must_use]
    pub fn participates(&self, status: HealthStatus) -> bool {
        match status {
            HealthStatus::Dead => false,
            HealthStatus::Infected => !self.isolate_infected,
            _ => true,
        }
    }

    fn degree_distribution(&self) -> ClampedNormal {
        ClampedNormal::new(self.effective_degree, self.effective_degree)
    }
}

/// Partners are drawn by rejection while they are needed from a pool at least this many
/// times larger; otherwise the pool is listed in full.
const REJECTION_POOL_RATIO: usize = 4;
const REJECTION_ATTEMPTS_PER_PARTNER: usize = 16;

/// Chooses `needed` distinct partners for `source` uniformly among the `available`
/// participants it is not yet connected to.
fn choose_partners<R: Rng>(
    network: &ContactNetwork,
    participants: &[IndividualId],
    source: IndividualId,
    needed: usize,
    available: usize,
    rng: &mut R,
) -> Result<Vec<IndividualId>, ContagionError> {
    if needed == 0 {
        return Ok(Vec::new());
    }

    if needed * REJECTION_POOL_RATIO <= available {
        let mut chosen = Vec::with_capacity(needed);
        for _ in 0..needed * REJECTION_ATTEMPTS_PER_PARTNER {
            let candidate = participants[rng.random_range(0..participants.len())];
            if candidate != source
                && !network.has_edge(source, candidate)
                && !chosen.contains(&candidate)
            {
                chosen.push(candidate);
                if chosen.len() == needed {
                    return Ok(chosen);
                }
            }
        }
        trace!("individual {source}: rejection sampling gave up, listing candidates");
    }

    let candidates: Vec<IndividualId> = participants
        .iter()
        .copied()
        .filter(|&other| other != source && !network.has_edge(source, other))
        .collect();
    sample_multiple_from_known_length(rng, candidates.into_iter(), needed)
}

/// Replaces yesterday's ambient edges with a freshly sampled set and returns it.
///
/// Individuals are visited in ascending id order. Household edges are left untouched, and
/// anyone already connected to an individual (including its household) is excluded from its
/// candidates. While the degree target is small next to the population, partners are found by
/// rejection, so a day costs about O(N * degree) rather than O(N^2).
///
/// # Errors
///
/// Returns [`ContagionError::ExhaustedCandidates`] if a sampling step asks for more
/// candidates than exist, and propagates edge insertion failures. Both indicate a logic
/// fault; the network may be left partially rewired.
pub fn rewire_ambient_edges<R: Rng>(
    network: &mut ContactNetwork,
    population: &Population,
    policy: &AmbientPolicy,
    previous: AmbientEdges,
    rng: &mut R,
) -> Result<AmbientEdges, ContagionError> {
    let mut removed = 0;
    for (a, b) in previous.pairs {
        if network.edge_kind(a, b) == Some(EdgeKind::Ambient) {
            network.remove_edge(a, b);
            removed += 1;
        }
    }

    let distribution = policy.degree_distribution();
    let participating: Vec<bool> = population
        .iter()
        .map(|individual| policy.participates(individual.health_status))
        .collect();
    let participants: Vec<IndividualId> = population
        .ids()
        .filter(|id| participating[id.index()])
        .collect();
    let mut current = AmbientEdges::new();

    for &source in &participants {
        let desired = distribution.sample_count(rng).min(policy.max_degree);
        let existing = network.degree_of_kind(source, EdgeKind::Ambient);
        if desired <= existing {
            continue;
        }

        let connected = network
            .neighbors(source)
            .filter(|neighbor| participating[neighbor.index()])
            .count();
        let available = participants.len() - 1 - connected;
        let needed = (desired - existing).min(available);
        trace!(
            "individual {source}: desired ambient degree {desired}, has {existing}, adding {needed} of {available} candidates"
        );

        for target in choose_partners(network, &participants, source, needed, available, rng)? {
            network.add_edge(source, target, EdgeKind::Ambient)?;
            current.push(source, target);
        }
    }

    debug!(
        "rewired ambient edges: removed {removed}, added {}",
        current.len()
    );
    Ok(current)
}
