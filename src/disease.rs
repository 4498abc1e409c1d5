//! The disease state machine.
//!
//! Every individual moves along Healthy -> Incubating -> Infected -> Recovered | Dead and never
//! back. A day is evaluated in two steps: all transitions are first *planned* against the
//! health states and edges as they stand at the start of the day, then *committed* together.
//! An individual exposed during a day therefore cannot expose anyone else until the next day.
//!
//! Within a day, for each individual (ascending id):
//! * Healthy: each neighbor that is Incubating or Infected gets one Bernoulli draw with the
//!   infection probability, in ascending id order, stopping at the first success. An exposed
//!   individual becomes Incubating and, if the incubation period is zero, Infected straight
//!   away.
//! * Incubating: the day counter advances; at `incubation_days` the individual becomes
//!   Infected.
//! * Infected: the day counter advances; at `recovery_days` one draw with the death
//!   probability decides between Dead and Recovered.
//!
//! Every transition resets the day counter to zero. Everyone else still alive has their
//! counter advanced.
use log::{debug, trace};
use serde::Serialize;

use crate::context::Context;
use crate::define_rng;
use crate::error::ContagionError;
use crate::network::{ContactNetwork, ContextNetworkExt};
use crate::parameters::{ContextParametersExt, Parameters};
use crate::population::{ContextPopulationExt, HealthStatus, IndividualId, Population};
use crate::rand::Rng;
use crate::random::{sample_multiple_from_known_length, ContextRandomExt};
use crate::HashSet;

define_rng!(TransmissionRng);
define_rng!(OutcomeRng);
define_rng!(SeedingRng);

/// One planned change of health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub id: IndividualId,
    pub from: HealthStatus,
    pub to: HealthStatus,
}

/// What happened on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTransitions {
    /// Healthy individuals that became Incubating.
    pub exposed: usize,
    /// Individuals that became Infected.
    pub onsets: usize,
    pub recovered: usize,
    pub died: usize,
}

impl DayTransitions {
    fn record(&mut self, to: HealthStatus) {
        match to {
            HealthStatus::Incubating => self.exposed += 1,
            HealthStatus::Infected => self.onsets += 1,
            HealthStatus::Recovered => self.recovered += 1,
            HealthStatus::Dead => self.died += 1,
            HealthStatus::Healthy => {}
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == DayTransitions::default()
    }
}

/// Healthy individuals exposed today, ascending.
///
/// Only neighbors that were Incubating or Infected in `population` count, so calling this
/// before any of today's transitions are applied gives start-of-day semantics.
pub fn plan_exposures<R: Rng>(
    population: &Population,
    network: &ContactNetwork,
    infection_probability: f64,
    rng: &mut R,
) -> Vec<IndividualId> {
    let mut exposed = Vec::new();
    for individual in population.iter() {
        if individual.health_status != HealthStatus::Healthy {
            continue;
        }

        let mut infectious: Vec<IndividualId> = network
            .neighbors(individual.id)
            .filter(|neighbor| {
                population
                    .health_status(*neighbor)
                    .is_ok_and(HealthStatus::is_infectious)
            })
            .collect();
        infectious.sort_unstable();

        for source in infectious {
            if rng.random_bool(infection_probability) {
                trace!("individual {source} exposed individual {}", individual.id);
                exposed.push(individual.id);
                break;
            }
        }
    }
    exposed
}

/// Incubation and recovery transitions due today, ascending by id. Outcome draws for
/// resolving infections come from `rng`.
pub fn plan_progressions<R: Rng>(
    population: &Population,
    parameters: &Parameters,
    rng: &mut R,
) -> Vec<Transition> {
    let mut transitions = Vec::new();
    for individual in population.iter() {
        let days = individual.days_in_state + 1;
        let to = match individual.health_status {
            HealthStatus::Incubating if days >= parameters.incubation_days => {
                HealthStatus::Infected
            }
            HealthStatus::Infected if days >= parameters.recovery_days => {
                if rng.random_bool(parameters.death_probability) {
                    HealthStatus::Dead
                } else {
                    HealthStatus::Recovered
                }
            }
            _ => continue,
        };
        transitions.push(Transition {
            id: individual.id,
            from: individual.health_status,
            to,
        });
    }
    transitions
}

/// Combines the exposures and progressions of one day into the ordered list of transitions to
/// commit.
#[must_use]
pub fn combine_transitions(
    exposed: &[IndividualId],
    progressions: Vec<Transition>,
    incubation_days: u32,
) -> Vec<Transition> {
    let mut transitions = progressions;
    for &id in exposed {
        transitions.push(Transition {
            id,
            from: HealthStatus::Healthy,
            to: HealthStatus::Incubating,
        });
        if incubation_days == 0 {
            transitions.push(Transition {
                id,
                from: HealthStatus::Incubating,
                to: HealthStatus::Infected,
            });
        }
    }
    transitions
}

/// Applies `transitions` in order, then advances the day counter of every living individual
/// that did not change state.
///
/// # Errors
///
/// Returns [`ContagionError::InvalidTransition`] if a transition does not start from the
/// individual's current status or is not a forward step.
pub fn commit_transitions(
    population: &mut Population,
    transitions: &[Transition],
) -> Result<DayTransitions, ContagionError> {
    let mut summary = DayTransitions::default();
    let mut changed: HashSet<IndividualId> = HashSet::default();

    for transition in transitions {
        let current = population.health_status(transition.id)?;
        if current != transition.from {
            return Err(ContagionError::InvalidTransition {
                id: transition.id,
                from: current,
                to: transition.to,
            });
        }
        population.set_health_status(transition.id, transition.to)?;
        summary.record(transition.to);
        changed.insert(transition.id);
    }

    let unchanged: Vec<IndividualId> = population
        .iter()
        .filter(|individual| {
            individual.health_status != HealthStatus::Dead && !changed.contains(&individual.id)
        })
        .map(|individual| individual.id)
        .collect();
    for id in unchanged {
        population.increment_days_in_state(id)?;
    }

    Ok(summary)
}

pub trait ContextDiseaseExt {
    /// Moves `count` uniformly chosen Healthy individuals to Incubating.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::ExhaustedCandidates`] if fewer than `count` individuals are
    /// Healthy, or a missing-plugin error.
    fn seed_infections(&mut self, count: usize) -> Result<Vec<IndividualId>, ContagionError>;

    /// Plans today's transitions from the current states and edges without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] if a plugin is missing.
    fn plan_transitions(&self) -> Result<Vec<Transition>, ContagionError>;

    /// Plans and commits one day of the disease state machine.
    ///
    /// # Errors
    ///
    /// See [`ContextDiseaseExt::plan_transitions`] and [`commit_transitions`].
    fn advance_disease(&mut self) -> Result<DayTransitions, ContagionError>;
}

impl ContextDiseaseExt for Context {
    fn seed_infections(&mut self, count: usize) -> Result<Vec<IndividualId>, ContagionError> {
        let healthy = self.query_individuals(HealthStatus::Healthy)?;
        let seeds = self.sample(SeedingRng, |rng| {
            sample_multiple_from_known_length(rng, healthy.into_iter(), count)
        })?;

        let population = self.get_population_mut()?;
        for &id in &seeds {
            population.set_health_status(id, HealthStatus::Incubating)?;
        }
        debug!("seeded {} initial infections: {seeds:?}", seeds.len());
        Ok(seeds)
    }

    fn plan_transitions(&self) -> Result<Vec<Transition>, ContagionError> {
        let parameters = self.get_parameters()?;
        let population = self.get_population()?;
        let network = self.get_network()?;

        let exposed = self.sample(TransmissionRng, |rng| {
            plan_exposures(population, network, parameters.infection_probability, rng)
        });
        let progressions = self.sample(OutcomeRng, |rng| {
            plan_progressions(population, parameters, rng)
        });
        Ok(combine_transitions(
            &exposed,
            progressions,
            parameters.incubation_days,
        ))
    }

    fn advance_disease(&mut self) -> Result<DayTransitions, ContagionError> {
        let transitions = self.plan_transitions()?;
        let summary = commit_transitions(self.get_population_mut()?, &transitions)?;
        debug!(
            "day {}: {} exposed, {} onsets, {} recovered, {} died",
            self.get_current_day(),
            summary.exposed,
            summary.onsets,
            summary.recovered,
            summary.died
        );
        Ok(summary)
    }
}
