//! Individuals and their disease state.
//!
//! A [`Population`] is created once per run with every individual Healthy and without a
//! household. Individuals are never added or removed afterwards; their [`IndividualId`]s are
//! dense indices `0..N`.
use std::fmt::{self, Display};

use log::trace;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::ContagionError;
use crate::parameters::MIN_POPULATION_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(usize);

impl IndividualId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        IndividualId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseholdId(u32);

impl HouseholdId {
    #[must_use]
    pub fn new(index: u32) -> Self {
        HouseholdId(index)
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
)]
pub enum HealthStatus {
    Healthy,
    Incubating,
    Infected,
    Recovered,
    Dead,
}

impl HealthStatus {
    /// Incubating and Infected individuals expose their neighbors.
    #[must_use]
    pub fn is_infectious(self) -> bool {
        matches!(self, HealthStatus::Incubating | HealthStatus::Infected)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, HealthStatus::Recovered | HealthStatus::Dead)
    }

    /// Whether `self -> next` is a step along Healthy -> Incubating -> Infected -> Recovered|Dead.
    #[must_use]
    pub fn can_transition_to(self, next: HealthStatus) -> bool {
        matches!(
            (self, next),
            (HealthStatus::Healthy, HealthStatus::Incubating)
                | (HealthStatus::Incubating, HealthStatus::Infected)
                | (
                    HealthStatus::Infected,
                    HealthStatus::Recovered | HealthStatus::Dead
                )
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Individual {
    pub id: IndividualId,
    pub health_status: HealthStatus,
    pub days_in_state: u32,
    pub household: Option<HouseholdId>,
}

/// Number of individuals in each [`HealthStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub healthy: usize,
    pub incubating: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn get(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Incubating => self.incubating,
            HealthStatus::Infected => self.infected,
            HealthStatus::Recovered => self.recovered,
            HealthStatus::Dead => self.dead,
        }
    }

    fn increment(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Incubating => self.incubating += 1,
            HealthStatus::Infected => self.infected += 1,
            HealthStatus::Recovered => self.recovered += 1,
            HealthStatus::Dead => self.dead += 1,
        }
    }

    /// Individuals currently carrying the disease.
    #[must_use]
    pub fn active(&self) -> usize {
        self.incubating + self.infected
    }

    /// Everyone who has left Healthy at some point.
    #[must_use]
    pub fn ever_infected(&self) -> usize {
        self.incubating + self.infected + self.recovered + self.dead
    }

    #[must_use]
    pub fn alive(&self) -> usize {
        self.total() - self.dead
    }

    #[must_use]
    pub fn total(&self) -> usize {
        HealthStatus::iter().map(|status| self.get(status)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Population {
    individuals: Vec<Individual>,
    household_count: u32,
}

impl Population {
    /// Creates `size` Healthy individuals with no household.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if `size` is below the minimum
    /// population size of 10.
    pub fn new(size: usize) -> Result<Self, ContagionError> {
        if size < MIN_POPULATION_SIZE {
            return Err(ContagionError::InvalidConfiguration(format!(
                "population of {size} is too small to cluster; at least {MIN_POPULATION_SIZE} required"
            )));
        }
        let individuals = (0..size)
            .map(|index| Individual {
                id: IndividualId(index),
                health_status: HealthStatus::Healthy,
                days_in_state: 0,
                household: None,
            })
            .collect();
        Ok(Population {
            individuals,
            household_count: 0,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`ContagionError::UnknownIndividual`] if `id` is out of range.
    pub fn get(&self, id: IndividualId) -> Result<&Individual, ContagionError> {
        self.individuals
            .get(id.0)
            .ok_or(ContagionError::UnknownIndividual(id))
    }

    fn get_mut(&mut self, id: IndividualId) -> Result<&mut Individual, ContagionError> {
        self.individuals
            .get_mut(id.0)
            .ok_or(ContagionError::UnknownIndividual(id))
    }

    /// # Errors
    ///
    /// Returns [`ContagionError::UnknownIndividual`] if `id` is out of range.
    pub fn health_status(&self, id: IndividualId) -> Result<HealthStatus, ContagionError> {
        Ok(self.get(id)?.health_status)
    }

    /// Iterates over individuals in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Individual> + '_ {
        self.individuals.iter()
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = IndividualId> {
        (0..self.individuals.len()).map(IndividualId)
    }

    /// Ids of all individuals with the given status, ascending.
    #[must_use]
    pub fn query(&self, status: HealthStatus) -> Vec<IndividualId> {
        self.individuals
            .iter()
            .filter(|individual| individual.health_status == status)
            .map(|individual| individual.id)
            .collect()
    }

    #[must_use]
    pub fn count(&self, status: HealthStatus) -> usize {
        self.individuals
            .iter()
            .filter(|individual| individual.health_status == status)
            .count()
    }

    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for individual in &self.individuals {
            counts.increment(individual.health_status);
        }
        counts
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.len() - self.count(HealthStatus::Dead)
    }

    /// Moves an individual to `status` and resets its day counter.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidTransition`] unless the move is a single forward step of
    /// the disease state machine.
    pub fn set_health_status(
        &mut self,
        id: IndividualId,
        status: HealthStatus,
    ) -> Result<(), ContagionError> {
        let individual = self.get_mut(id)?;
        let from = individual.health_status;
        if !from.can_transition_to(status) {
            return Err(ContagionError::InvalidTransition {
                id,
                from,
                to: status,
            });
        }
        trace!("individual {id}: {from} -> {status}");
        individual.health_status = status;
        individual.days_in_state = 0;
        Ok(())
    }

    /// Advances the day counter of an individual and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::UnknownIndividual`] if `id` is out of range.
    pub fn increment_days_in_state(&mut self, id: IndividualId) -> Result<u32, ContagionError> {
        let individual = self.get_mut(id)?;
        individual.days_in_state += 1;
        Ok(individual.days_in_state)
    }

    /// Allocates a fresh household id.
    pub fn new_household(&mut self) -> HouseholdId {
        let household = HouseholdId(self.household_count);
        self.household_count += 1;
        household
    }

    /// # Errors
    ///
    /// Returns [`ContagionError::HouseholdAlreadyAssigned`] if the individual already has a
    /// household, since household membership is permanent.
    pub fn assign_household(
        &mut self,
        id: IndividualId,
        household: HouseholdId,
    ) -> Result<(), ContagionError> {
        let individual = self.get_mut(id)?;
        if individual.household.is_some() {
            return Err(ContagionError::HouseholdAlreadyAssigned(id));
        }
        individual.household = Some(household);
        Ok(())
    }

    /// Number of households allocated so far.
    #[must_use]
    pub fn households(&self) -> usize {
        self.household_count as usize
    }

    #[must_use]
    pub fn household_members(&self, household: HouseholdId) -> Vec<IndividualId> {
        self.individuals
            .iter()
            .filter(|individual| individual.household == Some(household))
            .map(|individual| individual.id)
            .collect()
    }

    /// Individuals that were left out of every household.
    #[must_use]
    pub fn unassigned(&self) -> Vec<IndividualId> {
        self.individuals
            .iter()
            .filter(|individual| individual.household.is_none())
            .map(|individual| individual.id)
            .collect()
    }
}

define_data_plugin!(PopulationPlugin, Option<Population>, None);

pub trait ContextPopulationExt {
    /// Creates the run's population, replacing any previous one.
    ///
    /// # Errors
    ///
    /// See [`Population::new`].
    fn init_population(&mut self, size: usize) -> Result<(), ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_population`.
    fn get_population(&self) -> Result<&Population, ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_population`.
    fn get_population_mut(&mut self) -> Result<&mut Population, ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_population`.
    fn query_individuals(&self, status: HealthStatus) -> Result<Vec<IndividualId>, ContagionError> {
        Ok(self.get_population()?.query(status))
    }

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_population`.
    fn get_status_counts(&self) -> Result<StatusCounts, ContagionError> {
        Ok(self.get_population()?.status_counts())
    }
}

impl ContextPopulationExt for Context {
    fn init_population(&mut self, size: usize) -> Result<(), ContagionError> {
        let population = Population::new(size)?;
        trace!("created population of {size}");
        *self.get_data_mut(PopulationPlugin) = Some(population);
        Ok(())
    }

    fn get_population(&self) -> Result<&Population, ContagionError> {
        self.get_data(PopulationPlugin)
            .and_then(Option::as_ref)
            .ok_or(ContagionError::PluginNotInitialized("population"))
    }

    fn get_population_mut(&mut self) -> Result<&mut Population, ContagionError> {
        self.get_data_mut(PopulationPlugin)
            .as_mut()
            .ok_or(ContagionError::PluginNotInitialized("population"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_population_is_healthy() {
        let population = Population::new(12).unwrap();
        assert_eq!(population.len(), 12);
        for (index, individual) in population.iter().enumerate() {
            assert_eq!(individual.id, IndividualId::new(index));
            assert_eq!(individual.health_status, HealthStatus::Healthy);
            assert_eq!(individual.days_in_state, 0);
            assert_eq!(individual.household, None);
        }
        assert_eq!(population.status_counts().healthy, 12);
    }

    #[test]
    fn too_small() {
        assert!(matches!(
            Population::new(9),
            Err(ContagionError::InvalidConfiguration(_))
        ));
        assert!(Population::new(10).is_ok());
    }

    #[test]
    fn unknown_individual() {
        let population = Population::new(10).unwrap();
        assert!(matches!(
            population.get(IndividualId::new(10)),
            Err(ContagionError::UnknownIndividual(_))
        ));
    }

    #[test]
    fn allowed_transitions() {
        use HealthStatus::*;
        let allowed = [
            (Healthy, Incubating),
            (Incubating, Infected),
            (Infected, Recovered),
            (Infected, Dead),
        ];
        for from in HealthStatus::iter() {
            for to in HealthStatus::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn set_health_status_moves_forward_only() {
        let mut population = Population::new(10).unwrap();
        let id = IndividualId::new(4);
        population.increment_days_in_state(id).unwrap();
        population
            .set_health_status(id, HealthStatus::Incubating)
            .unwrap();
        assert_eq!(population.get(id).unwrap().days_in_state, 0);
        population
            .set_health_status(id, HealthStatus::Infected)
            .unwrap();
        population
            .set_health_status(id, HealthStatus::Recovered)
            .unwrap();

        let result = population.set_health_status(id, HealthStatus::Infected);
        assert!(matches!(
            result,
            Err(ContagionError::InvalidTransition {
                from: HealthStatus::Recovered,
                to: HealthStatus::Infected,
                ..
            })
        ));
        assert_eq!(population.health_status(id).unwrap(), HealthStatus::Recovered);
    }

    #[test]
    fn cannot_skip_states() {
        let mut population = Population::new(10).unwrap();
        let id = IndividualId::new(0);
        assert!(population
            .set_health_status(id, HealthStatus::Infected)
            .is_err());
        assert!(population.set_health_status(id, HealthStatus::Dead).is_err());
    }

    #[test]
    fn queries_and_counts() {
        let mut population = Population::new(10).unwrap();
        for index in [2, 5, 7] {
            population
                .set_health_status(IndividualId::new(index), HealthStatus::Incubating)
                .unwrap();
        }
        population
            .set_health_status(IndividualId::new(5), HealthStatus::Infected)
            .unwrap();
        population
            .set_health_status(IndividualId::new(5), HealthStatus::Dead)
            .unwrap();

        assert_eq!(
            population.query(HealthStatus::Incubating),
            vec![IndividualId::new(2), IndividualId::new(7)]
        );
        assert_eq!(population.count(HealthStatus::Dead), 1);
        assert_eq!(population.alive_count(), 9);

        let counts = population.status_counts();
        assert_eq!(
            counts,
            StatusCounts {
                healthy: 7,
                incubating: 2,
                infected: 0,
                recovered: 0,
                dead: 1,
            }
        );
        assert_eq!(counts.active(), 2);
        assert_eq!(counts.ever_infected(), 3);
        assert_eq!(counts.alive(), 9);
        assert_eq!(counts.total(), 10);
    }

    #[test]
    fn household_assignment_is_permanent() {
        let mut population = Population::new(10).unwrap();
        let first = population.new_household();
        let second = population.new_household();
        assert_ne!(first, second);
        assert_eq!(population.households(), 2);

        let id = IndividualId::new(3);
        population.assign_household(id, first).unwrap();
        assert!(matches!(
            population.assign_household(id, second),
            Err(ContagionError::HouseholdAlreadyAssigned(_))
        ));
        assert_eq!(population.household_members(first), vec![id]);
        assert!(population.household_members(second).is_empty());
        assert_eq!(population.unassigned().len(), 9);
    }

    #[test]
    fn context_population() {
        let mut context = Context::new();
        assert!(matches!(
            context.get_population(),
            Err(ContagionError::PluginNotInitialized("population"))
        ));
        context.init_population(20).unwrap();
        assert_eq!(context.get_population().unwrap().len(), 20);
        context
            .get_population_mut()
            .unwrap()
            .set_health_status(IndividualId::new(1), HealthStatus::Incubating)
            .unwrap();
        assert_eq!(
            context.query_individuals(HealthStatus::Incubating).unwrap(),
            vec![IndividualId::new(1)]
        );
        assert_eq!(context.get_status_counts().unwrap().healthy, 19);
    }
}
