//! A module for modeling the contact network.
//!
//! The network is an undirected graph over the population with two classes of edges. Household
//! edges are created once by the household partitioner and are permanent. Ambient edges are
//! resampled every day by [`rewire_ambient_edges`]; the set returned by one day's rewiring is
//! passed back in the next day so that the caller, not the network, owns day-to-day
//! continuity.

pub mod edge;
mod network;
mod rewire;

pub use edge::{ordered_pair, Edge, EdgeKind};
pub use network::ContactNetwork;
pub use rewire::{rewire_ambient_edges, AmbientEdges, AmbientPolicy};

use crate::context::Context;
use crate::error::ContagionError;
use crate::parameters::ContextParametersExt;
use crate::population::{ContextPopulationExt, IndividualId};
use crate::random::ContextRandomExt;
use crate::{define_data_plugin, define_rng};

define_rng!(ContactRng);

define_data_plugin!(NetworkPlugin, Option<ContactNetwork>, None);

// Public API.
pub trait ContextNetworkExt {
    /// Creates an empty network over the current population.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] if there is no population yet.
    fn init_network(&mut self) -> Result<(), ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_network`.
    fn get_network(&self) -> Result<&ContactNetwork, ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_network`.
    fn get_network_mut(&mut self) -> Result<&mut ContactNetwork, ContagionError>;

    /// Add an undirected edge of the given kind between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError`] if:
    ///
    /// * the network has not been initialized
    /// * `a` and `b` are the same or an edge already exists between them
    fn add_edge(
        &mut self,
        a: IndividualId,
        b: IndividualId,
        kind: EdgeKind,
    ) -> Result<(), ContagionError> {
        self.get_network_mut()?.add_edge(a, b, kind)
    }

    /// Find all individuals with exactly `degree` edges of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] before `init_network`.
    fn find_individuals_by_degree(
        &self,
        kind: EdgeKind,
        degree: usize,
    ) -> Result<Vec<IndividualId>, ContagionError> {
        Ok(self.get_network()?.find_individuals_by_degree(kind, degree))
    }

    /// Drops `previous` and samples today's ambient edges from the contact random stream,
    /// using the stored parameters and the current health states.
    ///
    /// # Errors
    ///
    /// Propagates missing plugins and any error from [`rewire_ambient_edges`]. The network is
    /// put back in place either way.
    fn rewire_ambient_edges(
        &mut self,
        previous: AmbientEdges,
    ) -> Result<AmbientEdges, ContagionError>;
}

impl ContextNetworkExt for Context {
    fn init_network(&mut self) -> Result<(), ContagionError> {
        let size = self.get_population()?.len();
        *self.get_data_mut(NetworkPlugin) = Some(ContactNetwork::new(size));
        Ok(())
    }

    fn get_network(&self) -> Result<&ContactNetwork, ContagionError> {
        self.get_data(NetworkPlugin)
            .and_then(Option::as_ref)
            .ok_or(ContagionError::PluginNotInitialized("network"))
    }

    fn get_network_mut(&mut self) -> Result<&mut ContactNetwork, ContagionError> {
        self.get_data_mut(NetworkPlugin)
            .as_mut()
            .ok_or(ContagionError::PluginNotInitialized("network"))
    }

    fn rewire_ambient_edges(
        &mut self,
        previous: AmbientEdges,
    ) -> Result<AmbientEdges, ContagionError> {
        let policy = AmbientPolicy::from_parameters(self.get_parameters()?);
        let mut network = self
            .take_data(NetworkPlugin)
            .ok_or(ContagionError::PluginNotInitialized("network"))?;

        let result = self.get_population().and_then(|population| {
            self.sample(ContactRng, |rng| {
                rewire_ambient_edges(&mut network, population, &policy, previous, rng)
            })
        });

        *self.get_data_mut(NetworkPlugin) = Some(network);
        result
    }
}
