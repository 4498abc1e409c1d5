/*!

`ContactNetwork` stores the undirected contact graph as one adjacency list per individual,
indexed by `IndividualId`. Every edge is stored twice, once in each endpoint's list, so that
neighbor lookups never have to scan the whole graph.

This structure is only concerned with storing unique, well-formed edges. Deciding which edges
should exist is the job of the household partitioner and the ambient rewiring step.

*/

use log::trace;

use crate::error::ContagionError;
use crate::network::edge::{Edge, EdgeKind};
use crate::population::IndividualId;

/// The underlying storage type representing the adjacency list
pub(super) type AdjacencyList = Vec<Edge>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactNetwork {
    /// The backing storage vector for the adjacency lists.
    adjacency_lists: Vec<AdjacencyList>,
}

impl ContactNetwork {
    /// Creates a network with `size` individuals and no edges.
    #[must_use]
    pub fn new(size: usize) -> Self {
        ContactNetwork {
            adjacency_lists: vec![AdjacencyList::new(); size],
        }
    }

    /// Number of individuals (nodes) in the network.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adjacency_lists.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency_lists.is_empty()
    }

    fn check_individual(&self, id: IndividualId) -> Result<(), ContagionError> {
        if id.index() < self.adjacency_lists.len() {
            Ok(())
        } else {
            Err(ContagionError::UnknownIndividual(id))
        }
    }

    /// Adds an undirected edge between `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError`] if `a == b`, if either id is out of range, or if any edge
    /// between the two already exists.
    pub fn add_edge(
        &mut self,
        a: IndividualId,
        b: IndividualId,
        kind: EdgeKind,
    ) -> Result<(), ContagionError> {
        if a == b {
            return Err(ContagionError::CannotMakeEdgeToSelf(a));
        }
        self.check_individual(a)?;
        self.check_individual(b)?;

        // Enforce uniqueness by neighbor
        if self.has_edge(a, b) {
            return Err(ContagionError::EdgeAlreadyExists(a, b));
        }

        trace!("adding {kind} edge {a} <-> {b}");
        self.adjacency_lists[a.index()].push(Edge { neighbor: b, kind });
        self.adjacency_lists[b.index()].push(Edge { neighbor: a, kind });
        Ok(())
    }

    /// Removes the edge between `a` and `b` and returns its kind, or `None` if the edge does
    /// not exist.
    pub fn remove_edge(&mut self, a: IndividualId, b: IndividualId) -> Option<EdgeKind> {
        let kind = Self::remove_from_list(self.adjacency_lists.get_mut(a.index())?, b)?;
        Self::remove_from_list(self.adjacency_lists.get_mut(b.index())?, a);
        trace!("removed {kind} edge {a} <-> {b}");
        Some(kind)
    }

    fn remove_from_list(edges: &mut AdjacencyList, neighbor: IndividualId) -> Option<EdgeKind> {
        edges
            .iter()
            .position(|edge| edge.neighbor == neighbor)
            .map(|pos| edges.swap_remove(pos).kind)
    }

    /// Returns the kind of the edge between `a` and `b`, if there is one.
    #[must_use]
    pub fn edge_kind(&self, a: IndividualId, b: IndividualId) -> Option<EdgeKind> {
        self.adjacency_lists
            .get(a.index())
            .and_then(|edges| edges.iter().find(|edge| edge.neighbor == b))
            .map(|edge| edge.kind)
    }

    #[must_use]
    pub fn has_edge(&self, a: IndividualId, b: IndividualId) -> bool {
        self.edge_kind(a, b).is_some()
    }

    /// The adjacency list of `id`, or an empty slice for an unknown id.
    #[must_use]
    pub fn edges_of(&self, id: IndividualId) -> &[Edge] {
        match self.adjacency_lists.get(id.index()) {
            Some(edges) => edges,
            None => &[],
        }
    }

    /// All neighbors of `id` over edges of any kind.
    pub fn neighbors(&self, id: IndividualId) -> impl Iterator<Item = IndividualId> + '_ {
        self.edges_of(id).iter().map(|edge| edge.neighbor)
    }

    #[must_use]
    pub fn degree(&self, id: IndividualId) -> usize {
        self.edges_of(id).len()
    }

    #[must_use]
    pub fn degree_of_kind(&self, id: IndividualId, kind: EdgeKind) -> usize {
        self.edges_of(id)
            .iter()
            .filter(|edge| edge.kind == kind)
            .count()
    }

    /// Number of undirected edges of the given kind.
    #[must_use]
    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        let endpoints: usize = self
            .adjacency_lists
            .iter()
            .map(|edges| edges.iter().filter(|edge| edge.kind == kind).count())
            .sum();
        endpoints / 2
    }

    /// Every undirected edge once, as `(source, target, kind)` with `source < target`, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(IndividualId, IndividualId, EdgeKind)> {
        let mut edges: Vec<_> = self
            .adjacency_lists
            .iter()
            .enumerate()
            .flat_map(|(index, list)| {
                let source = IndividualId::new(index);
                list.iter()
                    .filter(move |edge| source < edge.neighbor)
                    .map(move |edge| (source, edge.neighbor, edge.kind))
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Every undirected edge of one kind as ordered pairs, sorted.
    #[must_use]
    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<(IndividualId, IndividualId)> {
        self.edges()
            .into_iter()
            .filter(|(_, _, edge_kind)| *edge_kind == kind)
            .map(|(source, target, _)| (source, target))
            .collect()
    }

    /// Returns a list of `IndividualId`s having exactly `degree` edges of the given kind.
    #[must_use]
    pub fn find_individuals_by_degree(&self, kind: EdgeKind, degree: usize) -> Vec<IndividualId> {
        (0..self.adjacency_lists.len())
            .map(IndividualId::new)
            .filter(|id| self.degree_of_kind(*id, kind) == degree)
            .collect()
    }
}
