//! Per-day views of the simulation handed to an external consumer such as a renderer.
//!
//! A [`Snapshot`] is taken after a day has been fully computed, so it never mixes edges or
//! states from two different days. It owns its data: observers may keep it for as long as
//! they like without holding on to the simulation.
use std::ops::ControlFlow;

use serde::Serialize;

use crate::context::Day;
use crate::error::ContagionError;
use crate::network::{ContactNetwork, EdgeKind};
use crate::population::{HealthStatus, IndividualId, Population, StatusCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotEdge {
    pub source: IndividualId,
    pub target: IndividualId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub day: Day,
    /// Indexed by [`IndividualId::index`].
    pub health_statuses: Vec<HealthStatus>,
    /// Every edge once with `source < target`, sorted.
    pub edges: Vec<SnapshotEdge>,
    pub counts: StatusCounts,
}

impl Snapshot {
    #[must_use]
    pub fn capture(day: Day, population: &Population, network: &ContactNetwork) -> Self {
        Snapshot {
            day,
            health_statuses: population
                .iter()
                .map(|individual| individual.health_status)
                .collect(),
            edges: network
                .edges()
                .into_iter()
                .map(|(source, target, kind)| SnapshotEdge {
                    source,
                    target,
                    kind,
                })
                .collect(),
            counts: population.status_counts(),
        }
    }

    #[must_use]
    pub fn health_status(&self, id: IndividualId) -> Option<HealthStatus> {
        self.health_statuses.get(id.index()).copied()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &SnapshotEdge> + '_ {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    /// # Errors
    ///
    /// Returns [`ContagionError::JsonError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ContagionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receives every snapshot of a run, in day order, before the next day is computed.
/// Returning [`ControlFlow::Break`] stops the run once the current day is complete.
pub trait SnapshotObserver {
    fn on_snapshot(&mut self, snapshot: &Snapshot) -> ControlFlow<()>;
}

impl<F> SnapshotObserver for F
where
    F: FnMut(&Snapshot) -> ControlFlow<()>,
{
    fn on_snapshot(&mut self, snapshot: &Snapshot) -> ControlFlow<()> {
        self(snapshot)
    }
}

/// An observer that keeps every snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotObserver for SnapshotRecorder {
    fn on_snapshot(&mut self, snapshot: &Snapshot) -> ControlFlow<()> {
        self.snapshots.push(snapshot.clone());
        ControlFlow::Continue(())
    }
}

/// An observer that ignores every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SnapshotObserver for NoopObserver {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
