//! An epidemic simulation on a dynamic, household-clustered contact network
//!
//! A run tracks every individual of a synthetic population through the
//! disease states Healthy, Incubating, Infected and finally Recovered or
//! Dead, one simulated day at a time. Individuals are connected by an
//! undirected contact network with two kinds of edges:
//! * *Household* edges fully connect each household cluster. They are created
//!   once, before the first day, and never removed.
//! * *Ambient* edges model casual social contact. They are thrown away and
//!   resampled every day, with a per-individual degree target that shrinks as
//!   the isolation policy tightens.
//!
//! The central object of a run is the [`Context`](context::Context), which
//! holds the state of each module as a typed data plugin: the parameters,
//! the population, the contact network and the named random streams. The
//! modules access it through extension traits:
//! * [`ContextParametersExt`](parameters::ContextParametersExt) stores the
//!   validated configuration.
//! * [`ContextPopulationExt`](population::ContextPopulationExt) owns the
//!   individuals and answers queries about their health.
//! * [`ContextNetworkExt`](network::ContextNetworkExt) owns the contact
//!   network and rewires its ambient edges.
//! * [`ContextHouseholdExt`](household::ContextHouseholdExt) partitions the
//!   population into households.
//! * [`ContextDiseaseExt`](disease::ContextDiseaseExt) seeds the infection and
//!   advances the disease state machine.
//!
//! The [`Simulation`](simulation::Simulation) driver wires these together
//! into a day loop, hands a [`Snapshot`](snapshot::Snapshot) of every day to
//! a [`SnapshotObserver`](snapshot::SnapshotObserver) and reports a
//! [`RunSummary`](simulation::RunSummary) at the end.
pub mod context;
pub use context::{Context, Day};

pub mod disease;
pub use disease::ContextDiseaseExt;

pub mod error;
pub use error::ContagionError;

pub mod hashing;
pub use hashing::{HashMap, HashSet};

pub mod household;
pub use household::ContextHouseholdExt;

pub mod log;
pub use crate::log::{debug, error, info, trace, warn};

pub mod network;
pub use network::{AmbientEdges, ContactNetwork, ContextNetworkExt, EdgeKind};

pub mod parameters;
pub use parameters::{ContextParametersExt, HouseholdDensity, Parameters};

pub mod population;
pub use population::{
    ContextPopulationExt, HealthStatus, HouseholdId, Individual, IndividualId, Population,
    StatusCounts,
};

pub mod random;
pub use random::{ClampedNormal, ContextRandomExt, RngId};

pub mod runner;
pub use runner::{run_with_args, BaseArgs};

pub mod simulation;
pub use simulation::{run_batch, RunSummary, Simulation, StopHandle, Termination};

pub mod snapshot;
pub use snapshot::{Snapshot, SnapshotEdge, SnapshotObserver, SnapshotRecorder};

// Re-exports used by the exported macros.
pub use paste;
pub use rand;
