use std::fmt::{self, Display};
use std::io;

use crate::population::{HealthStatus, IndividualId};

/// Provides `ContagionError` and maps to other errors to
/// convert to a `ContagionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ContagionError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    /// A parameter is missing or outside of its documented bounds. Raised before
    /// a run starts.
    InvalidConfiguration(String),
    /// A sampling step asked for more individuals than were available. This is a
    /// logic fault: the bounding rules in the partitioner and the rewiring step
    /// should make it unreachable.
    ExhaustedCandidates {
        requested: usize,
        available: usize,
    },
    CannotMakeEdgeToSelf(IndividualId),
    EdgeAlreadyExists(IndividualId, IndividualId),
    UnknownIndividual(IndividualId),
    InvalidTransition {
        id: IndividualId,
        from: HealthStatus,
        to: HealthStatus,
    },
    HouseholdAlreadyAssigned(IndividualId),
    PluginNotInitialized(&'static str),
    ContagionError(String),
}

impl From<io::Error> for ContagionError {
    fn from(error: io::Error) -> Self {
        ContagionError::IoError(error)
    }
}

impl From<serde_json::Error> for ContagionError {
    fn from(error: serde_json::Error) -> Self {
        ContagionError::JsonError(error)
    }
}

impl From<String> for ContagionError {
    fn from(error: String) -> Self {
        ContagionError::ContagionError(error)
    }
}

impl From<&str> for ContagionError {
    fn from(error: &str) -> Self {
        ContagionError::ContagionError(error.to_string())
    }
}

impl std::error::Error for ContagionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContagionError::IoError(error) => Some(error),
            ContagionError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ContagionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContagionError::IoError(error) => write!(f, "I/O error: {error}"),
            ContagionError::JsonError(error) => write!(f, "JSON error: {error}"),
            ContagionError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {message}")
            }
            ContagionError::ExhaustedCandidates {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} samples but only {available} candidates are available"
            ),
            ContagionError::CannotMakeEdgeToSelf(id) => {
                write!(f, "cannot make an edge from individual {id} to itself")
            }
            ContagionError::EdgeAlreadyExists(a, b) => {
                write!(f, "an edge between {a} and {b} already exists")
            }
            ContagionError::UnknownIndividual(id) => write!(f, "unknown individual {id}"),
            ContagionError::InvalidTransition { id, from, to } => {
                write!(f, "individual {id} cannot move from {from} to {to}")
            }
            ContagionError::HouseholdAlreadyAssigned(id) => {
                write!(f, "individual {id} already belongs to a household")
            }
            ContagionError::PluginNotInitialized(name) => {
                write!(f, "the {name} plugin has not been initialized")
            }
            ContagionError::ContagionError(message) => write!(f, "Error: {message}"),
        }
    }
}
