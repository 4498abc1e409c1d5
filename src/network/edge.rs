use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::population::IndividualId;

/// The two classes of contact edges.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Permanent edge between members of the same household.
    Household,
    /// Casual contact that only lasts for the day it was sampled on.
    Ambient,
}

/// One entry of an individual's adjacency list. Edges are undirected: an edge between `a`
/// and `b` appears as `Edge { neighbor: b, .. }` in `a`'s list and as
/// `Edge { neighbor: a, .. }` in `b`'s list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The individual on the other end of this edge.
    pub neighbor: IndividualId,
    pub kind: EdgeKind,
}

/// Orders the endpoints of an undirected edge so that the smaller id comes first.
#[must_use]
pub fn ordered_pair(a: IndividualId, b: IndividualId) -> (IndividualId, IndividualId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
