//! Kinship graph data structures and operations.
//!
//! This module provides the core graph structure using petgraph's StableGraph
//! keyed by stable person uids, with append-only reciprocal relationship
//! edges and the placement mutation used when a person joins a family tree.

mod edge;
mod engine;
mod person;

pub use edge::{RelEdge, RelKind};
pub use engine::{KinshipEngine, Placement};
pub use person::{MemberRecord, Person, PersonId};
