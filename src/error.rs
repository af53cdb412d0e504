//! Error types for kinship graph operations.
//!
//! Every fallible operation in the crate returns [`KinshipError`]. An
//! unresolvable kinship label is NOT an error: the resolver falls back to the
//! person's role label (or "Member") as a normal return value.

use thiserror::Error;

use crate::graph::{PersonId, RelKind};

/// Errors surfaced by graph mutations and kinship computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KinshipError {
    /// The pair already holds a semantic relationship; a second one (of any
    /// kind) contradicts it. Surfaced to the mutation caller, never retried.
    #[error("{a} and {b} already hold a \"{existing}\" relationship")]
    Conflict {
        a: PersonId,
        b: PersonId,
        existing: RelKind,
    },

    /// Generation propagation assigned two different generations to the same
    /// person. Fatal for that computation; indicates corrupt upstream data.
    #[error("generation conflict for {person}: computed both {first} and {second}")]
    Inconsistency {
        person: PersonId,
        first: i32,
        second: i32,
    },

    /// A referenced person is not present in the graph.
    #[error("unknown person: {0}")]
    UnknownPerson(PersonId),

    /// A person cannot hold a relationship with themselves.
    #[error("self-relationship rejected for {0}")]
    SelfRelationship(PersonId),

    /// A person with this id is already in the graph.
    #[error("person {0} is already in the graph")]
    DuplicatePerson(PersonId),

    /// A loaded snapshot holds an edge without its mandatory mirror edge.
    #[error("edge {from} -> {to} ({kind}) has no reciprocal edge")]
    MissingReciprocal {
        from: PersonId,
        to: PersonId,
        kind: RelKind,
    },

    /// A relationship kind string from the boundary was not recognized.
    #[error("unknown relationship kind: {0:?}")]
    InvalidKind(String),
}
