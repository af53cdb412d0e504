//! Relationship edge types.
//!
//! Edges are typed, directed connections between people. Each edge has:
//! - A kind (parent, child, partner, sibling)
//! - A creation timestamp (opaque string owned by the external store)
//!
//! Every edge is accompanied by its mandatory reciprocal on the peer:
//! parent <-> child, partner <-> partner, sibling <-> sibling. An edge
//! `(A -> B, kind)` reads as "B is A's `kind`".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KinshipError;

use super::person::PersonId;

/// The semantic kind of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelKind {
    /// The peer is this person's parent.
    Parent,
    /// The peer is this person's child.
    Child,
    /// The peer is this person's partner.
    Partner,
    /// The peer is this person's sibling.
    Sibling,
}

impl RelKind {
    /// The mirror-image kind that must appear on the peer:
    /// parent <-> child, partner and sibling are self-reciprocal.
    #[inline]
    pub fn reciprocal(self) -> Self {
        match self {
            Self::Parent => Self::Child,
            Self::Child => Self::Parent,
            Self::Partner => Self::Partner,
            Self::Sibling => Self::Sibling,
        }
    }

    /// The generation delta of the peer relative to the edge owner:
    /// a parent sits one generation earlier, a child one later.
    #[inline]
    pub fn generation_delta(self) -> i32 {
        match self {
            Self::Parent => -1,
            Self::Child => 1,
            Self::Partner | Self::Sibling => 0,
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Child => write!(f, "child"),
            Self::Partner => write!(f, "partner"),
            Self::Sibling => write!(f, "sibling"),
        }
    }
}

impl FromStr for RelKind {
    type Err = KinshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            "partner" => Ok(Self::Partner),
            "sibling" => Ok(Self::Sibling),
            other => Err(KinshipError::InvalidKind(other.to_string())),
        }
    }
}

/// A relationship edge as held by one person.
///
/// Serializes with the backing store's field names (`uid`, `type`, `addedAt`).
/// Insertion order within a person's edge list is preserved; it is not
/// semantically significant but makes every tie-break reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelEdge {
    /// The related person.
    pub uid: PersonId,

    /// What the related person is to the edge owner.
    #[serde(rename = "type")]
    pub kind: RelKind,

    /// Creation timestamp, opaque to the engine (the store owns time).
    #[serde(rename = "addedAt")]
    pub added_at: String,
}

impl RelEdge {
    /// Create a new edge.
    pub fn new(uid: impl Into<PersonId>, kind: RelKind, added_at: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind,
            added_at: added_at.into(),
        }
    }
}
