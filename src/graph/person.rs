//! Person records and identifiers.
//!
//! People are the vertices of the kinship graph. Each person has:
//! - A stable unique identifier (the backing store's document uid)
//! - A display name and optional avatar reference
//! - A freeform role label (informational only, used as a label fallback)
//! - A stored generation number (recomputed; never the ordering ground truth)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::edge::RelEdge;

/// Stable person identifier.
///
/// Wraps the backing document store's uid string. Identifiers order
/// lexicographically; every deterministic tie-break in the crate (couple
/// ordering, unit ordering) compares these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Create a new PersonId from a raw uid string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw uid string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PersonId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A person in the family graph.
///
/// Field names follow the backing store's document shape so records round-trip
/// through the JS boundary unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier.
    pub uid: PersonId,

    /// Display name.
    pub name: String,

    /// Optional avatar reference.
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Freeform role label ("member", "organizer", ...). Informational only;
    /// the label resolver uses it as its final fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Stored generation. A cached display value: layout and ordering always
    /// recompute generations from the edge set.
    #[serde(default = "default_generation")]
    pub generation: i32,
}

fn default_generation() -> i32 {
    1
}

impl Person {
    /// Create a person with just an id and name.
    pub fn new(uid: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            photo_url: None,
            role: None,
            generation: 1,
        }
    }

    /// Set the role label.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the stored generation.
    pub fn with_generation(mut self, generation: i32) -> Self {
        self.generation = generation;
        self
    }
}

/// One person's full document as exchanged with the external store:
/// the person record plus their insertion-ordered relationship edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(flatten)]
    pub person: Person,

    /// Relationship edges in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelEdge>,
}

impl MemberRecord {
    /// Wrap a person with no edges yet.
    pub fn new(person: Person) -> Self {
        Self {
            person,
            relationships: Vec::new(),
        }
    }
}
