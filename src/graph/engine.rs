//! KinshipEngine - Core kinship graph data structure.
//!
//! The KinshipEngine stores people and typed relationship edges using
//! petgraph's StableGraph, with stable string uids mapped to internal
//! indices. The edge set is append-only: edges are added in reciprocal
//! pairs and never removed, so edge indices grow monotonically and
//! insertion order is recoverable for deterministic traversal.

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::KinshipError;

use super::edge::{RelEdge, RelKind};
use super::person::{MemberRecord, Person, PersonId};

/// Internal edge weight. The target person is the edge endpoint; only the
/// kind and timestamp live on the weight.
#[derive(Debug, Clone)]
struct EdgeLink {
    kind: RelKind,
    added_at: String,
}

/// Result of a successful `place()` call: the new person record plus the
/// full updated document of every person whose edge list changed, ready for
/// the external store to persist.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Placement {
    /// The newly placed (or re-placed) person.
    pub person: Person,
    /// Full updated member documents: the placed person, the anchor, and the
    /// synthesized shared parent when sibling placement found one.
    pub records: Vec<MemberRecord>,
}

/// The core kinship graph engine.
///
/// This struct manages:
/// - People and typed relationship edges via petgraph
/// - uid -> internal index mapping
/// - Person insertion order (for deterministic seeds and tie-breaks)
///
/// All reads are pure; the single mutation primitive appends a reciprocal
/// edge pair after full validation, so no observer ever sees half a pair.
pub struct KinshipEngine {
    /// Graph topology. Nodes store the person record, edges store kind
    /// and timestamp.
    graph: StableGraph<Person, EdgeLink, Directed>,

    /// Map from stable uid to petgraph NodeIndex.
    index_of: HashMap<PersonId, NodeIndex>,

    /// Person uids in insertion order.
    order: Vec<PersonId>,
}

impl KinshipEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            index_of: HashMap::new(),
            order: Vec::new(),
        }
    }

    // =========================================================================
    // Person Operations
    // =========================================================================

    /// Add a person with no edges.
    ///
    /// Fails with `DuplicatePerson` if the uid is already present.
    pub fn add_person(&mut self, person: Person) -> Result<(), KinshipError> {
        if self.index_of.contains_key(&person.uid) {
            return Err(KinshipError::DuplicatePerson(person.uid));
        }
        let uid = person.uid.clone();
        let index = self.graph.add_node(person);
        self.index_of.insert(uid.clone(), index);
        self.order.push(uid);
        Ok(())
    }

    /// Get a person by uid.
    pub fn person(&self, uid: &PersonId) -> Option<&Person> {
        self.index_of
            .get(uid)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Check whether a person is in the graph.
    pub fn contains(&self, uid: &PersonId) -> bool {
        self.index_of.contains_key(uid)
    }

    /// Number of people.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the graph holds no people.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Person uids in insertion order.
    pub fn ids(&self) -> &[PersonId] {
        &self.order
    }

    /// Iterate people in insertion order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.order.iter().filter_map(|uid| self.person(uid))
    }

    /// Clear all people and edges, resetting the engine.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.index_of.clear();
        self.order.clear();
    }

    fn index_required(&self, uid: &PersonId) -> Result<NodeIndex, KinshipError> {
        self.index_of
            .get(uid)
            .copied()
            .ok_or_else(|| KinshipError::UnknownPerson(uid.clone()))
    }

    // =========================================================================
    // Edge Reads
    // =========================================================================

    /// Edges of a person, optionally filtered by kind, in insertion order.
    ///
    /// Returns an empty list for an unknown uid.
    pub fn edges_of(&self, uid: &PersonId, kind: Option<RelKind>) -> Vec<RelEdge> {
        let Some(&index) = self.index_of.get(uid) else {
            return Vec::new();
        };

        // StableGraph iterates outgoing edges most-recent-first; sorting by
        // edge index restores insertion order (the graph is append-only).
        let mut edges: Vec<(usize, RelEdge)> = self
            .graph
            .edges(index)
            .filter(|e| kind.is_none_or(|k| e.weight().kind == k))
            .filter_map(|e| {
                let peer = self.graph.node_weight(e.target())?;
                Some((
                    e.id().index(),
                    RelEdge {
                        uid: peer.uid.clone(),
                        kind: e.weight().kind,
                        added_at: e.weight().added_at.clone(),
                    },
                ))
            })
            .collect();
        edges.sort_by_key(|(slot, _)| *slot);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    /// The semantic relationship a person holds toward a peer, if any.
    pub fn relationship_between(&self, a: &PersonId, b: &PersonId) -> Option<RelKind> {
        self.edges_of(a, None)
            .into_iter()
            .find(|edge| edge.uid == *b)
            .map(|edge| edge.kind)
    }

    /// Uids of a person's parents, in edge insertion order.
    pub fn parents_of(&self, uid: &PersonId) -> Vec<PersonId> {
        self.peer_ids(uid, RelKind::Parent)
    }

    /// Uids of a person's children, in edge insertion order.
    pub fn children_of(&self, uid: &PersonId) -> Vec<PersonId> {
        self.peer_ids(uid, RelKind::Child)
    }

    /// Uids of a person's partners, in edge insertion order.
    pub fn partners_of(&self, uid: &PersonId) -> Vec<PersonId> {
        self.peer_ids(uid, RelKind::Partner)
    }

    /// Uids of a person's siblings, in edge insertion order.
    pub fn siblings_of(&self, uid: &PersonId) -> Vec<PersonId> {
        self.peer_ids(uid, RelKind::Sibling)
    }

    fn peer_ids(&self, uid: &PersonId, kind: RelKind) -> Vec<PersonId> {
        self.edges_of(uid, Some(kind))
            .into_iter()
            .map(|edge| edge.uid)
            .collect()
    }

    /// A person's full document: record plus insertion-ordered edges.
    pub fn member_record(&self, uid: &PersonId) -> Option<MemberRecord> {
        let person = self.person(uid)?.clone();
        Some(MemberRecord {
            relationships: self.edges_of(uid, None),
            person,
        })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append the edge `(a -> b, kind)` and its reciprocal `(b -> a)`.
    ///
    /// Fails with `Conflict` if the pair already holds any semantic
    /// relationship. Validation completes before the first write, so a
    /// failure leaves the graph untouched and a success always commits
    /// both sides.
    pub fn add_relationship(
        &mut self,
        a: &PersonId,
        b: &PersonId,
        kind: RelKind,
        added_at: &str,
    ) -> Result<(), KinshipError> {
        if a == b {
            return Err(KinshipError::SelfRelationship(a.clone()));
        }
        let ia = self.index_required(a)?;
        let ib = self.index_required(b)?;
        if let Some(existing) = self.relationship_between(a, b) {
            return Err(KinshipError::Conflict {
                a: a.clone(),
                b: b.clone(),
                existing,
            });
        }

        self.graph.add_edge(
            ia,
            ib,
            EdgeLink {
                kind,
                added_at: added_at.to_string(),
            },
        );
        self.graph.add_edge(
            ib,
            ia,
            EdgeLink {
                kind: kind.reciprocal(),
                added_at: added_at.to_string(),
            },
        );
        Ok(())
    }

    /// Place a person into the tree relative to an anchor, the mutation
    /// behind the member onboarding flow.
    ///
    /// `kind` is what the new person is to the anchor: placing as `child`
    /// puts them one generation below the anchor. Placing as `sibling`
    /// additionally attaches them as a child of the anchor's first known
    /// parent, so siblings share parentage instead of only linking to each
    /// other. With no anchor (first person in a tree) the person is seeded
    /// at generation 1 with no edges.
    ///
    /// All validation happens before the first write; on error the graph is
    /// left in its prior state.
    pub fn place(
        &mut self,
        mut person: Person,
        anchor: Option<&PersonId>,
        kind: RelKind,
        added_at: &str,
    ) -> Result<Placement, KinshipError> {
        let Some(anchor_id) = anchor else {
            person.generation = 1;
            self.add_person(person.clone())?;
            return Ok(Placement {
                records: vec![MemberRecord::new(person.clone())],
                person,
            });
        };

        if *anchor_id == person.uid {
            return Err(KinshipError::SelfRelationship(person.uid));
        }
        let anchor_index = self.index_required(anchor_id)?;
        let anchor_generation = self.graph[anchor_index].generation;

        let is_new = !self.contains(&person.uid);
        if !is_new {
            if let Some(existing) = self.relationship_between(&person.uid, anchor_id) {
                return Err(KinshipError::Conflict {
                    a: person.uid.clone(),
                    b: anchor_id.clone(),
                    existing,
                });
            }
        }

        // Sibling placement synthesizes a shared-parent edge when the anchor
        // already has a parent.
        let shared_parent = if kind == RelKind::Sibling {
            self.parents_of(anchor_id).into_iter().next()
        } else {
            None
        };
        if let Some(parent_id) = &shared_parent {
            if !is_new {
                if let Some(existing) = self.relationship_between(&person.uid, parent_id) {
                    return Err(KinshipError::Conflict {
                        a: person.uid.clone(),
                        b: parent_id.clone(),
                        existing,
                    });
                }
            }
        }

        person.generation = anchor_generation + kind.generation_delta();

        // Commit. Every write below is infallible after the validation above.
        if is_new {
            self.add_person(person.clone())?;
        } else {
            let index = self.index_required(&person.uid)?;
            self.graph[index].generation = person.generation;
        }
        self.add_relationship(&person.uid, anchor_id, kind.reciprocal(), added_at)?;
        if let Some(parent_id) = &shared_parent {
            self.add_relationship(&person.uid, parent_id, RelKind::Parent, added_at)?;
        }

        let mut touched = vec![person.uid.clone(), anchor_id.clone()];
        if let Some(parent_id) = shared_parent {
            touched.push(parent_id);
        }
        let records = touched
            .into_iter()
            .filter_map(|uid| self.member_record(&uid))
            .collect();

        let person = self
            .person(&person.uid)
            .cloned()
            .ok_or_else(|| KinshipError::UnknownPerson(person.uid.clone()))?;
        Ok(Placement { person, records })
    }

    /// Replace the graph with a snapshot of member documents from the
    /// external store.
    ///
    /// Edges in the records are expected to be pre-reciprocal; a missing or
    /// mismatched mirror is a `MissingReciprocal` error. `Conflict` fires
    /// when one record holds two edges to the same peer. On any error the
    /// engine keeps its previous contents.
    pub fn load_members(&mut self, records: Vec<MemberRecord>) -> Result<(), KinshipError> {
        let mut fresh = Self::new();
        for record in &records {
            fresh.add_person(record.person.clone())?;
        }

        for record in &records {
            let owner = &record.person.uid;
            let owner_index = fresh.index_required(owner)?;
            for edge in &record.relationships {
                if edge.uid == *owner {
                    return Err(KinshipError::SelfRelationship(owner.clone()));
                }
                let peer_index = fresh.index_required(&edge.uid)?;
                if let Some(existing) = fresh.relationship_between(owner, &edge.uid) {
                    return Err(KinshipError::Conflict {
                        a: owner.clone(),
                        b: edge.uid.clone(),
                        existing,
                    });
                }
                fresh.graph.add_edge(
                    owner_index,
                    peer_index,
                    EdgeLink {
                        kind: edge.kind,
                        added_at: edge.added_at.clone(),
                    },
                );
            }
        }

        // Reciprocity invariant: every edge must have its mirror.
        for uid in fresh.order.clone() {
            for edge in fresh.edges_of(&uid, None) {
                let mirrored = fresh
                    .relationship_between(&edge.uid, &uid)
                    .is_some_and(|k| k == edge.kind.reciprocal());
                if !mirrored {
                    return Err(KinshipError::MissingReciprocal {
                        from: uid.clone(),
                        to: edge.uid.clone(),
                        kind: edge.kind,
                    });
                }
            }
        }

        *self = fresh;
        Ok(())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Number of relationship hops between two people across all edge kinds,
    /// or `None` if they are not connected. Partner of = 1, grandparent = 2.
    pub fn relationship_degree(
        &self,
        a: &PersonId,
        b: &PersonId,
    ) -> Result<Option<u32>, KinshipError> {
        self.index_required(a)?;
        self.index_required(b)?;
        if a == b {
            return Ok(Some(0));
        }

        let mut visited: HashSet<PersonId> = HashSet::new();
        let mut queue: VecDeque<(PersonId, u32)> = VecDeque::new();
        visited.insert(a.clone());
        queue.push_back((a.clone(), 0));

        while let Some((uid, degree)) = queue.pop_front() {
            for edge in self.edges_of(&uid, None) {
                if edge.uid == *b {
                    return Ok(Some(degree + 1));
                }
                if visited.insert(edge.uid.clone()) {
                    queue.push_back((edge.uid, degree + 1));
                }
            }
        }
        Ok(None)
    }
}

impl Default for KinshipEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: &str = "2024-01-01T00:00:00Z";

    fn engine_with(people: &[&str]) -> KinshipEngine {
        let mut engine = KinshipEngine::new();
        for uid in people {
            engine.add_person(Person::new(*uid, format!("Person {uid}"))).unwrap();
        }
        engine
    }

    #[test]
    fn test_add_person_and_duplicate() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("a", "A")).unwrap();
        assert_eq!(engine.len(), 1);

        let err = engine.add_person(Person::new("a", "A again")).unwrap_err();
        assert!(matches!(err, KinshipError::DuplicatePerson(_)));
    }

    #[test]
    fn test_add_relationship_writes_both_sides() {
        let mut engine = engine_with(&["a", "b"]);
        engine
            .add_relationship(&"a".into(), &"b".into(), RelKind::Parent, T)
            .unwrap();

        // a holds (a -> b, parent); b holds the reciprocal child edge.
        assert_eq!(
            engine.relationship_between(&"a".into(), &"b".into()),
            Some(RelKind::Parent)
        );
        assert_eq!(
            engine.relationship_between(&"b".into(), &"a".into()),
            Some(RelKind::Child)
        );
    }

    #[test]
    fn test_conflict_rejected_without_partial_write() {
        let mut engine = engine_with(&["x", "y"]);
        engine
            .add_relationship(&"x".into(), &"y".into(), RelKind::Sibling, T)
            .unwrap();

        let err = engine
            .add_relationship(&"x".into(), &"y".into(), RelKind::Partner, T)
            .unwrap_err();
        assert!(matches!(
            err,
            KinshipError::Conflict {
                existing: RelKind::Sibling,
                ..
            }
        ));

        // Edge counts unchanged: one edge each way.
        assert_eq!(engine.edges_of(&"x".into(), None).len(), 1);
        assert_eq!(engine.edges_of(&"y".into(), None).len(), 1);
    }

    #[test]
    fn test_self_relationship_rejected() {
        let mut engine = engine_with(&["a"]);
        let err = engine
            .add_relationship(&"a".into(), &"a".into(), RelKind::Partner, T)
            .unwrap_err();
        assert!(matches!(err, KinshipError::SelfRelationship(_)));
    }

    #[test]
    fn test_edges_of_preserves_insertion_order() {
        let mut engine = engine_with(&["hub", "c1", "c2", "c3"]);
        for peer in ["c1", "c2", "c3"] {
            engine
                .add_relationship(&"hub".into(), &peer.into(), RelKind::Child, T)
                .unwrap();
        }

        let peers: Vec<String> = engine
            .edges_of(&"hub".into(), None)
            .into_iter()
            .map(|e| e.uid.as_str().to_string())
            .collect();
        assert_eq!(peers, vec!["c1", "c2", "c3"]);

        // Filtered reads keep the same order.
        assert_eq!(engine.children_of(&"hub".into()).len(), 3);
        assert!(engine.parents_of(&"hub".into()).is_empty());
    }

    #[test]
    fn test_place_without_anchor_seeds_generation_one() {
        let mut engine = KinshipEngine::new();
        let placement = engine
            .place(Person::new("first", "First"), None, RelKind::Child, T)
            .unwrap();

        assert_eq!(placement.person.generation, 1);
        assert!(placement.records[0].relationships.is_empty());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_place_child_sets_generation_and_edges() {
        let mut engine = KinshipEngine::new();
        engine
            .add_person(Person::new("b", "B").with_generation(2))
            .unwrap();

        let placement = engine
            .place(Person::new("a", "A"), Some(&"b".into()), RelKind::Child, T)
            .unwrap();
        assert_eq!(placement.person.generation, 3);

        // B sees A as child, A sees B as parent.
        assert_eq!(
            engine.relationship_between(&"b".into(), &"a".into()),
            Some(RelKind::Child)
        );
        assert_eq!(
            engine.relationship_between(&"a".into(), &"b".into()),
            Some(RelKind::Parent)
        );
    }

    #[test]
    fn test_place_parent_sets_generation_above_anchor() {
        let mut engine = KinshipEngine::new();
        engine
            .add_person(Person::new("kid", "Kid").with_generation(3))
            .unwrap();

        let placement = engine
            .place(Person::new("mom", "Mom"), Some(&"kid".into()), RelKind::Parent, T)
            .unwrap();
        assert_eq!(placement.person.generation, 2);
        assert_eq!(engine.parents_of(&"kid".into()), vec![PersonId::new("mom")]);
    }

    #[test]
    fn test_place_sibling_synthesizes_shared_parent() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("f", "F").with_generation(1)).unwrap();
        engine
            .place(Person::new("e", "E"), Some(&"f".into()), RelKind::Child, T)
            .unwrap();

        let placement = engine
            .place(Person::new("d", "D"), Some(&"e".into()), RelKind::Sibling, T)
            .unwrap();

        // D linked to E as sibling AND to F as child.
        assert_eq!(
            engine.relationship_between(&"d".into(), &"e".into()),
            Some(RelKind::Sibling)
        );
        assert_eq!(
            engine.relationship_between(&"f".into(), &"d".into()),
            Some(RelKind::Child)
        );
        assert_eq!(placement.person.generation, 2);

        // Persistence payload covers all three touched people.
        let uids: Vec<&str> = placement
            .records
            .iter()
            .map(|r| r.person.uid.as_str())
            .collect();
        assert_eq!(uids, vec!["d", "e", "f"]);
    }

    #[test]
    fn test_place_conflict_adds_nothing() {
        let mut engine = engine_with(&["x", "y"]);
        engine
            .add_relationship(&"x".into(), &"y".into(), RelKind::Sibling, T)
            .unwrap();

        let before_x = engine.edges_of(&"x".into(), None).len();
        let err = engine
            .place(
                engine.person(&"x".into()).unwrap().clone(),
                Some(&"y".into()),
                RelKind::Partner,
                T,
            )
            .unwrap_err();
        assert!(matches!(err, KinshipError::Conflict { .. }));
        assert_eq!(engine.edges_of(&"x".into(), None).len(), before_x);
    }

    #[test]
    fn test_load_members_round_trip() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("p", "P").with_generation(1)).unwrap();
        engine
            .place(Person::new("c", "C"), Some(&"p".into()), RelKind::Child, T)
            .unwrap();

        let records: Vec<MemberRecord> = engine
            .ids()
            .to_vec()
            .iter()
            .filter_map(|uid| engine.member_record(uid))
            .collect();

        let mut reloaded = KinshipEngine::new();
        reloaded.load_members(records).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.relationship_between(&"p".into(), &"c".into()),
            Some(RelKind::Child)
        );
    }

    #[test]
    fn test_load_members_rejects_one_sided_edge() {
        let mut a = MemberRecord::new(Person::new("a", "A"));
        a.relationships.push(RelEdge::new("b", RelKind::Parent, T));
        let b = MemberRecord::new(Person::new("b", "B"));

        let mut engine = KinshipEngine::new();
        let err = engine.load_members(vec![a, b]).unwrap_err();
        assert!(matches!(err, KinshipError::MissingReciprocal { .. }));
        // Engine untouched on failure.
        assert!(engine.is_empty());
    }

    #[test]
    fn test_load_members_rejects_mismatched_pair() {
        let mut a = MemberRecord::new(Person::new("a", "A"));
        a.relationships.push(RelEdge::new("b", RelKind::Parent, T));
        let mut b = MemberRecord::new(Person::new("b", "B"));
        b.relationships.push(RelEdge::new("a", RelKind::Partner, T));

        let mut engine = KinshipEngine::new();
        let err = engine.load_members(vec![a, b]).unwrap_err();
        assert!(matches!(err, KinshipError::MissingReciprocal { .. }));
    }

    #[test]
    fn test_relationship_degree() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("g", "G").with_generation(1)).unwrap();
        engine
            .place(Person::new("p", "P"), Some(&"g".into()), RelKind::Child, T)
            .unwrap();
        engine
            .place(Person::new("c", "C"), Some(&"p".into()), RelKind::Child, T)
            .unwrap();
        engine
            .place(Person::new("q", "Q"), Some(&"p".into()), RelKind::Partner, T)
            .unwrap();
        engine.add_person(Person::new("z", "Z")).unwrap();

        let degree = |a: &str, b: &str| engine.relationship_degree(&a.into(), &b.into()).unwrap();
        assert_eq!(degree("g", "g"), Some(0));
        assert_eq!(degree("p", "q"), Some(1));
        assert_eq!(degree("g", "c"), Some(2));
        assert_eq!(degree("q", "g"), Some(2));
        assert_eq!(degree("g", "z"), None);
    }

    #[test]
    fn test_unknown_person_errors() {
        let engine = engine_with(&["a"]);
        let err = engine
            .relationship_degree(&"a".into(), &"ghost".into())
            .unwrap_err();
        assert!(matches!(err, KinshipError::UnknownPerson(_)));
    }
}
