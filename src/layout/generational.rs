//! Generational family tree layout.
//!
//! Produces a deterministic left-to-right ordering of people within each
//! generation, plus the connector descriptors the drawing layer needs.
//!
//! # Algorithm Overview
//!
//! Generation by generation, lowest first:
//!
//! 1. **Unit grouping:** A unit is a solitary person, or a person plus their
//!    partner when both sit in this generation. Couple members order
//!    lexicographically by uid so the same couple always renders in the same
//!    left-right order.
//! 2. **Parent-anchored sort:** Units sort by the visual index of a located
//!    parent in the previous generation's already-sorted row; units with no
//!    locatable parent go to the end. Ties break on the lexicographically
//!    smaller member uid.
//! 3. **Flatten:** The sorted units become the row, which in turn anchors
//!    the next generation's sort.
//!
//! Anchoring each row on the previous resolved row keeps siblings clustered
//! beneath their parents and stops members from visually jumping around on
//! re-renders: the output is byte-identical for an unchanged snapshot.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::{KinshipEngine, PersonId};
use crate::kinship::GenerationMap;

/// One rendered generation: ordered member uids, left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRow {
    /// Normalized generation number (earliest ancestor = 1).
    pub generation: i32,
    /// Member uids in final visual order.
    pub members: Vec<PersonId>,
}

/// A line for the drawing layer to position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Connector {
    /// Undirected partner link, emitted once per unordered pair (`a < b`).
    Partner { a: PersonId, b: PersonId },
    /// Parent-to-child link. When the parent has a partner, the line
    /// originates from the midpoint between `parent` and `co_parent`;
    /// otherwise from `parent` directly. Terminates at `child`.
    #[serde(rename_all = "camelCase")]
    ParentChild {
        parent: PersonId,
        co_parent: Option<PersonId>,
        child: PersonId,
    },
}

/// Result of the generational layout: rows plus connector descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeLayout {
    pub rows: Vec<LayoutRow>,
    pub connectors: Vec<Connector>,
}

/// Compute the layout for one graph snapshot.
///
/// Pure and side-effect free; safe to recompute on every change
/// notification.
pub fn compute(engine: &KinshipEngine, generations: &GenerationMap) -> TreeLayout {
    let mut rows: Vec<LayoutRow> = Vec::new();
    let mut connectors: Vec<Connector> = Vec::new();
    let mut prev_index: HashMap<PersonId, usize> = HashMap::new();

    for (generation, people) in generations.rows() {
        let in_row: HashSet<&PersonId> = people.iter().collect();

        // Group into units, scanning in person insertion order.
        let mut consumed: HashSet<PersonId> = HashSet::new();
        let mut units: Vec<Vec<PersonId>> = Vec::new();
        for uid in people {
            if consumed.contains(uid) {
                continue;
            }
            consumed.insert(uid.clone());

            let partner = engine
                .partners_of(uid)
                .into_iter()
                .find(|p| in_row.contains(p) && !consumed.contains(p));

            let mut unit = vec![uid.clone()];
            if let Some(partner) = partner {
                consumed.insert(partner.clone());
                unit.push(partner);
            }
            unit.sort();
            units.push(unit);
        }

        // Anchor units beneath the previous row.
        units.sort_by(|a, b| {
            parent_slot(engine, &prev_index, a)
                .cmp(&parent_slot(engine, &prev_index, b))
                .then_with(|| a[0].cmp(&b[0]))
        });

        let mut members: Vec<PersonId> = Vec::new();
        let mut next_index: HashMap<PersonId, usize> = HashMap::new();
        for unit in &units {
            for uid in unit {
                next_index.insert(uid.clone(), members.len());
                members.push(uid.clone());
            }
        }

        rows.push(LayoutRow {
            generation: *generation,
            members,
        });
        prev_index = next_index;
    }

    connectors.extend(partner_connectors(engine));
    connectors.extend(parent_child_connectors(engine));

    TreeLayout { rows, connectors }
}

/// One connector per unordered partner pair, emitted from the `a < b` side.
/// A person with several partner edges contributes one connector per pair,
/// not one per unit they render in.
fn partner_connectors(engine: &KinshipEngine) -> Vec<Connector> {
    let mut connectors: Vec<Connector> = Vec::new();
    for uid in engine.ids() {
        for partner in engine.partners_of(uid) {
            if *uid < partner {
                connectors.push(Connector::Partner {
                    a: uid.clone(),
                    b: partner,
                });
            }
        }
    }
    connectors
}

/// Visual index of a unit's parent in the previous sorted row, or MAX when
/// no parent is locatable (sorts the unit to the end).
fn parent_slot(
    engine: &KinshipEngine,
    prev_index: &HashMap<PersonId, usize>,
    unit: &[PersonId],
) -> usize {
    unit.iter()
        .flat_map(|member| engine.parents_of(member))
        .filter_map(|parent| prev_index.get(&parent).copied())
        .min()
        .unwrap_or(usize::MAX)
}

/// One connector per (parent couple, child), scanning people and edges in
/// insertion order. A couple who are both parents of the same child yields
/// a single midpoint-anchored line, not two.
fn parent_child_connectors(engine: &KinshipEngine) -> Vec<Connector> {
    let mut seen: HashSet<(PersonId, Option<PersonId>, PersonId)> = HashSet::new();
    let mut connectors: Vec<Connector> = Vec::new();

    for uid in engine.ids() {
        let co_parent = engine.partners_of(uid).into_iter().next();
        for child in engine.children_of(uid) {
            let mut pair = vec![uid.clone()];
            if let Some(co) = &co_parent {
                pair.push(co.clone());
            }
            pair.sort();
            let key = (
                pair[0].clone(),
                pair.get(1).cloned(),
                child.clone(),
            );
            if seen.insert(key) {
                connectors.push(Connector::ParentChild {
                    parent: uid.clone(),
                    co_parent: co_parent.clone(),
                    child,
                });
            }
        }
    }
    connectors
}
