//! Generation assignment.
//!
//! Derives an integer generation for every person from the edge set by
//! fixed-point propagation: +1 across a child edge, -1 across a parent edge,
//! 0 across partner and sibling edges. Components are seeded in person
//! insertion order and expanded breadth-first in edge insertion order, so the
//! result is a pure, deterministic function of the graph snapshot.
//!
//! Generations are relative; display normalizes the minimum observed value
//! to 1 on every read. The normalized value is never the ordering ground
//! truth, only a recomputed view.

use std::collections::{HashMap, VecDeque};

use crate::error::KinshipError;
use crate::graph::{KinshipEngine, PersonId};

/// Normalized generation assignment for one graph snapshot.
#[derive(Debug)]
pub struct GenerationMap {
    /// Normalized generation per person (minimum in view = 1).
    generations: HashMap<PersonId, i32>,
    /// People grouped per generation, ascending; within a row, person
    /// insertion order.
    rows: Vec<(i32, Vec<PersonId>)>,
}

impl GenerationMap {
    /// Compute generations for every person in the engine.
    ///
    /// Fails with `Inconsistency` if propagation assigns two different
    /// generations to the same person (contradictory upstream data; never
    /// silently patched).
    pub fn assign(engine: &KinshipEngine) -> Result<Self, KinshipError> {
        let mut raw: HashMap<PersonId, i32> = HashMap::new();
        let mut queue: VecDeque<PersonId> = VecDeque::new();

        for seed in engine.ids() {
            if raw.contains_key(seed) {
                continue;
            }
            raw.insert(seed.clone(), 0);
            queue.push_back(seed.clone());

            while let Some(uid) = queue.pop_front() {
                let generation = raw[&uid];
                for edge in engine.edges_of(&uid, None) {
                    let implied = generation + edge.kind.generation_delta();
                    match raw.get(&edge.uid) {
                        Some(&existing) if existing != implied => {
                            return Err(KinshipError::Inconsistency {
                                person: edge.uid,
                                first: existing,
                                second: implied,
                            });
                        }
                        Some(_) => {}
                        None => {
                            raw.insert(edge.uid.clone(), implied);
                            queue.push_back(edge.uid);
                        }
                    }
                }
            }
        }

        // Normalize: earliest-known ancestor in view becomes generation 1.
        let offset = 1 - raw.values().copied().min().unwrap_or(1);
        let generations: HashMap<PersonId, i32> = raw
            .into_iter()
            .map(|(uid, generation)| (uid, generation + offset))
            .collect();

        let mut levels: Vec<i32> = generations.values().copied().collect();
        levels.sort_unstable();
        levels.dedup();

        let rows = levels
            .into_iter()
            .map(|level| {
                let members: Vec<PersonId> = engine
                    .ids()
                    .iter()
                    .filter(|uid| generations.get(uid) == Some(&level))
                    .cloned()
                    .collect();
                (level, members)
            })
            .collect();

        Ok(Self { generations, rows })
    }

    /// Normalized generation of a person.
    pub fn generation_of(&self, uid: &PersonId) -> Option<i32> {
        self.generations.get(uid).copied()
    }

    /// People grouped per generation, lowest first.
    pub fn rows(&self) -> &[(i32, Vec<PersonId>)] {
        &self.rows
    }

    /// True when the snapshot held no people.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
