//! Kindred Graph - WASM Module
//!
//! This module provides the kinship graph engine for the Kindred family
//! application. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen, while keeping every algorithm
//! in plain Rust testable off-wasm.
//!
//! # Architecture
//!
//! - `graph`: People and typed relationship edges (petgraph StableGraph),
//!   reciprocal mutation, and tree placement
//! - `kinship`: Generation assignment and relationship label resolution
//! - `layout`: Deterministic per-generation ordering and connectors
//!
//! All persistence, networking, and rendering stay with the JS host; this
//! crate consumes and produces plain data records.

use std::str::FromStr;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod kinship;
pub mod layout;

use error::KinshipError;
use graph::{KinshipEngine, MemberRecord, Person, PersonId, RelKind};
use kinship::GenerationMap;
use layout::Connector;

/// Initialize the WASM module: route panics to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(target_arch = "wasm32")]
fn debug_log(message: &str) {
    web_sys::console::debug_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn debug_log(_message: &str) {}

/// One person in a rendered row, enriched with the viewer-relative label.
#[derive(Serialize)]
struct MemberView {
    uid: String,
    name: String,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    label: String,
    generation: i32,
    order: usize,
}

/// One generation row, left-to-right.
#[derive(Serialize)]
struct RowView {
    generation: i32,
    members: Vec<MemberView>,
}

/// Full rendering payload: rows plus connector descriptors.
#[derive(Serialize)]
struct TreeView {
    rows: Vec<RowView>,
    connectors: Vec<Connector>,
}

/// Main entry point for the kinship engine.
///
/// This struct wraps the internal KinshipEngine and provides the public API
/// exposed to JavaScript. It owns the graph single-threaded, so the
/// reciprocal-pair mutation is atomic with respect to every read.
#[wasm_bindgen]
pub struct KindredGraphWasm {
    engine: KinshipEngine,
}

#[wasm_bindgen]
impl KindredGraphWasm {
    /// Create a new empty engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: KinshipEngine::new(),
        }
    }

    // =========================================================================
    // Snapshot Ingestion
    // =========================================================================

    /// Replace the graph with a snapshot of member documents.
    ///
    /// Called by the data collaborator whenever the family's member
    /// collection changes; every derived value (generations, labels,
    /// layout) is recomputed from this snapshot on read.
    ///
    /// Expects an array of `{uid, name, photoURL?, role?, generation?,
    /// relationships?}` objects with pre-reciprocal edges. Rejects
    /// one-sided or conflicting edges and leaves the previous snapshot in
    /// place on error.
    #[wasm_bindgen(js_name = loadMembers)]
    pub fn load_members(&mut self, members: JsValue) -> Result<(), JsError> {
        let records: Vec<MemberRecord> = serde_wasm_bindgen::from_value(members)?;
        debug_log(&format!("kindred-graph: loading {} members", records.len()));
        self.engine.load_members(records)?;
        Ok(())
    }

    /// Number of people in the current snapshot.
    #[wasm_bindgen(js_name = memberCount)]
    pub fn member_count(&self) -> u32 {
        self.engine.len() as u32
    }

    /// Clear all people and edges.
    pub fn clear(&mut self) {
        self.engine.clear();
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Place a person into the tree relative to an anchor.
    ///
    /// `kind` is what the new person is to the anchor ("child", "parent",
    /// "partner", "sibling"); pass no anchor for the first person in a
    /// tree. Sibling placement also attaches the person to the anchor's
    /// first known parent.
    ///
    /// Returns `{person, records}` where `records` holds the full updated
    /// document of every person whose edge list changed, for the host to
    /// persist. Throws on conflicts; a failed placement writes nothing.
    #[wasm_bindgen(js_name = placeMember)]
    pub fn place_member(
        &mut self,
        member: JsValue,
        anchor_id: Option<String>,
        kind: String,
        added_at: String,
    ) -> Result<JsValue, JsError> {
        let person: Person = serde_wasm_bindgen::from_value(member)?;
        let kind = RelKind::from_str(&kind)?;
        let anchor = anchor_id.map(PersonId::new);
        let placement = self
            .engine
            .place(person, anchor.as_ref(), kind, &added_at)?;
        Ok(serde_wasm_bindgen::to_value(&placement)?)
    }

    // =========================================================================
    // Kinship Queries
    // =========================================================================

    /// Relationship label of `target_id` as seen by `viewer_id`
    /// ("Me", "Parent", "Great-Aunt/Uncle", "Sibling-in-Law", ...).
    #[wasm_bindgen(js_name = labelFor)]
    pub fn label_for(&self, viewer_id: String, target_id: String) -> Result<String, JsError> {
        let label = kinship::resolve(
            &self.engine,
            &PersonId::new(viewer_id),
            &PersonId::new(target_id),
        )?;
        Ok(label)
    }

    /// Normalized generation of a person (earliest ancestor in view = 1).
    #[wasm_bindgen(js_name = generationOf)]
    pub fn generation_of(&self, person_id: String) -> Result<i32, JsError> {
        let uid = PersonId::new(person_id);
        let generations = GenerationMap::assign(&self.engine)?;
        generations
            .generation_of(&uid)
            .ok_or_else(|| KinshipError::UnknownPerson(uid).into())
    }

    /// Relationship hops between two people across all edge kinds, or
    /// undefined when they are not connected.
    #[wasm_bindgen(js_name = relationshipDegree)]
    pub fn relationship_degree(&self, a: String, b: String) -> Result<Option<u32>, JsError> {
        let degree = self
            .engine
            .relationship_degree(&PersonId::new(a), &PersonId::new(b))?;
        Ok(degree)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Compute the family tree rendering payload for a viewer.
    ///
    /// Returns `{rows, connectors}`: per generation an ordered member list
    /// with viewer-relative labels and ordering indices, plus partner and
    /// parent-child connector descriptors for the drawing layer.
    #[wasm_bindgen(js_name = computeTree)]
    pub fn compute_tree(&self, viewer_id: String) -> Result<JsValue, JsError> {
        let viewer = PersonId::new(viewer_id);
        let generations = GenerationMap::assign(&self.engine)?;
        let tree = layout::compute(&self.engine, &generations);

        let mut rows: Vec<RowView> = Vec::with_capacity(tree.rows.len());
        for row in &tree.rows {
            let mut members: Vec<MemberView> = Vec::with_capacity(row.members.len());
            for (order, uid) in row.members.iter().enumerate() {
                let person = self
                    .engine
                    .person(uid)
                    .ok_or_else(|| KinshipError::UnknownPerson(uid.clone()))?;
                let label = kinship::resolve(&self.engine, &viewer, uid)?;
                members.push(MemberView {
                    uid: person.uid.as_str().to_string(),
                    name: person.name.clone(),
                    photo_url: person.photo_url.clone(),
                    label,
                    generation: row.generation,
                    order,
                });
            }
            rows.push(RowView {
                generation: row.generation,
                members,
            });
        }

        let view = TreeView {
            rows,
            connectors: tree.connectors,
        };
        Ok(serde_wasm_bindgen::to_value(&view)?)
    }
}

impl Default for KindredGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}
