//! Kinship computations over a graph snapshot.
//!
//! Two pure, recompute-on-read functions: generation assignment
//! (fixed-point propagation over parent/child/partner/sibling edges) and
//! point-to-point relationship label resolution (lowest-common-ancestor
//! search with a fixed label table).

pub mod generation;
pub mod label;

pub use generation::GenerationMap;
pub use label::{FALLBACK_LABEL, blood_distance, resolve};
