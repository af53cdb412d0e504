//! Layout for family tree rendering.
//!
//! This module computes the position-free visual ordering of people per
//! generation and the connector descriptors (partner links, parent-child
//! links) that the drawing layer turns into lines. All geometry stays with
//! the renderer; the layout only decides order and connectivity.

pub mod generational;

pub use generational::{Connector, LayoutRow, TreeLayout, compute};
