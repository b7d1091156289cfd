//! Data structures and algorithms
//!
//! This module contains the engine's types and algorithms:
//!
//! - `index`: staged index data structures
//! - `merge`: line diff, chunk fusion, formatting, tree merge
//! - `objects`: object types (blob, tree, ids, modes)
//! - `walk`: cursors and the synchronized multi-tree walk

pub mod index;
pub mod merge;
pub mod objects;
pub mod walk;
