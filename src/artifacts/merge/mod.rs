//! Merge algorithms
//!
//! The two algorithmic halves of the engine and their glue:
//!
//! - `line_diff`: Myers diff producing edit ranges over base offsets
//! - `sequence`: blob content split into lines
//! - `algorithm`: fusion of per-side edit scripts into annotated chunks
//! - `formatter`: conflict-marker rendering and clean-result assembly
//! - `outcome`: per-path resolved/conflicted classification
//! - `tree_merger`: the walk-driven three-way tree merge

pub mod algorithm;
pub mod formatter;
pub mod line_diff;
pub mod outcome;
pub mod sequence;
pub mod tree_merger;
