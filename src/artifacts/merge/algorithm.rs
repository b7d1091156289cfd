//! N-way line-sequence merge
//!
//! Fuses the edit scripts of a base sequence against any number of sides
//! into one ordered chunk list.
//!
//! ## Algorithm Overview
//!
//! Each side is diffed against the base independently. The fusion then
//! sweeps base offsets left to right:
//!
//! - a base run untouched by every script is copied as one clean chunk;
//! - a run touched by exactly one script becomes that side's replacement
//!   chunk;
//! - a run touched by several scripts is a conflict candidate: if all
//!   replacements are byte-for-byte identical the sides made the same
//!   edit and one clean chunk suffices, otherwise each side contributes
//!   a conflicting chunk.
//!
//! Touching edits are coalesced aggressively: a cluster grows until no
//! script has an edit overlapping *or adjacent to* its base span. Two
//! scripts frequently disagree about where an overlapping change
//! "starts", and widening both to the union span turns what would be two
//! half-conflicts into the single conflict a reader expects. Deleting a
//! region one side modified is never resolved silently - an empty
//! replacement that differs from the other side's is a conflict like any
//! other.

use crate::artifacts::merge::line_diff::{Edit, LineComparator, MyersDiff};
use derive_new::new;

/// Conflict annotation of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictState {
    /// Content taken cleanly from one sequence
    NoConflict,
    /// Opening chunk of a conflict run
    FirstConflicting,
    /// Subsequent chunk of the same conflict run
    NextConflicting,
}

impl ConflictState {
    pub fn is_conflicting(&self) -> bool {
        !matches!(self, ConflictState::NoConflict)
    }
}

/// A contiguous half-open line range `[begin, end)` taken from one input
/// sequence (0 = base, 1.. = sides)
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MergeChunk {
    pub source: usize,
    pub begin: usize,
    pub end: usize,
    pub state: ConflictState,
}

impl MergeChunk {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Line spans of one conflict, per input sequence
///
/// `begins[s]..ends[s]` is sequence `s`'s side of the conflict; sides
/// that did not edit the region carry their base-equal span.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ConflictRegion {
    pub begins: Vec<usize>,
    pub ends: Vec<usize>,
}

/// Ordered chunk list produced by the merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    chunks: Vec<MergeChunk>,
    regions: Vec<ConflictRegion>,
    sequence_count: usize,
}

impl MergeResult {
    pub fn chunks(&self) -> &[MergeChunk] {
        &self.chunks
    }

    /// Per-conflict line spans, in chunk order
    pub fn conflict_regions(&self) -> &[ConflictRegion] {
        &self.regions
    }

    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    pub fn contains_conflicts(&self) -> bool {
        self.chunks.iter().any(|chunk| chunk.state.is_conflicting())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SideState {
    /// Next unconsumed edit of this side's script
    next_edit: usize,
    /// Offset shift between base and side coordinates, accumulated over
    /// consumed edits
    delta: isize,
}

/// Merge a base sequence with any number of sides
///
/// `sequences[0]` is the base; every further entry is one side. Elements
/// are matched through `comparator`; the same-edit check that collapses
/// identical replacements always uses strict equality, as two sides that
/// made *equivalent* but unequal edits still need a human to pick one.
pub fn merge_sequences<T: Eq, C: LineComparator<T>>(
    sequences: &[&[T]],
    comparator: &C,
) -> anyhow::Result<MergeResult> {
    if sequences.len() < 2 {
        anyhow::bail!("a merge needs a base and at least one side");
    }

    let base = sequences[0];
    let side_count = sequences.len() - 1;

    let scripts: Vec<Vec<Edit>> = sequences[1..]
        .iter()
        .map(|side| MyersDiff::new(base, *side, comparator).diff())
        .collect();

    let mut states = vec![SideState::default(); side_count];
    let mut chunks: Vec<MergeChunk> = Vec::new();
    let mut regions: Vec<ConflictRegion> = Vec::new();
    let mut base_pos = 0usize;

    loop {
        // next cluster starts at the minimal pending edit
        let mut cluster_begin: Option<usize> = None;
        for (side, state) in states.iter().enumerate() {
            if let Some(edit) = scripts[side].get(state.next_edit) {
                cluster_begin =
                    Some(cluster_begin.map_or(edit.begin_a, |begin| begin.min(edit.begin_a)));
            }
        }
        let Some(cluster_begin) = cluster_begin else {
            break;
        };

        // untouched base run before the cluster
        if cluster_begin > base_pos {
            chunks.push(MergeChunk::new(
                0,
                base_pos,
                cluster_begin,
                ConflictState::NoConflict,
            ));
        }

        // grow the cluster over every touching edit on any side
        let mut cluster_end = cluster_begin;
        let mut included: Vec<Vec<Edit>> = vec![Vec::new(); side_count];
        loop {
            let mut changed = false;
            for (side, state) in states.iter_mut().enumerate() {
                while let Some(edit) = scripts[side].get(state.next_edit) {
                    if edit.begin_a > cluster_end {
                        break;
                    }
                    cluster_end = cluster_end.max(edit.end_a);
                    included[side].push(edit.clone());
                    state.next_edit += 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // map the cluster span into each side's coordinates; the span
        // boundaries never cut through an edit, so the mapping is exact
        let mut side_ranges: Vec<(usize, usize)> = Vec::with_capacity(side_count);
        for (side, state) in states.iter_mut().enumerate() {
            let begin = (cluster_begin as isize + state.delta) as usize;
            for edit in &included[side] {
                state.delta += edit.len_b() as isize - edit.len_a() as isize;
            }
            let end = (cluster_end as isize + state.delta) as usize;
            side_ranges.push((begin, end));
        }

        let participating: Vec<usize> = (0..side_count)
            .filter(|side| !included[*side].is_empty())
            .collect();

        let same_edit = participating.len() > 1
            && participating.windows(2).all(|pair| {
                let (begin_0, end_0) = side_ranges[pair[0]];
                let (begin_1, end_1) = side_ranges[pair[1]];
                sequences[pair[0] + 1][begin_0..end_0] == sequences[pair[1] + 1][begin_1..end_1]
            });

        if participating.len() == 1 || same_edit {
            // a one-sided change, or both sides making the identical one
            let side = participating[0];
            let (begin, end) = side_ranges[side];
            chunks.push(MergeChunk::new(side + 1, begin, end, ConflictState::NoConflict));
        } else {
            for (position, side) in participating.iter().enumerate() {
                let (begin, end) = side_ranges[*side];
                let state = if position == 0 {
                    ConflictState::FirstConflicting
                } else {
                    ConflictState::NextConflicting
                };
                chunks.push(MergeChunk::new(side + 1, begin, end, state));
            }

            let mut begins = vec![0; sequences.len()];
            let mut ends = vec![0; sequences.len()];
            begins[0] = cluster_begin;
            ends[0] = cluster_end;
            for (side, (begin, end)) in side_ranges.iter().enumerate() {
                begins[side + 1] = *begin;
                ends[side + 1] = *end;
            }
            regions.push(ConflictRegion::new(begins, ends));
        }

        base_pos = cluster_end;
    }

    // untouched base tail
    if base.len() > base_pos {
        chunks.push(MergeChunk::new(
            0,
            base_pos,
            base.len(),
            ConflictState::NoConflict,
        ));
    }

    Ok(MergeResult {
        chunks,
        regions,
        sequence_count: sequences.len(),
    })
}
