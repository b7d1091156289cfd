//! Conflict-marker rendering
//!
//! Streams a chunk list into text. Clean chunks are copied verbatim;
//! a conflict run is wrapped in the usual seven-character markers:
//!
//! ```text
//! <<<<<<< ours
//! our lines
//! =======
//! their lines
//! >>>>>>> theirs
//! ```
//!
//! The mid marker is unlabeled in the common base/ours/theirs case and
//! labeled when more sequences participate. Lines keep their own
//! sequence's newline convention; a result that ends inside a conflict
//! still gets its closing marker.

use crate::artifacts::merge::algorithm::{ConflictState, MergeChunk, MergeResult};
use crate::artifacts::merge::sequence::LineSequence;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;

const MARKER_BEGIN: &str = "<<<<<<<";
const MARKER_MIDDLE: &str = "=======";
const MARKER_END: &str = ">>>>>>>";

/// Render a merge result with conflict markers
///
/// `sequences` and `side_names` are indexed like the chunks' source
/// indexes (0 = base). The base name is only ever printed when a merge
/// of more than three sequences puts the base into a conflict run.
pub fn format_merge_result<W: Write>(
    result: &MergeResult,
    sequences: &[&LineSequence],
    side_names: &[&str],
    out: &mut W,
) -> anyhow::Result<()> {
    if sequences.len() != result.sequence_count() {
        anyhow::bail!(
            "result covers {} sequences, got {}",
            result.sequence_count(),
            sequences.len()
        );
    }
    if side_names.len() != sequences.len() {
        anyhow::bail!(
            "need one name per sequence, got {} for {}",
            side_names.len(),
            sequences.len()
        );
    }

    // the unlabeled mid marker is reserved for plain three-way merges
    let label_middle = sequences.len() > 3;
    let mut current_conflict_source: Option<usize> = None;

    for chunk in result.chunks() {
        let sequence = sequences[chunk.source];
        let eol = sequence.eol();

        match chunk.state {
            ConflictState::NoConflict => {
                if let Some(source) = current_conflict_source.take() {
                    write_marker(out, MARKER_END, Some(side_names[source]), sequences[source].eol())?;
                }
            }
            ConflictState::FirstConflicting => {
                // close a dangling run before opening a new one
                if let Some(source) = current_conflict_source.take() {
                    write_marker(out, MARKER_END, Some(side_names[source]), sequences[source].eol())?;
                }
                write_marker(out, MARKER_BEGIN, Some(side_names[chunk.source]), eol)?;
                current_conflict_source = Some(chunk.source);
            }
            ConflictState::NextConflicting => {
                let label = label_middle.then_some(side_names[chunk.source]);
                write_marker(out, MARKER_MIDDLE, label, eol)?;
                current_conflict_source = Some(chunk.source);
            }
        }

        write_chunk(out, chunk, sequence)?;
    }

    // never leave a conflict unterminated
    if let Some(source) = current_conflict_source {
        write_marker(out, MARKER_END, Some(side_names[source]), sequences[source].eol())?;
    }

    Ok(())
}

/// Assemble the merged content of a conflict-free result
pub fn merged_bytes(result: &MergeResult, sequences: &[&LineSequence]) -> anyhow::Result<Bytes> {
    if result.contains_conflicts() {
        anyhow::bail!("cannot assemble merged content out of a conflicting result");
    }

    let mut out = Vec::new();
    for chunk in result.chunks() {
        let sequence = sequences
            .get(chunk.source)
            .context("chunk references a sequence that was not supplied")?;
        write_chunk(&mut out, chunk, sequence)?;
    }

    Ok(Bytes::from(out))
}

fn write_chunk<W: Write>(
    out: &mut W,
    chunk: &MergeChunk,
    sequence: &LineSequence,
) -> anyhow::Result<()> {
    for index in chunk.begin..chunk.end {
        out.write_all(sequence.line(index))?;
        out.write_all(sequence.eol().as_bytes())?;
    }

    Ok(())
}

fn write_marker<W: Write>(
    out: &mut W,
    marker: &str,
    label: Option<&str>,
    eol: &str,
) -> anyhow::Result<()> {
    out.write_all(marker.as_bytes())?;
    if let Some(label) = label {
        out.write_all(b" ")?;
        out.write_all(label.as_bytes())?;
    }
    out.write_all(eol.as_bytes())?;

    Ok(())
}
