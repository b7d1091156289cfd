//! Canonical ordering for tree entries
//!
//! Entries are ordered by raw path bytes, with one twist: when one path
//! runs out before the other, the comparison continues one step using the
//! byte the entry's mode implies past its end - `/` for trees, NUL for
//! everything else. A tree named `a` therefore sorts as if it were `a/`,
//! which puts it after `a.b` (`.` < `/`) and before `a0b` (`/` < `0`).
//!
//! Byte-identical paths compare equal regardless of mode: a file `a` and a
//! tree `a` land on the same walk row, which is what lets the walk see a
//! directory/file conflict in the first place.
//!
//! Every cursor source is required to yield entries in this order already;
//! the comparator itself never re-checks that precondition.

use crate::artifacts::objects::entry_mode::EntryMode;
use std::cmp::Ordering;

/// Compare two entry paths (or single-level names) in canonical order
pub fn compare(a: &[u8], a_mode: EntryMode, b: &[u8], b_mode: EntryMode) -> Ordering {
    let common = a.len().min(b.len());
    match a[..common].cmp(&b[..common]) {
        Ordering::Equal => {}
        ord => return ord,
    }

    if a.len() == b.len() {
        return Ordering::Equal;
    }

    // One path is a strict prefix of the other: substitute the implied
    // suffix byte for the exhausted side and compare one more step. A
    // residual tie (the longer path continues with exactly the implied
    // byte) puts the shorter path first.
    let (suffix_a, suffix_b) = if a.len() < b.len() {
        (a_mode.sort_suffix(), b[common])
    } else {
        (a[common], b_mode.sort_suffix())
    };

    suffix_a.cmp(&suffix_b).then(a.len().cmp(&b.len()))
}
