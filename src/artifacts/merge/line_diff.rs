//! Line diff (Myers' algorithm)
//!
//! Computes a minimal set of disjoint edit ranges between two sequences,
//! expressed over base offsets. The merge algorithm consumes ranges
//! rather than per-element edit scripts: each `Edit` says "lines
//! `[begin_a, end_a)` of the first sequence were replaced by lines
//! `[begin_b, end_b)` of the second". An insertion has an empty `a`
//! range, a deletion an empty `b` range.
//!
//! Elements are compared through a pluggable `LineComparator`, so a
//! whitespace-insensitive comparison can be slotted in without touching
//! the algorithm.

use derive_new::new;

/// Equivalence test between sequence elements
///
/// Used instead of plain identity so callers can treat, e.g.,
/// whitespace-only differences as equal.
pub trait LineComparator<T> {
    fn equals(&self, a: &T, b: &T) -> bool;
}

impl<T, C: LineComparator<T>> LineComparator<T> for &C {
    fn equals(&self, a: &T, b: &T) -> bool {
        (*self).equals(a, b)
    }
}

/// Strict equality
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictEq;

impl<T: Eq> LineComparator<T> for StrictEq {
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Equality ignoring all ASCII whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreWhitespace;

impl<'l> LineComparator<&'l [u8]> for IgnoreWhitespace {
    fn equals(&self, a: &&'l [u8], b: &&'l [u8]) -> bool {
        let significant = |line: &&[u8]| {
            line.iter()
                .copied()
                .filter(|byte| !byte.is_ascii_whitespace())
                .collect::<Vec<u8>>()
        };

        significant(a) == significant(b)
    }
}

/// One edit range: lines `[begin_a, end_a)` replaced by `[begin_b, end_b)`
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Edit {
    pub begin_a: usize,
    pub end_a: usize,
    pub begin_b: usize,
    pub end_b: usize,
}

impl Edit {
    pub fn is_insert(&self) -> bool {
        self.begin_a == self.end_a
    }

    pub fn is_delete(&self) -> bool {
        self.begin_b == self.end_b
    }

    pub fn len_a(&self) -> usize {
        self.end_a - self.begin_a
    }

    pub fn len_b(&self) -> usize {
        self.end_b - self.begin_b
    }
}

#[derive(Debug, Clone, new)]
pub struct MyersDiff<'d, T, C> {
    a: &'d [T],
    b: &'d [T],
    comparator: C,
}

impl<'d, T, C: LineComparator<T>> MyersDiff<'d, T, C> {
    fn compute_shortest_edit(&self) -> Vec<Vec<isize>> {
        let (n, m) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (n + m) as usize;

        let mut v = vec![0; 2 * offset + 1];
        let mut trace = Vec::new();

        for d in 0..=(n + m) {
            trace.push(v.clone());

            for k in (-d..=d).step_by(2) {
                let idx = (offset as isize + k) as usize;

                let mut x = if k == -d {
                    // we could have only come from k+1, thus an insertion
                    v[idx + 1]
                } else if k == d {
                    // we could have only come from k-1, thus a deletion
                    v[idx - 1] + 1
                } else {
                    // we could have come from either k-1 (deletion) or k+1 (insertion)
                    let x_del = v[idx - 1] + 1;
                    let x_ins = v[idx + 1];
                    if x_del > x_ins { x_del } else { x_ins }
                };

                let mut y = x - k;
                while x < n
                    && y < m
                    && self
                        .comparator
                        .equals(&self.a[x as usize], &self.b[y as usize])
                {
                    // snake
                    x += 1;
                    y += 1;
                }

                v[idx] = x;

                if x >= n && y >= m {
                    return trace;
                }
            }
        }

        trace
    }

    fn backtrack(&self) -> Vec<(isize, isize, isize, isize)> {
        if self.a.is_empty() && self.b.is_empty() {
            return Vec::new();
        }

        let (mut x, mut y) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (x + y) as usize;
        let mut edit_path = Vec::new();

        let trace = self.compute_shortest_edit();

        for (d, v) in trace.iter().enumerate().rev() {
            let k = x - y;

            let prev_k = if k == -(d as isize) {
                k + 1
            } else if k == (d as isize) {
                k - 1
            } else {
                let k_del = k - 1;
                let k_ins = k + 1;
                if v[(offset as isize + k_del) as usize] + 1 > v[(offset as isize + k_ins) as usize]
                {
                    k_del
                } else {
                    k_ins
                }
            };

            let prev_x = v[(offset as isize + prev_k) as usize];
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                edit_path.push((x - 1, y - 1, x, y));
                x -= 1;
                y -= 1;
            }

            if d > 0 {
                edit_path.push((prev_x, prev_y, x, y));
            }

            (x, y) = (prev_x, prev_y);
        }

        edit_path
    }

    /// The edit script as ordered, disjoint ranges over base offsets
    ///
    /// Consecutive non-equal steps collapse into one range, so an
    /// adjacent delete+insert pair comes back as a single replace.
    /// Distinct ranges always have at least one equal element between
    /// them.
    pub fn diff(&self) -> Vec<Edit> {
        let path = self.backtrack();
        let mut edits: Vec<Edit> = Vec::new();

        // the path is built back-to-front; walk it forward
        for &(prev_x, prev_y, x, y) in path.iter().rev() {
            if x > prev_x && y > prev_y {
                // diagonal step: equal elements, closes any open range
                continue;
            }

            let (begin_a, end_a) = (prev_x as usize, x as usize);
            let (begin_b, end_b) = (prev_y as usize, y as usize);
            match edits.last_mut() {
                Some(last) if last.end_a == begin_a && last.end_b == begin_b => {
                    last.end_a = end_a;
                    last.end_b = end_b;
                }
                _ => edits.push(Edit::new(begin_a, end_a, begin_b, end_b)),
            }
        }

        edits
    }
}
