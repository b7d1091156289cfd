use bytes::Bytes;
use std::ops::Range;

/// Blob content split into lines
///
/// Line ranges exclude their terminators. The sequence remembers its own
/// newline convention (taken from the first terminated line) so the
/// formatter can reproduce it; a file mixing conventions is normalized
/// to the first one seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSequence {
    text: Bytes,
    lines: Vec<Range<usize>>,
    eol: &'static str,
}

impl LineSequence {
    pub fn from_bytes(text: Bytes) -> Self {
        let mut lines = Vec::new();
        let mut eol = "\n";
        let mut eol_decided = false;
        let mut start = 0;

        for (index, byte) in text.iter().enumerate() {
            if *byte != b'\n' {
                continue;
            }

            let mut end = index;
            if end > start && text[end - 1] == b'\r' {
                end -= 1;
                if !eol_decided {
                    eol = "\r\n";
                }
            }
            eol_decided = true;

            lines.push(start..end);
            start = index + 1;
        }

        // trailing line without a terminator
        if start < text.len() {
            lines.push(start..text.len());
        }

        LineSequence { text, lines, eol }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> &[u8] {
        &self.text[self.lines[index].clone()]
    }

    /// Borrowed view of all lines, the shape the diff layer consumes
    pub fn lines(&self) -> Vec<&[u8]> {
        self.lines.iter().map(|range| &self.text[range.clone()]).collect()
    }

    pub fn eol(&self) -> &'static str {
        self.eol
    }
}
