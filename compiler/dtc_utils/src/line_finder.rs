//! Tools for looking up the [`LineAndCol`] of some location in a source unit
//!
//! Contract violations are reported by source line, so every loaded unit keeps
//! a [`LineLookup`] next to its text.

/// Wrapper around a line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineAndCol {
    /// The 1-indexed line number
    pub line: usize,
    /// The 1-indexed column number, counted in bytes
    pub col: usize,
}

/// Simple tool to lookup the line and column of a location in a source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLookup {
    /// The spans of each line in the input, excluding the line terminator
    line_spans: Vec<(usize, usize)>,
}

impl LineLookup {
    /// Creates a new [`LineLookup`] over a string
    #[must_use]
    pub fn new(input: &str) -> Self {
        let mut line_start = 0;
        let mut line_spans = vec![];
        for line in input.split('\n') {
            let line_end = line_start + line.len();
            let content_end = if line.ends_with('\r') {
                line_end - 1
            } else {
                line_end
            };
            line_spans.push((line_start, content_end));
            line_start = line_end + 1;
        }

        Self { line_spans }
    }

    /// The number of lines in the input
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_spans.len()
    }

    /// Look up the `1`-indexed line and column from an offset in the string
    ///
    /// Offsets pointing at a line terminator belong to the line they end.
    /// Offsets past the end of the input resolve to the last line.
    #[must_use]
    pub fn lookup_from_index(&self, index: usize) -> LineAndCol {
        // a line owns every offset from its start up to the next line's start
        let line = self
            .line_spans
            .partition_point(|&(line_start, _)| line_start <= index)
            .saturating_sub(1);

        let (line_start, line_end) = self.line_spans[line];
        LineAndCol {
            line: line + 1,
            col: index.min(line_end + 1).saturating_sub(line_start) + 1,
        }
    }

    /// Obtain the byte range of the `1`-indexed `line`, excluding its
    /// terminator, if such a line exists
    #[must_use]
    pub fn line_range(&self, line: usize) -> Option<std::ops::Range<usize>> {
        let (start, end) = *self.line_spans.get(line.checked_sub(1)?)?;
        Some(start..end)
    }
}
