//! Loaded source units

use std::path::{Path, PathBuf};

use dtc_utils::{line_finder::LineLookup, span::SourceId};

/// The text of one loaded unit, with its line table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// The id every span into this unit carries
    id: SourceId,
    /// Path the unit was read from
    path: PathBuf,
    /// Content of the unit
    content: String,
    /// Line table over `content`
    lines: LineLookup,
}

impl SourceFile {
    /// Create a new [`SourceFile`], computing its line table
    #[must_use]
    pub fn new(id: SourceId, path: PathBuf, content: String) -> Self {
        let lines = LineLookup::new(&content);
        Self {
            id,
            path,
            content,
            lines,
        }
    }

    /// The id of this unit
    #[must_use]
    pub const fn id(&self) -> SourceId {
        self.id
    }

    /// The path this unit was read from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full text of this unit
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The 1-based line containing the byte `offset`
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.lookup_from_index(offset).line
    }
}
