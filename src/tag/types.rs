//! Common types shared by selection, diff and output

use std::fmt;

use indexmap::IndexSet;

/// Unique tags in display order (descending version, source order on ties)
pub type TagSet = IndexSet<String>;

/// Output category a tag can be emitted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Arm64,
    Amd64,
    Multi,
    /// Unsplit listing used by the plain `tags` mode
    Tags,
}

impl Category {
    /// Key used in the output sink and the state file
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Arm64 => "arm64",
            Category::Amd64 => "amd64",
            Category::Multi => "multi",
            Category::Tags => "tags",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate tags per architecture for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    pub arm64: TagSet,
    pub amd64: TagSet,
    pub multi: TagSet,
}

impl SelectionResult {
    /// Categories in output order
    pub fn entries(&self) -> [(Category, &TagSet); 3] {
        [
            (Category::Arm64, &self.arm64),
            (Category::Amd64, &self.amd64),
            (Category::Multi, &self.multi),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.arm64.is_empty() && self.amd64.is_empty() && self.multi.is_empty()
    }
}

/// Result of a selection in either output mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// `arm64=`, `amd64=` and `multi=` lines
    Matrix(SelectionResult),
    /// A single `tags=` line
    Plain(TagSet),
}

impl Emission {
    /// Categories in output order
    pub fn entries(&self) -> Vec<(Category, &TagSet)> {
        match self {
            Emission::Matrix(result) => result.entries().to_vec(),
            Emission::Plain(tags) => vec![(Category::Tags, tags)],
        }
    }
}
