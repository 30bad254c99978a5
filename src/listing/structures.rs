use std::ops::Range;

/// Header forms that can declare a file path in front of a fenced block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    /// ``### File: `path` ``
    Keyword,
    /// `### path`
    Heading,
    /// `/path` at the start of a line
    AbsolutePath,
}

/// A file extracted from the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

/// Where a [`FileRecord`] came from in the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Consumed byte range: header line start up to and including the closing backticks
    pub range: Range<usize>,
    pub form: HeaderForm,
    /// Fence language tag, if any
    pub language: Option<String>,
}

/// Output of a single parse pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Extracted files in document order
    pub files: Vec<FileRecord>,
    /// Everything not consumed by a block, trimmed once at the end
    pub residual_text: String,
    /// One span per entry of `files`, same order
    pub blocks: Vec<BlockSpan>,
}

impl ParseResult {
    /// Neither files nor residual prose were found
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.residual_text.trim().is_empty()
    }

    /// Whether the residual text will become a `README.md` entry
    pub fn has_readme(&self) -> bool {
        !self.residual_text.trim().is_empty()
    }
}
