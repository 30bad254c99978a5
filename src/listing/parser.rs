//! Line-oriented scanner for listing documents.
//!
//! ## Scanning Strategy
//!
//! The scanner visits line starts from left to right and tries to match a
//! complete block at each one:
//! 1. A header line in one of the three [`HeaderForm`]s
//! 2. A fence opener on the very next line
//! 3. A body ending at the first line break followed by a closing fence
//!
//! When a block matches, scanning resumes at the first line start after
//! the closing backticks, so blocks never overlap. Text between blocks is
//! collected as residual text.
//!
//! Step 3 is what keeps consecutive blocks apart: the body always stops at
//! the FIRST closing fence after the opener. The opener consumes its own
//! line break, so the first body line can never act as the closer.

use super::structures::*;

/// Fence delimiter
const FENCE: &str = "```";

/// Prefix of a keyword header, up to the opening backtick
const KEYWORD_PREFIX: &str = "### File: `";

/// Prefix of a heading header
const HEADING_PREFIX: &str = "###";

/// A recognized header line
struct Header<'a> {
    path: &'a str,
    form: HeaderForm,
    /// Offset just past the header's line break
    end: usize,
}

/// A complete block match
struct Block<'a> {
    header: Header<'a>,
    language: Option<&'a str>,
    content: &'a str,
    /// Offset just past the closing backticks
    end: usize,
}

/// Parse a listing document into file records and residual text.
///
/// Never fails: a document without any block yields no files and its own
/// trimmed text as residual.
///
/// # Example
///
/// ```
/// let doc = "Notes\n### File: `a.txt`\n```\nhello\n```\n";
/// let result = mdzip::listing::parse(doc);
/// assert_eq!(result.files[0].path, "a.txt");
/// assert_eq!(result.files[0].content, "hello");
/// assert_eq!(result.residual_text, "Notes");
/// ```
pub fn parse(document: &str) -> ParseResult {
    let mut result = ParseResult::default();
    let mut residual = String::new();
    // End of the last consumed span
    let mut consumed = 0;
    let mut line = 0;

    while line < document.len() {
        let Some(block) = match_block(document, line) else {
            line = next_line(document, line);
            continue;
        };

        residual.push_str(&document[consumed..line]);
        result.files.push(FileRecord {
            path: block.header.path.to_string(),
            content: block.content.to_string(),
        });
        result.blocks.push(BlockSpan {
            range: line..block.end,
            form: block.header.form,
            language: block.language.map(str::to_string),
        });

        consumed = block.end;
        line = next_line(document, block.end);
    }

    residual.push_str(&document[consumed..]);
    result.residual_text = residual.trim().to_string();
    result
}

/// Offset of the first line start after `from`
fn next_line(document: &str, from: usize) -> usize {
    match document[from..].find('\n') {
        Some(i) => from + i + 1,
        None => document.len(),
    }
}

/// Try to match a whole block starting at line start `start`.
fn match_block(document: &str, start: usize) -> Option<Block<'_>> {
    let header = match_header(document, start)?;
    let (language, body_start) = match_opener(document, header.end)?;

    // First "\n```" at or after the body start wins
    let newline = body_start + document[body_start..].find("\n```")?;
    let body_end = if newline > body_start && document.as_bytes()[newline - 1] == b'\r' {
        newline - 1
    } else {
        newline
    };

    Some(Block {
        header,
        language,
        content: &document[body_start..body_end],
        end: newline + 1 + FENCE.len(),
    })
}

/// Header forms are tried in order. A line that parses as a keyword header
/// always fails the heading form (the `File:` bareword is followed by more
/// text), so at most one form can apply to a given line.
fn match_header(document: &str, start: usize) -> Option<Header<'_>> {
    keyword_header(document, start)
        .or_else(|| heading_header(document, start))
        .or_else(|| absolute_path_header(document, start))
}

fn keyword_header(document: &str, start: usize) -> Option<Header<'_>> {
    let rest = document[start..].strip_prefix(KEYWORD_PREFIX)?;
    let close = rest.find(['`', '\n'])?;
    if !rest[close..].starts_with('`') {
        return None;
    }

    let path = rest[..close].trim();
    if path.is_empty() {
        return None;
    }

    let end = end_of_header(document, start + KEYWORD_PREFIX.len() + close + 1)?;
    Some(Header {
        path,
        form: HeaderForm::Keyword,
        end,
    })
}

fn heading_header(document: &str, start: usize) -> Option<Header<'_>> {
    let rest = document[start..].strip_prefix(HEADING_PREFIX)?;

    // At least one separator between the hashes and the path
    let path_start = rest.find(|c: char| !is_horizontal_space(c))?;
    if path_start == 0 {
        return None;
    }

    let tail = &rest[path_start..];
    let path_len = tail.find(char::is_whitespace).unwrap_or(tail.len());
    if path_len == 0 {
        return None;
    }

    let end = end_of_header(document, start + HEADING_PREFIX.len() + path_start + path_len)?;
    Some(Header {
        path: &tail[..path_len],
        form: HeaderForm::Heading,
        end,
    })
}

fn absolute_path_header(document: &str, start: usize) -> Option<Header<'_>> {
    let rest = &document[start..];
    if !rest.starts_with('/') {
        return None;
    }

    // The slash plus at least one more non-whitespace character
    let path_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if path_len < 2 {
        return None;
    }

    let end = end_of_header(document, start + path_len)?;
    Some(Header {
        path: &rest[..path_len],
        form: HeaderForm::AbsolutePath,
        end,
    })
}

/// Skip trailing horizontal whitespace (including `\r`) and require exactly
/// one line break. Returns the offset past the `\n`.
fn end_of_header(document: &str, pos: usize) -> Option<usize> {
    let rest = &document[pos..];
    let skipped = rest.find(|c: char| !is_horizontal_space(c))?;
    rest[skipped..].starts_with('\n').then_some(pos + skipped + 1)
}

/// Match a fence opener at `pos`. Returns the language tag and the body
/// start offset.
fn match_opener(document: &str, pos: usize) -> Option<(Option<&str>, usize)> {
    let rest = document[pos..].strip_prefix(FENCE)?;
    let tag_len = rest.find(|c: char| !is_tag_char(c)).unwrap_or(rest.len());

    let after = &rest[tag_len..];
    let line_break = if after.starts_with("\r\n") {
        2
    } else if after.starts_with('\n') {
        1
    } else {
        return None;
    };

    let tag = &rest[..tag_len];
    let language = (!tag.is_empty()).then_some(tag);
    Some((language, pos + FENCE.len() + tag_len + line_break))
}

fn is_horizontal_space(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
