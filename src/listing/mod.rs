//! Listing document parsing.
//!
//! A listing is Markdown-like text in which prose is interleaved with fenced
//! code blocks, each introduced by a header line naming the file the block
//! holds:
//!
//! ```text
//! ### File: `src/main.rs`      keyword form, path may contain spaces
//! ### src/lib.rs               heading form, bare path
//! /etc/app.conf                absolute path form, slash kept
//! ```
//!
//! The header is followed by a line break and a fence opener (three
//! backticks plus an optional language tag). The body runs up to the first
//! closing fence, never further.
//!
//! Everything outside matched blocks is kept as residual text and ends up
//! in the archive as `README.md`.

mod parser;
mod structures;

pub use parser::parse;
pub use structures::*;

/// Archive entry name used for residual prose
pub const README_NAME: &str = "README.md";
