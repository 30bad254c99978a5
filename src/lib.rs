//! # mdzip
//!
//! Turn a Markdown listing of labeled code blocks into a ZIP archive.
//!
//! A listing interleaves prose with fenced code blocks, each introduced by
//! a header line that names the file the block holds. This crate extracts
//! those blocks as files, collects the remaining prose as a `README.md`, and
//! packages everything into a ZIP archive named after the input.
//!
//! ## Features
//!
//! - Three header forms: ``### File: `path` ``, `### path` and `/path`
//! - Exact block bodies, never merged across consecutive blocks
//! - Self-contained ZIP writer with STORED and DEFLATE entries
//! - Input from local files, HTTP/HTTPS URLs or stdin
//!
//! ## Example
//!
//! ```no_run
//! use mdzip::{ArchiveBuilder, BuildOptions, ZipArchiveWriter, listing};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let text = std::fs::read_to_string("notes.md")?;
//!     let parsed = listing::parse(&text);
//!
//!     let builder = ArchiveBuilder::new(ZipArchiveWriter::default(), BuildOptions::default());
//!     let archive = builder
//!         .build(&parsed.files, &parsed.residual_text, "notes.md")
//!         .await?;
//!
//!     std::fs::write(archive.file_name(), &archive.bytes)?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod listing;
pub mod pipeline;
pub mod zip;

pub use archive::{ArchiveBuilder, ArchiveWriter, BuildOptions, BuildSummary, BuiltArchive};
pub use cli::Cli;
pub use error::MdzipError;
pub use io::{DocumentSource, HttpSource, LocalFileSource, StdinSource};
pub use listing::{FileRecord, ParseResult};
pub use zip::{ZipArchiveWriter, ZipReader};
