use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::archive::{BuildOptions, PathPolicy};
use crate::io::{HttpSource, LocalFileSource, StdinSource};
use crate::pipeline::{Input, LoadOptions};
use crate::zip::{CompressionMethod, DosDateTime, ZipArchiveWriter};

#[derive(Parser, Debug)]
#[command(name = "mdzip")]
#[command(version)]
#[command(about = "Turn a Markdown listing of labeled code blocks into a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  mdzip notes.md                 write notes.zip into the current directory\n  \
  mdzip -l notes.md              list the entries notes.zip would contain\n  \
  cat notes.md | mdzip -p - > out.zip   read stdin, write the archive to stdout\n  \
  mdzip -d dist https://example.com/plan.md   fetch a remote listing")]
pub struct Cli {
    /// Markdown file, HTTP URL, or '-' for stdin
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Use TEXT as the document (takes priority over FILE)
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Write the archive into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Name the archive after NAME instead of the input
    #[arg(short = 'N', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Write the archive to stdout, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// List entries only, do not write an archive
    #[arg(short = 'l')]
    pub list: bool,

    /// Overwrite an existing archive
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Store entries without compression
    #[arg(short = '0')]
    pub store: bool,

    /// Test the archive before writing it
    #[arg(short = 'T')]
    pub test: bool,

    /// Refuse absolute or parent-relative entry paths
    #[arg(long)]
    pub strict_paths: bool,

    /// Accept input files without a .md extension
    #[arg(long)]
    pub any_extension: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// More log output (-vv for debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(|f| f.starts_with("http://") || f.starts_with("https://"))
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn log_level(&self) -> Level {
        if self.quiet > 0 {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Pick the input channel. Non-blank `--text` wins over FILE.
    pub fn input(&self) -> Result<Input> {
        if let Some(text) = &self.text {
            if !text.trim().is_empty() || self.file.is_none() {
                return Ok(Input::Text(text.clone()));
            }
        }

        let input = match self.file.as_deref() {
            None => Input::Text(String::new()),
            Some("-") => Input::Source(Box::new(StdinSource)),
            Some(url) if self.is_http_url() => {
                Input::Source(Box::new(HttpSource::new(url.to_string())?))
            }
            Some(path) => Input::Source(Box::new(LocalFileSource::new(Path::new(path)))),
        };
        Ok(input)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_md_extension: !self.any_extension,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            path_policy: if self.strict_paths {
                PathPolicy::Strict
            } else {
                PathPolicy::Permissive
            },
            ..BuildOptions::default()
        }
    }

    pub fn archive_writer(&self) -> ZipArchiveWriter {
        let compression = if self.store {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflate
        };
        ZipArchiveWriter::new(compression, DosDateTime::now())
    }
}
