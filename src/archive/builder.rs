use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{MdzipError, MdzipResult};
use crate::listing::{FileRecord, README_NAME};

use super::path::{PathPolicy, unsafe_reason};
use super::{ArchiveEntry, ArchiveWriter};

/// Base name used when the hint yields nothing
pub const DEFAULT_ARCHIVE_NAME: &str = "project";

/// Archive builder settings
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub fallback_name: String,
    pub path_policy: PathPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            fallback_name: DEFAULT_ARCHIVE_NAME.to_string(),
            path_policy: PathPolicy::default(),
        }
    }
}

/// What went into an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// `<base_name>.zip`
    pub archive_name: String,
    /// Files plus README, counting repeated paths every time
    pub entry_count: usize,
    /// Entry paths in registration order
    pub entries: Vec<String>,
    pub readme_included: bool,
    pub archive_size: usize,
}

/// A serialized archive ready for delivery
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    pub base_name: String,
    pub bytes: Vec<u8>,
    pub summary: BuildSummary,
}

impl BuiltArchive {
    pub fn file_name(&self) -> &str {
        &self.summary.archive_name
    }
}

/// Strip one trailing `.md` from `name_hint`, falling back when nothing is left.
///
/// The match is case-sensitive and applied once: `notes.md.md` becomes `notes.md`.
pub fn derive_base_name(name_hint: &str, fallback: &str) -> String {
    let stem = name_hint.strip_suffix(".md").unwrap_or(name_hint);
    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}

/// Assembles parsed records into an archive through an [`ArchiveWriter`]
pub struct ArchiveBuilder<W: ArchiveWriter> {
    writer: W,
    options: BuildOptions,
}

impl<W: ArchiveWriter> ArchiveBuilder<W> {
    pub fn new(writer: W, options: BuildOptions) -> Self {
        Self { writer, options }
    }

    /// Entries in registration order: every record, then `README.md` when
    /// the residual text is not blank. README goes last so it wins a path
    /// collision with a record.
    pub fn plan(&self, files: &[FileRecord], residual_text: &str) -> MdzipResult<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(files.len() + 1);
        let mut seen = HashSet::with_capacity(files.len());

        for file in files {
            if let Some(reason) = unsafe_reason(&file.path) {
                match self.options.path_policy {
                    PathPolicy::Strict => {
                        return Err(MdzipError::UnsafePath {
                            path: file.path.clone(),
                            reason,
                        });
                    }
                    PathPolicy::Permissive => {
                        warn!(path = %file.path, reason, "keeping unsafe entry path");
                    }
                }
            }

            if !seen.insert(file.path.as_str()) {
                debug!(path = %file.path, "path registered again, later content wins");
            }
            entries.push(ArchiveEntry::new(file.path.as_str(), file.content.as_str()));
        }

        let readme = residual_text.trim();
        if !readme.is_empty() {
            if seen.contains(README_NAME) {
                debug!("residual text replaces extracted {}", README_NAME);
            }
            entries.push(ArchiveEntry::new(README_NAME, readme));
        }

        Ok(entries)
    }

    /// Build the archive for `files` and `residual_text`, named after `name_hint`.
    pub async fn build(
        &self,
        files: &[FileRecord],
        residual_text: &str,
        name_hint: &str,
    ) -> MdzipResult<BuiltArchive> {
        let base_name = derive_base_name(name_hint, &self.options.fallback_name);
        let entries = self.plan(files, residual_text)?;
        let names: Vec<String> = entries.iter().map(|e| e.path.clone()).collect();
        let readme_included = files.len() < entries.len();

        let bytes = self
            .writer
            .write_archive(entries)
            .await
            .map_err(|e| MdzipError::ArchiveSerializationFailure(format!("{:#}", e)))?;

        let summary = BuildSummary {
            archive_name: format!("{}.zip", base_name),
            entry_count: names.len(),
            entries: names,
            readme_included,
            archive_size: bytes.len(),
        };

        info!(
            archive = %summary.archive_name,
            entries = summary.entry_count,
            readme = summary.readme_included,
            bytes = summary.archive_size,
            "archive built"
        );

        Ok(BuiltArchive {
            base_name,
            bytes,
            summary,
        })
    }
}
