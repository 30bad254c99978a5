use thiserror::Error;

/// Failures surfaced to the user. None of them are retried.
#[derive(Debug, Error)]
pub enum MdzipError {
    #[error("No input: pass a Markdown file, a URL, '-' for stdin, or --text")]
    EmptyInput,

    #[error("Invalid file type: {name} (expected a '.md' file)")]
    InvalidFileType { name: String },

    #[error("Error reading file: {name}: {detail}")]
    FileReadFailure { name: String, detail: String },

    #[error(
        "Parsing did not find any files or content. Ensure file definitions \
         (e.g. '### File: `path/to/file`', '### path/to/file' or '/path/to/file') \
         are followed by a code block."
    )]
    NoStructureFound,

    #[error("Failed to create ZIP archive: {0}")]
    ArchiveSerializationFailure(String),

    #[error("Unsafe entry path: {path} ({reason})")]
    UnsafePath { path: String, reason: &'static str },

    #[error("Archive already exists: {path} (use -o to overwrite)")]
    OutputExists { path: String },
}

pub type MdzipResult<T> = Result<T, MdzipError>;
