//! Input selection and the parse → build flow.
//!
//! Every failure comes back as an [`MdzipError`] and ends the run. Nothing
//! is retried and nothing is kept from a failed attempt.

use tracing::{debug, info};

use crate::archive::{ArchiveBuilder, ArchiveWriter, BuiltArchive};
use crate::error::{MdzipError, MdzipResult};
use crate::io::DocumentSource;
use crate::listing::{self, ParseResult};

/// Name hint for text that did not come from a named file
pub const TEXT_INPUT_NAME: &str = "project";

/// Extension a document file must carry
pub const DOCUMENT_EXTENSION: &str = ".md";

/// Where the document comes from
pub enum Input {
    /// Text given directly, e.g. on the command line
    Text(String),
    Source(Box<dyn DocumentSource>),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub require_md_extension: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            require_md_extension: true,
        }
    }
}

/// Document text plus the hint its archive is named after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub text: String,
    pub name_hint: String,
}

/// Result of a successful run
#[derive(Debug)]
pub struct Outcome {
    pub parsed: ParseResult,
    pub archive: BuiltArchive,
}

/// Resolve `input` into document text.
///
/// Direct text is trimmed and named [`TEXT_INPUT_NAME`]. File content is
/// used as read, named after the file.
pub async fn load(input: Input, options: &LoadOptions) -> MdzipResult<LoadedDocument> {
    let source = match input {
        Input::Text(text) => return direct_text(&text),
        Input::Source(source) => source,
    };

    if source.is_direct_text() {
        let text = source
            .read_text()
            .await
            .map_err(|e| read_failure(source.name(), e))?;
        return direct_text(&text);
    }

    let name = source.name().to_string();
    if options.require_md_extension && !name.ends_with(DOCUMENT_EXTENSION) {
        return Err(MdzipError::InvalidFileType { name });
    }

    let text = source
        .read_text()
        .await
        .map_err(|e| read_failure(&name, e))?;
    if text.is_empty() {
        return Err(MdzipError::EmptyInput);
    }

    info!(name = %name, bytes = text.len(), "document loaded");
    Ok(LoadedDocument {
        text,
        name_hint: name,
    })
}

fn direct_text(text: &str) -> MdzipResult<LoadedDocument> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MdzipError::EmptyInput);
    }

    Ok(LoadedDocument {
        text: text.to_string(),
        name_hint: TEXT_INPUT_NAME.to_string(),
    })
}

fn read_failure(name: &str, error: anyhow::Error) -> MdzipError {
    MdzipError::FileReadFailure {
        name: name.to_string(),
        detail: format!("{:#}", error),
    }
}

/// Parse `text`, rejecting documents with neither files nor prose.
pub fn parse_checked(text: &str) -> MdzipResult<ParseResult> {
    let parsed = listing::parse(text);
    if parsed.is_empty() {
        return Err(MdzipError::NoStructureFound);
    }

    for (file, block) in parsed.files.iter().zip(&parsed.blocks) {
        debug!(
            path = %file.path,
            form = ?block.form,
            language = block.language.as_deref().unwrap_or(""),
            bytes = file.content.len(),
            "file block"
        );
    }
    info!(
        files = parsed.files.len(),
        readme = parsed.has_readme(),
        "listing parsed"
    );

    Ok(parsed)
}

/// Parse the document and build its archive.
pub async fn process<W: ArchiveWriter>(
    document: &LoadedDocument,
    builder: &ArchiveBuilder<W>,
) -> MdzipResult<Outcome> {
    let parsed = parse_checked(&document.text)?;
    let archive = builder
        .build(&parsed.files, &parsed.residual_text, &document.name_hint)
        .await?;

    Ok(Outcome { parsed, archive })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::BuildOptions;
    use crate::zip::{CompressionMethod, DosDateTime, ZipArchiveWriter, ZipReader};
    use anyhow::{Result, bail};
    use async_trait::async_trait;

    struct FakeSource {
        name: &'static str,
        text: Option<&'static str>,
        direct: bool,
    }

    impl FakeSource {
        fn file(name: &'static str, text: &'static str) -> Input {
            Input::Source(Box::new(Self {
                name,
                text: Some(text),
                direct: false,
            }))
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn is_direct_text(&self) -> bool {
            self.direct
        }

        async fn read_text(&self) -> Result<String> {
            match self.text {
                Some(text) => Ok(text.to_string()),
                None => bail!("permission denied"),
            }
        }
    }

    fn builder() -> ArchiveBuilder<ZipArchiveWriter> {
        ArchiveBuilder::new(
            ZipArchiveWriter::new(CompressionMethod::Deflate, DosDateTime::MIN),
            BuildOptions::default(),
        )
    }

    #[tokio::test]
    async fn direct_text_is_trimmed_and_named_project() {
        let doc = load(Input::Text("\n  hello  \n".into()), &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(doc.text, "hello");
        assert_eq!(doc.name_hint, "project");
    }

    #[tokio::test]
    async fn blank_text_is_empty_input() {
        let err = load(Input::Text(" \n\t".into()), &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MdzipError::EmptyInput));
    }

    #[tokio::test]
    async fn piped_text_counts_as_direct() {
        let input = Input::Source(Box::new(FakeSource {
            name: "-",
            text: Some("  body\n"),
            direct: true,
        }));
        let doc = load(input, &LoadOptions::default()).await.unwrap();
        assert_eq!(doc.text, "body");
        assert_eq!(doc.name_hint, "project");
    }

    #[tokio::test]
    async fn file_keeps_content_and_name() {
        let doc = load(FakeSource::file("notes.md", "  x\n"), &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(doc.text, "  x\n");
        assert_eq!(doc.name_hint, "notes.md");
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_reading() {
        let input = Input::Source(Box::new(FakeSource {
            name: "notes.txt",
            text: None,
            direct: false,
        }));
        let err = load(input, &LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, MdzipError::InvalidFileType { ref name } if name == "notes.txt"));
    }

    #[tokio::test]
    async fn extension_check_can_be_disabled() {
        let options = LoadOptions {
            require_md_extension: false,
        };
        let doc = load(FakeSource::file("notes.txt", "x"), &options).await.unwrap();
        assert_eq!(doc.name_hint, "notes.txt");
    }

    #[tokio::test]
    async fn read_error_names_the_file() {
        let input = Input::Source(Box::new(FakeSource {
            name: "locked.md",
            text: None,
            direct: false,
        }));
        let err = load(input, &LoadOptions::default()).await.unwrap_err();
        match err {
            MdzipError::FileReadFailure { name, detail } => {
                assert_eq!(name, "locked.md");
                assert!(detail.contains("permission denied"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_file_is_empty_input() {
        let err = load(FakeSource::file("empty.md", ""), &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MdzipError::EmptyInput));
    }

    #[test]
    fn whitespace_document_has_no_structure() {
        let err = parse_checked(" \n\n ").unwrap_err();
        assert!(matches!(err, MdzipError::NoStructureFound));
        assert!(err.to_string().contains("### path/to/file"));
    }

    #[tokio::test]
    async fn end_to_end_single_file() {
        let doc = LoadedDocument {
            text: "### File: `a.txt`\n```\nhello\n```\n".to_string(),
            name_hint: "hello.md".to_string(),
        };
        let outcome = process(&doc, &builder()).await.unwrap();

        assert_eq!(outcome.parsed.files.len(), 1);
        assert_eq!(outcome.parsed.residual_text, "");
        assert_eq!(outcome.archive.file_name(), "hello.zip");
        assert_eq!(outcome.archive.summary.entries, ["a.txt"]);

        let reader = ZipReader::new(&outcome.archive.bytes).unwrap();
        assert_eq!(reader.read_by_name("a.txt").unwrap(), b"hello");
    }

    #[tokio::test]
    async fn prose_only_document_still_builds() {
        let doc = LoadedDocument {
            text: "Just some notes.".to_string(),
            name_hint: TEXT_INPUT_NAME.to_string(),
        };
        let outcome = process(&doc, &builder()).await.unwrap();
        assert!(outcome.parsed.files.is_empty());
        assert_eq!(outcome.archive.summary.entries, ["README.md"]);
        assert_eq!(outcome.archive.file_name(), "project.zip");
    }
}
