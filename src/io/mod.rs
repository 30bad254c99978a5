mod http;
mod local;
mod stdin;

pub use http::HttpSource;
pub use local::LocalFileSource;
pub use stdin::StdinSource;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for sources a listing document can be read from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name used for type checks and archive naming, e.g. `notes.md`
    fn name(&self) -> &str;

    /// Typed or piped text rather than a named file
    fn is_direct_text(&self) -> bool {
        false
    }

    /// Read the whole document as text, replacing invalid UTF-8 with U+FFFD
    async fn read_text(&self) -> Result<String>;
}
