use super::DocumentSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

/// Document piped in on stdin
pub struct StdinSource;

#[async_trait]
impl DocumentSource for StdinSource {
    fn name(&self) -> &str {
        "-"
    }

    fn is_direct_text(&self) -> bool {
        true
    }

    async fn read_text(&self) -> Result<String> {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("failed to read stdin")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
