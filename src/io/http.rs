use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::warn;

use super::DocumentSource;
use anyhow::{Context, Result, bail};

/// Document served over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: Url,
    name: String,
    max_retry: u32,
}

impl HttpSource {
    pub fn new(url: String) -> Result<Self> {
        let url = Url::parse(&url).with_context(|| format!("invalid URL: {}", url))?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let name = name_from_url(&url);

        Ok(Self {
            client,
            url,
            name,
            max_retry: 10,
        })
    }
}

/// Last non-empty path segment of `url`
fn name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> Result<String> {
        let mut retry_count = 0;

        loop {
            match self.client.get(self.url.clone()).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }
                    return Ok(resp.text().await?);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    warn!(
                        retry = retry_count,
                        max = self.max_retry,
                        error = %e,
                        "connection error, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> String {
        name_from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn url_names() {
        assert_eq!(name("https://example.com/docs/plan.md"), "plan.md");
        assert_eq!(name("https://example.com/docs/plan.md?raw=1#top"), "plan.md");
        assert_eq!(name("http://example.com/docs/"), "docs");
        assert_eq!(name("https://example.com"), "");
        assert_eq!(name("https://example.com/"), "");
    }

    #[test]
    fn url_names_are_normalized() {
        assert_eq!(name("https://example.com/docs/.."), "");
        assert_eq!(name("https://example.com\\docs\\plan.md"), "plan.md");
        assert_eq!(name("https://h/x/./y.md/."), "y.md");
        assert_eq!(name("https://example.com/my%20notes.md"), "my%20notes.md");
    }

    #[test]
    fn source_is_named_after_the_url() {
        let source = HttpSource::new("https://example.com/a/listing.md".to_string()).unwrap();
        assert_eq!(source.name(), "listing.md");
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(HttpSource::new("https://[::1".to_string()).is_err());
        assert!(HttpSource::new("not a url".to_string()).is_err());
    }
}
