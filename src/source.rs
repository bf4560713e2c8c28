//! Loading page markup from a local file or an `http(s)` URL.

use crate::{Document, Error, ExportConfig, Result};
use std::path::Path;

/// Where a page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    File(String),
    #[cfg(feature = "fetch")]
    Url(String),
}

impl PageSource {
    /// Classify a CLI-style source string. Anything that isn't an http(s) URL is a path.
    pub fn parse(raw: &str) -> Self {
        #[cfg(feature = "fetch")]
        if let Ok(u) = url::Url::parse(raw) {
            if matches!(u.scheme(), "http" | "https") {
                return PageSource::Url(u.to_string());
            }
        }
        PageSource::File(raw.to_string())
    }
}

/// Read the page markup. Uses blocking IO; call from a blocking context.
pub fn load_html(source: &PageSource, config: &ExportConfig) -> Result<String> {
    match source {
        PageSource::File(path) => std::fs::read_to_string(Path::new(path))
            .map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path, e))),
        #[cfg(feature = "fetch")]
        PageSource::Url(url) => fetch(url, config),
    }
}

/// Load and parse a page
pub fn load_document(source: &PageSource, config: &ExportConfig) -> Result<Document> {
    let html = load_html(source, config)?;
    Ok(Document::parse(&html))
}

#[cfg(feature = "fetch")]
fn fetch(url: &str, config: &ExportConfig) -> Result<String> {
    use std::time::Duration;

    // zero disables the deadline
    let timeout = (config.load_timeout_ms > 0).then(|| Duration::from_millis(config.load_timeout_ms));
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::LoadError(format!("Failed to build HTTP client: {}", e)))?;
    let resp = client
        .get(url)
        .header("User-Agent", config.user_agent.clone())
        .send()
        .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::LoadError(format!("{} returned {}", url, status)));
    }
    let body = resp
        .text()
        .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
    log::debug!("fetched {} bytes from {}", body.len(), url);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_sources() {
        assert_eq!(PageSource::parse("dash.html"), PageSource::File("dash.html".into()));
        assert_eq!(PageSource::parse("/tmp/a b.html"), PageSource::File("/tmp/a b.html".into()));
        #[cfg(feature = "fetch")]
        assert_eq!(
            PageSource::parse("http://127.0.0.1:8080/dash"),
            PageSource::Url("http://127.0.0.1:8080/dash".into())
        );
        assert!(matches!(PageSource::parse("file:///tmp/x.html"), PageSource::File(_)));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_html(&PageSource::File("/definitely/not/here.html".into()), &ExportConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::LoadError(_)));
    }
}
