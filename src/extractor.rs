//! Article content extraction.
//!
//! Fetches a URL's HTML and reduces it to readable plain text. Many news
//! sites reject clients that do not identify as a browser, so requests carry
//! a browser User-Agent header.
//!
//! # Cleaning
//!
//! Text nodes inside `<script>` and `<style>` elements are discarded, then
//! whitespace is collapsed: every run of spaces, tabs, and newlines becomes a
//! single space. The result has no embedded newlines, and cleaning an
//! already-clean string changes nothing.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use scraper::{Html, Node};
use tracing::{debug, info, instrument};
use url::Url;

/// User-Agent sent with every article fetch. Text-only mirrors are tolerant,
/// but mainstream outlets serve 403s to non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Errors produced while fetching or extracting article content.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The input string could not be parsed as a URL.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The HTTP request failed at the transport level.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
}

/// Capability: turn a URL into cleaned, readable article text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch `url` and return its visible text content.
    async fn extract(&self, url: &str) -> Result<String, FetchError>;
}

/// [`ContentExtractor`] backed by an HTTP GET and an HTML parser.
#[derive(Debug, Clone, Default)]
pub struct HttpContentExtractor {
    client: Client,
}

impl HttpContentExtractor {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(bytes = body.len(), "Fetched article HTML");

        let text = clean_html(&body);
        info!(chars = text.len(), "Extracted article text");
        Ok(text)
    }
}

/// Reduce an HTML document to normalized visible text.
pub fn clean_html(html: &str) -> String {
    normalize_whitespace(&visible_text(html))
}

/// Collect the document's text nodes, skipping `<script>` and `<style>`
/// subtrees.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.root_element().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => matches!(element.name(), "script" | "style"),
                _ => false,
            });
            if !hidden {
                out.push_str(text);
                out.push('\n');
            }
        }
    }

    out
}

/// Collapse all whitespace runs to single spaces.
///
/// Splits the input into fragments on any whitespace, drops the empty ones,
/// and rejoins with single spaces. Running it on its own output is a no-op.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_strips_script_and_style() {
        let html = r#"<html><head>
            <style>body { color: red; }</style>
            <script>console.log("tracking");</script>
        </head><body>
            <h1>Headline</h1>
            <p>First paragraph.</p>
            <script>var x = 1;</script>
        </body></html>"#;

        let text = clean_html(html);
        assert_eq!(text, "Headline First paragraph.");
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_nested_markup_keeps_inline_text() {
        let html = "<p>Officials <em>confirmed</em> the <a href=\"#\">report</a>.</p>";
        assert_eq!(clean_html(html), "Officials confirmed the report .");
    }

    #[test]
    fn test_normalize_collapses_runs() {
        let raw = "  line one\n\n\t line   two  \r\n three ";
        assert_eq!(normalize_whitespace(raw), "line one line two three");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "Some\n messy \t\t input   with  gaps";
        let once = normalize_whitespace(raw);
        let twice = normalize_whitespace(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("   \n\t "), "");
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_url() {
        let extractor = HttpContentExtractor::new();
        let err = extractor.extract("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
