//! Fetch one URL and reduce it to readable text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use trainset_shared::{Result, ScrapeConfig, TrainSetError};
use trainset_text::{extract_clean_text, normalize_lines};

/// Why a single source could not be used. Never ends a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("cannot extract text: {0}")]
    Extract(String),
}

/// Retrieves a page and returns its cleaned text (trimmed lines, no blanks).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Plain GET over reqwest with the configured user agent and timeout.
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrainSetError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), fields(timeout_secs = self.timeout_secs))]
    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        debug!("fetching page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        let text = to_text(&content_type, &body)?;
        debug!(body_len = body.len(), text_len = text.len(), "page extracted");
        Ok(text)
    }
}

/// HTML (or untyped) bodies go through the HTML extractor; other text is only
/// line-normalized. Binary payloads are rejected.
fn to_text(content_type: &str, body: &str) -> std::result::Result<String, FetchError> {
    let mime = content_type.split(';').next().unwrap_or("").trim();

    if mime.is_empty() || mime.contains("html") {
        return Ok(extract_clean_text(body));
    }
    if mime.starts_with("text/") {
        return Ok(normalize_lines(body));
    }
    Err(FetchError::Extract(format!(
        "unsupported content type '{mime}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ScrapeConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_cleans_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guide"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body>\n  <h1> Ownership </h1>\n\n<p>Each value has one owner.</p>\n\
                 <script>track()</script></body></html>",
                "text/html; charset=utf-8",
            ))
            .mount(&server)
            .await;

        let text = fetcher()
            .fetch_text(&format!("{}/guide", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "Ownership\nEach value has one owner.");
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Http { status: 404 });
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = ScrapeConfig {
            timeout_secs: 1,
            ..ScrapeConfig::default()
        };
        let err = HttpFetcher::new(&config)
            .unwrap()
            .fetch_text(&server.uri())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout { secs: 1 });
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let err = fetcher()
            .fetch_text("http://127.0.0.1:1/")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[test]
    fn plain_text_is_only_normalized() {
        let text = to_text("text/plain", "  a <b> \n\n c ").unwrap();
        assert_eq!(text, "a <b>\nc");
    }

    #[test]
    fn binary_content_is_rejected() {
        let err = to_text("application/pdf", "%PDF-1.7").unwrap_err();
        assert!(matches!(err, FetchError::Extract(_)));
    }

    #[test]
    fn missing_content_type_is_treated_as_html() {
        assert_eq!(to_text("", "<p>hi</p>").unwrap(), "hi");
    }
}
