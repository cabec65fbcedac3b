//! Page rendering backends used by the source scrapers.
//!
//! A [`Renderer`] turns a URL into the HTML of the page after it has loaded.
//! Every call is an independent session: nothing is pooled or reused between
//! calls, so one source's broken page cannot leak state into another.
//!
//! # Backends
//!
//! | Backend | Scripts executed | Notes |
//! |---------|------------------|-------|
//! | [`BrowserlessRenderer`] | yes | Headless Chrome behind the Browserless `/content` API |
//! | [`HttpRenderer`] | no | Plain GET, used when no Browserless endpoint is configured |

use crate::error::ScrapeError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) daily_headlines/",
    env!("CARGO_PKG_VERSION")
);

/// Time allowed on top of a navigation timeout for starting and closing a
/// browser. Callers bounding a whole render should add it as well.
pub const STARTUP_HEADROOM: Duration = Duration::from_secs(10);

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyCondition {
    /// No more than two network connections for 500 ms.
    NetworkIdle,
}

impl ReadyCondition {
    fn as_puppeteer(self) -> &'static str {
        match self {
            ReadyCondition::NetworkIdle => "networkidle2",
        }
    }
}

/// Something that can load a page and hand back its HTML.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, ready: ReadyCondition) -> Result<String, ScrapeError>;

    /// Whether page scripts run before the HTML is handed back.
    fn executes_scripts(&self) -> bool {
        true
    }
}

/// Renders pages in a headless browser through the Browserless `/content` API.
///
/// Browserless starts a fresh browser for each request and closes it once the
/// content has been returned.
#[derive(Debug)]
pub struct BrowserlessRenderer {
    client: reqwest::Client,
    endpoint: Url,
    navigation_timeout: Duration,
}

impl BrowserlessRenderer {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        navigation_timeout: Duration,
    ) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(navigation_timeout + STARTUP_HEADROOM)
            .build()?;

        let mut endpoint = Url::parse(&format!("{}/content", base_url.trim_end_matches('/')))?;
        if let Some(token) = token {
            endpoint.query_pairs_mut().append_pair("token", token);
        }

        Ok(Self {
            client,
            endpoint,
            navigation_timeout,
        })
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body(&self, url: &str, ready: ReadyCondition) -> serde_json::Value {
        serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": ready.as_puppeteer(),
                "timeout": self.navigation_timeout.as_millis() as u64,
            }
        })
    }
}

#[async_trait]
impl Renderer for BrowserlessRenderer {
    #[instrument(level = "debug", skip(self), fields(backend = "browserless"))]
    async fn render(&self, url: &str, ready: ReadyCondition) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .post(self.endpoint().clone())
            .json(&self.request_body(url, ready))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Browserless rejected render request");
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        debug!(bytes = html.len(), "Rendered page");
        Ok(html)
    }
}

/// Fetches raw HTML without executing scripts.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    fn executes_scripts(&self) -> bool {
        false
    }

    #[instrument(level = "debug", skip(self), fields(backend = "http"))]
    async fn render(&self, url: &str, _ready: ReadyCondition) -> Result<String, ScrapeError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        let html = resp.text().await?;
        debug!(bytes = html.len(), "Fetched page");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browserless_endpoint_with_token() {
        let r = BrowserlessRenderer::new(
            "http://localhost:3000/",
            Some("secret"),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(r.endpoint().as_str(), "http://localhost:3000/content?token=secret");
    }

    #[test]
    fn test_browserless_endpoint_without_token() {
        let r = BrowserlessRenderer::new("http://chrome:3000", None, Duration::from_secs(5)).unwrap();
        assert_eq!(r.endpoint().as_str(), "http://chrome:3000/content");
    }

    #[test]
    fn test_browserless_token_is_percent_encoded() {
        let r = BrowserlessRenderer::new("http://chrome:3000", Some("a b&c=d#e"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(r.endpoint().as_str(), "http://chrome:3000/content?token=a+b%26c%3Dd%23e");
        let token = r
            .endpoint()
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("a b&c=d#e"));
    }

    #[test]
    fn test_only_browserless_executes_scripts() {
        let browserless = BrowserlessRenderer::new("http://chrome:3000", None, Duration::from_secs(5)).unwrap();
        let http = HttpRenderer::new(Duration::from_secs(5)).unwrap();
        assert!(browserless.executes_scripts());
        assert!(!http.executes_scripts());
    }

    #[test]
    fn test_browserless_rejects_invalid_base_url() {
        assert!(matches!(
            BrowserlessRenderer::new("not a url", None, Duration::from_secs(5)),
            Err(ScrapeError::Url(_))
        ));
    }

    #[test]
    fn test_browserless_request_waits_for_network_idle() {
        let r = BrowserlessRenderer::new("http://chrome:3000", None, Duration::from_secs(20)).unwrap();
        let body = r.request_body("https://dev.to/", ReadyCondition::NetworkIdle);
        assert_eq!(body["url"], "https://dev.to/");
        assert_eq!(body["gotoOptions"]["waitUntil"], "networkidle2");
        assert_eq!(body["gotoOptions"]["timeout"], 20_000);
    }
}
