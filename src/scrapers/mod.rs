//! Headline scrapers, one per source site.
//!
//! Every source is exposed to the rest of the application as a
//! [`SourceAdapter`]. The adapters shipped here are all [`PageSource`]s: a
//! fixed page URL plus a pure extraction function over the rendered HTML.
//!
//! # Supported Sources
//!
//! | Source | Module | Page | Selector |
//! |--------|--------|------|----------|
//! | Hacker News | [`hackernews`] | front page | `.titleline > a` |
//! | Dev.to | [`devto`] | home feed | `.crayons-story__title a` |
//! | Velog | [`velog`] | trending | `.PostCard_block__FTMsy`, second link, `h4` |
//! | AWS | [`aws`] | AWS News Blog (ko) | `.blog-post`, `h2` + first link |
//!
//! # Common Patterns
//!
//! Each scraper module exports:
//! - `NAME`: the display name every produced article is tagged with
//! - `PAGE_URL`: the page that is rendered
//! - `extract(html, base)`: pure extraction of at most [`MAX_ITEMS`] articles
//!
//! Extraction never fails. Missing sub-elements become [`NO_TITLE`] /
//! [`NO_LINK`], and relative links are resolved against the page URL.

pub mod aws;
pub mod devto;
pub mod hackernews;
pub mod velog;

use crate::error::ScrapeError;
use crate::models::{Article, NO_LINK, NO_TITLE};
use crate::render::{ReadyCondition, Renderer, STARTUP_HEADROOM};
use crate::utils::{collapse_whitespace, truncate_for_log};
use async_trait::async_trait;
use scraper::ElementRef;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Most headlines a single source contributes to one aggregation.
pub const MAX_ITEMS: usize = 3;

/// Every known source name, in registration order.
pub const ALL_SOURCES: [&str; 4] = [hackernews::NAME, devto::NAME, velog::NAME, aws::NAME];

/// What one source run produced.
#[derive(Debug)]
pub enum SourceOutcome {
    /// At least one article was extracted.
    Success(Vec<Article>),
    /// The page loaded but nothing matched.
    Empty,
    /// The page could not be retrieved.
    Failed(ScrapeError),
}

impl SourceOutcome {
    pub fn from_articles(articles: Vec<Article>) -> Self {
        if articles.is_empty() {
            SourceOutcome::Empty
        } else {
            SourceOutcome::Success(articles)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }

    /// Articles carried by the outcome; empty unless it is a success.
    pub fn into_articles(self) -> Vec<Article> {
        match self {
            SourceOutcome::Success(articles) => articles,
            SourceOutcome::Empty | SourceOutcome::Failed(_) => Vec::new(),
        }
    }

    /// Log the outcome against `source` and reduce it to its articles.
    pub fn log_into_articles(self, source: &str) -> Vec<Article> {
        match &self {
            SourceOutcome::Success(articles) => {
                info!(%source, count = articles.len(), "Source scraped");
            }
            SourceOutcome::Empty => warn!(%source, "Source page matched no stories"),
            SourceOutcome::Failed(e) => error!(%source, error = %e, "Source scrape failed"),
        }
        self.into_articles()
    }
}

/// One external site that yields a short list of headlines.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name attached to every article from this source.
    fn name(&self) -> &str;

    /// Scrape the source. Failures are reported in the outcome, never raised.
    async fn fetch(&self) -> SourceOutcome;
}

/// Pure extraction of articles from a rendered page.
pub type Extractor = fn(&str, &Url) -> Vec<Article>;

/// A source backed by a single rendered page.
pub struct PageSource {
    name: &'static str,
    page_url: &'static str,
    extract: Extractor,
    renderer: Arc<dyn Renderer>,
    navigation_timeout: Duration,
}

impl PageSource {
    pub fn new(
        name: &'static str,
        page_url: &'static str,
        extract: Extractor,
        renderer: Arc<dyn Renderer>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            name,
            page_url,
            extract,
            renderer,
            navigation_timeout,
        }
    }
}

#[async_trait]
impl SourceAdapter for PageSource {
    fn name(&self) -> &str {
        self.name
    }

    #[instrument(level = "info", skip(self), fields(source = self.name))]
    async fn fetch(&self) -> SourceOutcome {
        let base = match Url::parse(self.page_url) {
            Ok(url) => url,
            Err(e) => return SourceOutcome::Failed(e.into()),
        };

        debug!(url = self.page_url, timeout = ?self.navigation_timeout, "Rendering source page");
        let rendered = tokio::time::timeout(
            self.navigation_timeout + STARTUP_HEADROOM,
            self.renderer.render(self.page_url, ReadyCondition::NetworkIdle),
        )
        .await;

        let html = match rendered {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => return SourceOutcome::Failed(e),
            Err(_) => return SourceOutcome::Failed(ScrapeError::Timeout(self.navigation_timeout)),
        };

        let mut articles = (self.extract)(&html, &base);
        articles.truncate(MAX_ITEMS);
        for a in &articles {
            debug!(title = %truncate_for_log(&a.title, 120), url = %a.url, "Extracted headline");
        }
        SourceOutcome::from_articles(articles)
    }
}

/// Build the adapter for a known source name.
pub fn build_source(
    name: &str,
    renderer: Arc<dyn Renderer>,
    navigation_timeout: Duration,
) -> Option<PageSource> {
    let (name, page_url, extract): (&'static str, &'static str, Extractor) = match name {
        hackernews::NAME => (hackernews::NAME, hackernews::PAGE_URL, hackernews::extract),
        devto::NAME => (devto::NAME, devto::PAGE_URL, devto::extract),
        velog::NAME => (velog::NAME, velog::PAGE_URL, velog::extract),
        aws::NAME => (aws::NAME, aws::PAGE_URL, aws::extract),
        _ => return None,
    };
    Some(PageSource::new(name, page_url, extract, renderer, navigation_timeout))
}

/// Build adapters for `names` in the given order, skipping unknown names.
pub fn registry(
    names: &[String],
    renderer: Arc<dyn Renderer>,
    navigation_timeout: Duration,
) -> Vec<Arc<dyn SourceAdapter>> {
    names
        .iter()
        .filter_map(|name| {
            let source = build_source(name, Arc::clone(&renderer), navigation_timeout);
            if source.is_none() {
                warn!(%name, "Unknown source name; skipping");
            }
            source
        })
        .map(|s| Arc::new(s) as Arc<dyn SourceAdapter>)
        .collect()
}

/// Visible text of an element, whitespace-collapsed. `None` when blank.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Title text or the [`NO_TITLE`] placeholder.
pub(crate) fn title_or_placeholder(element: Option<ElementRef<'_>>) -> String {
    element
        .and_then(element_text)
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// Resolve an `href` against the page URL, or the [`NO_LINK`] placeholder.
pub(crate) fn resolve_link(base: &Url, href: Option<&str>) -> String {
    href.map(str::trim)
        .filter(|h| !h.is_empty())
        .and_then(|h| base.join(h).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| NO_LINK.to_string())
}
