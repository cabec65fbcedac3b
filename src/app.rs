//! Application context and the command surface offered to the shell.
//!
//! [`AppContext`] owns the wired-up pipeline (renderer, sources, aggregator,
//! store, cache, translator) and exposes the three commands the display
//! layer calls. Each command returns a plain article list; every internal
//! failure has already been absorbed and logged by the time it returns.

use crate::aggregator::Aggregator;
use crate::cache::FreshnessCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::ScrapeError;
use crate::models::Article;
use crate::render::{BrowserlessRenderer, HttpRenderer, Renderer};
use crate::scheduler::DailyScheduler;
use crate::scrapers;
use crate::store::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::translate::{GoogleTranslator, RetryTranslate, Translator, translate_articles};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub struct AppContext {
    cache: Arc<FreshnessCache>,
    translator: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
    target_language: String,
    refresh_hour: u32,
}

impl AppContext {
    pub fn new(
        cache: Arc<FreshnessCache>,
        translator: Arc<dyn Translator>,
        clock: Arc<dyn Clock>,
        target_language: impl Into<String>,
        refresh_hour: u32,
    ) -> Self {
        Self {
            cache,
            translator,
            clock,
            target_language: target_language.into(),
            refresh_hour,
        }
    }

    /// Wire the production pipeline from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, Box<dyn Error>> {
        let timeout = settings.navigation_timeout();

        let renderer = build_renderer(settings)?;
        if !renderer.executes_scripts() {
            warn!(
                "No Browserless endpoint configured; pages are fetched without running scripts \
                 and script-rendered feeds may come back empty"
            );
        }

        let sources = scrapers::registry(&settings.sources, renderer, timeout);
        let aggregator = Arc::new(Aggregator::new(sources));

        let store: Arc<dyn KeyValueStore> = if settings.in_memory_cache {
            info!("Keeping the cache in memory only");
            Arc::new(MemoryStore::new())
        } else {
            let cache_file = settings.cache_file();
            info!(path = %cache_file.display(), "Using cache file");
            Arc::new(JsonFileStore::new(cache_file))
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(FreshnessCache::new(store, aggregator, Arc::clone(&clock)));

        let google = GoogleTranslator::new(&settings.source_language, Duration::from_secs(10))?;
        let translator: Arc<dyn Translator> =
            Arc::new(RetryTranslate::new(google, 2, Duration::from_millis(500)));

        Ok(Self::new(
            cache,
            translator,
            clock,
            settings.target_language.clone(),
            settings.refresh_hour,
        ))
    }

    /// Today's headlines, aggregating only if today is not cached yet.
    #[instrument(level = "info", skip(self))]
    pub async fn get_news(&self) -> Vec<Article> {
        self.cache.get_or_refresh().await
    }

    /// Today's headlines with titles translated into `lang` (or the
    /// configured target language).
    #[instrument(level = "info", skip(self))]
    pub async fn translate_news(&self, lang: Option<&str>) -> Vec<Article> {
        let articles = self.cache.get_or_refresh().await;
        let lang = lang.unwrap_or(&self.target_language);
        translate_articles(self.translator.as_ref(), &articles, lang).await
    }

    /// Re-aggregate immediately, bypassing the cache.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_news(&self) -> Vec<Article> {
        self.cache.refresh().await
    }

    /// The daily refresh scheduler bound to this context's cache.
    pub fn scheduler(&self) -> DailyScheduler {
        DailyScheduler::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.clock),
            self.refresh_hour,
        )
    }
}

/// Browserless when an endpoint is configured, plain HTTP otherwise.
fn build_renderer(settings: &Settings) -> Result<Arc<dyn Renderer>, ScrapeError> {
    let timeout = settings.navigation_timeout();
    Ok(match settings.browserless_url.as_deref() {
        Some(url) => {
            info!(%url, "Rendering pages through Browserless");
            Arc::new(BrowserlessRenderer::new(
                url,
                settings.browserless_token.as_deref(),
                timeout,
            )?)
        }
        None => Arc::new(HttpRenderer::new(timeout)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FixedClock;
    use crate::error::TranslateError;
    use crate::scrapers::SourceAdapter;
    use crate::scrapers::test_support::{Behaviour, FakeSource};
    use async_trait::async_trait;

    struct Prefix;

    #[async_trait]
    impl Translator for Prefix {
        async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
            if text.ends_with('1') {
                return Err(TranslateError::Status(500));
            }
            Ok(format!("[{target_lang}] {text}"))
        }
    }

    fn context(source: &Arc<FakeSource>) -> AppContext {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(2025, 5, 6, 12, 0));
        let aggregator = Aggregator::new(vec![Arc::clone(source) as Arc<dyn SourceAdapter>]);
        let cache = FreshnessCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(aggregator),
            Arc::clone(&clock),
        );
        AppContext::new(Arc::new(cache), Arc::new(Prefix), clock, "ko", 9)
    }

    #[tokio::test]
    async fn test_get_news_is_cache_aware() {
        let source = FakeSource::new("A", Behaviour::Items(3));
        let app = context(&source);
        assert_eq!(app.get_news().await.len(), 3);
        assert_eq!(app.get_news().await.len(), 3);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_news_always_aggregates() {
        let source = FakeSource::new("A", Behaviour::Items(1));
        let app = context(&source);
        app.get_news().await;
        app.refresh_news().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_translate_news_translates_titles_only() {
        let source = FakeSource::new("A", Behaviour::Items(3));
        let app = context(&source);
        let original = app.get_news().await;
        let translated = app.translate_news(None).await;

        assert_eq!(translated.len(), original.len());
        assert_eq!(translated[0].title, "[ko] A story 0");
        // "A story 1" fails to translate and is kept as is
        assert_eq!(translated[1].title, "A story 1");
        assert_eq!(translated[2].title, "[ko] A story 2");
        for (a, b) in original.iter().zip(&translated) {
            assert_eq!(a.url, b.url);
            assert_eq!(a.source, b.source);
        }
        // translation never touches the cache
        assert_eq!(app.get_news().await, original);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_translate_news_with_explicit_language() {
        let source = FakeSource::new("A", Behaviour::Items(1));
        let app = context(&source);
        let translated = app.translate_news(Some("ja")).await;
        assert_eq!(translated[0].title, "[ja] A story 0");
    }

    #[tokio::test]
    async fn test_total_failure_yields_empty_list_not_error() {
        let source = FakeSource::new("A", Behaviour::Fail);
        let app = context(&source);
        assert!(app.get_news().await.is_empty());
        assert!(app.translate_news(None).await.is_empty());
        assert!(app.refresh_news().await.is_empty());
    }

    #[test]
    fn test_from_settings_wires_http_renderer_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            cache_path: Some(tmp.path().join("cache.json")),
            ..Settings::default()
        };
        assert!(AppContext::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_renderer_runs_scripts_only_with_browserless() {
        let plain = build_renderer(&Settings::default()).unwrap();
        assert!(!plain.executes_scripts());

        let settings = Settings {
            browserless_url: Some("http://localhost:3000".into()),
            ..Settings::default()
        };
        assert!(build_renderer(&settings).unwrap().executes_scripts());
    }

    #[tokio::test]
    async fn test_from_settings_in_memory_never_touches_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let cache_path = tmp.path().join("cache.json");
        let settings = Settings {
            cache_path: Some(cache_path.clone()),
            in_memory_cache: true,
            sources: Vec::new(),
            ..Settings::default()
        };
        let app = AppContext::from_settings(&settings).unwrap();
        assert!(app.get_news().await.is_empty());
        assert!(!cache_path.exists());
    }
}
