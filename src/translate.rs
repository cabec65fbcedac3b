//! Headline translation with per-item fallback.
//!
//! This module translates article titles through an external text
//! translation service. Only `title` is touched; `url`, `source`, order and
//! length of the list are preserved. A title that cannot be translated keeps
//! its original text.
//!
//! # Architecture
//!
//! - [`Translator`]: Core trait for translating one string
//! - [`GoogleTranslator`]: The public `translate_a/single` endpoint
//! - [`RetryTranslate`]: Decorator that adds retry logic to any `Translator`
//! - [`translate_articles`]: Applies a translator to a whole article list
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 10 seconds
//! - Random jitter (0-250ms) added to spread out retries

use crate::error::TranslateError;
use crate::models::Article;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use rand::{Rng, rng};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates a single piece of text.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError>;
}

/// Client for Google's public translation endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    source_lang: String,
}

impl GoogleTranslator {
    pub fn new(source_lang: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: GOOGLE_TRANSLATE_URL.to_string(),
            source_lang: source_lang.to_string(),
        })
    }
}

/// Join the translated sentence segments of a `translate_a/single` response.
///
/// The response is a nested array whose first element lists one
/// `[translated, original, ...]` entry per sentence.
pub fn parse_google_response(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed(truncate_for_log(&body.to_string(), 200)))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslateError::Empty);
    }
    Ok(translated)
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(level = "debug", skip(self, text), fields(chars = text.chars().count()))]
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }
        let body: Value = resp.json().await?;
        parse_google_response(&body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Translator`].
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryTranslate<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Translator> RetryTranslate<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl<T> fmt::Debug for RetryTranslate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTranslate")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl<T: Translator> Translator for RetryTranslate<T> {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.translate(text, target_lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        debug!(
                            attempt,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "translate() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "translate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Translate every title in `articles`, one at a time.
///
/// The output has the same length and order as the input. A title whose
/// translation fails keeps its original text.
#[instrument(level = "info", skip_all, fields(count = articles.len(), %target_lang))]
pub async fn translate_articles(
    translator: &dyn Translator,
    articles: &[Article],
    target_lang: &str,
) -> Vec<Article> {
    let t0 = Instant::now();
    let mut translated = Vec::with_capacity(articles.len());
    let mut failed = 0usize;

    for (index, article) in articles.iter().enumerate() {
        let title = match translator.translate(&article.title, target_lang).await {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => {
                failed += 1;
                warn!(index, "Empty translation; keeping original title");
                article.title.clone()
            }
            Err(e) => {
                failed += 1;
                error!(
                    index,
                    title = %truncate_for_log(&article.title, 80),
                    error = %e,
                    "Translation failed; keeping original title"
                );
                article.title.clone()
            }
        };
        translated.push(Article {
            title,
            ..article.clone()
        });
    }

    info!(
        failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Titles translated"
    );
    translated
}
