//! Per-day cache of the aggregated headline list.
//!
//! The cache serves the stored list while it was fetched today and holds
//! data; otherwise it runs an aggregation cycle and stores the result under
//! today's date. An empty cycle never overwrites anything and never marks the
//! day as fetched, so the last good list keeps being served and the next
//! access retries.
//!
//! # Single flight
//!
//! Refreshes are serialised through one async mutex. A caller that had to
//! wait while another refresh ran returns that refresh's result instead of
//! starting its own.
//!
//! # Persistence
//!
//! `lastFetchDate` and `articles` are written together with a single
//! [`KeyValueStore::set_many`]. An in-memory mirror of the last good record
//! covers store failures: a failed write still serves (and keeps serving) the
//! fresh list, and a failed read falls back to the mirror.

use crate::aggregator::Aggregator;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::models::{Article, CacheRecord, CalendarDay};
use crate::store::KeyValueStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

pub const KEY_LAST_FETCH_DATE: &str = "lastFetchDate";
pub const KEY_ARTICLES: &str = "articles";

pub struct FreshnessCache {
    store: Arc<dyn KeyValueStore>,
    aggregator: Arc<Aggregator>,
    clock: Arc<dyn Clock>,
    refresh_lock: Mutex<()>,
    // bumped after every completed refresh
    generation: AtomicU64,
    mirror: StdMutex<Option<CacheRecord>>,
}

impl FreshnessCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        aggregator: Arc<Aggregator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            aggregator,
            clock,
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            mirror: StdMutex::new(None),
        }
    }

    /// Serve today's list from the cache, aggregating only on a miss.
    #[instrument(level = "info", skip(self))]
    pub async fn get_or_refresh(&self) -> Vec<Article> {
        let today = self.clock.today();
        let seen = self.generation.load(Ordering::SeqCst);

        let record = self.load_record().await;
        if record.is_fresh_for(today) {
            info!(%today, count = record.articles.len(), "Cache hit");
            return record.articles;
        }
        info!(%today, last_fetch = ?record.last_fetch_date.map(|d| d.to_string()), "Cache miss");

        self.refresh_once(seen).await
    }

    /// Re-aggregate regardless of freshness.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh(&self) -> Vec<Article> {
        let seen = self.generation.load(Ordering::SeqCst);
        self.refresh_once(seen).await
    }

    async fn refresh_once(&self, seen: u64) -> Vec<Article> {
        let _guard = self.refresh_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != seen {
            debug!("Joined a refresh that completed while waiting");
            return self.load_record().await.articles;
        }

        let articles = self.refresh_locked().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        articles
    }

    async fn refresh_locked(&self) -> Vec<Article> {
        let today = self.clock.today();
        let previous = self.load_record().await;
        let fresh = self.aggregator.collect().await;

        if fresh.is_empty() {
            warn!(
                kept = previous.articles.len(),
                last_fetch = ?previous.last_fetch_date.map(|d| d.to_string()),
                "Every source failed; serving previously cached articles"
            );
            return previous.articles;
        }

        let record = CacheRecord {
            last_fetch_date: Some(today),
            articles: fresh,
        };
        self.set_mirror(record.clone());

        match self.persist(&record).await {
            Ok(()) => info!(%today, count = record.articles.len(), "Cache refreshed"),
            Err(e) => error!(error = %e, "Failed to persist refreshed articles; serving in-memory copy"),
        }
        record.articles
    }

    async fn persist(&self, record: &CacheRecord) -> Result<(), StoreError> {
        let date = serde_json::to_value(record.last_fetch_date)?;
        let articles = serde_json::to_value(&record.articles)?;
        self.store
            .set_many(vec![
                (KEY_LAST_FETCH_DATE.to_string(), date),
                (KEY_ARTICLES.to_string(), articles),
            ])
            .await
    }

    /// The newest of the stored record and the in-memory mirror.
    async fn load_record(&self) -> CacheRecord {
        let mirror = self.mirror();
        match self.read_store().await {
            Ok(stored) => match mirror {
                Some(m) if m.last_fetch_date > stored.last_fetch_date => m,
                _ => stored,
            },
            Err(e) => {
                error!(error = %e, "Failed to read cache store; using in-memory copy");
                mirror.unwrap_or_default()
            }
        }
    }

    async fn read_store(&self) -> Result<CacheRecord, StoreError> {
        let mut values = self
            .store
            .get_many(&[KEY_LAST_FETCH_DATE, KEY_ARTICLES])
            .await?
            .into_iter();
        let date = values.next().flatten();
        let articles = values.next().flatten();

        let last_fetch_date = match date {
            Some(v) => serde_json::from_value::<Option<CalendarDay>>(v.clone()).unwrap_or_else(|e| {
                warn!(value = %v, error = %e, "Ignoring unparseable lastFetchDate");
                None
            }),
            None => None,
        };
        let articles = match articles {
            Some(v) => serde_json::from_value::<Vec<Article>>(v)?,
            None => Vec::new(),
        };

        Ok(CacheRecord {
            last_fetch_date,
            articles,
        })
    }

    fn mirror(&self) -> Option<CacheRecord> {
        self.mirror.lock().map(|m| m.clone()).unwrap_or_else(|p| p.into_inner().clone())
    }

    fn set_mirror(&self, record: CacheRecord) {
        match self.mirror.lock() {
            Ok(mut m) => *m = Some(record),
            Err(p) => *p.into_inner() = Some(record),
        }
    }
}
