//! Fan-out over every registered source and merge their headlines.
//!
//! All sources run concurrently as separate tasks and the aggregation waits
//! for every one of them to settle. A source that fails, or whose task
//! panics, contributes nothing; the rest are concatenated in registration
//! order. Nothing here is ever raised to the caller.

use crate::error::ScrapeError;
use crate::models::Article;
use crate::scrapers::{SourceAdapter, SourceOutcome};
use futures::future::join_all;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Per-source results of one aggregation cycle, in registration order.
#[derive(Debug)]
pub struct AggregationReport {
    pub outcomes: Vec<(String, SourceOutcome)>,
}

impl AggregationReport {
    pub fn failed_sources(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failure())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Concatenate successful outputs, logging every non-success.
    pub fn into_articles(self) -> Vec<Article> {
        self.outcomes
            .into_iter()
            .flat_map(|(name, outcome)| outcome.log_into_articles(&name))
            .collect()
    }
}

/// Runs one aggregation cycle across a fixed, ordered set of sources.
pub struct Aggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run every source concurrently and report each outcome.
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len()))]
    pub async fn collect_report(&self) -> AggregationReport {
        info!(sources = %self.source_names().iter().join(", "), "Starting aggregation cycle");

        let handles = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            tokio::spawn(async move { source.fetch().await })
        });
        let joined = join_all(handles).await;

        let outcomes = self
            .sources
            .iter()
            .zip(joined)
            .map(|(source, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    warn!(source = source.name(), error = %e, "Source task did not complete");
                    SourceOutcome::Failed(ScrapeError::Aborted(e.to_string()))
                });
                (source.name().to_string(), outcome)
            })
            .collect();

        AggregationReport { outcomes }
    }

    /// Run one cycle and return the merged article list.
    pub async fn collect(&self) -> Vec<Article> {
        let report = self.collect_report().await;
        let failed = report.failed_sources().len();
        let articles = report.into_articles();

        if articles.is_empty() {
            warn!(sources = self.sources.len(), failed, "Aggregation produced no articles");
        } else {
            info!(count = articles.len(), failed, "Aggregation cycle complete");
        }
        articles
    }
}
