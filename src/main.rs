//! # Daily Headlines
//!
//! Collects a short "top stories" list from a handful of tech sites once a
//! day, caches it locally and optionally translates the headlines. It is the
//! data side of a small desktop news widget: the widget shell calls the
//! commands below and renders whatever list comes back.
//!
//! ## Features
//!
//! - Scrapes the top 3 stories from Hacker News, Dev.to, Velog and the AWS
//!   News Blog, concurrently, tolerating any subset of them failing
//! - Renders pages in headless Chrome via Browserless when configured
//! - Caches the merged list per local calendar day, keeping the last good
//!   list when a whole cycle fails
//! - Refreshes once a day at a fixed local hour, with startup catch-up
//! - Translates titles one by one, keeping originals on failure
//!
//! ## Usage
//!
//! ```sh
//! daily_headlines get
//! daily_headlines translate --lang ko
//! daily_headlines refresh
//! daily_headlines daemon
//! ```
//!
//! ## Architecture
//!
//! 1. **Sources**: one adapter per site renders its page and extracts headlines
//! 2. **Aggregation**: all adapters run concurrently; successes are concatenated
//! 3. **Cache**: serves today's list or triggers an aggregation cycle
//! 4. **Scheduler / commands**: decide when the cache is consulted

use clap::Parser;
use std::error::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod app;
mod cache;
mod cli;
mod clock;
mod config;
mod error;
mod models;
mod render;
mod scheduler;
mod scrapers;
mod store;
mod translate;
mod utils;

use app::AppContext;
use cli::{Cli, Command};
use config::Settings;
use models::Article;
use scheduler::{SchedulerEvent, SchedulerState};
use utils::ensure_parent_writable;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("daily_headlines starting up");

    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?.apply_cli(&args);
    if let Err(e) = settings.validate() {
        error!(error = %e, "Invalid settings");
        return Err(e.into());
    }

    if !settings.in_memory_cache {
        let cache_file = settings.cache_file();
        if let Err(e) = ensure_parent_writable(&cache_file).await {
            error!(
                path = %cache_file.display(),
                error = %e,
                "Cache directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let app = AppContext::from_settings(&settings)?;

    match args.command {
        Command::Get => print_articles(&app.get_news().await)?,
        Command::Translate { lang } => print_articles(&app.translate_news(lang.as_deref()).await)?,
        Command::Refresh => print_articles(&app.refresh_news().await)?,
        Command::Daemon => run_daemon(&app).await,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn print_articles(articles: &[Article]) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(articles)?);
    Ok(())
}

/// Run the daily scheduler until Ctrl-C.
async fn run_daemon(app: &AppContext) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = app.scheduler().with_event_sender(event_tx);
    let state = scheduler.subscribe();
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SchedulerEvent::Refreshed { articles, catch_up } => {
                    info!(articles, catch_up, "Headlines refreshed")
                }
                SchedulerEvent::Armed { next_fire, .. } => {
                    debug!(next_fire = %next_fire.to_rfc3339(), "Next refresh scheduled")
                }
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C; stopping");
    }
    info!("Shutting down");
    if matches!(*state.borrow(), SchedulerState::Running) {
        info!("Waiting for the in-flight refresh to finish");
    }
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        error!(error = %e, "Scheduler task failed");
    }
    let _ = events.await;
}
