//! Command-line interface definitions for Daily Headlines.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Options that also live in the settings file override it when given;
//! several can be provided via environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Daily Headlines application.
///
/// # Examples
///
/// ```sh
/// # Today's headlines (cached per day)
/// daily_headlines get
///
/// # Translated to Japanese
/// daily_headlines translate --lang ja
///
/// # Render through a Browserless instance and keep the daily refresh running
/// daily_headlines --browserless-url http://localhost:3000 daemon
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml settings file
    #[arg(short, long, env = "DAILY_HEADLINES_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path of the JSON cache file
    #[arg(long, env = "DAILY_HEADLINES_CACHE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Keep the cache in memory instead of the cache file
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Base URL of a Browserless instance used to render pages
    #[arg(long, env = "BROWSERLESS_URL", global = true)]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN", global = true, hide_env_values = true)]
    pub browserless_token: Option<String>,

    /// Local hour (0-23) of the daily refresh
    #[arg(long, global = true)]
    pub refresh_hour: Option<u32>,

    /// Per-page navigation timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print today's headlines, aggregating only if not cached today
    Get,
    /// Print today's headlines with translated titles
    Translate {
        /// Target language code (e.g. ko, ja, de)
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Re-aggregate now, ignoring the cache
    Refresh,
    /// Keep running and refresh once a day at the configured hour
    Daemon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_get() {
        let cli = Cli::parse_from(["daily_headlines", "get"]);
        assert_eq!(cli.command, Command::Get);
        assert!(cli.refresh_hour.is_none());
    }

    #[test]
    fn test_cli_translate_with_lang() {
        let cli = Cli::parse_from(["daily_headlines", "translate", "-l", "ja"]);
        assert_eq!(
            cli.command,
            Command::Translate {
                lang: Some("ja".to_string())
            }
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "daily_headlines",
            "daemon",
            "--refresh-hour",
            "7",
            "--cache-file",
            "/tmp/news.json",
            "--browserless-url",
            "http://localhost:3000",
        ]);
        assert_eq!(cli.command, Command::Daemon);
        assert_eq!(cli.refresh_hour, Some(7));
        assert_eq!(cli.cache_file, Some(PathBuf::from("/tmp/news.json")));
        assert_eq!(cli.browserless_url.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["daily_headlines"]).is_err());
    }
}
