//! Application settings.
//!
//! Settings come from an optional YAML file, then command-line flags override
//! individual values. A missing file at the default location simply means
//! defaults; an explicitly given file must exist.
//!
//! ```yaml
//! refresh_hour: 9
//! target_language: ko
//! source_language: auto
//! navigation_timeout_secs: 30
//! browserless_url: http://localhost:3000
//! cache_path: /home/me/.local/share/daily_headlines/cache.json
//! sources: ["Hacker News", "Dev.to", "Velog", "AWS"]
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::scrapers::ALL_SOURCES;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const APP_DIR: &str = "daily_headlines";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local hour of the daily refresh.
    pub refresh_hour: u32,
    /// Language code headlines are translated into.
    pub target_language: String,
    /// Language code of the headlines, `auto` to detect.
    pub source_language: String,
    pub navigation_timeout_secs: u64,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub cache_path: Option<PathBuf>,
    /// Keep the cache in memory only; nothing survives the process.
    pub in_memory_cache: bool,
    /// Enabled sources, in the order their headlines are listed.
    pub sources: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_hour: 9,
            target_language: "ko".to_string(),
            source_language: "auto".to_string(),
            navigation_timeout_secs: 30,
            browserless_url: None,
            browserless_token: None,
            cache_path: None,
            in_memory_cache: false,
            sources: ALL_SOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the settings file, or defaults when the default file is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("No settings file; using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let text = std::fs::read_to_string(&path)?;
        let settings = Self::from_yaml(&text)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(hour) = cli.refresh_hour {
            self.refresh_hour = hour;
        }
        if let Some(secs) = cli.timeout_secs {
            self.navigation_timeout_secs = secs;
        }
        if let Some(ref url) = cli.browserless_url {
            self.browserless_url = Some(url.clone());
        }
        if let Some(ref token) = cli.browserless_token {
            self.browserless_token = Some(token.clone());
        }
        if let Some(ref path) = cli.cache_file {
            self.cache_path = Some(path.clone());
        }
        if cli.in_memory {
            self.in_memory_cache = true;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "refresh_hour must be 0-23, got {}",
                self.refresh_hour
            )));
        }
        if self.navigation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "navigation_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.target_language.trim().is_empty() {
            return Err(ConfigError::Invalid("target_language is empty".into()));
        }
        if let Some(unknown) = self.sources.iter().find(|s| !ALL_SOURCES.contains(&s.as_str())) {
            return Err(ConfigError::Invalid(format!(
                "unknown source {unknown:?}; known sources: {}",
                ALL_SOURCES.join(", ")
            )));
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Cache file location: the configured path or the platform data dir.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("cache.json")
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.refresh_hour, 9);
        assert_eq!(s.target_language, "ko");
        assert_eq!(s.sources, vec!["Hacker News", "Dev.to", "Velog", "AWS"]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let s = Settings::from_yaml("refresh_hour: 7\nsources: [\"AWS\", \"Velog\"]\n").unwrap();
        assert_eq!(s.refresh_hour, 7);
        assert_eq!(s.sources, vec!["AWS", "Velog"]);
        assert_eq!(s.navigation_timeout_secs, 30);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut s = Settings::default();
        s.refresh_hour = 24;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.navigation_timeout_secs = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.sources.push("Slashdot".into());
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(m)) if m.contains("Slashdot")));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = Settings::from_yaml("refresh_hour: 6\nnavigation_timeout_secs: 10\n").unwrap();
        let cli = Cli::parse_from([
            "daily_headlines",
            "get",
            "--refresh-hour",
            "8",
            "--cache-file",
            "/tmp/x.json",
        ]);
        let s = file.apply_cli(&cli);
        assert_eq!(s.refresh_hour, 8);
        assert_eq!(s.navigation_timeout_secs, 10);
        assert_eq!(s.cache_file(), PathBuf::from("/tmp/x.json"));
        assert!(!s.in_memory_cache);

        let cli = Cli::parse_from(["daily_headlines", "refresh", "--in-memory"]);
        assert!(Settings::default().apply_cli(&cli).in_memory_cache);
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "target_language: ja\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.target_language, "ja");

        assert!(Settings::load(Some(&tmp.path().join("missing.yaml"))).is_err());
    }
}
