//! Data models shared by the scrapers, the cache and the command surface.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: One headline scraped from a source
//! - [`CalendarDay`]: A local calendar day used to decide cache freshness
//! - [`CacheRecord`]: The persisted snapshot of the last successful aggregation
//!
//! Articles serialize as `{title, url, source}`, the shape the display layer
//! consumes.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Placeholder used when a story entry has no recognisable title element.
pub const NO_TITLE: &str = "No Title";

/// Placeholder used when a story entry has no link.
pub const NO_LINK: &str = "No Link";

/// A single headline as scraped from a source.
///
/// `title` and `url` may carry [`NO_TITLE`] / [`NO_LINK`] when the page had an
/// entry but not the expected sub-element. That is a degraded success, not a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// The headline text.
    pub title: String,
    /// Absolute link to the story.
    pub url: String,
    /// Fixed display name of the source that produced the item.
    pub source: String,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
        }
    }
}

/// A calendar day with no time component, compared by value.
///
/// Stored as `YYYY-MM-DD`, which keeps the persisted format readable and
/// compatible with older cache files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// The calendar day `now` falls on, in `now`'s own time zone.
    pub fn of<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self(now.date_naive())
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The last successful aggregation and the day it was produced.
///
/// `articles` and `last_fetch_date` are only ever written together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    pub last_fetch_date: Option<CalendarDay>,
    pub articles: Vec<Article>,
}

impl CacheRecord {
    /// A record counts as fresh when it was fetched `today` and holds data.
    pub fn is_fresh_for(&self, today: CalendarDay) -> bool {
        self.last_fetch_date == Some(today) && !self.articles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        format!("{y:04}-{m:02}-{d:02}").parse().unwrap()
    }

    #[test]
    fn test_article_serialization_shape() {
        let article = Article::new("Hello", "https://example.com/a", "Hacker News");
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Hello",
                "url": "https://example.com/a",
                "source": "Hacker News"
            })
        );
    }

    #[test]
    fn test_calendar_day_display_and_parse() {
        let d = day(2025, 3, 7);
        assert_eq!(d.to_string(), "2025-03-07");
        assert_eq!("2025-03-07".parse::<CalendarDay>().unwrap(), d);
        assert!("03/07/2025".parse::<CalendarDay>().is_err());
    }

    #[test]
    fn test_calendar_day_serde_as_string() {
        let d = day(2024, 12, 31);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2024-12-31\"");
        let back: CalendarDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_calendar_day_ignores_time_of_day() {
        use chrono::{FixedOffset, TimeZone};
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2025, 5, 6, 0, 5, 0).unwrap();
        let night = tz.with_ymd_and_hms(2025, 5, 6, 23, 55, 0).unwrap();
        assert_eq!(CalendarDay::of(&morning), CalendarDay::of(&night));
    }

    #[test]
    fn test_cache_record_freshness() {
        let today = day(2025, 5, 6);
        let article = Article::new("t", "u", "s");

        let empty = CacheRecord::default();
        assert!(!empty.is_fresh_for(today));

        let fresh = CacheRecord {
            last_fetch_date: Some(today),
            articles: vec![article.clone()],
        };
        assert!(fresh.is_fresh_for(today));

        let stale = CacheRecord {
            last_fetch_date: Some(day(2025, 5, 5)),
            articles: vec![article],
        };
        assert!(!stale.is_fresh_for(today));

        let dated_but_empty = CacheRecord {
            last_fetch_date: Some(today),
            articles: vec![],
        };
        assert!(!dated_but_empty.is_fresh_for(today));
    }
}
