//! Utility functions for string cleanup, logging and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace normalisation for scraped headline text
//! - String truncation for log output
//! - File system validation for the cache location

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Collapse runs of whitespace (including newlines from nested markup) into
/// single spaces and trim the ends, approximating a browser's `innerText`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Show HN:\n   a thing "), "Show HN: a thing");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_parent_writable(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Cache directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Show HN:\n   a thing "), "Show HN: a thing");
        assert_eq!(collapse_whitespace("\t\n"), "");
        assert_eq!(collapse_whitespace("한국어  제목"), "한국어 제목");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // each Hangul syllable is 3 bytes in UTF-8
        let s = "가나다라";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with("가"));
        assert!(result.contains("(+9 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_parent_writable_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("nested").join("cache.json");
        ensure_parent_writable(&file).await.unwrap();
        assert!(tmp.path().join("nested").is_dir());
        assert!(!tmp.path().join("nested").join("..__probe_write__").exists());
    }
}
