//! Hacker News front page scraper.
//!
//! Story links live in `span.titleline`; the site domain shown next to each
//! title is a nested link inside `.sitebit` and must not be picked up, hence
//! the direct-child selector. "Ask HN" style posts link relatively
//! (`item?id=...`) and are resolved against the front page URL.

use super::{MAX_ITEMS, resolve_link, title_or_placeholder};
use crate::models::Article;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

pub const NAME: &str = "Hacker News";
pub const PAGE_URL: &str = "https://news.ycombinator.com/";

static STORY_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".titleline > a").expect("static selector"));

/// Extract the top stories from a rendered front page.
pub fn extract(html: &str, base: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&STORY_LINK)
        .take(MAX_ITEMS)
        .map(|link| {
            Article::new(
                title_or_placeholder(Some(link)),
                resolve_link(base, link.value().attr("href")),
                NAME,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_TITLE;

    fn base() -> Url {
        Url::parse(PAGE_URL).unwrap()
    }

    const FRONT_PAGE: &str = r#"
    <table id="hnmain"><tr><td><table>
      <tr class="athing submission" id="101">
        <td class="title"><span class="rank">1.</span></td>
        <td class="title"><span class="titleline">
          <a href="https://blog.example.com/rust-2025">Rust in 2025</a>
          <span class="sitebit comhead"> (<a href="from?site=example.com"><span class="sitestr">example.com</span></a>)</span>
        </span></td>
      </tr>
      <tr class="athing submission" id="102">
        <td class="title"><span class="rank">2.</span></td>
        <td class="title"><span class="titleline">
          <a href="item?id=102">Ask HN:   What are you
            working on?</a>
        </span></td>
      </tr>
      <tr class="athing submission" id="103">
        <td class="title"><span class="rank">3.</span></td>
        <td class="title"><span class="titleline"><a href="https://three.example/"></a></span></td>
      </tr>
      <tr class="athing submission" id="104">
        <td class="title"><span class="titleline"><a href="https://four.example/">Four</a></span></td>
      </tr>
    </table></td></tr></table>"#;

    #[test]
    fn test_extracts_top_three_story_links() {
        let articles = extract(FRONT_PAGE, &base());
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].title, "Rust in 2025");
        assert_eq!(articles[0].url, "https://blog.example.com/rust-2025");
        assert!(articles.iter().all(|a| a.source == NAME));
    }

    #[test]
    fn test_skips_site_domain_links() {
        let articles = extract(FRONT_PAGE, &base());
        assert!(articles.iter().all(|a| !a.url.contains("from?site")));
    }

    #[test]
    fn test_resolves_relative_and_collapses_whitespace() {
        let articles = extract(FRONT_PAGE, &base());
        assert_eq!(articles[1].title, "Ask HN: What are you working on?");
        assert_eq!(articles[1].url, "https://news.ycombinator.com/item?id=102");
    }

    #[test]
    fn test_blank_title_uses_placeholder() {
        let articles = extract(FRONT_PAGE, &base());
        assert_eq!(articles[2].title, NO_TITLE);
    }

    #[test]
    fn test_fewer_than_three_stories() {
        let html = r#"<span class="titleline"><a href="https://only.example/">Only</a></span>"#;
        let articles = extract(html, &base());
        assert_eq!(articles.len(), 1);
    }
}
