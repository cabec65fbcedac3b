//! Dev.to home feed scraper.
//!
//! The feed is rendered client-side, so without a script-capable renderer the
//! page may come back with no stories at all.

use super::{MAX_ITEMS, resolve_link, title_or_placeholder};
use crate::models::Article;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

pub const NAME: &str = "Dev.to";
pub const PAGE_URL: &str = "https://dev.to/";

static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".crayons-story__title a").expect("static selector"));

pub fn extract(html: &str, base: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&TITLE_LINK)
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
