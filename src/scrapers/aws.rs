//! AWS News Blog (Korean edition) scraper.
//!
//! Each `.blog-post` article carries its headline in an `h2` and the permalink
//! as the first link in the post.

use super::{MAX_ITEMS, resolve_link, title_or_placeholder};
use crate::models::Article;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

pub const NAME: &str = "AWS";
pub const PAGE_URL: &str = "https://aws.amazon.com/ko/blogs/aws/page/2/";

static POST: Lazy<Selector> = Lazy::new(|| Selector::parse(".blog-post").expect("static selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("static selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));

pub fn extract(html: &str, base: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&POST)
        .take(MAX_ITEMS)
        .map(|post| {
            let href = post.select(&LINK).next().and_then(|a| a.value().attr("href"));
            Article::new(
                title_or_placeholder(post.select(&HEADLINE).next()),
                resolve_link(base, href),
                NAME,
            )
        })
        .collect()
}
