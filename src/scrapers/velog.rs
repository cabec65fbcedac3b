//! Velog trending posts scraper.
//!
//! Each post card holds two links: the thumbnail and the title block. The
//! title block is the second `<a>` and wraps the `<h4>` headline. Links are
//! site-relative (`/@user/slug`).

use super::{MAX_ITEMS, resolve_link, title_or_placeholder};
use crate::models::{Article, NO_LINK};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const NAME: &str = "Velog";
pub const PAGE_URL: &str = "https://velog.io/";

static POST_CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".PostCard_block__FTMsy").expect("static selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h4").expect("static selector"));

pub fn extract(html: &str, base: &Url) -> Vec<Article> {
    let document = Html::parse_document(html);
    document
        .select(&POST_CARD)
        .take(MAX_ITEMS)
        .map(|card| card_to_article(card, base))
        .collect()
}

fn card_to_article(card: ElementRef<'_>, base: &Url) -> Article {
    match card.select(&LINK).nth(1) {
        Some(link) => Article::new(
            title_or_placeholder(link.select(&HEADLINE).next()),
            resolve_link(base, link.value().attr("href")),
            NAME,
        ),
        None => Article::new(title_or_placeholder(None), NO_LINK, NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_TITLE;

    fn base() -> Url {
        Url::parse(PAGE_URL).unwrap()
    }

    const TRENDING: &str = r#"
    <main>
      <div class="PostCard_block__FTMsy">
        <a href="/@kim/thumb"><img src="x.png"></a>
        <a href="/@kim/rust-ownership"><h4>Rust 소유권   정리</h4><p>summary</p></a>
      </div>
      <div class="PostCard_block__FTMsy">
        <a href="/@lee/thumb"></a>
        <a href="https://velog.io/@lee/tokio"><p>no headline</p></a>
      </div>
      <div class="PostCard_block__FTMsy">
        <a href="/@park/only-one-link"><h4>Lonely</h4></a>
      </div>
      <div class="PostCard_block__FTMsy">
        <a href="/@choi/a"></a><a href="/@choi/b"><h4>Fourth</h4></a>
      </div>
    </main>"#;

    #[test]
    fn test_uses_second_link_and_resolves_relative_url() {
        let articles = extract(TRENDING, &base());
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].title, "Rust 소유권 정리");
        assert_eq!(articles[0].url, "https://velog.io/@kim/rust-ownership");
        assert_eq!(articles[0].source, NAME);
    }

    #[test]
    fn test_missing_headline_keeps_link() {
        let articles = extract(TRENDING, &base());
        assert_eq!(articles[1].title, NO_TITLE);
        assert_eq!(articles[1].url, "https://velog.io/@lee/tokio");
    }

    #[test]
    fn test_card_without_second_link_degrades_to_placeholders() {
        let articles = extract(TRENDING, &base());
        assert_eq!(articles[2].title, NO_TITLE);
        assert_eq!(articles[2].url, NO_LINK);
    }
}
