//! CSS selectors and info-block labels for Douban Books pages.
//!
//! Both page templates are described here so markup changes only touch
//! this file. When parsing starts failing, save the page under
//! `tests/fixtures/`, fix the selector, and add a test against it.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the Top 250 listing page.
pub mod listing {
    use super::*;

    /// One ranked book entry.
    pub static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr.item").unwrap());

    /// Title-bearing anchor; carries both `href` and `title`.
    pub static TITLE_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[title]").unwrap());

    /// One-line editorial quote.
    pub static QUOTE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("p.quote > span").unwrap());

    /// Average score, e.g. `9.4`.
    pub static RATING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.rating_nums").unwrap());

    /// Rating count wrapped in prose, e.g. `(123456人评价)`.
    pub static RATING_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.pl").unwrap());

    /// Pagination link to the following page. Absent on the last page.
    pub static NEXT_PAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("link[rel='next']").unwrap());
}

/// Selectors for a book's subject (detail) page. All are scoped to the
/// `div#info` block holding label/value pairs.
pub mod detail {
    use super::*;

    /// Author (and translator) links nested in a wrapper span.
    pub static AUTHOR_LINKS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div#info > span > a").unwrap());

    /// Bare anchors directly under `#info`; older layouts put the author here.
    pub static INFO_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div#info > a").unwrap());

    /// Label spans directly under `#info`.
    pub static LABEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div#info > span").unwrap());
}

/// Literal label texts inside the info block.
pub mod labels {
    pub const PUBLISHER: &str = "出版社:";
    pub const PUB_DATE: &str = "出版年:";
    pub const PAGES: &str = "页数:";
    pub const PRICE: &str = "定价:";
    pub const SERIES: &str = "丛书:";
    pub const ISBN: &str = "ISBN:";
    /// Pre-ISBN catalogue number used by older printings.
    pub const UNIFIED_BOOK_NUMBER: &str = "统一书号:";
}
