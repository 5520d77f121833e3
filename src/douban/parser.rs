//! HTML parser for the Top 250 listing and book subject pages.

use crate::douban::models::{BookRecord, ListingPage, RowContext};
use crate::douban::selectors::{detail, labels, listing};
use crate::douban::text::{collapse_whitespace, element_text, format_rating_count, PLACEHOLDER};
use scraper::{ElementRef, Html, Node};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Extraction failures. Neither is fatal to a crawl: callers skip the
/// offending row or page and continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("listing row {index} is missing required field `{field}`")]
    MalformedRow { index: usize, field: &'static str },

    #[error("detail page {url} is missing required field `{field}`")]
    MalformedPage { url: String, field: &'static str },
}

/// One way of locating the author text. Returns `None` when its markup is absent.
type AuthorStrategy = fn(&Html) -> Option<String>;

/// Tried in order; the first hit wins.
const AUTHOR_STRATEGIES: &[AuthorStrategy] = &[linked_authors, first_info_link];

/// Parser for Douban Books pages.
///
/// Stateless; a single instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a listing page into rows (in rank order) and the next-page link.
    ///
    /// Rows missing a required field are logged and skipped.
    pub fn parse_listing(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);
        let mut page = ListingPage::default();

        for (index, element) in document.select(&listing::ROW).enumerate() {
            match self.parse_row(index, element) {
                Ok(row) => {
                    trace!("Parsed row {}: {} ({})", index, row.title, row.detail_url);
                    page.rows.push(row);
                }
                Err(e) => {
                    warn!("Skipping row: {}", e);
                    page.skipped += 1;
                }
            }
        }

        page.next_page = document
            .select(&listing::NEXT_PAGE)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty());

        debug!(
            "Parsed {} rows, skipped {} (next page: {:?})",
            page.rows.len(),
            page.skipped,
            page.next_page
        );

        page
    }

    /// Parses one `tr.item` row.
    fn parse_row(&self, index: usize, element: ElementRef) -> Result<RowContext, ParseError> {
        let malformed = |field| ParseError::MalformedRow { index, field };

        let link = element.select(&listing::TITLE_LINK).next();

        let detail_url = link
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| malformed("detail_url"))?
            .to_string();

        let title = link
            .and_then(|a| a.value().attr("title"))
            .map(|t| t.trim().to_string())
            .ok_or_else(|| malformed("title"))?;

        // Present-but-blank stays blank; only a missing element gets the placeholder
        let quote = element
            .select(&listing::QUOTE)
            .next()
            .map(|e| element_text(e).trim().to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let rating = element
            .select(&listing::RATING)
            .next()
            .map(|e| element_text(e).trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| malformed("rating"))?;

        let raw_count = element.select(&listing::RATING_COUNT).next().map(element_text);
        let rating_count = format_rating_count(raw_count.as_deref());

        Ok(RowContext { detail_url, title, quote, rating, rating_count })
    }

    /// Parses a subject page, combining it with the row it was reached from.
    ///
    /// `url` is the address the page was actually served from and becomes
    /// the record's `detail_url`. A missing author or publication year is a
    /// [`ParseError::MalformedPage`].
    pub fn parse_detail(
        &self,
        html: &str,
        url: &str,
        context: RowContext,
    ) -> Result<BookRecord, ParseError> {
        let document = Html::parse_document(html);
        let malformed = |field| ParseError::MalformedPage { url: url.to_string(), field };

        let author = AUTHOR_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&document))
            .map(|a| collapse_whitespace(&a))
            .ok_or_else(|| malformed("author"))?;

        let pub_date =
            label_text(&document, &[labels::PUB_DATE]).ok_or_else(|| malformed("pub_date"))?;

        let publisher = label_link(&document, labels::PUBLISHER);
        let pages = label_text(&document, &[labels::PAGES]);
        let price =
            label_text(&document, &[labels::PRICE]).unwrap_or_else(|| PLACEHOLDER.to_string());
        let series = label_link(&document, labels::SERIES);
        let isbn = label_text(&document, &[labels::ISBN, labels::UNIFIED_BOOK_NUMBER]);

        debug!("Parsed detail for {}: author={}, isbn={:?}", context.title, author, isbn);

        Ok(BookRecord {
            title: context.title,
            author,
            quote: context.quote,
            rating: context.rating,
            rating_count: context.rating_count,
            publisher,
            pub_date,
            pages,
            price,
            series,
            isbn,
            detail_url: url.to_string(),
        })
    }
}

/// Author and translator links; several are joined with `" / "`.
fn linked_authors(document: &Html) -> Option<String> {
    let names: Vec<String> = document
        .select(&detail::AUTHOR_LINKS)
        .map(|a| element_text(a).trim().to_string())
        .collect();

    match names.len() {
        0 => None,
        1 => names.into_iter().next(),
        _ => Some(names.join(" / ")),
    }
}

/// First bare anchor in the info block.
fn first_info_link(document: &Html) -> Option<String> {
    document
        .select(&detail::INFO_LINK)
        .next()
        .map(element_text)
        .filter(|text| !text.trim().is_empty())
}

/// First label span (document order) whose text equals any of `names`.
fn find_label<'a>(document: &'a Html, names: &[&str]) -> Option<ElementRef<'a>> {
    document.select(&detail::LABEL).find(|span| {
        let text = element_text(*span);
        names.contains(&text.trim())
    })
}

/// A label's value ends at the next line break or label.
fn ends_value(node: &Node) -> bool {
    node.as_element().is_some_and(|el| matches!(el.name(), "br" | "span"))
}

/// Trimmed text following a label, e.g. `出版年:</span> 2012-8-1<br>`.
fn label_text(document: &Html, names: &[&str]) -> Option<String> {
    let label = find_label(document, names)?;
    label
        .next_siblings()
        .take_while(|node| !ends_value(node.value()))
        .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .find(|text| !text.is_empty())
}

/// Text of the first anchor following a label, e.g. `出版社:</span> <a>作家出版社</a>`.
fn label_link(document: &Html, name: &str) -> Option<String> {
    let label = find_label(document, &[name])?;
    label
        .next_siblings()
        .take_while(|node| !ends_value(node.value()))
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .map(|a| element_text(a).trim().to_string())
        .filter(|text| !text.is_empty())
}
