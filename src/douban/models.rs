//! Data models for listing rows and book records.

use serde::{Deserialize, Serialize};
use url::Url;

/// Fields scraped from one listing row, carried to the detail page parse.
///
/// Built once per row and consumed by exactly one detail parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowContext {
    /// Link to the subject page, as written in the listing
    pub detail_url: String,
    /// Book title from the anchor's `title` attribute
    pub title: String,
    /// Editorial quote, or the `"None"` placeholder
    pub quote: String,
    /// Average score as displayed, e.g. `"9.4"`
    pub rating: String,
    /// `"<digits>人"` or the `"None"` placeholder
    pub rating_count: String,
}

impl RowContext {
    /// Creates a row context from already-cleaned values.
    pub fn new(
        detail_url: impl Into<String>,
        title: impl Into<String>,
        quote: impl Into<String>,
        rating: impl Into<String>,
        rating_count: impl Into<String>,
    ) -> Self {
        Self {
            detail_url: detail_url.into(),
            title: title.into(),
            quote: quote.into(),
            rating: rating.into(),
            rating_count: rating_count.into(),
        }
    }
}

/// Result of parsing one listing page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPage {
    /// Rows in document (rank) order
    pub rows: Vec<RowContext>,
    /// Raw `href` of the next page; `None` on the last page
    pub next_page: Option<String>,
    /// Rows dropped because a required field was missing
    pub skipped: usize,
}

impl ListingPage {
    /// Returns number of rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows were parsed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves the next-page link against the URL this page was served from.
    pub fn resolve_next(&self, base: &Url) -> Option<Url> {
        self.next_page.as_deref().and_then(|href| base.join(href.trim()).ok())
    }
}

/// One fully extracted book.
///
/// Every value keeps its on-page text form, trimmed of surrounding
/// whitespace. `quote`, `rating_count` and `price` use the `"None"`
/// placeholder when missing; the other optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub quote: String,
    pub rating: String,
    pub rating_count: String,
    pub publisher: Option<String>,
    pub pub_date: String,
    /// Page count text after the label, trimmed but otherwise verbatim
    /// (e.g. `"191页"`)
    pub pages: Option<String>,
    pub price: String,
    pub series: Option<String>,
    pub isbn: Option<String>,
    /// URL the detail page was served from
    pub detail_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> BookRecord {
        BookRecord {
            title: "活着".to_string(),
            author: "余华".to_string(),
            quote: "生的苦难与伟大".to_string(),
            rating: "9.4".to_string(),
            rating_count: "987654人".to_string(),
            publisher: Some("作家出版社".to_string()),
            pub_date: "2012-8-1".to_string(),
            pages: None,
            price: "20.00元".to_string(),
            series: None,
            isbn: None,
            detail_url: "https://book.douban.com/subject/4913064/".to_string(),
        }
    }

    #[test]
    fn test_row_context_new() {
        let row = RowContext::new("https://book.douban.com/subject/1/", "红楼梦", "None", "9.6", "None");
        assert_eq!(row.detail_url, "https://book.douban.com/subject/1/");
        assert_eq!(row.title, "红楼梦");
        assert_eq!(row.quote, "None");
        assert_eq!(row.rating, "9.6");
    }

    #[test]
    fn test_listing_page_counts() {
        let mut page = ListingPage::default();
        assert!(page.is_empty());
        assert_eq!(page.count(), 0);

        page.rows.push(RowContext::new("/s/1", "A", "None", "9.0", "None"));
        assert!(!page.is_empty());
        assert_eq!(page.count(), 1);
    }

    #[test]
    fn test_resolve_next_relative() {
        let base = Url::parse("https://book.douban.com/top250?start=0").unwrap();
        let page = ListingPage {
            next_page: Some("?start=25&filter=".to_string()),
            ..Default::default()
        };
        let next = page.resolve_next(&base).unwrap();
        assert_eq!(next.as_str(), "https://book.douban.com/top250?start=25&filter=");
    }

    #[test]
    fn test_resolve_next_absolute() {
        let base = Url::parse("https://book.douban.com/top250").unwrap();
        let page = ListingPage {
            next_page: Some("https://book.douban.com/top250?start=50".to_string()),
            ..Default::default()
        };
        let next = page.resolve_next(&base).unwrap();
        assert_eq!(next.as_str(), "https://book.douban.com/top250?start=50");
    }

    #[test]
    fn test_resolve_next_last_page() {
        let base = Url::parse("https://book.douban.com/top250?start=225").unwrap();
        assert!(ListingPage::default().resolve_next(&base).is_none());
    }

    #[test]
    fn test_record_serde_absence_vs_placeholder() {
        let mut record = make_record();
        record.price = "None".to_string();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["price"], "None");
        assert!(json["isbn"].is_null());
        assert!(json["pages"].is_null());
        assert_eq!(json["publisher"], "作家出版社");

        let parsed: BookRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
