//! Text clean-up shared by the listing and detail parsers.

use regex_lite::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Literal value stored for some missing optional fields.
///
/// Used by `quote`, `rating_count` and `price` only. Other optional fields
/// are `None` instead; downstream consumers rely on the difference.
pub const PLACEHOLDER: &str = "None";

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Concatenates all text under an element.
pub fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Collapses every run of whitespace into one space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the first run of ASCII digits in `text`.
pub fn first_digit_run(text: &str) -> Option<&str> {
    DIGIT_RUN.find(text).map(|m| m.as_str())
}

/// Normalizes raw rating-count prose such as `(1245人评价)` to `1245人`.
///
/// Missing text, or text without any digits, yields [`PLACEHOLDER`].
pub fn format_rating_count(raw: Option<&str>) -> String {
    match raw.and_then(first_digit_run) {
        Some(digits) => format!("{}人", digits),
        None => PLACEHOLDER.to_string(),
    }
}
