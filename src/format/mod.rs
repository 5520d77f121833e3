//! Output formatting for book records (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::douban::{BookRecord, ListingPage};

const CSV_HEADER: &str =
    "title,author,quote,rating,rating_count,publisher,pub_date,pages,price,series,isbn,detail_url";

/// Formats records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single record.
    pub fn format_record(&self, record: &BookRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json(record, "{}"),
            OutputFormat::Table => self.table_single(record),
            OutputFormat::Markdown => self.markdown_single(record),
            OutputFormat::Csv => self.csv_records(std::slice::from_ref(record)),
        }
    }

    /// Formats multiple records in rank order.
    pub fn format_records(&self, records: &[BookRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => CSV_HEADER.to_string(),
                _ => "No books found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json(records, "[]"),
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    /// Formats the rows of a listing page without detail fields.
    pub fn format_listing(&self, page: &ListingPage) -> String {
        match self.format {
            OutputFormat::Json => self.json(page, "{}"),
            OutputFormat::Csv => {
                let mut lines = vec!["title,quote,rating,rating_count,detail_url".to_string()];
                for row in &page.rows {
                    lines.push(format!(
                        "{},{},{},{},{}",
                        csv_escape(&row.title),
                        csv_escape(&row.quote),
                        csv_escape(&row.rating),
                        csv_escape(&row.rating_count),
                        csv_escape(&row.detail_url)
                    ));
                }
                lines.join("\n")
            }
            OutputFormat::Table | OutputFormat::Markdown => {
                let mut lines = Vec::new();
                for (rank, row) in page.rows.iter().enumerate() {
                    lines.push(format!(
                        "{:>3}  {:>4}  {:>9}  {}  <{}>",
                        rank + 1,
                        row.rating,
                        row.rating_count,
                        row.title,
                        row.detail_url
                    ));
                }
                lines.push(String::new());
                lines.push(match &page.next_page {
                    Some(next) => format!("Next page: {}", next),
                    None => "Last page.".to_string(),
                });
                lines.join("\n")
            }
        }
    }

    // JSON formatting

    fn json<T: serde::Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
    }

    // Table formatting

    fn table_single(&self, record: &BookRecord) -> String {
        let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());

        let lines = [
            format!("Title:     {}", record.title),
            format!("Author:    {}", record.author),
            format!("Rating:    {} ({})", record.rating, record.rating_count),
            format!("Quote:     {}", record.quote),
            format!("Publisher: {}", optional(&record.publisher)),
            format!("Published: {}", record.pub_date),
            format!("Pages:     {}", optional(&record.pages)),
            format!("Price:     {}", record.price),
            format!("Series:    {}", optional(&record.series)),
            format!("ISBN:      {}", optional(&record.isbn)),
            format!("URL:       {}", record.detail_url),
        ];

        lines.join("\n")
    }

    fn table_records(&self, records: &[BookRecord]) -> String {
        let title_width = 24;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:>3}  {:<6}  {:<10}  {:<title_width$}  {}",
            "#", "Rating", "Ratings", "Title", "Author"
        ));
        lines.push(format!(
            "{:-<3}  {:-<6}  {:-<10}  {:-<title_width$}  {:-<20}",
            "", "", "", "", ""
        ));

        for (rank, record) in records.iter().enumerate() {
            lines.push(format!(
                "{:>3}  {:<6}  {:<10}  {:<title_width$}  {}",
                rank + 1,
                record.rating,
                record.rating_count,
                truncate(&record.title, title_width),
                record.author
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} books", records.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, record: &BookRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", record.title));
        lines.push(String::new());

        lines.push(format!("- **Author:** {}", record.author));
        lines.push(format!("- **Rating:** {} ({})", record.rating, record.rating_count));
        if let Some(publisher) = &record.publisher {
            lines.push(format!("- **Publisher:** {}", publisher));
        }
        lines.push(format!("- **Published:** {}", record.pub_date));
        if let Some(pages) = &record.pages {
            lines.push(format!("- **Pages:** {}", pages));
        }
        lines.push(format!("- **Price:** {}", record.price));
        if let Some(series) = &record.series {
            lines.push(format!("- **Series:** {}", series));
        }
        if let Some(isbn) = &record.isbn {
            lines.push(format!("- **ISBN:** {}", isbn));
        }
        lines.push(format!("- **URL:** [View on Douban]({})", record.detail_url));
        lines.push(String::new());
        lines.push(format!("> {}", record.quote));

        lines.join("\n")
    }

    fn markdown_records(&self, records: &[BookRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| # | Rating | Ratings | Title | Author |".to_string());
        lines.push("|---|--------|---------|-------|--------|".to_string());

        for (rank, record) in records.iter().enumerate() {
            lines.push(format!(
                "| {} | {} | {} | [{}]({}) | {} |",
                rank + 1,
                record.rating,
                record.rating_count,
                record.title.replace('|', "\\|"),
                record.detail_url,
                record.author.replace('|', "\\|")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} books found*", records.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_records(&self, records: &[BookRecord]) -> String {
        let optional = |v: &Option<String>| v.as_deref().map(csv_escape).unwrap_or_default();

        let mut lines = vec![CSV_HEADER.to_string()];

        for record in records {
            lines.push(format!(
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                csv_escape(&record.title),
                csv_escape(&record.author),
                csv_escape(&record.quote),
                csv_escape(&record.rating),
                csv_escape(&record.rating_count),
                optional(&record.publisher),
                csv_escape(&record.pub_date),
                optional(&record.pages),
                csv_escape(&record.price),
                optional(&record.series),
                optional(&record.isbn),
                csv_escape(&record.detail_url)
            ));
        }

        lines.join("\n")
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Truncates to `width` characters, marking the cut with `...`.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
