//! Offline parsing of saved listing and subject pages.

use crate::config::OutputFormat;
use crate::douban::{Parser, RowContext};
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Parses HTML files saved from a browser or an earlier crawl.
pub struct ParseCommand {
    format: OutputFormat,
}

impl ParseCommand {
    /// Creates a new parse command.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Parses a saved listing page and returns its rows, formatted.
    pub fn listing(&self, path: &Path) -> Result<String> {
        let html = read_html(path)?;
        let page = Parser::new().parse_listing(&html);
        info!("{}: {} rows, {} skipped", path.display(), page.count(), page.skipped);

        Ok(Formatter::new(self.format).format_listing(&page))
    }

    /// Parses a saved subject page with the listing fields it was reached from.
    pub fn detail(&self, path: &Path, context: RowContext) -> Result<String> {
        let html = read_html(path)?;
        let url = context.detail_url.clone();
        let record = Parser::new()
            .parse_detail(&html, &url, context)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Formatter::new(self.format).format_record(&record))
    }
}

fn read_html(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(html: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", html).unwrap();
        file
    }

    fn context() -> RowContext {
        RowContext::new("https://book.douban.com/subject/1/", "1984", "None", "9.4", "2000人")
    }

    #[test]
    fn test_listing_from_file() {
        let file = write_temp(
            r#"<table><tr class="item"><td>
                 <a href="https://book.douban.com/subject/1/" title="1984">1984</a>
                 <span class="rating_nums">9.4</span>
               </td></tr></table>
               <link rel="next" href="?start=25"/>"#,
        );

        let output = ParseCommand::new(OutputFormat::Json).listing(file.path()).unwrap();
        assert!(output.contains("\"title\": \"1984\""));
        assert!(output.contains("?start=25"));
    }

    #[test]
    fn test_detail_from_file() {
        let file = write_temp(
            r#"<div id="info">
                 <span><span class="pl">作者</span>: <a href="/a">乔治·奥威尔</a></span><br/>
                 <span class="pl">出版年:</span> 2010-4<br/>
               </div>"#,
        );

        let output = ParseCommand::new(OutputFormat::Json).detail(file.path(), context()).unwrap();
        assert!(output.contains("乔治·奥威尔"));
        assert!(output.contains("\"isbn\": null"));
    }

    #[test]
    fn test_detail_malformed_page() {
        let file = write_temp("<html><body>gone</body></html>");

        let err = ParseCommand::new(OutputFormat::Table).detail(file.path(), context()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
        assert!(format!("{:#}", err).contains("author"));
    }

    #[test]
    fn test_missing_file() {
        let err =
            ParseCommand::new(OutputFormat::Table).listing(Path::new("/nonexistent/top250.html")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
