//! Crawl command: walks the listing pages and every linked subject page.

use crate::config::Config;
use crate::douban::{BookRecord, DoubanClient, PageSource, Parser};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a crawl.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Records in rank order
    pub records: Vec<BookRecord>,
    /// Listing pages fetched
    pub pages: usize,
    /// Listing rows dropped for missing fields
    pub skipped_rows: usize,
    /// Rows whose detail page failed to fetch or parse
    pub failed_details: usize,
    /// Continuation link when the crawl stopped early
    pub next_page: Option<Url>,
}

impl CrawlReport {
    /// Tells how to continue a crawl that stopped at a page or record limit.
    pub fn resume_hint(&self) -> Option<String> {
        self.next_page.as_ref().map(|next| format!("Stopped early; resume with --start-url {}", next))
    }
}

/// Executes a ranking crawl.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the crawl and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let client = DoubanClient::new(&self.config).await.context("Failed to create HTTP client")?;

        let report = self.crawl_with_client(&client).await?;

        info!(
            "Crawled {} books from {} pages ({} rows skipped, {} details failed)",
            report.records.len(),
            report.pages,
            report.skipped_rows,
            report.failed_details
        );
        if let Some(hint) = report.resume_hint() {
            info!("{}", hint);
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_records(&report.records))
    }

    /// Runs the crawl with a provided client (for testing).
    pub async fn crawl_with_client(&self, client: &impl PageSource) -> Result<CrawlReport> {
        let parser = Parser::new();
        let mut report = CrawlReport::default();

        let mut next = Some(
            Url::parse(&self.config.start_url)
                .with_context(|| format!("Invalid start URL: {}", self.config.start_url))?,
        );

        while let Some(url) = next.take() {
            if report.pages >= self.config.max_pages {
                debug!("Reached page limit ({})", self.config.max_pages);
                report.next_page = Some(url);
                break;
            }
            if self.records_full(&report) {
                report.next_page = Some(url);
                break;
            }

            let listing = client
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch listing page {}", url))?;
            report.pages += 1;

            let page = parser.parse_listing(&listing.html);
            report.skipped_rows += page.skipped;
            info!("Listing page {}: {} books", report.pages, page.count());

            let following = page.resolve_next(&listing.url);

            for row in page.rows {
                if self.records_full(&report) {
                    break;
                }

                let detail_url = match listing.url.join(&row.detail_url) {
                    Ok(u) if self.is_allowed(&u) => u,
                    Ok(u) => {
                        debug!("Skipping offsite link: {}", u);
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping {}: bad link {:?} ({})", row.title, row.detail_url, e);
                        report.failed_details += 1;
                        continue;
                    }
                };

                let detail = match client.fetch(&detail_url).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!("Failed to fetch {}: {:#}", detail_url, e);
                        report.failed_details += 1;
                        continue;
                    }
                };

                match parser.parse_detail(&detail.html, detail.url.as_str(), row) {
                    Ok(record) => report.records.push(record),
                    Err(e) => {
                        warn!("Skipping page: {}", e);
                        report.failed_details += 1;
                    }
                }
            }

            next = following.filter(|u| {
                let allowed = self.is_allowed(u);
                if !allowed {
                    debug!("Skipping offsite next page: {}", u);
                }
                allowed
            });
        }

        if let Some(max) = self.config.max_records {
            report.records.truncate(max);
        }

        info!(
            "Crawled {} books from {} pages ({} rows skipped, {} details failed)",
            report.records.len(),
            report.pages,
            report.skipped_rows,
            report.failed_details
        );

        Ok(report)
    }

    fn records_full(&self, report: &CrawlReport) -> bool {
        self.config.max_records.is_some_and(|max| report.records.len() >= max)
    }

    /// Offsite filter: the host must be an allowed domain or a subdomain of one.
    fn is_allowed(&self, url: &Url) -> bool {
        if self.config.allowed_domains.is_empty() {
            return true;
        }

        let Some(host) = url.host_str() else {
            return false;
        };

        self.config.allowed_domains.iter().any(|domain| {
            host == domain || host.strip_suffix(domain.as_str()).is_some_and(|p| p.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::douban::Page;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages by URL and records every request.
    struct MockSource {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, h)| (u.to_string(), h.clone())).collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for MockSource {
        async fn fetch(&self, url: &Url) -> Result<Page> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url.as_str()) {
                Some(html) => Ok(Page { url: url.clone(), html: html.clone() }),
                None => anyhow::bail!("Request failed with status: 404 Not Found"),
            }
        }
    }

    const START: &str = "https://book.douban.com/top250";

    fn make_test_config() -> Config {
        Config { delay_ms: 0, delay_jitter_ms: 0, ..Config::default() }
    }

    fn listing(rows: &[(&str, &str)], next: Option<&str>) -> String {
        let mut html = String::from("<html><body><table>");
        for (href, title) in rows {
            html.push_str(&format!(
                r#"<tr class="item"><td>
                     <a href="{href}" title="{title}">{title}</a>
                     <span class="rating_nums">9.0</span>
                     <span class="pl">(100人评价)</span>
                   </td></tr>"#
            ));
        }
        html.push_str("</table>");
        if let Some(href) = next {
            html.push_str(&format!(r#"<link rel="next" href="{}"/>"#, href));
        }
        html.push_str("</body></html>");
        html
    }

    fn detail(author: &str) -> String {
        format!(
            r#"<html><body><div id="info">
                 <span><span class="pl">作者</span>: <a href="/a">{}</a></span><br/>
                 <span class="pl">出版年:</span> 2001<br/>
               </div></body></html>"#,
            author
        )
    }

    #[tokio::test]
    async fn test_crawl_follows_pagination() {
        let source = MockSource::new(&[
            (
                START,
                listing(
                    &[("https://book.douban.com/subject/1/", "A"), ("/subject/2/", "B")],
                    Some("?start=25&filter="),
                ),
            ),
            ("https://book.douban.com/top250?start=25&filter=", listing(&[("/subject/3/", "C")], None)),
            ("https://book.douban.com/subject/1/", detail("Author A")),
            ("https://book.douban.com/subject/2/", detail("Author B")),
            ("https://book.douban.com/subject/3/", detail("Author C")),
        ]);

        let report = CrawlCommand::new(make_test_config()).crawl_with_client(&source).await.unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.failed_details, 0);
        assert!(report.next_page.is_none());
        assert!(report.resume_hint().is_none());

        let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(report.records[1].author, "Author B");
        assert_eq!(report.records[1].detail_url, "https://book.douban.com/subject/2/");

        // Every row of a page is requested before the next listing page
        let requests = source.requests();
        assert_eq!(requests[0], START);
        assert_eq!(requests[3], "https://book.douban.com/top250?start=25&filter=");
    }

    #[tokio::test]
    async fn test_crawl_skips_failed_details() {
        let source = MockSource::new(&[
            (START, listing(&[("/subject/1/", "A"), ("/subject/2/", "B"), ("/subject/3/", "C")], None)),
            ("https://book.douban.com/subject/1/", detail("Author A")),
            // subject/2 is missing (fetch error); subject/3 has no info block
            ("https://book.douban.com/subject/3/", "<html><body>removed</body></html>".to_string()),
        ]);

        let report = CrawlCommand::new(make_test_config()).crawl_with_client(&source).await.unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "A");
        assert_eq!(report.failed_details, 2);
    }

    #[tokio::test]
    async fn test_crawl_listing_failure_is_fatal() {
        let source = MockSource::new(&[]);
        let err = CrawlCommand::new(make_test_config()).crawl_with_client(&source).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch listing page"));
    }

    #[tokio::test]
    async fn test_crawl_respects_max_pages() {
        let source = MockSource::new(&[
            (START, listing(&[("/subject/1/", "A")], Some("?start=25"))),
            ("https://book.douban.com/subject/1/", detail("X")),
        ]);

        let mut config = make_test_config();
        config.max_pages = 1;

        let report = CrawlCommand::new(config).crawl_with_client(&source).await.unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.next_page.as_ref().map(Url::as_str),
            Some("https://book.douban.com/top250?start=25")
        );
        assert_eq!(
            report.resume_hint().as_deref(),
            Some("Stopped early; resume with --start-url https://book.douban.com/top250?start=25")
        );
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_crawl_respects_max_records() {
        let source = MockSource::new(&[
            (START, listing(&[("/subject/1/", "A"), ("/subject/2/", "B"), ("/subject/3/", "C")], None)),
            ("https://book.douban.com/subject/1/", detail("X")),
            ("https://book.douban.com/subject/2/", detail("Y")),
            ("https://book.douban.com/subject/3/", detail("Z")),
        ]);

        let mut config = make_test_config();
        config.max_records = Some(2);

        let report = CrawlCommand::new(config).crawl_with_client(&source).await.unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(!source.requests().contains(&"https://book.douban.com/subject/3/".to_string()));
    }

    #[tokio::test]
    async fn test_crawl_filters_offsite_links() {
        let source = MockSource::new(&[
            (
                START,
                listing(
                    &[("https://evil.example.com/subject/1/", "Offsite"), ("/subject/2/", "B")],
                    Some("https://evil.example.com/top250?start=25"),
                ),
            ),
            ("https://book.douban.com/subject/2/", detail("Y")),
        ]);

        let report = CrawlCommand::new(make_test_config()).crawl_with_client(&source).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.pages, 1);
        assert!(!source.requests().iter().any(|u| u.contains("evil.example.com")));
    }

    #[test]
    fn test_is_allowed() {
        let cmd = CrawlCommand::new(make_test_config());
        let allowed = |u: &str| cmd.is_allowed(&Url::parse(u).unwrap());

        assert!(allowed("https://book.douban.com/subject/1/"));
        assert!(allowed("https://m.book.douban.com/subject/1/"));
        assert!(!allowed("https://notbook.douban.com/"));
        assert!(!allowed("https://www.douban.com/"));
        assert!(!allowed("https://example.com/"));

        let mut config = make_test_config();
        config.allowed_domains.clear();
        let open = CrawlCommand::new(config);
        assert!(open.is_allowed(&Url::parse("https://example.com/").unwrap()));
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let mut config = make_test_config();
        config.start_url = "not a url".to_string();
        let source = MockSource::new(&[]);

        let err = CrawlCommand::new(config).crawl_with_client(&source).await.unwrap_err();
        assert!(err.to_string().contains("Invalid start URL"));
        assert!(source.requests().is_empty());
    }
}
