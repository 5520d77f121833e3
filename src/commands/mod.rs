//! CLI command implementations.

pub mod crawl;
pub mod parse;

pub use crawl::{CrawlCommand, CrawlReport};
pub use parse::ParseCommand;
