//! douban-top250 - Crawler for the Douban Books Top 250 ranking
//!
//! Walks the paginated listing, follows every book to its subject page and
//! extracts bibliographic fields into flat records.

pub mod commands;
pub mod config;
pub mod douban;
pub mod format;

pub use config::Config;
pub use douban::models::{BookRecord, ListingPage, RowContext};
pub use douban::parser::{ParseError, Parser};
