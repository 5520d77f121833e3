//! Douban-specific modules for fetching, parsing, and data models.

pub mod client;
pub mod cookies;
pub mod models;
pub mod parser;
pub mod selectors;
pub mod text;

pub use client::{DoubanClient, Page, PageSource};
pub use cookies::Cookies;
pub use models::{BookRecord, ListingPage, RowContext};
pub use parser::{ParseError, Parser};
