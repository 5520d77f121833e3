//! douban-top250 - Crawler for the Douban Books Top 250 ranking

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use douban_top250::commands::{CrawlCommand, ParseCommand};
use douban_top250::config::{Config, OutputFormat};
use douban_top250::douban::text::PLACEHOLDER;
use douban_top250::RowContext;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "douban-top250",
    version,
    about = "Crawler for the Douban Books Top 250 ranking",
    long_about = "Walks the Douban Books Top 250 listing, follows every book to its subject page and exports the bibliographic fields."
)]
struct Cli {
    /// Browser-copied cookie string for a logged-in session
    #[arg(long, global = true, env = "DOUBAN_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "DOUBAN_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "DOUBAN_DELAY")]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the ranking and every linked book page
    #[command(alias = "c")]
    Crawl {
        /// First listing page
        #[arg(long)]
        start_url: Option<String>,

        /// Maximum number of listing pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// Stop after this many books
        #[arg(long)]
        max_records: Option<usize>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a saved listing page
    Listing {
        /// HTML file
        file: PathBuf,
    },

    /// Parse a saved book page
    Detail {
        /// HTML file
        file: PathBuf,

        /// URL the page was saved from
        #[arg(long)]
        url: String,

        /// Title carried from the listing
        #[arg(long, default_value = "")]
        title: String,

        /// Quote carried from the listing
        #[arg(long, default_value = PLACEHOLDER)]
        quote: String,

        /// Rating carried from the listing
        #[arg(long, default_value = "")]
        rating: String,

        /// Rating count carried from the listing
        #[arg(long, default_value = PLACEHOLDER)]
        rating_count: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(cookie) = cli.cookie {
        config.cookie = Some(cookie);
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Crawl { start_url, max_pages, max_records, output } => {
            if let Some(url) = start_url {
                config.start_url = url;
            }
            if let Some(max) = max_pages {
                config.max_pages = max;
            }
            if max_records.is_some() {
                config.max_records = max_records;
            }

            let cmd = CrawlCommand::new(config);
            let rendered = cmd.execute().await?;

            match output {
                Some(path) => std::fs::write(&path, rendered + "\n")
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", rendered),
            }
        }

        Commands::Listing { file } => {
            let output = ParseCommand::new(config.format).listing(&file)?;
            println!("{}", output);
        }

        Commands::Detail { file, url, title, quote, rating, rating_count } => {
            let context = RowContext::new(url, title, quote, rating, rating_count);
            let output = ParseCommand::new(config.format).detail(&file, context)?;
            println!("{}", output);
        }
    }

    Ok(())
}
