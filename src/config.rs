//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// First page of the ranking.
pub const DEFAULT_START_URL: &str = "https://book.douban.com/top250";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// First listing page to fetch
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Browser-copied cookie string (e.g., `bid=...; dbcl2="..."`)
    #[serde(default)]
    pub cookie: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Overrides the emulated browser's User-Agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Base delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Maximum number of listing pages to walk
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Stop after this many book records
    #[serde(default)]
    pub max_records: Option<usize>,

    /// Hosts that detail and next-page links may point to
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_start_url() -> String {
    DEFAULT_START_URL.to_string()
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_max_pages() -> usize {
    10
}

fn default_allowed_domains() -> Vec<String> {
    vec!["book.douban.com".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            cookie: None,
            proxy: None,
            user_agent: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            max_pages: default_max_pages(),
            max_records: None,
            allowed_domains: default_allowed_domains(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("douban-top250").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::new())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(cookie) = std::env::var("DOUBAN_COOKIE") {
            if !cookie.trim().is_empty() {
                self.cookie = Some(cookie);
            }
        }

        if let Ok(proxy) = std::env::var("DOUBAN_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("DOUBAN_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
