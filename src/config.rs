//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::cache;
use crate::extract::poller::PollSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP service listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Chromium executable (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Browser user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser locale
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Viewport width in pixels
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height in pixels
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Navigation limit in milliseconds
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Wait for the product heading in milliseconds
    #[serde(default = "default_heading_timeout_ms")]
    pub heading_timeout_ms: u64,

    /// Per-banner click limit in milliseconds
    #[serde(default = "default_banner_timeout_ms")]
    pub banner_timeout_ms: u64,

    /// Limit for reading the heading or page text in milliseconds
    #[serde(default = "default_text_timeout_ms")]
    pub text_timeout_ms: u64,

    /// Price search time limit in milliseconds
    #[serde(default = "default_poll_deadline_ms")]
    pub poll_deadline_ms: u64,

    /// Pause between price queries in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum cached records
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cached record lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Output format for one-shot commands
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_locale() -> String {
    "es-MX".to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    900
}

fn default_navigation_timeout_ms() -> u64 {
    120_000
}

fn default_heading_timeout_ms() -> u64 {
    20_000
}

fn default_banner_timeout_ms() -> u64 {
    1200
}

fn default_text_timeout_ms() -> u64 {
    2000
}

fn default_poll_deadline_ms() -> u64 {
    18_000
}

fn default_poll_interval_ms() -> u64 {
    350
}

fn default_cache_capacity() -> usize {
    cache::DEFAULT_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    cache::DEFAULT_TTL.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            chrome_path: None,
            user_agent: default_user_agent(),
            locale: default_locale(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            heading_timeout_ms: default_heading_timeout_ms(),
            banner_timeout_ms: default_banner_timeout_ms(),
            text_timeout_ms: default_text_timeout_ms(),
            poll_deadline_ms: default_poll_deadline_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
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
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("alsuper-scraper").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    ///
    /// `PORT` keeps the usual container convention and binds all interfaces;
    /// `ALSUPER_BIND` wins when both are set.
    pub fn with_env(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                self.bind = format!("0.0.0.0:{p}");
            }
        }

        if let Ok(bind) = std::env::var("ALSUPER_BIND") {
            if !bind.is_empty() {
                self.bind = bind;
            }
        }

        if let Ok(chrome) = std::env::var("ALSUPER_CHROME") {
            if !chrome.is_empty() {
                self.chrome_path = Some(PathBuf::from(chrome));
            }
        }

        if let Ok(ttl) = std::env::var("ALSUPER_CACHE_TTL") {
            if let Ok(t) = ttl.parse() {
                self.cache_ttl_secs = t;
            }
        }

        self
    }

    /// Price search timing.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            deadline: Duration::from_millis(self.poll_deadline_ms),
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Cached record lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Output format for one-shot results.
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
