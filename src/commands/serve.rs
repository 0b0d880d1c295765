//! HTTP service command implementation.

use crate::alsuper::{BrowserSettings, ChromiumLoader};
use crate::config::Config;
use crate::extract::{ExtractSettings, Extractor};
use crate::server;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the price service until shutdown.
pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    /// Creates a new serve command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Launches the browser, serves requests, then closes the browser.
    pub async fn execute(&self) -> Result<()> {
        let loader = Arc::new(
            ChromiumLoader::launch(BrowserSettings::from(&self.config))
                .await
                .context("Failed to start browser")?,
        );

        let extractor =
            Arc::new(Extractor::new(loader.clone(), ExtractSettings::from(&self.config)));
        info!(
            "Cache: {} entries, {}s TTL",
            self.config.cache_capacity, self.config.cache_ttl_secs
        );

        let result = server::serve(&self.config.bind, extractor).await;

        match Arc::try_unwrap(loader) {
            Ok(loader) => {
                if let Err(e) = loader.shutdown().await {
                    warn!("Browser shutdown failed: {:#}", e);
                }
            }
            Err(_) => warn!("Browser still in use, leaving it to exit with the process"),
        }

        result
    }
}
