//! One-shot price lookup command implementation.

use crate::alsuper::{BrowserSettings, ChromiumLoader, PageLoader, PriceRecord};
use crate::config::Config;
use crate::extract::{ExtractSettings, Extractor};
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Extracts prices for product URLs and formats them.
pub struct PriceCommand {
    config: Config,
}

impl PriceCommand {
    /// Creates a new price command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Looks up one or more URLs in a fresh browser and returns formatted output.
    pub async fn execute(&self, urls: &[String], debug: bool) -> Result<String> {
        let loader = Arc::new(
            ChromiumLoader::launch(BrowserSettings::from(&self.config))
                .await
                .context("Failed to start browser")?,
        );

        let output = self.execute_with_loader(loader.clone(), urls, debug).await;

        match Arc::try_unwrap(loader) {
            Ok(loader) => {
                if let Err(e) = loader.shutdown().await {
                    warn!("Browser shutdown failed: {:#}", e);
                }
            }
            Err(_) => warn!("Browser still in use, leaving it to exit with the process"),
        }

        output
    }

    /// Looks up URLs with a provided loader (for testing).
    ///
    /// A single URL propagates its extraction error; with several, failures
    /// are reported on stderr and the rest are still printed.
    pub async fn execute_with_loader(
        &self,
        loader: Arc<dyn PageLoader>,
        urls: &[String],
        debug: bool,
    ) -> Result<String> {
        let urls: Vec<&str> = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()).collect();
        if urls.is_empty() {
            anyhow::bail!("No product URL given");
        }

        let extractor = Extractor::new(loader, ExtractSettings::from(&self.config));
        let formatter = Formatter::new(self.config.format);

        if let [url] = urls.as_slice() {
            let record = extractor.extract(url, debug).await?;
            return Ok(formatter.format_record(&record));
        }

        let mut records: Vec<PriceRecord> = Vec::new();
        for url in urls {
            info!("Looking up price: {}", url);

            match extractor.extract(url, debug).await {
                Ok(record) => records.push(record),
                Err(e) => eprintln!("Failed to extract {}: {}", url, e),
            }
        }

        Ok(formatter.format_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::ExtractError;
    use crate::extract::testing::{raw, FakePage, MockLoader, RED};

    const CHORIZO: &str = "https://www.alsuper.com/producto/chorizo-319544";
    const TOCINETA: &str = "https://www.alsuper.com/producto/tocineta-ahumada-118230";

    fn make_test_config(format: OutputFormat) -> Config {
        // Keep failing lookups quick on the real clock
        Config { format, poll_deadline_ms: 20, poll_interval_ms: 5, ..Config::default() }
    }

    fn chorizo_loader() -> Arc<MockLoader> {
        let page = FakePage::new(Some("Chorizo de Cerdo"))
            .with_candidates(vec![raw("$24.50", RED, false)]);
        Arc::new(MockLoader::serving(page))
    }

    #[tokio::test]
    async fn test_price_command_single_url() {
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Table));

        let output =
            cmd.execute_with_loader(chorizo_loader(), &[CHORIZO.to_string()], false).await.unwrap();

        assert!(output.contains("Chorizo de Cerdo"));
        assert!(output.contains("MXN 24.50 / pieza"));
    }

    #[tokio::test]
    async fn test_price_command_json() {
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Json));

        let urls = [format!("  {}  ", CHORIZO)];
        let output = cmd.execute_with_loader(chorizo_loader(), &urls, true).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["url"], CHORIZO);
        assert_eq!(json["unit_price"], 24.5);
    }

    #[tokio::test]
    async fn test_price_command_batch_shares_cache() {
        let loader = chorizo_loader();
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Csv));

        let urls = [CHORIZO.to_string(), TOCINETA.to_string(), CHORIZO.to_string()];
        let output = cmd.execute_with_loader(loader.clone(), &urls, false).await.unwrap();

        assert_eq!(output.lines().count(), 4);
        assert!(output.contains("Chorizo de Cerdo,24.5,,,,MXN,kg"));
        assert_eq!(loader.opened(), 2);
    }

    #[tokio::test]
    async fn test_price_command_single_failure_propagates() {
        let loader = Arc::new(MockLoader::failing("Simulated network error"));
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with_loader(loader, &[CHORIZO.to_string()], false).await.unwrap_err();

        let extract_err = err.downcast_ref::<ExtractError>().unwrap();
        assert_eq!(extract_err.status_code(), 502);
        assert!(err.to_string().contains("Simulated network error"));
    }

    #[tokio::test]
    async fn test_price_command_not_found() {
        let loader = Arc::new(MockLoader::serving(FakePage::new(Some("Chorizo"))));
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with_loader(loader, &[CHORIZO.to_string()], false).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<ExtractError>(), Some(ExtractError::PriceNotFound)));
    }

    #[tokio::test]
    async fn test_price_command_batch_skips_failures() {
        let loader = Arc::new(MockLoader::failing("Simulated network error"));
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Table));

        let urls = [CHORIZO.to_string(), TOCINETA.to_string()];
        let output = cmd.execute_with_loader(loader, &urls, false).await.unwrap();

        assert_eq!(output, "No prices found.");
    }

    #[tokio::test]
    async fn test_price_command_requires_url() {
        let cmd = PriceCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with_loader(chorizo_loader(), &["  ".to_string()], false).await;

        assert!(err.unwrap_err().to_string().contains("No product URL"));
    }
}
