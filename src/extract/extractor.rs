//! Price extraction for a single product URL.

use crate::alsuper::client::{PageLoader, ProductPage};
use crate::alsuper::models::PriceRecord;
use crate::alsuper::selectors;
use crate::alsuper::units::guess_units;
use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::ExtractError;
use crate::extract::poller::{PollOutcome, PollSettings, PriceSearch};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of raw candidates shown in debug diagnostics.
const DEBUG_CANDIDATES: usize = 5;

/// Tunables for the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSettings {
    pub poll: PollSettings,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl From<&Config> for ExtractSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll: config.poll_settings(),
            cache_capacity: config.cache_capacity,
            cache_ttl: config.cache_ttl(),
        }
    }
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Loads product pages, finds the current price and caches the result.
///
/// Concurrent extractions of the same URL are not coalesced; the last one
/// to finish owns the cache entry.
pub struct Extractor {
    loader: Arc<dyn PageLoader>,
    search: PriceSearch,
    cache: Mutex<TtlCache<String, PriceRecord>>,
}

impl Extractor {
    /// Creates an extractor on the system clock.
    pub fn new(loader: Arc<dyn PageLoader>, settings: ExtractSettings) -> Self {
        Self::with_clock(loader, settings, Arc::new(SystemClock))
    }

    /// Creates an extractor with a provided clock (for testing).
    pub fn with_clock(
        loader: Arc<dyn PageLoader>,
        settings: ExtractSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::new(settings.cache_capacity, settings.cache_ttl, clock.clone());
        Self { loader, search: PriceSearch::new(settings.poll, clock), cache: Mutex::new(cache) }
    }

    fn cache(&self) -> MutexGuard<'_, TtlCache<String, PriceRecord>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a fresh cached record for `url`, if any.
    pub fn cached(&self, url: &str) -> Option<PriceRecord> {
        self.cache().get(&url.to_string())
    }

    /// Number of records currently held in the cache.
    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    /// Extracts the price record for `url`.
    ///
    /// A cache hit returns immediately and skips diagnostics even when
    /// `debug` is set. Failures are never cached.
    pub async fn extract(&self, url: &str, debug: bool) -> Result<PriceRecord, ExtractError> {
        if let Some(record) = self.cached(url) {
            info!("Cache hit: {}", url);
            return Ok(record);
        }

        info!("Extracting price: {}", url);

        let page = self.loader.open(url).await.map_err(|source| {
            warn!("Failed to load {}: {:#}", url, source);
            ExtractError::LoadFailure { url: url.to_string(), source }
        })?;

        let page = OpenPage::new(page);
        let result = self.extract_from_page(url, page.get(), debug).await;
        page.close().await;
        let record = result?;

        self.cache().insert(url.to_string(), record.clone());
        Ok(record)
    }

    async fn extract_from_page(
        &self,
        url: &str,
        page: &dyn ProductPage,
        debug: bool,
    ) -> Result<PriceRecord, ExtractError> {
        let product_name = page.product_name().await;
        if product_name.is_none() {
            debug!("No product name on {}", url);
        }

        let outcome = self.search.run(page, selectors::PRICE).await;

        if debug {
            log_diagnostics(url, product_name.as_deref(), &outcome);
        }

        let Some(pick) = outcome.pick() else {
            warn!("No price on {} after {} attempts", url, outcome.attempts);
            return Err(ExtractError::PriceNotFound);
        };

        let page_text = page.page_text().await;
        let units = guess_units(url, &page_text);
        debug!(
            "Units for {}: {} (pack {:?}, {:?} g)",
            url, units.unit, units.pack_size, units.unit_weight_g
        );

        Ok(PriceRecord::new(url, product_name, pick.value, units))
    }
}

/// Page held for one extraction. Closed in the background if the extraction
/// is dropped before reaching `close`.
struct OpenPage {
    page: Arc<dyn ProductPage>,
    closed: bool,
}

impl OpenPage {
    fn new(page: Box<dyn ProductPage>) -> Self {
        Self { page: Arc::from(page), closed: false }
    }

    fn get(&self) -> &dyn ProductPage {
        self.page.as_ref()
    }

    async fn close(mut self) {
        self.closed = true;
        self.page.close().await;
    }
}

impl Drop for OpenPage {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Extraction abandoned, closing page");
                handle.spawn(async move { page.close().await });
            }
            Err(_) => warn!("Extraction abandoned outside a runtime, page left open"),
        }
    }
}

fn log_diagnostics(url: &str, product_name: Option<&str>, outcome: &PollOutcome) {
    let top = &outcome.last_candidates[..outcome.last_candidates.len().min(DEBUG_CANDIDATES)];
    let candidates = serde_json::to_string(top).unwrap_or_else(|_| "[]".to_string());
    let pick = outcome
        .pick()
        .and_then(|p| serde_json::to_string(p).ok())
        .unwrap_or_else(|| "null".to_string());

    info!("[debug] url: {}", url);
    info!("[debug] h1: {}", product_name.unwrap_or(""));
    info!("[debug] candidates (top {}): {}", DEBUG_CANDIDATES, candidates);
    info!("[debug] pick: {}", pick);
}
