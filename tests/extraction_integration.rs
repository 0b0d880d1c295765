//! End-to-end extraction against scripted product pages.

use alsuper_scraper::alsuper::models::RawCandidate;
use alsuper_scraper::alsuper::{CandidateSource, PageLoader, ProductPage};
use alsuper_scraper::clock::ManualClock;
use alsuper_scraper::extract::{ExtractSettings, Extractor};
use alsuper_scraper::{ExtractError, UnitLabel};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn candidate(selector: &str, text: &str, color: &str, struck: bool) -> RawCandidate {
    RawCandidate {
        selector: selector.to_string(),
        text: text.to_string(),
        color: color.to_string(),
        struck,
    }
}

/// A page whose price markup shows up after a few renders.
#[derive(Clone)]
struct RenderingPage {
    name: Option<String>,
    text: String,
    frames: Vec<Vec<RawCandidate>>,
    queries: Arc<AtomicUsize>,
}

#[async_trait]
impl CandidateSource for RenderingPage {
    async fn locate_candidates(&self, _selectors: &[&str]) -> Result<Vec<RawCandidate>> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.frames[n.min(self.frames.len() - 1)].clone())
    }
}

#[async_trait]
impl ProductPage for RenderingPage {
    async fn product_name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn page_text(&self) -> String {
        self.text.clone()
    }

    async fn close(&self) {}
}

/// Serves pages by URL; unknown URLs fail to load.
struct SiteLoader {
    pages: HashMap<String, RenderingPage>,
    opened: AtomicUsize,
}

impl SiteLoader {
    fn new(pages: Vec<(&str, RenderingPage)>) -> Self {
        let pages = pages.into_iter().map(|(url, page)| (url.to_string(), page)).collect();
        Self { pages, opened: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl PageLoader for SiteLoader {
    async fn open(&self, url: &str) -> Result<Box<dyn ProductPage>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(page) => Ok(Box::new(page.clone())),
            None => anyhow::bail!("net::ERR_NAME_NOT_RESOLVED at {}", url),
        }
    }
}

fn page(name: Option<&str>, text: &str, frames: Vec<Vec<RawCandidate>>) -> RenderingPage {
    RenderingPage {
        name: name.map(str::to_string),
        text: text.to_string(),
        frames,
        queries: Arc::new(AtomicUsize::new(0)),
    }
}

const JAMON: &str = "https://www.alsuper.com/producto/jamon-de-pierna-fud-113040";
const SALCHICHA: &str = "https://www.alsuper.com/producto/salchicha-de-pavo-fud-118911";
const V8: &str = "https://www.alsuper.com/producto/jugo-v8-340ml-4400";

fn site() -> SiteLoader {
    let red = "rgb(200, 16, 46)";
    let black = "rgb(0, 0, 0)";

    SiteLoader::new(vec![
        (
            JAMON,
            page(
                Some("Jamón de Pierna FUD"),
                "Jamón de Pierna FUD Precio por kilo",
                vec![
                    vec![],
                    vec![candidate("mat-label.as-price", "$219.00", black, false)],
                    vec![
                        candidate("mat-label.as-price.as-font-red-blood", "$189.00", red, false),
                        candidate("mat-label.as-price", "$219.00", black, true),
                    ],
                ],
            ),
        ),
        (
            SALCHICHA,
            page(
                Some("Salchicha de Pavo FUD"),
                "Paquete 800 g",
                vec![vec![candidate("[class*='as-price']", "$ 64.50", black, false)]],
            ),
        ),
        (
            V8,
            page(
                None,
                "Jugo V8 340 ml",
                vec![vec![candidate("[class*='as-price']", "$32.00", "rgb(117, 117, 117)", false)]],
            ),
        ),
    ])
}

fn extractor(loader: Arc<SiteLoader>) -> (Extractor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Extractor::with_clock(loader, ExtractSettings::default(), clock.clone()), clock)
}

#[tokio::test]
async fn test_black_price_picked_once_rendered() {
    let loader = Arc::new(site());
    let (extractor, clock) = extractor(loader.clone());

    let record = extractor.extract(JAMON, false).await.unwrap();

    // The black regular price is already eligible on the second render
    assert_eq!(record.price_per_kg, Some(219.0));
    assert_eq!(record.unit_price, None);
    assert_eq!(record.raw_unit, UnitLabel::Kg);
    assert_eq!(record.product_name.as_deref(), Some("Jamón de Pierna FUD"));
    assert_eq!(clock.elapsed(), Duration::from_millis(350));
}

#[tokio::test]
async fn test_package_with_space_after_dollar() {
    let (extractor, _clock) = extractor(Arc::new(site()));

    let record = extractor.extract(SALCHICHA, false).await.unwrap();

    assert_eq!(record.unit_price, Some(64.5));
    assert_eq!(record.raw_unit, UnitLabel::Paquete);
    assert_eq!(record.unit_pack_size, Some(1));
    assert_eq!(record.unit_weight_g, Some(800));
}

#[tokio::test]
async fn test_gray_price_times_out() {
    let loader = Arc::new(site());
    let (extractor, clock) = extractor(loader.clone());

    let err = extractor.extract(V8, true).await.unwrap_err();

    assert!(matches!(err, ExtractError::PriceNotFound));
    assert_eq!(err.status_code(), 500);
    assert!(clock.elapsed() >= Duration::from_secs(18));
    assert_eq!(extractor.cached_len(), 0);
}

#[tokio::test]
async fn test_unknown_url_fails_to_load() {
    let (extractor, _clock) = extractor(Arc::new(site()));
    let url = "https://www.alsuper.com/producto/inexistente-1";

    let err = extractor.extract(url, false).await.unwrap_err();

    assert_eq!(err.status_code(), 502);
    assert!(err.to_string().contains(url));
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn test_repeat_requests_hit_cache_until_expiry() {
    let loader = Arc::new(site());
    let (extractor, clock) = extractor(loader.clone());

    let first = extractor.extract(SALCHICHA, false).await.unwrap();
    let second = extractor.extract(SALCHICHA, false).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(loader.opened.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_secs(301));
    extractor.extract(SALCHICHA, false).await.unwrap();
    assert_eq!(loader.opened.load(Ordering::SeqCst), 2);
}
