//! Browser client for Alsuper product pages using chromiumoxide.

use crate::alsuper::models::RawCandidate;
use crate::alsuper::selectors::{self, BannerRule};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Pause after a banner click so the overlay can disappear.
const BANNER_SETTLE: Duration = Duration::from_millis(100);

/// Pause between checks for the product heading.
const HEADING_POLL: Duration = Duration::from_millis(250);

/// In-page price query.
///
/// For each selector in priority order, collects elements whose own text has
/// `$` followed by a digit, and stops at the first selector that yields any.
/// Reports text, computed color and line-through decoration per element.
const FIND_PRICE_JS: &str = r#"
(function (selList) {
  function isStruck(el) {
    var cs = getComputedStyle(el);
    var td = (cs.textDecorationLine || cs.textDecoration || '').toLowerCase();
    return td.indexOf('line-through') !== -1;
  }
  var out = [];
  for (var i = 0; i < selList.length; i++) {
    var sel = selList[i];
    var nodes = document.querySelectorAll(sel);
    for (var j = 0; j < nodes.length; j++) {
      var el = nodes[j];
      var text = (el.textContent || '').trim();
      if (!/\$\s*\d/.test(text)) continue;
      out.push({
        selector: sel,
        text: text,
        color: getComputedStyle(el).color,
        struck: isStruck(el)
      });
    }
    if (out.length) break;
  }
  return out;
})
"#;

/// Clicks the first button whose visible text contains the needle.
const CLICK_BUTTON_JS: &str = r#"
(function (needle) {
  var want = needle.toLowerCase();
  var buttons = document.querySelectorAll('button');
  for (var i = 0; i < buttons.length; i++) {
    var text = (buttons[i].innerText || buttons[i].textContent || '').toLowerCase();
    if (text.indexOf(want) !== -1) {
      buttons[i].click();
      return true;
    }
  }
  return false;
})
"#;

/// True once the product heading is laid out.
const HEADING_VISIBLE_JS: &str = r#"
(function () {
  var h = document.querySelector('h1');
  if (!h) return false;
  var r = h.getBoundingClientRect();
  return r.width > 0 && r.height > 0;
})()
"#;

/// Trait for querying rendered price candidates - enables fake pages in tests.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Runs the in-page price query against the live DOM.
    async fn locate_candidates(&self, selectors: &[&str]) -> Result<Vec<RawCandidate>>;
}

/// A loaded product page.
#[async_trait]
pub trait ProductPage: CandidateSource {
    /// Product heading text, if it can be read.
    async fn product_name(&self) -> Option<String>;

    /// Full visible page text, empty if it cannot be read.
    async fn page_text(&self) -> String;

    /// Releases the page.
    async fn close(&self);
}

/// Trait for opening product pages - enables mocking for tests.
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Navigates to `url`, dismisses banners and waits for the heading.
    ///
    /// Any error here means the page could not be loaded.
    async fn open(&self, url: &str) -> Result<Box<dyn ProductPage>>;
}

/// Browser launch and page timing.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub locale: String,
    pub viewport: (u32, u32),
    pub navigation_timeout: Duration,
    pub heading_timeout: Duration,
    pub banner_timeout: Duration,
    pub text_timeout: Duration,
}

impl From<&Config> for BrowserSettings {
    fn from(config: &Config) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            user_agent: config.user_agent.clone(),
            locale: config.locale.clone(),
            viewport: (config.viewport_width, config.viewport_height),
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            heading_timeout: Duration::from_millis(config.heading_timeout_ms),
            banner_timeout: Duration::from_millis(config.banner_timeout_ms),
            text_timeout: Duration::from_millis(config.text_timeout_ms),
        }
    }
}

/// Headless Chromium that opens one fresh page per product.
pub struct ChromiumLoader {
    browser: Browser,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
}

impl ChromiumLoader {
    /// Launches a headless Chromium instance.
    pub async fn launch(settings: BrowserSettings) -> Result<Self> {
        let (width, height) = settings.viewport;

        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--lang={}", settings.locale))
            .arg(format!("--user-agent={}", settings.user_agent));

        if let Some(path) = &settings.chrome_path {
            debug!("Using Chromium at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config =
            builder.build().map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) =
            Browser::launch(config).await.context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("Browser handler error: {}", e);
                }
            }
        });

        info!("Chromium launched ({}x{}, {})", width, height, settings.locale);

        Ok(Self { browser, handler, settings })
    }

    /// Closes the browser process.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await.context("failed to close Chromium")?;
        self.handler.abort();
        Ok(())
    }

    async fn prepare(&self, page: &Page, url: &str) -> Result<()> {
        let limit = self.settings.navigation_timeout;

        debug!("Navigating to {}", url);
        tokio::time::timeout(limit, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| anyhow!("navigation timed out after {:?}", limit))?
        .context("navigation failed")?;

        let scroll = page.evaluate("window.scrollTo(0, 0)");
        let _ = best_effort("scroll to top", self.settings.text_timeout, scroll).await;

        self.dismiss_banners(page).await;
        self.wait_for_heading(page).await
    }

    async fn dismiss_banners(&self, page: &Page) {
        for rule in selectors::BANNERS {
            let clicked = match rule {
                BannerRule::ButtonText(text) => {
                    let script = format!("{CLICK_BUTTON_JS}({})", js_string(text));
                    best_effort("banner button", self.settings.banner_timeout, async {
                        let result = page.evaluate(script).await?;
                        result.into_value::<bool>().map_err(|e| anyhow!("{e:?}"))
                    })
                    .await
                    .unwrap_or(false)
                }
                BannerRule::Css(selector) => {
                    best_effort("banner element", self.settings.banner_timeout, async {
                        page.find_element(*selector).await?.click().await?;
                        Ok::<_, chromiumoxide::error::CdpError>(true)
                    })
                    .await
                    .unwrap_or(false)
                }
            };

            if clicked {
                debug!("Dismissed banner via {:?}", rule);
                tokio::time::sleep(BANNER_SETTLE).await;
            }
        }
    }

    async fn wait_for_heading(&self, page: &Page) -> Result<()> {
        let limit = self.settings.heading_timeout;

        tokio::time::timeout(limit, async {
            loop {
                let visible = match page.evaluate(HEADING_VISIBLE_JS).await {
                    Ok(result) => result.into_value::<bool>().unwrap_or(false),
                    Err(e) => {
                        trace!("Heading check failed: {}", e);
                        false
                    }
                };
                if visible {
                    return;
                }
                tokio::time::sleep(HEADING_POLL).await;
            }
        })
        .await
        .map_err(|_| anyhow!("product heading not visible after {:?}", limit))
    }
}

#[async_trait]
impl PageLoader for ChromiumLoader {
    async fn open(&self, url: &str) -> Result<Box<dyn ProductPage>> {
        let page =
            self.browser.new_page("about:blank").await.context("failed to create new page")?;

        match self.prepare(&page, url).await {
            Ok(()) => {
                let text_timeout = self.settings.text_timeout;
                Ok(Box::new(ChromiumPage { page, text_timeout }))
            }
            Err(e) => {
                let _ = page.close().await;
                Err(e)
            }
        }
    }
}

/// A product page held open in Chromium.
pub struct ChromiumPage {
    page: Page,
    text_timeout: Duration,
}

impl ChromiumPage {
    async fn inner_text(&self, selector: &str) -> Option<String> {
        best_effort(selector, self.text_timeout, async {
            self.page.find_element(selector).await?.inner_text().await
        })
        .await
        .flatten()
    }
}

#[async_trait]
impl CandidateSource for ChromiumPage {
    async fn locate_candidates(&self, selectors: &[&str]) -> Result<Vec<RawCandidate>> {
        let script = locate_script(selectors)?;

        self.page
            .evaluate(script)
            .await
            .context("price query failed")?
            .into_value::<Vec<RawCandidate>>()
            .map_err(|e| anyhow!("unexpected price query result: {e:?}"))
    }
}

#[async_trait]
impl ProductPage for ChromiumPage {
    async fn product_name(&self) -> Option<String> {
        self.inner_text(selectors::PRODUCT_NAME)
            .await
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    async fn page_text(&self) -> String {
        self.inner_text(selectors::PAGE_TEXT).await.unwrap_or_default()
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            trace!("Failed to close page: {}", e);
        }
    }
}

/// Builds the in-page query call for a selector list.
pub fn locate_script(selectors: &[&str]) -> Result<String> {
    let list = serde_json::to_string(selectors).context("failed to encode selectors")?;
    Ok(format!("{FIND_PRICE_JS}({list})"))
}

/// Quotes a string as a JS literal.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Runs a fragile browser step with a time limit, yielding `None` on failure.
async fn best_effort<T, E, F>(what: &str, limit: Duration, fut: F) -> Option<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            trace!("{} failed: {}", what, e);
            None
        }
        Err(_) => {
            trace!("{} timed out after {:?}", what, limit);
            None
        }
    }
}
