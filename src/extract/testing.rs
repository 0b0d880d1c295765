//! In-memory product pages for unit tests.

use crate::alsuper::client::{CandidateSource, PageLoader, ProductPage};
use crate::alsuper::models::RawCandidate;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const RED: &str = "rgb(200, 16, 46)";
pub const BLACK: &str = "rgb(0, 0, 0)";

pub fn raw(text: &str, color: &str, struck: bool) -> RawCandidate {
    RawCandidate {
        selector: "mat-label.as-price".to_string(),
        text: text.to_string(),
        color: color.to_string(),
        struck,
    }
}

/// Rendered page snapshot returned on every query.
#[derive(Clone, Default)]
pub struct FakePage {
    name: Option<String>,
    candidates: Vec<RawCandidate>,
    text: String,
    closed: Arc<AtomicU32>,
}

impl FakePage {
    pub fn new(name: Option<&str>) -> Self {
        Self { name: name.map(str::to_string), ..Self::default() }
    }

    pub fn with_candidates(mut self, candidates: Vec<RawCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

#[async_trait]
impl CandidateSource for FakePage {
    async fn locate_candidates(&self, _selectors: &[&str]) -> Result<Vec<RawCandidate>> {
        Ok(self.candidates.clone())
    }
}

#[async_trait]
impl ProductPage for FakePage {
    async fn product_name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn page_text(&self) -> String {
        self.text.clone()
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock page loader that counts opens and closes.
pub struct MockLoader {
    page: Option<FakePage>,
    error: String,
    opened: AtomicU32,
    closed: Arc<AtomicU32>,
}

impl MockLoader {
    pub fn serving(page: FakePage) -> Self {
        let closed = page.closed.clone();
        Self { page: Some(page), error: String::new(), opened: AtomicU32::new(0), closed }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            page: None,
            error: error.to_string(),
            opened: AtomicU32::new(0),
            closed: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageLoader for MockLoader {
    async fn open(&self, _url: &str) -> Result<Box<dyn ProductPage>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match &self.page {
            Some(page) => Ok(Box::new(page.clone())),
            None => anyhow::bail!("{}", self.error),
        }
    }
}
