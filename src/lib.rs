//! alsuper-scraper - Browser-driven price extraction for Alsuper product pages
//!
//! Renders product pages in headless Chromium, picks the active price by its
//! rendered color and decoration, and normalizes it per kilogram or per unit.

pub mod alsuper;
pub mod cache;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod server;

pub use alsuper::models::{PriceRecord, UnitLabel};
pub use config::Config;
pub use error::ExtractError;
pub use extract::Extractor;
