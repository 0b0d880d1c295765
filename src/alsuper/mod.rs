//! Alsuper-specific modules for the browser client, parsing, and data models.

pub mod client;
pub mod color;
pub mod models;
pub mod parser;
pub mod selectors;
pub mod units;

pub use client::{BrowserSettings, CandidateSource, ChromiumLoader, PageLoader, ProductPage};
pub use color::classify_color;
pub use models::{
    ColorClass, PriceCandidate, PriceRecord, RawCandidate, UnitClassification, UnitLabel,
};
pub use parser::parse_price_value;
pub use units::guess_units;
