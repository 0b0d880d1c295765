//! Data models for price candidates, unit classification, and price records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency reported for every Alsuper price.
pub const CURRENCY: &str = "MXN";

/// One element observed on the rendered page as a possible price.
///
/// This is the record returned by the in-page query, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Selector rule that matched the element
    pub selector: String,
    /// Trimmed text content
    pub text: String,
    /// Computed CSS color, as reported by the browser
    pub color: String,
    /// True if the text is rendered with a line-through decoration
    pub struck: bool,
}

/// Visual class of a rendered price color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Red,
    Black,
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorClass::Red => write!(f, "red"),
            ColorClass::Black => write!(f, "black"),
        }
    }
}

/// A candidate that passed every filter and can be picked.
///
/// Holding both `value` and `color_class` is what makes it eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub selector: String,
    pub text: String,
    pub color: String,
    pub struck: bool,
    /// Parsed price
    pub value: f64,
    /// Color classification
    pub color_class: ColorClass,
}

impl PriceCandidate {
    /// Promotes a raw observation once it has a value and a color class.
    pub fn from_raw(raw: RawCandidate, value: f64, color_class: ColorClass) -> Self {
        Self {
            selector: raw.selector,
            text: raw.text,
            color: raw.color,
            struck: raw.struck,
            value,
            color_class,
        }
    }
}

/// Semantic pricing unit of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitLabel {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "pieza")]
    Pieza,
    #[serde(rename = "paquete")]
    Paquete,
    #[serde(rename = "lata")]
    Lata,
    #[serde(rename = "six-pack")]
    SixPack,
}

impl UnitLabel {
    /// Returns the label as reported in `raw_unit`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitLabel::Kg => "kg",
            UnitLabel::Pieza => "pieza",
            UnitLabel::Paquete => "paquete",
            UnitLabel::Lata => "lata",
            UnitLabel::SixPack => "six-pack",
        }
    }
}

impl fmt::Display for UnitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the unit/pack heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitClassification {
    pub unit: UnitLabel,
    pub pack_size: Option<u32>,
    pub unit_weight_g: Option<u32>,
}

impl UnitClassification {
    pub const fn new(unit: UnitLabel, pack_size: Option<u32>, unit_weight_g: Option<u32>) -> Self {
        Self { unit, pack_size, unit_weight_g }
    }
}

/// Structured price for one product page.
///
/// Exactly one of `price_per_kg` and `unit_price` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Source product URL
    pub url: String,
    /// Product name from the page heading
    pub product_name: Option<String>,
    /// MXN per kilogram (meat, produce)
    pub price_per_kg: Option<f64>,
    /// MXN per piece, pack, can or six-pack
    pub unit_price: Option<f64>,
    /// Units in the pack, e.g. 6 for a six-pack
    pub unit_pack_size: Option<u32>,
    /// Weight of one piece or pack in grams
    pub unit_weight_g: Option<u32>,
    /// Always "MXN"
    pub currency: String,
    /// Unit label the price refers to
    pub raw_unit: UnitLabel,
}

impl PriceRecord {
    /// Assembles a record, routing the price by unit.
    pub fn new(
        url: impl Into<String>,
        product_name: Option<String>,
        price: f64,
        units: UnitClassification,
    ) -> Self {
        let (price_per_kg, unit_price) = match units.unit {
            UnitLabel::Kg => (Some(price), None),
            _ => (None, Some(price)),
        };

        Self {
            url: url.into(),
            product_name,
            price_per_kg,
            unit_price,
            unit_pack_size: units.pack_size,
            unit_weight_g: units.unit_weight_g,
            currency: CURRENCY.to_string(),
            raw_unit: units.unit,
        }
    }

    /// Returns the price regardless of which unit it refers to.
    pub fn price(&self) -> f64 {
        self.price_per_kg.or(self.unit_price).unwrap_or_default()
    }
}
