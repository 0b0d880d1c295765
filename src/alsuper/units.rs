//! Unit and pack-size inference from URL slugs and page copy.
//!
//! Alsuper exposes no structured unit field, so the unit is guessed from
//! keywords. The rules form an ordered decision table: the first rule with a
//! matching keyword wins and later rules are never consulted. Order matters,
//! e.g. a six-pack page that also says "paquete" must stay a six-pack.

use crate::alsuper::models::{UnitClassification, UnitLabel};

/// One row of the decision table.
#[derive(Debug, Clone, Copy)]
pub struct UnitRule {
    /// Matches if the folded text contains any of these
    pub keywords: &'static [&'static str],
    pub result: UnitClassification,
}

impl UnitRule {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k))
    }
}

/// Ordered rules, first match wins.
pub const UNIT_RULES: &[UnitRule] = &[
    // Beer sold by the six-pack, price is for the whole pack
    UnitRule {
        keywords: &["six-pack", "six pack"],
        result: UnitClassification::new(UnitLabel::SixPack, Some(6), None),
    },
    // Single cans and canned juices
    UnitRule {
        keywords: &["nectar-mixto", "v8", "lata"],
        result: UnitClassification::new(UnitLabel::Lata, Some(1), None),
    },
    // Meat and produce sold by weight
    UnitRule {
        keywords: &["kg", "kilo", "pulpa-de-res", "jamon-de-pierna", "tocineta", "cebolla"],
        result: UnitClassification::new(UnitLabel::Kg, None, None),
    },
    UnitRule {
        keywords: &["chorizo"],
        result: UnitClassification::new(UnitLabel::Pieza, Some(1), Some(100)),
    },
    UnitRule {
        keywords: &["salchicha"],
        result: UnitClassification::new(UnitLabel::Paquete, Some(1), Some(800)),
    },
    UnitRule {
        keywords: &["paquete"],
        result: UnitClassification::new(UnitLabel::Paquete, Some(1), Some(800)),
    },
];

/// Classification when no rule matches.
pub const DEFAULT_UNIT: UnitClassification =
    UnitClassification::new(UnitLabel::Pieza, Some(1), None);

/// Infers the pricing unit from the product URL and the page's visible text.
pub fn guess_units(url: &str, page_text: &str) -> UnitClassification {
    let folded = format!("{url} {page_text}").to_lowercase();

    UNIT_RULES.iter().find(|rule| rule.matches(&folded)).map_or(DEFAULT_UNIT, |rule| rule.result)
}
