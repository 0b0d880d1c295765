//! CSS selectors for Alsuper product pages.
//!
//! This file contains every selector the extractor sends to the browser.
//! Update this file when Alsuper changes their markup.
//!
//! **Update process**: When a price stops being found, capture the rendered
//! page, adjust the priority list, and add a test for the new ordering.

/// Price markup, highest priority first.
///
/// The in-page query stops at the first selector that yields any element
/// with `$` and a digit in the same node, so order encodes precedence:
/// red discount markup outranks generic price markup.
pub const PRICE: &[&str] = &[
    // Discount/regular price in red
    "mat-label.as-discount-price.as-font-red-blood",
    "mat-label.as-price.as-font-red-blood",
    // Same classes on other tags
    "[class*='as-discount-price'][class*='as-font-red']",
    "[class*='as-price'][class*='as-font-red']",
    // Black
    "mat-label.as-price",
    "[class*='as-price']",
    // Near the heading, if the label tag changes but classes survive
    "h1 + * [class*='as-price']",
    "h1 ~ * [class*='as-price']",
];

/// Product name heading.
pub const PRODUCT_NAME: &str = "h1";

/// Full visible page text, used by the unit heuristic.
pub const PAGE_TEXT: &str = "body";

/// A way of locating a consent/banner control to dismiss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerRule {
    /// A `<button>` whose visible text contains this string (case-insensitive).
    ButtonText(&'static str),
    /// First element matching a CSS selector.
    Css(&'static str),
}

/// Cookie, store-picker and promo banners, tried once each in order.
pub const BANNERS: &[BannerRule] = &[
    BannerRule::ButtonText("Aceptar"),
    BannerRule::ButtonText("ACEPTAR"),
    BannerRule::ButtonText("Aceptar cookies"),
    BannerRule::ButtonText("Entendido"),
    BannerRule::Css("[id*=\"cookie\"] button"),
    BannerRule::Css("[class*=\"cookie\"] button"),
    BannerRule::ButtonText("Cerrar"),
    BannerRule::Css("[aria-label=\"Cerrar\"]"),
    BannerRule::ButtonText("Permitir"),
    BannerRule::ButtonText("Aceptar todo"),
    BannerRule::ButtonText("Seleccionar tienda"),
    BannerRule::ButtonText("Continuar"),
];
