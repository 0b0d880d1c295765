//! Candidate filtering and picking.
//!
//! Struck-through prices are former prices. Red signals the active
//! (discounted) price on Alsuper, black the regular one. Within a color the
//! first element in DOM order is authoritative.

use crate::alsuper::color::classify_color;
use crate::alsuper::models::{ColorClass, PriceCandidate, RawCandidate};
use crate::alsuper::parser::parse_price_value;
use tracing::trace;

/// Turns raw observations into eligible candidates, preserving order.
///
/// Drops struck candidates, colors other than red/black, and text without a
/// positive price.
pub fn eligible_candidates(raw: &[RawCandidate]) -> Vec<PriceCandidate> {
    raw.iter()
        .filter_map(|candidate| {
            if candidate.struck {
                trace!("Skipping struck candidate: {}", candidate.text);
                return None;
            }

            let Some(color_class) = classify_color(&candidate.color) else {
                trace!("Skipping candidate with color {}: {}", candidate.color, candidate.text);
                return None;
            };

            let value = parse_price_value(&candidate.text).filter(|v| *v > 0.0)?;

            Some(PriceCandidate::from_raw(candidate.clone(), value, color_class))
        })
        .collect()
}

/// Picks the first red candidate, else the first black one.
pub fn pick_price(raw: &[RawCandidate]) -> Option<PriceCandidate> {
    let eligible = eligible_candidates(raw);

    let (red, black): (Vec<_>, Vec<_>) =
        eligible.into_iter().partition(|c| c.color_class == ColorClass::Red);

    red.into_iter().next().or_else(|| black.into_iter().next())
}
