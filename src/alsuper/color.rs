//! Rendered color classification.
//!
//! Best-effort, not colorimetric: only the forms a browser reports for the
//! retailer's markup are recognized. Thresholds are empirical.

use crate::alsuper::models::ColorClass;

/// Max value of every channel for a color to count as black.
pub const BLACK_MAX_CHANNEL: i64 = 10;
/// Min red channel for a color to count as red.
pub const RED_MIN_RED: i64 = 180;
/// Max green and blue channels for a color to count as red.
pub const RED_MAX_OTHER: i64 = 60;

/// Classifies a computed color string as red, black, or neither (`None`).
///
/// Accepts `rgb(...)`/`rgba(...)`, `#000`/`#000000`/`#f00`/`#ff0000`, and
/// falls back to a substring match on "black"/"red".
pub fn classify_color(color: &str) -> Option<ColorClass> {
    let s: String = color.to_lowercase().chars().filter(|c| *c != ' ').collect();

    if s.starts_with("rgb") {
        // An rgb form that does not parse is never guessed at
        let (r, g, b) = parse_rgb_channels(&s)?;

        if r <= BLACK_MAX_CHANNEL && g <= BLACK_MAX_CHANNEL && b <= BLACK_MAX_CHANNEL {
            return Some(ColorClass::Black);
        }
        if r >= RED_MIN_RED && g <= RED_MAX_OTHER && b <= RED_MAX_OTHER {
            return Some(ColorClass::Red);
        }
    }

    match s.as_str() {
        "#000" | "#000000" => return Some(ColorClass::Black),
        "#f00" | "#ff0000" => return Some(ColorClass::Red),
        _ => {}
    }

    if s.contains("black") {
        Some(ColorClass::Black)
    } else if s.contains("red") {
        Some(ColorClass::Red)
    } else {
        None
    }
}

/// Reads the first three channels of `rgb(r,g,b)` or `rgba(r,g,b,a)`.
///
/// Fractional channels are truncated.
fn parse_rgb_channels(s: &str) -> Option<(i64, i64, i64)> {
    let open = s.find('(')?;
    let close = s.find(')')?;
    let inner = s.get(open + 1..close)?;

    let mut channels = inner.split(',').map(|part| {
        part.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64)
    });
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;
    Some((r, g, b))
}
