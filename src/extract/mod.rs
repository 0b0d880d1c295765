//! Price search and extraction pipeline.

pub mod extractor;
pub mod picker;
pub mod poller;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::{ExtractSettings, Extractor};
pub use picker::{eligible_candidates, pick_price};
pub use poller::{PollOutcome, PollSettings, PollState, PriceSearch};
