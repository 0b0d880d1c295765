//! Bounded polling for a price on a page that is still rendering.
//!
//! Alsuper renders price markup asynchronously after load, so a single query
//! is racy. The search is a small state machine:
//! `Searching -> Found` or `Searching -> TimedOut`.

use crate::alsuper::client::CandidateSource;
use crate::alsuper::models::{PriceCandidate, RawCandidate};
use crate::clock::Clock;
use crate::extract::picker::pick_price;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default time limit for finding a price.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(18);

/// Default pause between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(350);

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Give up once this much time has passed since the first attempt
    pub deadline: Duration,
    /// Fixed wait between attempts
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { deadline: DEFAULT_DEADLINE, interval: DEFAULT_INTERVAL }
    }
}

/// State of one price search.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Searching,
    Found(PriceCandidate),
    TimedOut,
}

impl PollState {
    fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Searching)
    }
}

/// Terminal state plus diagnostics.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// `Found` or `TimedOut`
    pub state: PollState,
    /// Number of attempts made
    pub attempts: u32,
    /// Raw candidates seen on the last successful query
    pub last_candidates: Vec<RawCandidate>,
    /// Time from the first attempt to the terminal state
    pub elapsed: Duration,
}

impl PollOutcome {
    /// Returns the picked candidate, if one was found.
    pub fn pick(&self) -> Option<&PriceCandidate> {
        match &self.state {
            PollState::Found(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// Repeatedly locates and picks candidates until found or out of time.
pub struct PriceSearch {
    settings: PollSettings,
    clock: Arc<dyn Clock>,
}

impl PriceSearch {
    /// Creates a search with the given timing and clock.
    pub fn new(settings: PollSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// Returns the configured timing.
    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Runs the search to a terminal state.
    ///
    /// Errors from a single attempt count as "no pick" and never end the
    /// loop early; only the deadline does. An attempt still pending when the
    /// time left runs out is abandoned and also counts as "no pick".
    pub async fn run<S>(&self, source: &S, selectors: &[&str]) -> PollOutcome
    where
        S: CandidateSource + ?Sized,
    {
        let started = self.clock.now();
        let deadline = started + self.settings.deadline;

        let mut state = PollState::Searching;
        let mut attempts = 0u32;
        let mut last_candidates = Vec::new();

        while !state.is_terminal() {
            attempts += 1;

            let remaining = deadline
                .saturating_duration_since(self.clock.now())
                .max(self.settings.interval);

            let attempt = tokio::select! {
                biased;
                result = source.locate_candidates(selectors) => Some(result),
                () = self.clock.sleep(remaining) => None,
            };

            match attempt {
                None => {
                    debug!("Price query attempt {} still pending after {:?}", attempts, remaining);
                }
                Some(Ok(raw)) => {
                    if let Some(candidate) = pick_price(&raw) {
                        debug!(
                            "Picked {} ({}) on attempt {}",
                            candidate.value, candidate.color_class, attempts
                        );
                        state = PollState::Found(candidate);
                    }
                    last_candidates = raw;
                }
                Some(Err(e)) => {
                    debug!("Price query attempt {} failed: {:#}", attempts, e);
                }
            }

            if state.is_terminal() {
                break;
            }

            if self.clock.now() >= deadline {
                state = PollState::TimedOut;
            } else {
                self.clock.sleep(self.settings.interval).await;
            }
        }

        let elapsed = self.clock.now().duration_since(started);
        if state == PollState::TimedOut {
            debug!("No price after {} attempts ({:?})", attempts, elapsed);
        }

        PollOutcome { state, attempts, last_candidates, elapsed }
    }
}
