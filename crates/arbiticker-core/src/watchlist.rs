//! Bulk evaluation of a profile's watchlist

use crate::error::ErrorNotice;
use crate::model::{CheckWatchlistResponse, Profile};
use crate::store::ProfileStore;
use crate::verdict::classify;

/// Holds the latest batch check for the selected profile
#[derive(Debug, Clone, Default)]
pub struct WatchlistEvaluator {
    checking: bool,
    result: Option<CheckWatchlistResponse>,
    error: Option<ErrorNotice>,
}

impl WatchlistEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_checking(&self) -> bool {
        self.checking
    }

    pub fn result(&self) -> Option<&CheckWatchlistResponse> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorNotice> {
        self.error.as_ref()
    }

    /// Evaluate every ticker of `profile`
    ///
    /// Does nothing without a profile. On failure the previous result stays
    /// cleared.
    pub async fn check(&mut self, store: &dyn ProfileStore, profile: Option<&Profile>) -> bool {
        let Some(profile) = profile else {
            return false;
        };

        self.checking = true;
        self.result = None;
        self.error = None;
        tracing::info!(profile = %profile.id, tickers = profile.tickers.len(), "checking watchlist");

        let outcome = store.check_watchlist(&profile.id).await;
        self.checking = false;

        match outcome {
            Ok(response) => {
                self.result = Some(derive_good_to_invest(response, profile));
                true
            }
            Err(err) => {
                tracing::warn!(profile = %profile.id, error = %err, "watchlist check failed");
                self.error = Some(ErrorNotice::from(&err));
                false
            }
        }
    }

    /// Forget everything about the previous profile
    pub fn reset(&mut self) {
        self.checking = false;
        self.result = None;
        self.error = None;
    }

    /// Drop a removed ticker from the cached result
    pub fn prune(&mut self, ticker: &str) {
        if let Some(result) = self.result.as_mut() {
            result.remove_ticker(ticker);
        }
    }

    /// Keep only tickers still on the watchlist
    pub fn retain(&mut self, tickers: &[String]) {
        if let Some(result) = self.result.as_mut() {
            result.retain_tickers(tickers);
        }
    }

    pub(crate) fn set_error(&mut self, error: ErrorNotice) {
        self.error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Drop rows for tickers outside the profile and recompute the BUY subset
/// from the rows themselves, in row order
fn derive_good_to_invest(
    mut response: CheckWatchlistResponse,
    profile: &Profile,
) -> CheckWatchlistResponse {
    let before = response.results.len();
    response.results.retain(|r| profile.contains(&r.ticker));
    if response.results.len() != before {
        tracing::warn!(
            profile = %profile.id,
            dropped = before - response.results.len(),
            "dropping results for tickers not on the watchlist"
        );
    }

    let mut good = Vec::new();
    for entry in &response.results {
        if classify(entry.verdict.as_deref()).is_buy() && !good.contains(&entry.ticker) {
            good.push(entry.ticker.clone());
        }
    }
    if good != response.good_to_invest {
        tracing::debug!(reported = ?response.good_to_invest, derived = ?good, "good-to-invest set re-derived");
    }
    response.good_to_invest = good;
    response
}
