//! Profile store interface and an in-memory implementation

use crate::error::StoreError;
use crate::model::{CheckWatchlistResponse, Profile, WatchlistEntry};
use crate::provider::AnalysisProvider;
use crate::verdict::classify;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// CRUD for profiles plus bulk evaluation of a profile's watchlist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    async fn get_profile(&self, id: &str) -> Result<Profile, StoreError>;

    async fn create_profile(&self, name: &str) -> Result<Profile, StoreError>;

    async fn delete_profile(&self, id: &str) -> Result<(), StoreError>;

    /// Apply removals and additions, returning the canonical profile afterwards
    async fn update_tickers(
        &self,
        id: &str,
        add: Option<Vec<String>>,
        remove: Option<Vec<String>>,
    ) -> Result<Profile, StoreError>;

    async fn check_watchlist(&self, id: &str) -> Result<CheckWatchlistResponse, StoreError>;
}

/// Non-persistent store used by tests and offline runs
///
/// Bulk evaluation runs every ticker through the configured
/// [`AnalysisProvider`]; without one, checks report the store as unreachable.
pub struct InMemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
    evaluator: Option<Arc<dyn AnalysisProvider>>,
    reachable: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(Vec::new()),
            evaluator: None,
            reachable: AtomicBool::new(true),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn AnalysisProvider>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_profiles(self, profiles: Vec<Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
            ..self
        }
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<(), StoreError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unreachable(
                "profile store is not reachable".to_string(),
            ))
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(tickers: Option<Vec<String>>) -> Vec<String> {
    tickers
        .unwrap_or_default()
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.ensure_reachable()?;
        Ok(self.profiles.read().await.clone())
    }

    async fn get_profile(&self, id: &str) -> Result<Profile, StoreError> {
        self.ensure_reachable()?;
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_profile(&self, name: &str) -> Result<Profile, StoreError> {
        self.ensure_reachable()?;
        let profile = Profile::new(uuid::Uuid::new_v4().to_string(), name);
        self.profiles.write().await.push(profile.clone());
        tracing::debug!(id = %profile.id, name = %profile.name, "profile created");
        Ok(profile)
    }

    async fn delete_profile(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_reachable()?;
        let mut profiles = self.profiles.write().await;
        let pos = profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        profiles.remove(pos);
        Ok(())
    }

    async fn update_tickers(
        &self,
        id: &str,
        add: Option<Vec<String>>,
        remove: Option<Vec<String>>,
    ) -> Result<Profile, StoreError> {
        self.ensure_reachable()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let remove = normalized(remove);
        profile.tickers.retain(|t| !remove.contains(t));
        for ticker in normalized(add) {
            if !profile.contains(&ticker) {
                profile.tickers.push(ticker);
            }
        }
        Ok(profile.clone())
    }

    async fn check_watchlist(&self, id: &str) -> Result<CheckWatchlistResponse, StoreError> {
        let profile = self.get_profile(id).await?;
        let evaluator = self.evaluator.as_ref().ok_or_else(|| {
            StoreError::Unreachable("no analysis provider configured".to_string())
        })?;

        let outcomes = join_all(
            profile
                .tickers
                .iter()
                .map(|ticker| async move { (ticker, evaluator.analyze(ticker).await) }),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(analysis) => results.push(WatchlistEntry {
                    ticker: ticker.clone(),
                    verdict: analysis.verdict.verdict,
                    confidence_score: analysis.verdict.confidence_score,
                }),
                Err(err) => {
                    tracing::warn!(%ticker, error = %err, "watchlist evaluation failed");
                    failed.push(ticker.clone());
                }
            }
        }
        if !failed.is_empty() {
            return Err(StoreError::PartialEvaluation { failed });
        }

        let good_to_invest = results
            .iter()
            .filter(|r| classify(r.verdict.as_deref()).is_buy())
            .map(|r| r.ticker.clone())
            .collect();
        Ok(CheckWatchlistResponse {
            results,
            good_to_invest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::{AnalysisResult, VerdictData};
    use crate::provider::MockAnalysisProvider;

    fn verdict_for(ticker: &str) -> Result<AnalysisResult, ProviderError> {
        let label = match ticker {
            "AAPL" => "BUY",
            "TSLA" => "SELL",
            "FAIL" => return Err(ProviderError::new("upstream down")),
            _ => "HOLD",
        };
        Ok(AnalysisResult {
            verdict: VerdictData {
                verdict: Some(label.to_string()),
                confidence_score: 70.0,
                ..VerdictData::default()
            },
            ..AnalysisResult::default()
        })
    }

    fn evaluator() -> Arc<dyn AnalysisProvider> {
        let mut provider = MockAnalysisProvider::new();
        provider.expect_analyze().returning(|t| verdict_for(t));
        Arc::new(provider)
    }

    #[tokio::test]
    async fn test_update_tickers_normalizes_and_dedupes() {
        let store = InMemoryProfileStore::new();
        let profile = store.create_profile("Tech").await.unwrap();

        let updated = store
            .update_tickers(&profile.id, Some(vec!["aapl".into(), " MSFT ".into(), "AAPL".into()]), None)
            .await
            .unwrap();
        assert_eq!(updated.tickers, vec!["AAPL", "MSFT"]);

        let updated = store
            .update_tickers(&profile.id, Some(vec!["NVDA".into()]), Some(vec!["aapl".into()]))
            .await
            .unwrap();
        assert_eq!(updated.tickers, vec!["MSFT", "NVDA"]);
        assert_eq!(store.get_profile(&profile.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = InMemoryProfileStore::new();
        assert_eq!(
            store.delete_profile("nope").await,
            Err(StoreError::NotFound("nope".to_string()))
        );
        assert!(matches!(
            store.update_tickers("nope", None, None).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let store = InMemoryProfileStore::new();
        store.set_reachable(false);
        assert!(matches!(store.list_profiles().await, Err(StoreError::Unreachable(_))));
        store.set_reachable(true);
        assert!(store.list_profiles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_watchlist_keeps_watchlist_order() {
        let store = InMemoryProfileStore::new()
            .with_evaluator(evaluator())
            .with_profiles(vec![Profile::new("p1", "Mixed").with_tickers(["TSLA", "AAPL", "KO"])]);

        let response = store.check_watchlist("p1").await.unwrap();
        let tickers: Vec<_> = response.results.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["TSLA", "AAPL", "KO"]);
        assert_eq!(response.good_to_invest, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_check_watchlist_partial_failure_is_total() {
        let store = InMemoryProfileStore::new()
            .with_evaluator(evaluator())
            .with_profiles(vec![Profile::new("p1", "Shaky").with_tickers(["AAPL", "FAIL"])]);

        assert_eq!(
            store.check_watchlist("p1").await,
            Err(StoreError::PartialEvaluation {
                failed: vec!["FAIL".to_string()]
            })
        );
    }

    #[tokio::test]
    async fn test_check_without_evaluator() {
        let store = InMemoryProfileStore::new()
            .with_profiles(vec![Profile::new("p1", "Empty")]);
        assert!(matches!(
            store.check_watchlist("p1").await,
            Err(StoreError::Unreachable(_))
        ));
    }
}
