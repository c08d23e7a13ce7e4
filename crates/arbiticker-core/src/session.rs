//! Single-ticker analysis session
//!
//! One live [`Session`] moves through `Idle -> Running -> Succeeded | Failed`
//! and back to `Running` whenever a new analysis starts. Every start issues
//! a new request id; an outcome is only applied while its id is the latest
//! one issued, so a slow response for an older ticker can never overwrite
//! the state of a newer one.

use crate::error::{ProviderError, ValidationError};
use crate::model::{AnalysisResult, normalize_ticker};
use crate::provider::AnalysisProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Lifecycle state of the current single-ticker analysis
///
/// Fields are private so a settled session never carries both a result and
/// an error message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    ticker: Option<String>,
    status: SessionStatus,
    result: Option<Arc<AnalysisResult>>,
    error_message: Option<String>,
    request_id: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Id of the latest request issued (0 before the first one)
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Running
    }

    fn begin(&mut self, ticker: String) -> u64 {
        self.request_id += 1;
        self.ticker = Some(ticker);
        self.status = SessionStatus::Running;
        self.result = None;
        self.error_message = None;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        self.request_id
    }

    fn settle(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult, ProviderError>,
    ) -> Settlement {
        if ticket.request_id != self.request_id || self.status != SessionStatus::Running {
            return Settlement::Superseded;
        }
        match outcome {
            Ok(result) => {
                self.status = SessionStatus::Succeeded;
                self.result = Some(Arc::new(result));
                self.error_message = None;
            }
            Err(err) => {
                self.status = SessionStatus::Failed;
                self.result = None;
                self.error_message = Some(err.user_message());
            }
        }
        self.finished_at = Some(Utc::now());
        Settlement::Applied
    }
}

/// Handle for one issued analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub request_id: u64,
    pub ticker: String,
}

/// What happened to a provider outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The outcome now drives the session
    Applied,
    /// A newer request was started; the outcome was discarded
    Superseded,
}

/// Owner of the live session
///
/// State lives in a `watch` channel: every transition notifies subscribers,
/// which is how a view layer knows to re-render.
pub struct SessionController {
    provider: Arc<dyn AnalysisProvider>,
    state: watch::Sender<Session>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            state: watch::Sender::new(Session::default()),
        }
    }

    /// Current session state
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Move to `Running` for `ticker` and issue a new request id
    pub fn begin(&self, ticker: &str) -> Result<AnalysisTicket, ValidationError> {
        let ticker = normalize_ticker(ticker)?;
        let mut request_id = 0;
        self.state
            .send_modify(|session| request_id = session.begin(ticker.clone()));
        let ticket = AnalysisTicket { request_id, ticker };
        tracing::info!(ticker = %ticket.ticker, request_id = ticket.request_id, "analysis started");
        Ok(ticket)
    }

    /// Apply a provider outcome if `ticket` is still the latest request
    pub fn settle(
        &self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult, ProviderError>,
    ) -> Settlement {
        let failed = outcome.is_err();
        let mut settlement = Settlement::Superseded;
        self.state.send_if_modified(|session| {
            settlement = session.settle(ticket, outcome);
            settlement == Settlement::Applied
        });

        match settlement {
            Settlement::Applied if failed => {
                tracing::warn!(ticker = %ticket.ticker, request_id = ticket.request_id, "analysis failed");
            }
            Settlement::Applied => {
                tracing::info!(ticker = %ticket.ticker, request_id = ticket.request_id, "analysis succeeded");
            }
            Settlement::Superseded => {
                tracing::debug!(
                    ticker = %ticket.ticker,
                    request_id = ticket.request_id,
                    "discarding outcome of superseded analysis"
                );
            }
        }
        settlement
    }

    /// Start an analysis and wait for its outcome
    ///
    /// Calls may overlap; only the most recently started one is reflected
    /// in the session once everything settles.
    pub async fn start_analysis(&self, ticker: &str) -> Result<Settlement, ValidationError> {
        let ticket = self.begin(ticker)?;
        let outcome = self.provider.analyze(&ticket.ticker).await;
        Ok(self.settle(&ticket, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VerdictData;
    use crate::provider::MockAnalysisProvider;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    fn analysis(label: &str) -> AnalysisResult {
        AnalysisResult {
            bull_output: format!("{label} bull"),
            verdict: VerdictData {
                verdict: Some("BUY".to_string()),
                ..VerdictData::default()
            },
            ..AnalysisResult::default()
        }
    }

    /// Provider whose latency depends on the ticker
    struct DelayedProvider {
        delays: HashMap<&'static str, u64>,
    }

    #[async_trait]
    impl AnalysisProvider for DelayedProvider {
        async fn analyze(&self, ticker: &str) -> Result<AnalysisResult, ProviderError> {
            let millis = self.delays.get(ticker).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(millis)).await;
            if ticker == "BAD" {
                return Err(ProviderError::new("bad ticker"));
            }
            Ok(analysis(ticker))
        }
    }

    fn delayed(delays: &[(&'static str, u64)]) -> SessionController {
        SessionController::new(Arc::new(DelayedProvider {
            delays: delays.iter().copied().collect(),
        }))
    }

    #[tokio::test]
    async fn test_success_path() {
        let mut provider = MockAnalysisProvider::new();
        provider
            .expect_analyze()
            .withf(|t| t == "AMD")
            .times(1)
            .returning(|t| Ok(analysis(t)));
        let controller = SessionController::new(Arc::new(provider));
        assert_eq!(controller.snapshot().status(), SessionStatus::Idle);

        let settlement = controller.start_analysis("  amd ").await.unwrap();
        assert_eq!(settlement, Settlement::Applied);

        let session = controller.snapshot();
        assert_eq!(session.ticker(), Some("AMD"));
        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.result().unwrap().bull_output, "AMD bull");
        assert_eq!(session.error_message(), None);
        assert!(session.finished_at().is_some());
    }

    #[tokio::test]
    async fn test_failure_uses_generic_message() {
        let mut provider = MockAnalysisProvider::new();
        provider
            .expect_analyze()
            .returning(|_| Err(ProviderError::opaque()));
        let controller = SessionController::new(Arc::new(provider));

        controller.start_analysis("NVDA").await.unwrap();
        let session = controller.snapshot();
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.error_message(), Some("Analysis failed"));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected_before_provider() {
        let controller = SessionController::new(Arc::new(MockAnalysisProvider::new()));
        assert_eq!(
            controller.start_analysis("   ").await,
            Err(ValidationError::EmptyTicker)
        );
        assert_eq!(controller.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn test_new_start_clears_previous_outcome() {
        let controller = delayed(&[]);
        controller.start_analysis("BAD").await.unwrap();
        assert_eq!(controller.snapshot().error_message(), Some("bad ticker"));

        let ticket = controller.begin("MSFT").unwrap();
        let session = controller.snapshot();
        assert_eq!(session.status(), SessionStatus::Running);
        assert!(session.is_loading());
        assert_eq!(session.error_message(), None);
        assert!(session.result().is_none());
        assert_eq!(session.request_id(), ticket.request_id);
    }

    #[tokio::test]
    async fn test_late_response_for_older_ticker_is_discarded() {
        let controller = delayed(&[("AAPL", 60), ("MSFT", 5)]);

        let (first, second) = tokio::join!(
            controller.start_analysis("AAPL"),
            controller.start_analysis("MSFT"),
        );
        assert_eq!(first.unwrap(), Settlement::Superseded);
        assert_eq!(second.unwrap(), Settlement::Applied);

        let session = controller.snapshot();
        assert_eq!(session.ticker(), Some("MSFT"));
        assert_eq!(session.result().unwrap().bull_output, "MSFT bull");
    }

    #[tokio::test]
    async fn test_early_response_for_older_ticker_is_discarded() {
        let controller = delayed(&[("AAPL", 5), ("MSFT", 40)]);

        let (first, second) = tokio::join!(
            controller.start_analysis("AAPL"),
            async {
                tokio::task::yield_now().await;
                controller.start_analysis("MSFT").await
            },
        );
        assert_eq!(first.unwrap(), Settlement::Superseded);
        assert_eq!(second.unwrap(), Settlement::Applied);
        assert_eq!(controller.snapshot().ticker(), Some("MSFT"));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_touch_newer_session() {
        let controller = delayed(&[]);
        let old = controller.begin("BAD").unwrap();
        let new = controller.begin("KO").unwrap();

        let settlement = controller.settle(&old, Err(ProviderError::new("boom")));
        assert_eq!(settlement, Settlement::Superseded);
        assert_eq!(controller.snapshot().status(), SessionStatus::Running);

        controller.settle(&new, Ok(analysis("KO")));
        assert_eq!(controller.snapshot().status(), SessionStatus::Succeeded);
        assert_eq!(controller.settle(&new, Ok(analysis("KO"))), Settlement::Superseded);
    }

    #[tokio::test]
    async fn test_only_latest_of_three_starts_applies() {
        let controller = delayed(&[]);
        let first = controller.begin("AAPL").unwrap();
        let second = controller.begin("BAD").unwrap();
        let third = controller.begin("MSFT").unwrap();

        assert_eq!(controller.settle(&third, Ok(analysis("MSFT"))), Settlement::Applied);
        assert_eq!(
            controller.settle(&second, Err(ProviderError::new("bad ticker"))),
            Settlement::Superseded
        );
        assert_eq!(controller.settle(&first, Ok(analysis("AAPL"))), Settlement::Superseded);

        let session = controller.snapshot();
        assert_eq!(session.ticker(), Some("MSFT"));
        assert_eq!(session.status(), SessionStatus::Succeeded);
        assert_eq!(session.error_message(), None);
        assert_eq!(session.result().unwrap().bull_output, "MSFT bull");
    }

    #[tokio::test]
    async fn test_latest_failure_wins_over_older_successes() {
        let controller = delayed(&[("AAPL", 50), ("MSFT", 30), ("BAD", 5)]);

        let (first, second, third) = tokio::join!(
            controller.start_analysis("AAPL"),
            controller.start_analysis("MSFT"),
            controller.start_analysis("BAD"),
        );
        assert_eq!(first.unwrap(), Settlement::Superseded);
        assert_eq!(second.unwrap(), Settlement::Superseded);
        assert_eq!(third.unwrap(), Settlement::Applied);

        let session = controller.snapshot();
        assert_eq!(session.ticker(), Some("BAD"));
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.error_message(), Some("bad ticker"));
        assert!(session.result().is_none());
        assert_eq!(session.request_id(), 3);
    }

    #[tokio::test]
    async fn test_repeated_ticker_reruns() {
        let controller = delayed(&[]);
        controller.start_analysis("AAPL").await.unwrap();
        controller.start_analysis("AAPL").await.unwrap();
        let session = controller.snapshot();
        assert_eq!(session.request_id(), 2);
        assert_eq!(session.status(), SessionStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let controller = delayed(&[]);
        let mut rx = controller.subscribe();

        let ticket = controller.begin("AAPL").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status(), SessionStatus::Running);

        controller.settle(&ticket, Ok(analysis("AAPL")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status(), SessionStatus::Succeeded);
    }
}
