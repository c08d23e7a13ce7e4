//! Analysis provider interface

use crate::error::ProviderError;
use crate::model::AnalysisResult;
use async_trait::async_trait;

/// Runs the multi-agent analysis pipeline for a single ticker
///
/// Timeouts and retries are the implementation's concern; the session
/// only sees the final outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, ticker: &str) -> Result<AnalysisResult, ProviderError>;
}
