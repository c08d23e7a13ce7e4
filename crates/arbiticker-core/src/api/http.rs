//! REST client for the analysis backend
//!
//! One [`HttpBackend`] serves as both the [`AnalysisProvider`] and the
//! [`ProfileStore`]. Requests are not retried; a 404 maps to
//! [`StoreError::NotFound`] and every other failure to
//! [`StoreError::Unreachable`], carrying the server's `detail` message when
//! it sent one.

use crate::config::CoordinatorConfig;
use crate::error::{ProviderError, Result, StoreError};
use crate::model::{AnalysisResult, CheckWatchlistResponse, Profile};
use crate::provider::AnalysisProvider;
use crate::store::ProfileStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    ticker: &'a str,
}

#[derive(Serialize)]
struct CreateProfileRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct UpdateTickersRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    add: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remove: Option<Vec<String>>,
}

/// HTTP client for the analysis and profile endpoints
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Create a client from the coordinator configuration
    pub fn new(config: &CoordinatorConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base: config.base_url()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `segments` below the base, each segment escaped
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Unreachable(format!("cannot route requests to {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        subject: &str,
    ) -> std::result::Result<Response, StoreError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, %subject, "backend returned an error");
        Err(status_error(status, &body, subject))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: &str,
    ) -> std::result::Result<T, StoreError> {
        self.send(request, subject)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Unreachable(format!("invalid response from backend: {e}")))
    }
}

/// Pull a human-readable `detail` out of an error body
fn detail_of(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn status_error(status: StatusCode, body: &str, subject: &str) -> StoreError {
    if status == StatusCode::NOT_FOUND {
        return StoreError::NotFound(subject.to_string());
    }
    StoreError::Unreachable(detail_of(body).unwrap_or_else(|| format!("HTTP {status}")))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Unreachable(format!("request timed out: {err}"))
    } else {
        StoreError::Unreachable(err.to_string())
    }
}

/// Analysis failures carry the server's `detail`, or nothing
fn analysis_error(status: StatusCode, body: &str) -> ProviderError {
    tracing::debug!(%status, "analysis request failed");
    detail_of(body).map_or_else(ProviderError::opaque, ProviderError::new)
}

#[async_trait]
impl AnalysisProvider for HttpBackend {
    async fn analyze(&self, ticker: &str) -> std::result::Result<AnalysisResult, ProviderError> {
        let url = self
            .endpoint(&["analyze"])
            .map_err(|e| ProviderError::new(e.to_string()))?;
        tracing::debug!(%ticker, %url, "requesting analysis");

        let response = self
            .client
            .post(url)
            .json(&AnalyzeRequest { ticker })
            .send()
            .await
            .map_err(|e| ProviderError::new(transport_error(e).to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(analysis_error(status, &body));
        }
        response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| ProviderError::new(format!("invalid analysis response: {e}")))
    }
}

#[async_trait]
impl ProfileStore for HttpBackend {
    async fn list_profiles(&self) -> std::result::Result<Vec<Profile>, StoreError> {
        let url = self.endpoint(&["profiles"])?;
        self.fetch(self.client.get(url), "profiles").await
    }

    async fn get_profile(&self, id: &str) -> std::result::Result<Profile, StoreError> {
        let url = self.endpoint(&["profiles", id])?;
        self.fetch(self.client.get(url), id).await
    }

    async fn create_profile(&self, name: &str) -> std::result::Result<Profile, StoreError> {
        let url = self.endpoint(&["profiles"])?;
        let request = self.client.post(url).json(&CreateProfileRequest { name });
        self.fetch(request, name).await
    }

    async fn delete_profile(&self, id: &str) -> std::result::Result<(), StoreError> {
        let url = self.endpoint(&["profiles", id])?;
        self.send(self.client.delete(url), id).await?;
        Ok(())
    }

    async fn update_tickers(
        &self,
        id: &str,
        add: Option<Vec<String>>,
        remove: Option<Vec<String>>,
    ) -> std::result::Result<Profile, StoreError> {
        let url = self.endpoint(&["profiles", id, "tickers"])?;
        let request = self
            .client
            .patch(url)
            .json(&UpdateTickersRequest { add, remove });
        self.fetch(request, id).await
    }

    async fn check_watchlist(
        &self,
        id: &str,
    ) -> std::result::Result<CheckWatchlistResponse, StoreError> {
        let url = self.endpoint(&["profiles", id, "check-watchlist"])?;
        self.fetch(self.client.post(url), id).await
    }
}
