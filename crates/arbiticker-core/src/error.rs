//! Error types for analysis and watchlist coordination

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when an analysis failure carries no detail
pub const GENERIC_ANALYSIS_FAILURE: &str = "Analysis failed";

/// Failure reported by an analysis provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderError {
    /// Upstream message, if the failure carried one
    pub message: Option<String>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure without any upstream detail
    pub fn opaque() -> Self {
        Self { message: None }
    }

    /// Human readable message, falling back to a generic one
    pub fn user_message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => GENERIC_ANALYSIS_FAILURE.to_string(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ProviderError {}

/// Failures reported by a profile store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No profile with the given id
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// Backend could not be reached or answered with an unexpected failure
    #[error("{0}")]
    Unreachable(String),

    /// Bulk evaluation failed for some tickers
    #[error("Watchlist check failed for {}", .failed.join(", "))]
    PartialEvaluation { failed: Vec<String> },
}

/// Input rejected before any collaborator is contacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Ticker must not be empty")]
    EmptyTicker,

    #[error("Profile id must not be empty")]
    EmptyProfileId,
}

/// Top-level error for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Analysis error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a failure recorded on a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Provider,
    StoreUnreachable,
    NotFound,
    Validation,
}

/// A failure converted into display form and kept on the component that
/// issued the failing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorNotice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether the backend itself could not be reached
    pub fn is_unreachable(&self) -> bool {
        self.kind == ErrorKind::StoreUnreachable
    }
}

impl std::fmt::Display for ErrorNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&ProviderError> for ErrorNotice {
    fn from(err: &ProviderError) -> Self {
        Self::new(ErrorKind::Provider, err.user_message())
    }
}

impl From<&StoreError> for ErrorNotice {
    fn from(err: &StoreError) -> Self {
        let kind = match err {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Unreachable(_) | StoreError::PartialEvaluation { .. } => {
                ErrorKind::StoreUnreachable
            }
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ValidationError> for ErrorNotice {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, err.to_string())
    }
}
