//! Data model shared by the session, the reconciler and the collaborators

use crate::error::ValidationError;
use crate::normalizer::coerce_numeric;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A score as the agents send it: number, numeric string, placeholder or
/// null. Anything that does not coerce to a finite number reads as 0.
fn loose_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<MetricValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_numeric).unwrap_or_default())
}

/// `null` reads as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trim and upper-case a ticker typed by a user
pub fn normalize_ticker(raw: &str) -> Result<String, ValidationError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ValidationError::EmptyTicker);
    }
    Ok(ticker)
}

/// A named watchlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tickers: Vec<String>,
}

impl Profile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tickers: Vec::new(),
        }
    }

    pub fn with_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers = tickers.into_iter().map(Into::into).collect();
        self
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }
}

/// A single quantitative metric as emitted by the agents: usually a number,
/// sometimes a placeholder such as `"N/A"`, occasionally something else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Named quantitative metrics for one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantData(pub BTreeMap<String, MetricValue>);

impl QuantData {
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    /// The metric coerced to a finite number, if possible
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(coerce_numeric)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

/// Final recommendation produced by the judging agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictData {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default, deserialize_with = "loose_score")]
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub justification: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence_basis: String,
}

/// Output of one multi-agent analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bear_output: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bull_output: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quant_data: QuantData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verdict: VerdictData,
}

/// One row of a bulk watchlist evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default, deserialize_with = "loose_score")]
    pub confidence_score: f64,
}

/// Result of evaluating every ticker of a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckWatchlistResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<WatchlistEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub good_to_invest: Vec<String>,
}

impl CheckWatchlistResponse {
    /// Drop every trace of `ticker`
    pub fn remove_ticker(&mut self, ticker: &str) {
        self.results.retain(|r| r.ticker != ticker);
        self.good_to_invest.retain(|t| t != ticker);
    }

    /// Keep only rows whose ticker is in `tickers`
    pub fn retain_tickers(&mut self, tickers: &[String]) {
        self.results.retain(|r| tickers.contains(&r.ticker));
        self.good_to_invest.retain(|t| tickers.contains(t));
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.good_to_invest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  amd ").unwrap(), "AMD");
        assert_eq!(normalize_ticker(" \t"), Err(ValidationError::EmptyTicker));
    }

    #[test]
    fn test_analysis_result_from_agent_json() {
        let raw = serde_json::json!({
            "bear_output": "* Margin pressure",
            "bull_output": "Strong demand.",
            "quant_data": {
                "current_price": 182.5,
                "pe_ratio": "N/A",
                "market_cap": "2950000000000",
                "sector": null
            },
            "verdict": {
                "verdict": "BUY",
                "confidence_score": 72,
                "justification": ["Growth", "Cash flow"],
                "confidence_basis": "Consensus of agents"
            }
        });

        let result: AnalysisResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.quant_data.number("current_price"), Some(182.5));
        assert_eq!(result.quant_data.number("pe_ratio"), None);
        assert_eq!(result.quant_data.number("market_cap"), Some(2.95e12));
        assert_eq!(
            result.quant_data.get("sector"),
            Some(&MetricValue::Other(serde_json::Value::Null))
        );
        assert_eq!(result.verdict.verdict.as_deref(), Some("BUY"));
        assert_eq!(result.verdict.justification.len(), 2);
    }

    #[test]
    fn test_verdict_tolerates_missing_fields() {
        let verdict: VerdictData = serde_json::from_str("{}").unwrap();
        assert_eq!(verdict.verdict, None);
        assert_eq!(verdict.confidence_score, 0.0);
    }

    #[test]
    fn test_verdict_accepts_loosely_typed_fields() {
        let verdict: VerdictData = serde_json::from_value(serde_json::json!({
            "verdict": "BUY",
            "confidence_score": "72",
            "justification": null,
            "confidence_basis": null
        }))
        .unwrap();
        assert_eq!(verdict.confidence_score, 72.0);
        assert!(verdict.justification.is_empty());
        assert!(verdict.confidence_basis.is_empty());

        for score in [serde_json::json!("N/A"), serde_json::Value::Null, serde_json::json!("high")] {
            let verdict: VerdictData =
                serde_json::from_value(serde_json::json!({ "confidence_score": score })).unwrap();
            assert_eq!(verdict.confidence_score, 0.0);
        }
    }

    #[test]
    fn test_analysis_result_with_null_sections() {
        let result: AnalysisResult = serde_json::from_value(serde_json::json!({
            "bear_output": null,
            "bull_output": "Strong demand.",
            "quant_data": null,
            "verdict": { "verdict": "HOLD", "confidence_score": " 55.5 " }
        }))
        .unwrap();
        assert!(result.bear_output.is_empty());
        assert_eq!(result.bull_output, "Strong demand.");
        assert!(result.quant_data.0.is_empty());
        assert_eq!(result.verdict.confidence_score, 55.5);
    }

    #[test]
    fn test_watchlist_rows_accept_placeholder_scores() {
        let response: CheckWatchlistResponse = serde_json::from_value(serde_json::json!({
            "results": [
                { "ticker": "AAPL", "verdict": "BUY", "confidence_score": "N/A" },
                { "ticker": "MSFT", "verdict": "HOLD", "confidence_score": "61" },
                { "ticker": "NVDA", "verdict": null, "confidence_score": null }
            ],
            "good_to_invest": null
        }))
        .unwrap();
        let scores: Vec<_> = response.results.iter().map(|r| r.confidence_score).collect();
        assert_eq!(scores, vec![0.0, 61.0, 0.0]);
        assert!(response.good_to_invest.is_empty());
    }

    #[test]
    fn test_prune_check_response() {
        let mut response = CheckWatchlistResponse {
            results: vec![
                WatchlistEntry {
                    ticker: "AAPL".into(),
                    verdict: Some("BUY".into()),
                    confidence_score: 80.0,
                },
                WatchlistEntry {
                    ticker: "MSFT".into(),
                    verdict: Some("HOLD".into()),
                    confidence_score: 55.0,
                },
            ],
            good_to_invest: vec!["AAPL".into()],
        };

        response.remove_ticker("AAPL");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].ticker, "MSFT");
        assert!(response.good_to_invest.is_empty());

        response.retain_tickers(&[]);
        assert!(response.is_empty());
    }
}
