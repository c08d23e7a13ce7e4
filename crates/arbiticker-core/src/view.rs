//! Display-ready views over analysis results, sessions and watchlists
//!
//! Views are plain data: every coercion, clamp and segmentation happens
//! here so formatters only lay text out.

use crate::model::{AnalysisResult, CheckWatchlistResponse, QuantData, VerdictData};
use crate::normalizer::{NOT_AVAILABLE, Segment, segment_bulleted, segment_paragraphs};
use crate::session::{Session, SessionStatus};
use crate::verdict::{Verdict, clamp_confidence, classify};
use serde::Serialize;

pub const REVENUE_GROWTH_LABEL: &str = "Revenue growth YoY %";
pub const EPS_GROWTH_LABEL: &str = "EPS growth %";
pub const VOLATILITY_LABEL: &str = "Volatility (ann.)";

/// Quantitative metrics coerced to numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuantView {
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub return_30d_pct: Option<f64>,
    pub revenue_growth_yoy_pct: Option<f64>,
    pub eps_growth_pct: Option<f64>,
    pub volatility_proxy: Option<f64>,
}

/// One bar of the growth/volatility chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthBar {
    pub label: &'static str,
    pub value: f64,
}

impl From<&QuantData> for QuantView {
    fn from(quant: &QuantData) -> Self {
        Self {
            current_price: quant.number("current_price"),
            pe_ratio: quant.number("pe_ratio"),
            market_cap: quant.number("market_cap"),
            return_30d_pct: quant.number("return_30d_pct"),
            revenue_growth_yoy_pct: quant.number("revenue_growth_yoy_pct"),
            eps_growth_pct: quant.number("eps_growth_pct"),
            volatility_proxy: quant.number("volatility_proxy"),
        }
    }
}

impl QuantView {
    pub fn pe_display(&self) -> String {
        self.pe_ratio
            .map_or_else(|| NOT_AVAILABLE.to_string(), |pe| format!("{pe:.1}"))
    }

    /// Market cap in billions, e.g. `$2950.0B`
    pub fn market_cap_display(&self) -> String {
        self.market_cap.map_or_else(
            || NOT_AVAILABLE.to_string(),
            |cap| format!("${:.1}B", cap / 1e9),
        )
    }

    /// 30-day return with an explicit `+` for gains
    pub fn return_30d_display(&self) -> String {
        match self.return_30d_pct {
            Some(ret) if ret > 0.0 => format!("+{ret:.2}%"),
            Some(ret) => format!("{ret:.2}%"),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn price_display(&self) -> String {
        self.current_price
            .map_or_else(|| NOT_AVAILABLE.to_string(), |p| format!("{p:.2}"))
    }

    /// Bars for revenue growth, EPS growth and annualised volatility
    ///
    /// Missing values count as zero. Zero-valued growth bars are dropped;
    /// the volatility bar is always present.
    pub fn growth_bars(&self) -> Vec<GrowthBar> {
        let bars = [
            GrowthBar {
                label: REVENUE_GROWTH_LABEL,
                value: self.revenue_growth_yoy_pct.unwrap_or(0.0),
            },
            GrowthBar {
                label: EPS_GROWTH_LABEL,
                value: self.eps_growth_pct.unwrap_or(0.0),
            },
            GrowthBar {
                label: VOLATILITY_LABEL,
                value: self.volatility_proxy.map_or(0.0, |v| v * 100.0),
            },
        ];
        bars.into_iter()
            .filter(|bar| bar.value != 0.0 || bar.label == VOLATILITY_LABEL)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictView {
    /// Label as received, or the category name when none was sent
    pub label: String,
    pub category: Verdict,
    pub confidence: f64,
    pub justification: Vec<String>,
    pub confidence_basis: String,
}

impl From<&VerdictData> for VerdictView {
    fn from(verdict: &VerdictData) -> Self {
        let category = classify(verdict.verdict.as_deref());
        Self {
            label: verdict
                .verdict
                .clone()
                .unwrap_or_else(|| category.as_str().to_string()),
            category,
            confidence: clamp_confidence(verdict.confidence_score),
            justification: verdict.justification.clone(),
            confidence_basis: verdict.confidence_basis.clone(),
        }
    }
}

/// Everything shown for a finished analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub bear: Vec<Segment>,
    pub bull: Vec<String>,
    pub quant: QuantView,
    pub verdict: VerdictView,
}

impl From<&AnalysisResult> for AnalysisView {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            bear: segment_bulleted(&result.bear_output),
            bull: segment_paragraphs(&result.bull_output),
            quant: QuantView::from(&result.quant_data),
            verdict: VerdictView::from(&result.verdict),
        }
    }
}

/// Screen state of the single-ticker analysis area
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionView {
    Idle,
    Loading { ticker: String },
    Failed { ticker: String, message: String },
    Ready { ticker: String, analysis: Box<AnalysisView> },
    /// A ticker was recorded but there is nothing to show yet
    Empty { ticker: String },
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let Some(ticker) = session.ticker().map(ToString::to_string) else {
            return Self::Idle;
        };
        match (session.status(), session.result(), session.error_message()) {
            (SessionStatus::Idle, _, _) => Self::Idle,
            (SessionStatus::Running, _, _) => Self::Loading { ticker },
            (SessionStatus::Failed, _, Some(message)) => Self::Failed {
                ticker,
                message: message.to_string(),
            },
            (SessionStatus::Succeeded, Some(result), _) => Self::Ready {
                ticker,
                analysis: Box::new(AnalysisView::from(result)),
            },
            _ => Self::Empty { ticker },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistRow {
    pub ticker: String,
    pub label: String,
    pub category: Verdict,
    pub confidence: f64,
}

/// Batch result rows in response order plus the BUY subset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistView {
    pub rows: Vec<WatchlistRow>,
    pub good_to_invest: Vec<String>,
}

impl From<&CheckWatchlistResponse> for WatchlistView {
    fn from(response: &CheckWatchlistResponse) -> Self {
        let rows = response
            .results
            .iter()
            .map(|entry| {
                let category = classify(entry.verdict.as_deref());
                WatchlistRow {
                    ticker: entry.ticker.clone(),
                    label: entry
                        .verdict
                        .clone()
                        .unwrap_or_else(|| category.as_str().to_string()),
                    category,
                    confidence: clamp_confidence(entry.confidence_score),
                }
            })
            .collect();
        Self {
            rows,
            good_to_invest: response.good_to_invest.clone(),
        }
    }
}
