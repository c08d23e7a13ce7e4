//! Verdict classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of a confidence score
pub const MIN_CONFIDENCE: f64 = 0.0;
/// Upper bound of a confidence score
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Presentation category of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Buy,
    Hold,
    Sell,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a verdict label to its category.
///
/// Matching is case-sensitive against `BUY`, `HOLD` and `SELL`; anything
/// else, including a missing label, is presented as `HOLD`.
pub fn classify(label: Option<&str>) -> Verdict {
    match label {
        Some("BUY") => Verdict::Buy,
        Some("SELL") => Verdict::Sell,
        _ => Verdict::Hold,
    }
}

/// Clamp a confidence score into `[0, 100]`.
///
/// Callers must pass a normalized number.
pub fn clamp_confidence(score: f64) -> f64 {
    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(Some("BUY")), Verdict::Buy);
        assert_eq!(classify(Some("SELL")), Verdict::Sell);
        assert_eq!(classify(Some("HOLD")), Verdict::Hold);
        assert_eq!(classify(Some("buy")), Verdict::Hold);
        assert_eq!(classify(Some(" BUY")), Verdict::Hold);
        assert_eq!(classify(Some("STRONG BUY")), Verdict::Hold);
        assert_eq!(classify(None), Verdict::Hold);
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(150.0), 100.0);
        assert_eq!(clamp_confidence(-5.0), 0.0);
        assert_eq!(clamp_confidence(42.0), 42.0);
        assert_eq!(clamp_confidence(100.0), 100.0);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Sell.to_string(), "SELL");
        assert!(Verdict::Buy.is_buy());
        assert_eq!(serde_json::to_string(&Verdict::Hold).unwrap(), "\"HOLD\"");
    }
}
