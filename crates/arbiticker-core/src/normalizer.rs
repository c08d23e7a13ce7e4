//! Normalization of loosely structured agent output
//!
//! Agents return quantitative fields that may be numbers, numeric strings or
//! placeholders, and prose that is either a bullet list or a run of
//! paragraphs. Everything here is a pure function of its input.

use crate::model::MetricValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Placeholder agents emit for unavailable metrics
pub const NOT_AVAILABLE: &str = "N/A";

static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[*+]\s*").expect("valid bullet regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n\s*\n").expect("valid paragraph regex"));

/// Coerce a metric into a finite number
///
/// Numbers pass through when finite, strings other than the `N/A`
/// placeholder are parsed, everything else is absent.
pub fn coerce_numeric(value: &MetricValue) -> Option<f64> {
    match value {
        MetricValue::Number(n) => n.is_finite().then_some(*n),
        MetricValue::Text(s) if s != NOT_AVAILABLE => {
            s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
        }
        MetricValue::Text(_) => None,
        MetricValue::Other(serde_json::Value::Number(n)) => n.as_f64().filter(|n| n.is_finite()),
        MetricValue::Other(_) => None,
    }
}

/// How freeform text should be split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentMode {
    /// One item per line, `*`/`+` lines are bullets
    Bulleted,
    /// Blocks separated by blank lines
    Paragraph,
}

/// One line of bulleted output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// `false` for heading/emphasis lines that had no marker
    pub is_bullet: bool,
}

impl Segment {
    pub fn bullet(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bullet: true,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bullet: false,
        }
    }
}

/// Output of [`segment_text`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segments {
    Bulleted(Vec<Segment>),
    Paragraphs(Vec<String>),
}

impl Segments {
    pub fn len(&self) -> usize {
        match self {
            Self::Bulleted(items) => items.len(),
            Self::Paragraphs(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `content` according to `mode`
pub fn segment_text(content: &str, mode: SegmentMode) -> Segments {
    match mode {
        SegmentMode::Bulleted => Segments::Bulleted(segment_bulleted(content)),
        SegmentMode::Paragraph => Segments::Paragraphs(segment_paragraphs(content)),
    }
}

/// Split into lines, classifying `*`/`+` lines as bullets
pub fn segment_bulleted(content: &str) -> Vec<Segment> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let is_bullet = BULLET_MARKER.is_match(line);
            let text = BULLET_MARKER.replace(line, "");
            let text = text.trim();
            (!text.is_empty()).then(|| Segment {
                text: text.to_string(),
                is_bullet,
            })
        })
        .collect()
}

/// Split on blank lines into trimmed, non-empty paragraphs
pub fn segment_paragraphs(content: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(content)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&MetricValue::from("N/A")), None);
        assert_eq!(coerce_numeric(&MetricValue::from("12.5")), Some(12.5));
        assert_eq!(coerce_numeric(&MetricValue::from(7.0)), Some(7.0));
        assert_eq!(coerce_numeric(&MetricValue::from("abc")), None);
        assert_eq!(coerce_numeric(&MetricValue::from(f64::NAN)), None);
        assert_eq!(coerce_numeric(&MetricValue::from(f64::INFINITY)), None);
        assert_eq!(coerce_numeric(&MetricValue::from("inf")), None);
        assert_eq!(coerce_numeric(&MetricValue::from(" -3 ")), Some(-3.0));
    }

    #[test]
    fn test_coerce_other_values() {
        assert_eq!(
            coerce_numeric(&MetricValue::Other(serde_json::Value::Bool(true))),
            None
        );
        assert_eq!(
            coerce_numeric(&MetricValue::Other(serde_json::json!([1, 2]))),
            None
        );
        assert_eq!(
            coerce_numeric(&MetricValue::Other(serde_json::json!(4))),
            Some(4.0)
        );
    }

    #[test]
    fn test_segment_bulleted() {
        let segments = segment_bulleted("* a\n+ b\nHeader\n");
        assert_eq!(
            segments,
            vec![Segment::bullet("a"), Segment::bullet("b"), Segment::heading("Header")]
        );
    }

    #[test]
    fn test_segment_bulleted_drops_empty_items() {
        let segments = segment_bulleted("\n   * \n**Risks**\n  +   Debt load  \n\n");
        assert_eq!(
            segments,
            vec![Segment::bullet("*Risks**"), Segment::bullet("Debt load")]
        );
    }

    #[test]
    fn test_segment_paragraphs() {
        assert_eq!(
            segment_paragraphs("Para one.\n\nPara two."),
            vec!["Para one.", "Para two."]
        );
        assert_eq!(
            segment_paragraphs("\n\nA\nstill A\n\n\n  \n B \r\n\r\n"),
            vec!["A\nstill A", "B"]
        );
        assert!(segment_paragraphs("  \n\n ").is_empty());
    }

    #[test]
    fn test_resegmenting_is_stable() {
        let paragraphs = segment_paragraphs("One.\n\n\nTwo.\n\nThree.");
        assert_eq!(segment_paragraphs(&paragraphs.join("\n\n")), paragraphs);

        let bullets = segment_bulleted("* x\ny\n+ z");
        let rejoined = bullets
            .iter()
            .map(|s| if s.is_bullet { format!("* {}", s.text) } else { s.text.clone() })
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(segment_bulleted(&rejoined), bullets);
    }

    #[test]
    fn test_segment_text_modes() {
        let bulleted = segment_text("* a\n* b", SegmentMode::Bulleted);
        assert_eq!(bulleted.len(), 2);
        assert!(matches!(bulleted, Segments::Bulleted(_)));

        let paragraphs = segment_text("", SegmentMode::Paragraph);
        assert!(paragraphs.is_empty());
    }
}
