//! Text rendering of views for terminals and chat-style outputs

use crate::model::Profile;
use crate::view::{AnalysisView, WatchlistView};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

pub trait Formatter: Send + Sync {
    fn kind(&self) -> FormatterKind;
    fn format_analysis(&self, ticker: &str, analysis: &AnalysisView) -> String;
    fn format_watchlist(&self, profile: &Profile, watchlist: &WatchlistView) -> String;
    fn format_profiles(&self, profiles: &[Profile], selected_id: Option<&str>) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Available output styles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Plain,
    Markdown,
}

impl FormatterKind {
    pub fn create(self) -> Box<dyn Formatter> {
        match self {
            Self::Plain => Box::new(PlainFormatter),
            Self::Markdown => Box::new(MarkdownFormatter),
        }
    }
}

impl FromStr for FormatterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(headers.to_vec());
    table
}

fn good_to_invest_line(watchlist: &WatchlistView) -> String {
    if watchlist.good_to_invest.is_empty() {
        "Good to invest: none".to_string()
    } else {
        format!("Good to invest: {}", watchlist.good_to_invest.join(", "))
    }
}

/// Terminal output with box-drawn tables
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::Plain
    }

    fn format_analysis(&self, ticker: &str, analysis: &AnalysisView) -> String {
        let mut out = String::new();
        let verdict = &analysis.verdict;
        let _ = writeln!(
            out,
            "{ticker}: {} (confidence {:.0}/100)",
            verdict.label, verdict.confidence
        );

        out.push_str("\nBear case\n");
        for segment in &analysis.bear {
            if segment.is_bullet {
                let _ = writeln!(out, "  - {}", segment.text);
            } else {
                let _ = writeln!(out, "  {}", segment.text);
            }
        }

        out.push_str("\nBull case\n");
        for paragraph in &analysis.bull {
            let _ = writeln!(out, "  {paragraph}\n");
        }

        let quant = &analysis.quant;
        let mut metrics = table(&["Price", "P/E", "Market cap", "30D return"]);
        metrics.add_row(vec![
            quant.price_display(),
            quant.pe_display(),
            quant.market_cap_display(),
            quant.return_30d_display(),
        ]);
        let _ = writeln!(out, "Quantitative data\n{metrics}");

        let mut bars = table(&["Metric", "Value"]);
        for bar in quant.growth_bars() {
            bars.add_row(vec![bar.label.to_string(), format!("{:.2}", bar.value)]);
        }
        let _ = writeln!(out, "{bars}");

        if !verdict.justification.is_empty() {
            out.push_str("\nJustification\n");
            for reason in &verdict.justification {
                let _ = writeln!(out, "  - {reason}");
            }
        }
        if !verdict.confidence_basis.is_empty() {
            let _ = writeln!(out, "\n{}", verdict.confidence_basis);
        }
        out
    }

    fn format_watchlist(&self, profile: &Profile, watchlist: &WatchlistView) -> String {
        let mut rows = table(&["Ticker", "Verdict", "Confidence"]);
        for row in &watchlist.rows {
            rows.add_row(vec![
                row.ticker.clone(),
                row.label.clone(),
                format!("{:.0}", row.confidence),
            ]);
        }
        format!(
            "Watchlist check for {}\n{rows}\n{}",
            profile.name,
            good_to_invest_line(watchlist)
        )
    }

    fn format_profiles(&self, profiles: &[Profile], selected_id: Option<&str>) -> String {
        if profiles.is_empty() {
            return "No profiles yet.".to_string();
        }
        let mut rows = table(&["", "Id", "Name", "Tickers"]);
        for profile in profiles {
            let marker = if selected_id == Some(profile.id.as_str()) { "*" } else { "" };
            rows.add_row(vec![
                marker.to_string(),
                profile.id.clone(),
                profile.name.clone(),
                profile.tickers.join(", "),
            ]);
        }
        rows.to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {error}")
    }
}

/// Markdown for chat clients and reports
pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::Markdown
    }

    fn format_analysis(&self, ticker: &str, analysis: &AnalysisView) -> String {
        let mut out = String::new();
        let verdict = &analysis.verdict;
        let _ = writeln!(
            out,
            "## {ticker}: **{}** ({:.0}/100)\n",
            verdict.label, verdict.confidence
        );

        out.push_str("### Bear case\n\n");
        for segment in &analysis.bear {
            if segment.is_bullet {
                let _ = writeln!(out, "- {}", segment.text);
            } else {
                let _ = writeln!(out, "**{}**", segment.text);
            }
        }

        out.push_str("\n### Bull case\n\n");
        for paragraph in &analysis.bull {
            let _ = writeln!(out, "{paragraph}\n");
        }

        let quant = &analysis.quant;
        out.push_str("### Quantitative data\n\n");
        out.push_str("| Price | P/E | Market cap | 30D return |\n|---|---|---|---|\n");
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |\n",
            quant.price_display(),
            quant.pe_display(),
            quant.market_cap_display(),
            quant.return_30d_display()
        );
        for bar in quant.growth_bars() {
            let _ = writeln!(out, "- {}: {:.2}", bar.label, bar.value);
        }

        if !verdict.justification.is_empty() {
            out.push_str("\n### Justification\n\n");
            for reason in &verdict.justification {
                let _ = writeln!(out, "- {reason}");
            }
        }
        if !verdict.confidence_basis.is_empty() {
            let _ = writeln!(out, "\n_{}_", verdict.confidence_basis);
        }
        out
    }

    fn format_watchlist(&self, profile: &Profile, watchlist: &WatchlistView) -> String {
        let mut out = format!(
            "### Watchlist: {}\n\n| Ticker | Verdict | Confidence |\n|---|---|---|\n",
            profile.name
        );
        for row in &watchlist.rows {
            let _ = writeln!(out, "| {} | {} | {:.0} |", row.ticker, row.label, row.confidence);
        }
        let _ = write!(out, "\n{}", good_to_invest_line(watchlist));
        out
    }

    fn format_profiles(&self, profiles: &[Profile], selected_id: Option<&str>) -> String {
        if profiles.is_empty() {
            return "_No profiles yet._".to_string();
        }
        let mut out = String::new();
        for profile in profiles {
            let name = if selected_id == Some(profile.id.as_str()) {
                format!("**{}**", profile.name)
            } else {
                profile.name.clone()
            };
            let _ = writeln!(
                out,
                "- {name} (`{}`): {}",
                profile.id,
                if profile.tickers.is_empty() {
                    "no tickers".to_string()
                } else {
                    profile.tickers.join(", ")
                }
            );
        }
        out
    }

    fn format_error(&self, error: &str) -> String {
        format!("**Error:** {error}")
    }
}
