//! Output of a completed job

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphModel, ValidationReport};

/// A stat the service reports either as a number or as display text
/// (`"12k"`, `"94%"`, `"N/A"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::Text(String::new())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(t) => f.write_str(t),
        }
    }
}

/// Summary counts reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub nodes: usize,
    #[serde(default)]
    pub edges: usize,
    /// Lines of code, abbreviated (`"12k"`) or exact.
    #[serde(default)]
    pub loc: MetricValue,
    /// Overall confidence, usually a percentage string.
    #[serde(default)]
    pub confidence: MetricValue,
}

impl AnalysisStats {
    /// Lines of code as a number; `"12k"` → 12000.
    pub fn loc_estimate(&self) -> Option<u64> {
        match &self.loc {
            MetricValue::Number(n) if *n >= 0.0 => Some(*n as u64),
            MetricValue::Number(_) => None,
            MetricValue::Text(text) => {
                let text = text.trim();
                let (digits, scale) = match text.strip_suffix(['k', 'K']) {
                    Some(rest) => (rest, 1000.0),
                    None => (text, 1.0),
                };
                digits
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| *n >= 0.0)
                    .map(|n| (n * scale).round() as u64)
            }
        }
    }

    /// Confidence in `0.0..=1.0`; `"94%"` → 0.94.
    pub fn confidence_ratio(&self) -> Option<f64> {
        let value = match &self.confidence {
            MetricValue::Number(n) => *n,
            MetricValue::Text(text) => text.trim().trim_end_matches('%').trim().parse().ok()?,
        };
        let ratio = if value > 1.0 { value / 100.0 } else { value };
        (0.0..=1.0).contains(&ratio).then_some(ratio)
    }
}

/// Everything a finished job produced
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    pub graph: GraphModel,
    pub stats: AnalysisStats,
    /// Markdown report.
    pub report: String,
    /// What validation dropped while building `graph`.
    pub validation: ValidationReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(loc: MetricValue, confidence: MetricValue) -> AnalysisStats {
        AnalysisStats {
            nodes: 0,
            edges: 0,
            loc,
            confidence,
        }
    }

    #[test]
    fn loc_forms() {
        let text = |s: &str| stats(MetricValue::Text(s.into()), MetricValue::default());
        assert_eq!(text("12k").loc_estimate(), Some(12_000));
        assert_eq!(text("1.5k").loc_estimate(), Some(1_500));
        assert_eq!(text("340").loc_estimate(), Some(340));
        assert_eq!(text("N/A").loc_estimate(), None);
        assert_eq!(
            stats(MetricValue::Number(812.0), MetricValue::default()).loc_estimate(),
            Some(812)
        );
    }

    #[test]
    fn confidence_forms() {
        let conf = |v: MetricValue| stats(MetricValue::default(), v).confidence_ratio();
        assert_eq!(conf(MetricValue::Text("94%".into())), Some(0.94));
        assert_eq!(conf(MetricValue::Number(0.5)), Some(0.5));
        assert_eq!(conf(MetricValue::Number(80.0)), Some(0.8));
        assert_eq!(conf(MetricValue::Text("high".into())), None);
        assert_eq!(conf(MetricValue::Number(250.0)), None);
    }

    #[test]
    fn stats_decode_mixed_types() {
        let stats: AnalysisStats = serde_json::from_str(
            r#"{"services": 4, "loc": "12k", "nodes": 40, "edges": 55, "confidence": 94}"#,
        )
        .unwrap();
        assert_eq!(stats.nodes, 40);
        assert_eq!(stats.loc, MetricValue::Text("12k".into()));
        assert_eq!(stats.confidence_ratio(), Some(0.94));
    }
}
