//! Deterministic rule-based query classification.
//!
//! The terminal fallback of the classification chain: keyword presence in
//! the lowercased query, expressed as an ordered rule table so the fallback
//! order stays auditable. First matching rule wins; always succeeds.

use crate::models::{IntentKind, QueryIntent};

struct IntentRule {
    keywords: &'static [&'static str],
    intent: IntentKind,
    analysis_type: &'static str,
    chart_types: &'static [&'static str],
    metrics: &'static [&'static str],
}

const INTENT_RULES: [IntentRule; 3] = [
    IntentRule {
        keywords: &["summary", "overview", "report"],
        intent: IntentKind::Summary,
        analysis_type: "comprehensive_summary",
        chart_types: &["bar", "pie", "line"],
        metrics: &["OEE", "Production", "Quality", "Energy"],
    },
    IntentRule {
        keywords: &["compare", "comparison", "vs", "versus"],
        intent: IntentKind::Comparison,
        analysis_type: "comparative_analysis",
        chart_types: &["bar", "line", "comparison"],
        metrics: &["OEE", "Production", "Quality"],
    },
    IntentRule {
        keywords: &["trend", "over time", "change"],
        intent: IntentKind::Trend,
        analysis_type: "trend_analysis",
        chart_types: &["line", "area"],
        metrics: &["OEE", "Energy", "Production"],
    },
];

const DEFAULT_RULE: IntentRule = IntentRule {
    keywords: &[],
    intent: IntentKind::SpecificMetric,
    analysis_type: "metric_analysis",
    chart_types: &["bar"],
    metrics: &["OEE", "Production"],
};

const CHART_KEYWORDS: [&str; 5] = ["chart", "graph", "visual", "plot", "show"];

/// Classify purely on keyword presence. Never fails.
pub fn classify(query: &str) -> QueryIntent {
    let lowered = query.to_lowercase();

    let rule = INTENT_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
        .unwrap_or(&DEFAULT_RULE);

    QueryIntent {
        intent: rule.intent,
        time_period: "all".to_string(),
        metrics: rule.metrics.iter().map(|m| m.to_string()).collect(),
        needs_chart: CHART_KEYWORDS.iter().any(|kw| lowered.contains(kw)),
        chart_types: rule.chart_types.iter().map(|c| c.to_string()).collect(),
        analysis_type: rule.analysis_type.to_string(),
    }
}
