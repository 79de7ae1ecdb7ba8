use crate::config::ReconSettings;
use crate::model::{
    ComparisonVerdict, PairMatchOutput, ReconFailure, ReconReport, UnmatchedSummary,
};

/// Default minimum share of compared pairs that must agree, in percent.
pub const DEFAULT_MIN_MATCH_PCT: f64 = 50.0;

/// Default number of residual names shown per feed.
pub const DEFAULT_PREVIEW_LIMIT: usize = 3;

/// Fold per-pair verdicts into the final report.
///
/// Checked in order: empty structured feed, empty tabular feed, no pairs.
/// Otherwise the verdict is `match_percentage >= threshold`.
pub fn aggregate(
    verdicts: Vec<ComparisonVerdict>,
    pairs: &PairMatchOutput,
    structured_len: usize,
    tabular_len: usize,
    settings: &ReconSettings,
) -> ReconReport {
    let failure = if structured_len == 0 {
        Some(ReconFailure::NoStructuredData)
    } else if tabular_len == 0 {
        Some(ReconFailure::NoTabularData)
    } else if pairs.matched.is_empty() || verdicts.is_empty() {
        Some(ReconFailure::NoCommonSensors)
    } else {
        None
    };

    let total_compared = verdicts.len();
    let matched_count = verdicts.iter().filter(|v| v.within_tolerance).count();
    let match_percentage = if failure.is_none() {
        matched_count as f64 / total_compared as f64 * 100.0
    } else {
        0.0
    };
    let passed = failure.is_none() && match_percentage >= settings.min_match_pct;

    match failure {
        Some(f) => tracing::warn!(reason = f.reason(), "reconciliation failed"),
        None => tracing::info!(
            matched = matched_count,
            total = total_compared,
            pct = format_args!("{match_percentage:.1}"),
            passed,
            "reconciliation complete"
        ),
    }

    ReconReport {
        passed,
        failure,
        match_percentage,
        matched_count,
        total_compared,
        threshold_pct: settings.min_match_pct,
        tolerance: settings.tolerance,
        verdicts,
        structured_only: summarize(&pairs.structured_only, settings.preview_limit),
        tabular_only: summarize(&pairs.tabular_only, settings.preview_limit),
    }
}

fn summarize(names: &[String], limit: usize) -> UnmatchedSummary {
    UnmatchedSummary {
        count: names.len(),
        preview: names.iter().take(limit).cloned().collect(),
    }
}
