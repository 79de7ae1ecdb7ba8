use crate::aggregate::aggregate;
use crate::compare::compare_pair;
use crate::config::{ReconConfig, ReconSettings};
use crate::error::ReconError;
use crate::limits::check_thermal_limits;
use crate::matcher::match_by_keywords;
use crate::model::{
    ComparisonVerdict, PairMatchOutput, ReconInput, ReconMeta, ReconReport, ReconResult, SensorMap,
};
use crate::structured::extract_structured;
use crate::tabular::parse_tabular;

/// Reconcile the two reading sets.
///
/// Never fails: missing data and disjoint vocabularies come back as a
/// [`crate::model::ReconFailure`] on the report. Empty inputs are rejected
/// before matching is attempted.
pub fn reconcile(structured: &SensorMap, tabular: &SensorMap, settings: &ReconSettings) -> ReconReport {
    if structured.is_empty() || tabular.is_empty() {
        return aggregate(
            Vec::new(),
            &PairMatchOutput::default(),
            structured.len(),
            tabular.len(),
            settings,
        );
    }

    tracing::info!(
        structured = structured.len(),
        tabular = tabular.len(),
        "matching sensors"
    );
    let pairs = match_by_keywords(structured, tabular, &settings.keywords);

    let verdicts: Vec<ComparisonVerdict> = pairs
        .matched
        .iter()
        .map(|pair| {
            let v = compare_pair(pair, settings.tolerance);
            tracing::debug!(
                structured = %v.structured_name,
                tabular = %v.tabular_name,
                difference = ?v.difference,
                within = v.within_tolerance,
                "compared pair"
            );
            v
        })
        .collect();

    aggregate(verdicts, &pairs, structured.len(), tabular.len(), settings)
}

/// Run reconciliation per config on raw payloads. Returns the report plus
/// run metadata and, when `[limits]` is configured, the thermal limit check.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let settings = config.settings()?;

    let structured = extract_structured(input.thermal.as_ref(), input.power.as_ref());
    let tabular = input
        .tabular_text
        .as_deref()
        .map(parse_tabular)
        .unwrap_or_default();

    let report = reconcile(&structured, &tabular, &settings);

    let limits = config
        .limits
        .as_ref()
        .map(|l| check_thermal_limits(input.thermal.as_ref(), l));

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        structured_count: structured.len(),
        tabular_count: tabular.len(),
        report,
        limits,
    })
}
