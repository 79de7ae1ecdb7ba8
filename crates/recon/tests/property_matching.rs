// Property-based tests for the parser, matcher and comparator.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use sensorgrid_recon::compare::compare_pair;
use sensorgrid_recon::matcher::{match_by_keywords, KeywordSet};
use sensorgrid_recon::model::{MatchedPair, ReconFailure, SensorMap, SensorReading, SensorUnit};
use sensorgrid_recon::tabular::{parse_tabular, parse_tabular_lines};
use sensorgrid_recon::{reconcile, ReconSettings};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Sensor-ish names: mostly vocabulary-bearing, sometimes not.
fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"(CPU|cpu|Core|System|Ambient|Processor)[0-9]{0,2}[ _](Temp|temp)?",
        2 => r"[A-Za-z][A-Za-z0-9 _]{0,12}",
    ]
}

/// A single listing line: well-formed, short, or without a number.
fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (r"[A-Za-z][A-Za-z0-9 ]{0,10}", 0u32..10_000, 0u32..1000).prop_map(|(n, i, f)| {
            format!("{n} | {i}.{f:03} degrees C | x | ok | na | na")
        }),
        1 => r"[A-Za-z ]{0,10}(\|[a-z ]{0,5}){0,4}",
        1 => r"[A-Za-z]{1,8} \| na \| x \| ns \| na \| na",
        1 => r"[A-Za-z ]{0,20}",
    ]
}

fn arb_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        4 => (-200.0..5000.0f64).prop_map(Some),
        1 => Just(None),
    ]
}

fn structured_map(names: &[String]) -> SensorMap {
    names
        .iter()
        .map(|n| SensorReading::structured(n.as_str(), Some(1.0), SensorUnit::Celsius))
        .collect()
}

fn tabular_map(names: &[String]) -> SensorMap {
    names
        .iter()
        .map(|n| SensorReading::tabular(n.as_str(), Some(1.0), "ok", n.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn parser_never_exceeds_line_count(lines in prop::collection::vec(arb_line(), 0..30)) {
        let text = lines.join("\n");
        let parse = parse_tabular_lines(&text);
        prop_assert!(parse.readings.len() <= lines.len());
        prop_assert!(parse.readings.len() + parse.malformed_lines + parse.no_reading_lines <= lines.len());
    }

    #[test]
    fn short_lines_never_produce_readings(
        fields in prop::collection::vec(r"[A-Za-z0-9. ]{0,8}", 1..6)
    ) {
        let line = fields.join("|");
        prop_assert!(parse_tabular(&line).is_empty());
    }

    #[test]
    fn first_decimal_is_extracted(int_part in 0u32..100_000, frac in 0u32..1000, unit in "[a-zA-Z ]{0,10}") {
        let reading = format!("{int_part}.{frac:03}{unit}");
        let line = format!("Sensor | {reading} | x | ok | na | na");
        let map = parse_tabular(&line);
        let expected: f64 = format!("{int_part}.{frac:03}").parse().unwrap();
        prop_assert_eq!(map.get("Sensor").and_then(|r| r.value), Some(expected));
    }

    #[test]
    fn matching_is_one_to_one(
        s_names in prop::collection::vec(arb_name(), 0..12),
        t_names in prop::collection::vec(arb_name(), 0..12),
    ) {
        let s = structured_map(&s_names);
        let t = tabular_map(&t_names);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());

        let mut seen_s = HashSet::new();
        let mut seen_t = HashSet::new();
        for pair in &out.matched {
            prop_assert!(seen_s.insert(pair.structured.name.clone()), "structured reused");
            prop_assert!(seen_t.insert(pair.tabular.name.clone()), "tabular reused");
        }
        prop_assert_eq!(out.matched.len() + out.structured_only.len(), s.len());
        prop_assert_eq!(out.matched.len() + out.tabular_only.len(), t.len());
        for name in &out.structured_only {
            prop_assert!(!seen_s.contains(name));
        }
        for name in &out.tabular_only {
            prop_assert!(!seen_t.contains(name));
        }
    }

    #[test]
    fn matching_is_deterministic(
        s_names in prop::collection::vec(arb_name(), 0..8),
        t_names in prop::collection::vec(arb_name(), 0..8),
    ) {
        let s = structured_map(&s_names);
        let t = tabular_map(&t_names);
        let a = match_by_keywords(&s, &t, &KeywordSet::default());
        let b = match_by_keywords(&s, &t, &KeywordSet::default());
        let names = |o: &sensorgrid_recon::model::PairMatchOutput| {
            o.matched.iter().map(|p| (p.structured.name.clone(), p.tabular.name.clone())).collect::<Vec<_>>()
        };
        prop_assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn zero_tolerance_means_equality(a in arb_value(), b in arb_value()) {
        let pair = MatchedPair {
            structured: SensorReading::structured("CPU", a, SensorUnit::Celsius),
            tabular: SensorReading::tabular("cpu", b, "ok", "cpu"),
            keyword: "cpu".into(),
        };
        let v = compare_pair(&pair, 0.0);
        let equal = matches!((a, b), (Some(x), Some(y)) if x == y);
        prop_assert_eq!(v.within_tolerance, equal);
    }

    #[test]
    fn absent_value_never_within(v in arb_value(), tol in 0.0..1e9f64, absent_left in any::<bool>()) {
        let (a, b) = if absent_left { (None, v) } else { (v, None) };
        let pair = MatchedPair {
            structured: SensorReading::structured("CPU", a, SensorUnit::Celsius),
            tabular: SensorReading::tabular("cpu", b, "ok", "cpu"),
            keyword: "cpu".into(),
        };
        prop_assert!(!compare_pair(&pair, tol).within_tolerance);
    }

    #[test]
    fn empty_feed_is_no_data(names in prop::collection::vec(arb_name(), 0..6)) {
        let settings = ReconSettings::default();
        let report = reconcile(&structured_map(&names), &SensorMap::new(), &settings);
        let expected = if names.is_empty() { ReconFailure::NoStructuredData } else { ReconFailure::NoTabularData };
        prop_assert_eq!(report.failure, Some(expected));
        prop_assert!(report.verdicts.is_empty());

        let report = reconcile(&SensorMap::new(), &tabular_map(&names), &settings);
        prop_assert_eq!(report.failure, Some(ReconFailure::NoStructuredData));
    }

    #[test]
    fn percentage_in_range(
        s_names in prop::collection::vec(arb_name(), 1..8),
        t_names in prop::collection::vec(arb_name(), 1..8),
    ) {
        let report = reconcile(&structured_map(&s_names), &tabular_map(&t_names), &ReconSettings::default());
        prop_assert!((0.0..=100.0).contains(&report.match_percentage));
        if report.failure.is_none() {
            prop_assert!(!report.verdicts.is_empty());
        } else {
            prop_assert!(!report.passed);
        }
    }
}
