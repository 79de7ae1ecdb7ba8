//! Processor temperature check against the thresholds published by the
//! structured feed itself (`Thresholds.UpperCaution` / `Thresholds.UpperCritical`).

use serde_json::Value;

use crate::config::LimitsConfig;
use crate::model::{LimitReport, LimitStatus, ThermalCheck};
use crate::structured::{category_entries, entry_name, TEMPERATURES};

/// Check every temperature sensor whose name contains a limit keyword
/// (case-insensitive).
///
/// A sensor without a reading or at/above its critical threshold fails the
/// report. At/above the caution threshold is a warning only. Finding no
/// sensor at all fails the report too.
pub fn check_thermal_limits(thermal: Option<&Value>, config: &LimitsConfig) -> LimitReport {
    let keywords: Vec<String> = config.keywords.iter().map(|k| k.trim().to_lowercase()).collect();

    let sensors: Vec<ThermalCheck> = thermal
        .map(|doc| category_entries(doc, TEMPERATURES))
        .unwrap_or(&[])
        .iter()
        .filter(|entry| {
            let name = entry_name(entry).to_lowercase();
            keywords.iter().any(|k| name.contains(k.as_str()))
        })
        .map(check_entry)
        .collect();

    if sensors.is_empty() {
        tracing::warn!("no cpu temperature sensors found");
        return LimitReport {
            passed: false,
            reason: Some("no cpu temperature sensors".into()),
            sensors,
        };
    }

    let failed: Vec<&str> = sensors
        .iter()
        .filter(|s| s.status.is_failure())
        .map(|s| s.name.as_str())
        .collect();
    let reason = if failed.is_empty() {
        None
    } else {
        Some(format!("limit exceeded or no reading: {}", failed.join(", ")))
    };

    LimitReport {
        passed: reason.is_none(),
        reason,
        sensors,
    }
}

fn check_entry(entry: &Value) -> ThermalCheck {
    let name = entry_name(entry).to_string();
    let reading = entry.get("ReadingCelsius").and_then(Value::as_f64);
    let caution = threshold(entry, "UpperCaution");
    let critical = threshold(entry, "UpperCritical");

    let status = match reading {
        None => {
            tracing::warn!(sensor = %name, "no temperature reading");
            LimitStatus::NoReading
        }
        Some(t) if critical.is_some_and(|c| t >= c) => {
            tracing::error!(sensor = %name, reading = t, critical, "critical temperature");
            LimitStatus::Critical
        }
        Some(t) if caution.is_some_and(|c| t >= c) => {
            tracing::warn!(sensor = %name, reading = t, caution, "temperature above caution threshold");
            LimitStatus::Warning
        }
        Some(t) => {
            tracing::debug!(sensor = %name, reading = t, "temperature within limits");
            LimitStatus::Normal
        }
    };

    ThermalCheck {
        name,
        reading_celsius: reading,
        caution_celsius: caution,
        critical_celsius: critical,
        status,
    }
}

fn threshold(entry: &Value, level: &str) -> Option<f64> {
    entry
        .get("Thresholds")?
        .get(level)?
        .get("ReadingCelsius")?
        .as_f64()
}
