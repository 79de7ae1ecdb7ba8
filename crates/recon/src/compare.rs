use crate::model::{ComparisonVerdict, MatchedPair};

/// Default absolute tolerance, in the readings' native unit.
pub const DEFAULT_TOLERANCE: f64 = 5.0;

/// Compare a matched pair within an absolute tolerance.
///
/// Units are not converted. A missing value on either side is a comparable
/// outcome that is never within tolerance.
pub fn compare_pair(pair: &MatchedPair, tolerance: f64) -> ComparisonVerdict {
    let structured_value = pair.structured.value;
    let tabular_value = pair.tabular.value;

    let difference = match (structured_value, tabular_value) {
        (Some(a), Some(b)) => Some((a - b).abs()),
        _ => None,
    };
    let within_tolerance = difference.is_some_and(|d| d <= tolerance);

    ComparisonVerdict {
        structured_name: pair.structured.name.clone(),
        tabular_name: pair.tabular.name.clone(),
        structured_value,
        tabular_value,
        difference,
        within_tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SensorReading, SensorUnit};

    fn pair(a: Option<f64>, b: Option<f64>) -> MatchedPair {
        MatchedPair {
            structured: SensorReading::structured("CPU0 Temp", a, SensorUnit::Celsius),
            tabular: SensorReading::tabular("cpu0_temp", b, "ok", "cpu0_temp | .."),
            keyword: "cpu".into(),
        }
    }

    #[test]
    fn within_default_tolerance() {
        let v = compare_pair(&pair(Some(45.0), Some(46.2)), DEFAULT_TOLERANCE);
        assert!(v.within_tolerance);
        assert!((v.difference.unwrap() - 1.2).abs() < 1e-9);
        assert_eq!(v.structured_name, "CPU0 Temp");
        assert_eq!(v.tabular_name, "cpu0_temp");
    }

    #[test]
    fn boundary_is_inclusive() {
        let v = compare_pair(&pair(Some(40.0), Some(45.0)), 5.0);
        assert_eq!(v.difference, Some(5.0));
        assert!(v.within_tolerance);
    }

    #[test]
    fn outside_tolerance() {
        let v = compare_pair(&pair(Some(40.0), Some(45.5)), 5.0);
        assert!(!v.within_tolerance);
    }

    #[test]
    fn zero_tolerance_requires_equality() {
        assert!(compare_pair(&pair(Some(12.0), Some(12.0)), 0.0).within_tolerance);
        assert!(!compare_pair(&pair(Some(12.0), Some(12.001)), 0.0).within_tolerance);
    }

    #[test]
    fn absent_value_never_within() {
        for (a, b) in [(None, Some(1.0)), (Some(1.0), None), (None, None)] {
            let v = compare_pair(&pair(a, b), 1_000.0);
            assert!(!v.within_tolerance);
            assert!(v.difference.is_none());
        }
    }
}
