//! Parser for pipe-delimited sensor listings.
//!
//! Record layout (fields trimmed):
//!
//! ```text
//! <name> | <reading> | <unused> | <status> | <unused> | <unused>
//! ```
//!
//! Header, separator and short lines are expected in real listings and are
//! skipped without error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{SensorMap, SensorReading};

/// Minimum number of `|`-separated fields for a record.
pub const MIN_FIELDS: usize = 6;

const NAME_FIELD: usize = 0;
const READING_FIELD: usize = 1;
const STATUS_FIELD: usize = 3;

/// First unsigned decimal number anywhere in the reading column. ASCII digits
/// only, so every match parses as `f64`.
static READING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+\.?[0-9]*)").expect("static reading pattern"));

/// Parse result with skip counters for diagnostics.
#[derive(Debug, Default, Serialize)]
pub struct TabularParse {
    pub readings: SensorMap,
    /// Lines with a `|` but fewer than [`MIN_FIELDS`] fields.
    pub malformed_lines: usize,
    /// Records whose reading column holds no number (e.g. `na`).
    pub no_reading_lines: usize,
    /// Records that replaced an earlier record with the same name.
    pub duplicate_names: usize,
}

/// Parse a sensor listing into readings keyed by sensor name.
///
/// Never fails: unparsable text yields an empty map.
pub fn parse_tabular(raw: &str) -> SensorMap {
    parse_tabular_lines(raw).readings
}

/// Like [`parse_tabular`] but keeps the skip counters.
pub fn parse_tabular_lines(raw: &str) -> TabularParse {
    let mut out = TabularParse::default();

    for line in raw.lines() {
        if !line.contains('|') {
            continue;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            tracing::trace!(fields = fields.len(), line, "skipping short listing line");
            out.malformed_lines += 1;
            continue;
        }

        let Some(value) = first_decimal(fields[READING_FIELD]) else {
            tracing::debug!(sensor = fields[NAME_FIELD], reading = fields[READING_FIELD], "no numeric reading");
            out.no_reading_lines += 1;
            continue;
        };

        let reading =
            SensorReading::tabular(fields[NAME_FIELD], Some(value), fields[STATUS_FIELD], line);
        if out.readings.insert(reading).is_some() {
            out.duplicate_names += 1;
        }
    }

    tracing::info!(
        sensors = out.readings.len(),
        malformed = out.malformed_lines,
        no_reading = out.no_reading_lines,
        "parsed tabular sensor listing"
    );
    out
}

/// Extract the first decimal number (optional fractional part) from `text`.
pub fn first_decimal(text: &str) -> Option<f64> {
    READING_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeedSource;

    const LISTING: &str = "\
CPU0 Temp        | 46.000     | degrees C  | ok    | na        | na
CPU1 Temp        | na         | degrees C  | na    | na        | na
P12V             | 12.180     | Volts      | ok    | 10.173    | 10.299
Fan 1            | 3000.000   | RPM        | ok    | na        | 300.000
garbage line without pipes
short | row
";

    #[test]
    fn parses_well_formed_lines() {
        let map = parse_tabular(LISTING);
        assert_eq!(map.len(), 3);

        let cpu = map.get("CPU0 Temp").unwrap();
        assert_eq!(cpu.value, Some(46.0));
        assert_eq!(cpu.status.as_deref(), Some("ok"));
        assert_eq!(cpu.source, FeedSource::TabularFeed);
        assert!(cpu.unit.is_none());
        assert!(cpu.raw_line.as_deref().unwrap().starts_with("CPU0 Temp"));

        assert_eq!(map.get("P12V").unwrap().value, Some(12.18));
        assert_eq!(map.get("Fan 1").unwrap().value, Some(3000.0));
    }

    #[test]
    fn skip_counters() {
        let parse = parse_tabular_lines(LISTING);
        assert_eq!(parse.malformed_lines, 1);
        assert_eq!(parse.no_reading_lines, 1);
        assert_eq!(parse.duplicate_names, 0);
    }

    #[test]
    fn reading_with_unit_text() {
        let map = parse_tabular("cpu0_core_temp | 46.2 degrees C | x | ok | x | x");
        assert_eq!(map.get("cpu0_core_temp").unwrap().value, Some(46.2));
    }

    #[test]
    fn first_number_wins() {
        assert_eq!(first_decimal("approx 3 of 7.5"), Some(3.0));
        assert_eq!(first_decimal("12."), Some(12.0));
        assert_eq!(first_decimal("0x1f"), Some(0.0));
        assert_eq!(first_decimal("na"), None);
        assert_eq!(first_decimal(""), None);
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let map = parse_tabular("Temp | 30 | a | ok | b | c | d | e");
        assert_eq!(map.get("Temp").unwrap().value, Some(30.0));
    }

    #[test]
    fn five_fields_is_malformed() {
        let parse = parse_tabular_lines("Temp | 30 | a | ok | b");
        assert!(parse.readings.is_empty());
        assert_eq!(parse.malformed_lines, 1);
    }

    #[test]
    fn duplicate_names_last_write_wins() {
        let text = "Temp | 30 | a | ok | b | c\nOther | 1 | a | ok | b | c\nTemp | 35 | a | cr | b | c";
        let parse = parse_tabular_lines(text);
        assert_eq!(parse.duplicate_names, 1);
        assert_eq!(parse.readings.len(), 2);
        let temp = parse.readings.get("Temp").unwrap();
        assert_eq!(temp.value, Some(35.0));
        assert_eq!(temp.status.as_deref(), Some("cr"));
        assert_eq!(parse.readings.names().next(), Some("Temp"));
    }

    #[test]
    fn empty_input_is_empty_map() {
        assert!(parse_tabular("").is_empty());
        assert!(parse_tabular("\n\n   \n").is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        let map = parse_tabular("Temp | 30.5 | a | ok | b | c\r\nVcore | 1.2 | V | ok | b | c\r\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Vcore").unwrap().value, Some(1.2));
    }

    #[test]
    fn non_ascii_digits_are_not_readings() {
        assert_eq!(first_decimal("\u{664}\u{665} / 46.5 degrees C"), Some(46.5));
        assert_eq!(first_decimal("\u{664}\u{665} degrees C"), None);

        let map = parse_tabular("CPU0 Temp | \u{664}\u{665} 46 C | a | ok | b | c");
        assert_eq!(map.get("CPU0 Temp").unwrap().value, Some(46.0));
    }
}
