use std::collections::HashMap;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Which telemetry feed a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    StructuredFeed,
    TabularFeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorUnit {
    Celsius,
    Volts,
}

/// A single sensor reading from either feed.
///
/// `value` is `None` when the feed reported the sensor without data. Such a
/// reading still takes part in matching but can never be within tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub name: String,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<SensorUnit>,
    pub source: FeedSource,
    /// Status column of the tabular listing (diagnostics only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Original listing line (diagnostics only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_line: Option<String>,
}

impl SensorReading {
    pub fn structured(name: impl Into<String>, value: Option<f64>, unit: SensorUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit: Some(unit),
            source: FeedSource::StructuredFeed,
            status: None,
            raw_line: None,
        }
    }

    pub fn tabular(
        name: impl Into<String>,
        value: Option<f64>,
        status: impl Into<String>,
        raw_line: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
            source: FeedSource::TabularFeed,
            status: Some(status.into()),
            raw_line: Some(raw_line.into()),
        }
    }
}

/// Readings keyed by name, iterated in insertion order.
///
/// Re-inserting a name replaces the earlier reading but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct SensorMap {
    entries: Vec<SensorReading>,
    index: HashMap<String, usize>,
}

impl SensorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reading, returning the one it replaced (if any).
    pub fn insert(&mut self, reading: SensorReading) -> Option<SensorReading> {
        match self.index.get(&reading.name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], reading)),
            None => {
                self.index.insert(reading.name.clone(), self.entries.len());
                self.entries.push(reading);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SensorReading> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SensorReading> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.name.as_str())
    }
}

impl<'a> IntoIterator for &'a SensorMap {
    type Item = &'a SensorReading;
    type IntoIter = std::slice::Iter<'a, SensorReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<SensorReading> for SensorMap {
    fn from_iter<I: IntoIterator<Item = SensorReading>>(iter: I) -> Self {
        let mut map = SensorMap::new();
        for reading in iter {
            map.insert(reading);
        }
        map
    }
}

impl Serialize for SensorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw payloads handed over by the collaborators. `None` means the fetch
/// failed or was not configured.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub tabular_text: Option<String>,
    pub thermal: Option<serde_json::Value>,
    pub power: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Pair matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub structured: SensorReading,
    pub tabular: SensorReading,
    /// First vocabulary keyword shared by both names.
    pub keyword: String,
}

#[derive(Debug, Default)]
pub struct PairMatchOutput {
    pub matched: Vec<MatchedPair>,
    pub structured_only: Vec<String>,
    pub tabular_only: Vec<String>,
}

// ---------------------------------------------------------------------------
// Comparison + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonVerdict {
    pub structured_name: String,
    pub tabular_name: String,
    pub structured_value: Option<f64>,
    pub tabular_value: Option<f64>,
    /// `None` when either side has no value.
    pub difference: Option<f64>,
    pub within_tolerance: bool,
}

/// Terminal failure reasons. Kept distinct so callers can tell a feed being
/// down from the feeds disagreeing on naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconFailure {
    NoStructuredData,
    NoTabularData,
    NoCommonSensors,
}

impl ReconFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoStructuredData => "no structured data",
            Self::NoTabularData => "no tabular data",
            Self::NoCommonSensors => "no common sensors",
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoStructuredData | Self::NoTabularData)
    }
}

impl std::fmt::Display for ReconFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Residual readings of one feed. `preview` is capped for display, `count` is not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnmatchedSummary {
    pub count: usize,
    pub preview: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ReconFailure>,
    pub match_percentage: f64,
    pub matched_count: usize,
    pub total_compared: usize,
    pub threshold_pct: f64,
    pub tolerance: f64,
    pub verdicts: Vec<ComparisonVerdict>,
    pub structured_only: UnmatchedSummary,
    pub tabular_only: UnmatchedSummary,
}

// ---------------------------------------------------------------------------
// Thermal limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    Normal,
    Warning,
    Critical,
    NoReading,
}

impl LimitStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Critical | Self::NoReading)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalCheck {
    pub name: String,
    pub reading_celsius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caution_celsius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_celsius: Option<f64>,
    pub status: LimitStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub sensors: Vec<ThermalCheck>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub structured_count: usize,
    pub tabular_count: usize,
    pub report: ReconReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitReport>,
}

impl ReconResult {
    /// Overall outcome: reconciliation passed and, when configured, limits too.
    pub fn passed(&self) -> bool {
        self.report.passed && self.limits.as_ref().map_or(true, |l| l.passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}
