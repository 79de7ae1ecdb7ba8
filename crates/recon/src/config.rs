use serde::Deserialize;

use crate::aggregate::{DEFAULT_MIN_MATCH_PCT, DEFAULT_PREVIEW_LIMIT};
use crate::compare::DEFAULT_TOLERANCE;
use crate::error::ReconError;
use crate::matcher::{KeywordSet, DEFAULT_KEYWORDS};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LIMIT_KEYWORDS: [&str; 3] = ["CPU", "Processor", "Core"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default, rename = "match")]
    pub matching: MatchConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Presence of the `[limits]` table enables the thermal limit check.
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
}

// ---------------------------------------------------------------------------
// Matching + Tolerance + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    /// Absolute tolerance in the readings' native unit.
    #[serde(default = "default_tolerance")]
    pub absolute: f64,
    /// Minimum percentage of agreeing pairs for a passing verdict.
    #[serde(default = "default_min_match_pct")]
    pub min_match_pct: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_TOLERANCE,
            min_match_pct: DEFAULT_MIN_MATCH_PCT,
        }
    }
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_min_match_pct() -> f64 {
    DEFAULT_MIN_MATCH_PCT
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    #[serde(default)]
    pub json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            json: None,
        }
    }
}

fn default_preview_limit() -> usize {
    DEFAULT_PREVIEW_LIMIT
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where the collaborators obtain the two feeds. The engine never reads
/// these; they are resolved by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub tabular: Option<TabularSource>,
    #[serde(default)]
    pub structured: StructuredSources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabularSource {
    #[serde(default)]
    pub file: Option<String>,
    /// argv of the sensor-listing command, e.g. `["ipmitool", "sensor", "list"]`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub enum TabularOrigin<'a> {
    File(&'a str),
    Command(&'a [String]),
}

impl TabularSource {
    pub fn origin(&self) -> Result<TabularOrigin<'_>, ReconError> {
        match (&self.file, &self.command) {
            (Some(file), None) => Ok(TabularOrigin::File(file)),
            (None, Some(argv)) if !argv.is_empty() => Ok(TabularOrigin::Command(argv)),
            (None, Some(_)) => Err(ReconError::ConfigValidation(
                "sources.tabular.command must not be empty".into(),
            )),
            _ => Err(ReconError::AmbiguousSource {
                source: "tabular".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredSources {
    #[serde(default)]
    pub thermal: Option<DocumentSource>,
    #[serde(default)]
    pub power: Option<DocumentSource>,
    /// Environment variable holding the basic-auth user for `url` sources.
    #[serde(default)]
    pub username_env: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    /// Management controllers commonly serve self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StructuredSources {
    fn default() -> Self {
        Self {
            thermal: None,
            power: None,
            username_env: None,
            password_env: None,
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSource {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

pub enum DocumentOrigin<'a> {
    File(&'a str),
    Url(&'a str),
}

impl DocumentSource {
    pub fn origin(&self, name: &str) -> Result<DocumentOrigin<'_>, ReconError> {
        match (&self.file, &self.url) {
            (Some(file), None) => Ok(DocumentOrigin::File(file)),
            (None, Some(url)) => Ok(DocumentOrigin::Url(url)),
            _ => Err(ReconError::AmbiguousSource {
                source: format!("structured.{name}"),
            }),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Temperature sensors whose name contains one of these are checked.
    #[serde(default = "default_limit_keywords")]
    pub keywords: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            keywords: default_limit_keywords(),
        }
    }
}

fn default_limit_keywords() -> Vec<String> {
    DEFAULT_LIMIT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Engine settings
// ---------------------------------------------------------------------------

/// Validated knobs consumed by [`crate::engine::reconcile`].
#[derive(Debug, Clone)]
pub struct ReconSettings {
    pub keywords: KeywordSet,
    pub tolerance: f64,
    pub min_match_pct: f64,
    pub preview_limit: usize,
}

impl ReconSettings {
    pub fn new(
        keywords: KeywordSet,
        tolerance: f64,
        min_match_pct: f64,
        preview_limit: usize,
    ) -> Result<Self, ReconError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance must be a non-negative number, got {tolerance}"
            )));
        }
        if !min_match_pct.is_finite() || !(0.0..=100.0).contains(&min_match_pct) {
            return Err(ReconError::ConfigValidation(format!(
                "min_match_pct must be between 0 and 100, got {min_match_pct}"
            )));
        }
        Ok(Self {
            keywords,
            tolerance,
            min_match_pct,
            preview_limit,
        })
    }
}

impl Default for ReconSettings {
    fn default() -> Self {
        Self {
            keywords: KeywordSet::default(),
            tolerance: DEFAULT_TOLERANCE,
            min_match_pct: DEFAULT_MIN_MATCH_PCT,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> Result<ReconSettings, ReconError> {
        ReconSettings::new(
            KeywordSet::new(&self.matching.keywords)?,
            self.tolerance.absolute,
            self.tolerance.min_match_pct,
            self.output.preview_limit,
        )
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        self.settings()?;

        if let Some(tabular) = &self.sources.tabular {
            tabular.origin()?;
            if tabular.timeout_secs == 0 {
                return Err(ReconError::ConfigValidation(
                    "sources.tabular.timeout_secs must be positive".into(),
                ));
            }
        }

        let structured = &self.sources.structured;
        for (name, doc) in [("thermal", &structured.thermal), ("power", &structured.power)] {
            if let Some(doc) = doc {
                doc.origin(name)?;
            }
        }
        if structured.timeout_secs == 0 {
            return Err(ReconError::ConfigValidation(
                "sources.structured.timeout_secs must be positive".into(),
            ));
        }
        if structured.username_env.is_some() != structured.password_env.is_some() {
            return Err(ReconError::ConfigValidation(
                "username_env and password_env must be set together".into(),
            ));
        }

        if let Some(limits) = &self.limits {
            if limits.keywords.is_empty() || limits.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(
                    "limits.keywords must be non-empty and contain no blank entries".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
