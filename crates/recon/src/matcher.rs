//! Identity matching between the structured and tabular feeds.
//!
//! The feeds share no key ("CPU0 Temp" vs "cpu0_core_temp"), so two readings
//! are candidates when some vocabulary keyword occurs in both names
//! (case-insensitive substring). Pairing is greedy and one-to-one: structured
//! readings are visited in insertion order and each takes the first unconsumed
//! tabular candidate, also in insertion order.
//!
//! Names containing no vocabulary keyword are never paired, even when the
//! other feed has the exact same name.

use crate::error::ReconError;
use crate::model::{MatchedPair, PairMatchOutput, SensorMap};

/// Vocabulary used when none is configured.
pub const DEFAULT_KEYWORDS: [&str; 6] = ["cpu", "temp", "core", "processor", "system", "ambient"];

/// Lowercased, deduplicated matching vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Build a vocabulary. Blank keywords are rejected because the empty
    /// substring would pair every reading.
    pub fn new<I, S>(keywords: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for kw in keywords {
            let kw = kw.as_ref().trim().to_lowercase();
            if kw.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "match keywords must not be blank".into(),
                ));
            }
            if !out.contains(&kw) {
                out.push(kw);
            }
        }
        if out.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one match keyword is required".into(),
            ));
        }
        Ok(Self { keywords: out })
    }

    /// First keyword contained in both (already lowercased) names.
    pub fn shared_keyword(&self, left_lower: &str, right_lower: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|kw| left_lower.contains(kw.as_str()) && right_lower.contains(kw.as_str()))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Pair structured readings with tabular readings by shared keyword.
pub fn match_by_keywords(
    structured: &SensorMap,
    tabular: &SensorMap,
    keywords: &KeywordSet,
) -> PairMatchOutput {
    let tabular_lower: Vec<String> = tabular.iter().map(|r| r.name.to_lowercase()).collect();
    let mut tabular_used = vec![false; tabular.len()];

    let mut matched = Vec::new();
    let mut structured_only = Vec::new();

    for s in structured {
        let s_lower = s.name.to_lowercase();

        let hit = tabular.iter().enumerate().find_map(|(ti, t)| {
            if tabular_used[ti] {
                return None;
            }
            keywords
                .shared_keyword(&s_lower, &tabular_lower[ti])
                .map(|kw| (ti, t, kw))
        });

        match hit {
            Some((ti, t, keyword)) => {
                tabular_used[ti] = true;
                tracing::debug!(structured = %s.name, tabular = %t.name, keyword, "paired sensors");
                matched.push(MatchedPair {
                    structured: s.clone(),
                    tabular: t.clone(),
                    keyword: keyword.to_string(),
                });
            }
            None => structured_only.push(s.name.clone()),
        }
    }

    let tabular_only: Vec<String> = tabular
        .iter()
        .enumerate()
        .filter(|(i, _)| !tabular_used[*i])
        .map(|(_, r)| r.name.clone())
        .collect();

    PairMatchOutput {
        matched,
        structured_only,
        tabular_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SensorReading, SensorUnit};

    fn structured(names: &[&str]) -> SensorMap {
        names
            .iter()
            .map(|n| SensorReading::structured(*n, Some(1.0), SensorUnit::Celsius))
            .collect()
    }

    fn tabular(names: &[&str]) -> SensorMap {
        names
            .iter()
            .map(|n| SensorReading::tabular(*n, Some(1.0), "ok", format!("{n} | 1 | | ok | |")))
            .collect()
    }

    #[test]
    fn keyword_set_normalizes() {
        let kws = KeywordSet::new(["CPU", " cpu ", "Temp"]).unwrap();
        assert_eq!(kws.iter().collect::<Vec<_>>(), vec!["cpu", "temp"]);
        assert_eq!(kws.len(), 2);
    }

    #[test]
    fn keyword_set_rejects_blank_and_empty() {
        assert!(KeywordSet::new(["cpu", "  "]).is_err());
        assert!(KeywordSet::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn pairs_across_naming_schemes() {
        let s = structured(&["CPU0 Temp"]);
        let t = tabular(&["cpu0_core_temp"]);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].structured.name, "CPU0 Temp");
        assert_eq!(out.matched[0].tabular.name, "cpu0_core_temp");
        assert_eq!(out.matched[0].keyword, "cpu");
        assert!(out.structured_only.is_empty());
        assert!(out.tabular_only.is_empty());
    }

    #[test]
    fn greedy_first_found_is_one_to_one() {
        let s = structured(&["CPU0 Temp", "CPU1 Temp"]);
        let t = tabular(&["CPU Temp A", "CPU Temp B", "CPU Temp C"]);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());
        assert_eq!(out.matched.len(), 2);
        assert_eq!(out.matched[0].tabular.name, "CPU Temp A");
        assert_eq!(out.matched[1].tabular.name, "CPU Temp B");
        assert_eq!(out.tabular_only, vec!["CPU Temp C"]);
    }

    #[test]
    fn unlisted_terms_never_pair() {
        // Identical names, but no vocabulary keyword in them.
        let s = structured(&["PSU1 Fan"]);
        let t = tabular(&["psu1 fan"]);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());
        assert!(out.matched.is_empty());
        assert_eq!(out.structured_only, vec!["PSU1 Fan"]);
        assert_eq!(out.tabular_only, vec!["psu1 fan"]);
    }

    #[test]
    fn keyword_must_occur_in_both_names() {
        let s = structured(&["Ambient"]);
        let t = tabular(&["CPU Temp"]);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());
        assert!(out.matched.is_empty());
    }

    #[test]
    fn injected_vocabulary_is_used() {
        let s = structured(&["PSU1 Fan"]);
        let t = tabular(&["psu1_fan_rpm"]);
        let kws = KeywordSet::new(["fan"]).unwrap();
        let out = match_by_keywords(&s, &t, &kws);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].keyword, "fan");
    }

    #[test]
    fn residuals_keep_insertion_order() {
        let s = structured(&["Zeta", "CPU Temp", "Alpha"]);
        let t = tabular(&["fan2", "cpu_temp", "fan1"]);
        let out = match_by_keywords(&s, &t, &KeywordSet::default());
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.structured_only, vec!["Zeta", "Alpha"]);
        assert_eq!(out.tabular_only, vec!["fan2", "fan1"]);
    }

    #[test]
    fn empty_inputs() {
        let out = match_by_keywords(&SensorMap::new(), &tabular(&["cpu"]), &KeywordSet::default());
        assert!(out.matched.is_empty());
        assert_eq!(out.tabular_only, vec!["cpu"]);
    }
}
