//! Field lexicon: key-path synonyms and unit tokens seen in evidence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use specbrain_core::constants::MAX_SYNONYM_HOSTS;
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, truncate_counts, ArtifactMeta};

static UNIT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\d|\b)(ghz|hz|dpi|cpi|mah|mm|cm|inch|in|grams|g|ms|v)\b").ok()
});

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "of", "to", "in", "on", "at", "by", "is", "data", "value", "values",
    "item", "items", "props", "product", "products", "spec", "specs", "json", "html", "div", "span",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymStat {
    pub count: u64,
    pub hosts: BTreeMap<String, u64>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStat {
    pub count: u64,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLexiconRow {
    pub synonyms: BTreeMap<String, SynonymStat>,
    pub units: BTreeMap<String, UnitStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLexicon {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub fields: BTreeMap<String, FieldLexiconRow>,
}

impl_brain_artifact!(FieldLexicon, "field_lexicon");

impl FieldLexicon {
    /// Synonym tokens of a field, most frequent first.
    pub fn top_synonyms(&self, field: &str, limit: usize) -> Vec<(String, u64)> {
        let Some(row) = self.fields.get(field) else {
            return Vec::new();
        };
        let mut out: Vec<(String, u64)> = row.synonyms.iter().map(|(k, s)| (k.clone(), s.count)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out.truncate(limit);
        out
    }
}

/// Synonym candidates of one key path and extraction method.
pub fn synonym_tokens(key_path: &str, method: &str) -> BTreeSet<String> {
    values::tokenize(key_path)
        .into_iter()
        .chain(values::tokenize(method))
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Unit tokens in free text, lowercased.
pub fn unit_tokens(text: &str) -> BTreeSet<String> {
    let Some(re) = UNIT_RE.as_ref() else {
        return BTreeSet::new();
    };
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

pub fn update_lexicon(
    mut artifact: FieldLexicon,
    run: &RunOutcome,
    now: DateTime<Utc>,
    max_synonyms: usize,
    max_units: usize,
) -> FieldLexicon {
    for (field, provenance) in &run.provenance {
        if provenance.evidence.is_empty() || !values::is_known_value(&provenance.value) {
            continue;
        }
        let row = artifact.fields.entry(field.clone()).or_default();
        let mut units = unit_tokens(&values::value_text(&provenance.value));

        for evidence in &provenance.evidence {
            let host = evidence.effective_host();
            for token in synonym_tokens(&evidence.key_path, &evidence.method) {
                let stat = row.synonyms.entry(token).or_default();
                stat.count += 1;
                stat.last_seen = Some(now);
                if !host.is_empty() {
                    *stat.hosts.entry(host.clone()).or_default() += 1;
                    truncate_counts(&mut stat.hosts, MAX_SYNONYM_HOSTS);
                }
            }
            units.extend(unit_tokens(&evidence.key_path));
        }

        for unit in units {
            let stat = row.units.entry(unit).or_default();
            stat.count += 1;
            stat.last_seen = Some(now);
        }
        cap_by_recency(&mut row.synonyms, max_synonyms, |s| (s.count, s.last_seen));
        cap_by_recency(&mut row.units, max_units, |s| (s.count, s.last_seen));
    }
    artifact
}

/// Keep the `cap` entries with the highest count, then most recent, then key.
fn cap_by_recency<T>(
    map: &mut BTreeMap<String, T>,
    cap: usize,
    rank: impl Fn(&T) -> (u64, Option<DateTime<Utc>>),
) {
    if map.len() <= cap {
        return;
    }
    let mut entries: Vec<(String, T)> = std::mem::take(map).into_iter().collect();
    entries.sort_by(|a, b| {
        let (ca, la) = rank(&a.1);
        let (cb, lb) = rank(&b.1);
        cb.cmp(&ca).then_with(|| lb.cmp(&la)).then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(cap);
    map.extend(entries);
}
