//! The set of learner artifacts kept per category.

use chrono::{DateTime, Utc};
use serde_json::Value;
use specbrain_core::errors::{ArtifactError, BrainResult};
use specbrain_learning::availability::FieldAvailability;
use specbrain_learning::constraints::FieldConstraints;
use specbrain_learning::field_yield::FieldYield;
use specbrain_learning::hypothesis::SourceIntel;
use specbrain_learning::lexicon::FieldLexicon;
use specbrain_learning::promotion::{PromotionLog, PromotionSuggestions, SourceOverrides};
use specbrain_learning::queries::QueryLearning;
use specbrain_learning::stats::BrainStats;
use specbrain_learning::{decode_artifact, encode_artifact, BrainArtifact};

/// Every artifact of one category, passed by value through the learners.
///
/// `source_intel` and `promotion_suggestions` are produced outside the brain
/// and are read but never written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBrain {
    pub category: String,
    pub availability: FieldAvailability,
    pub constraints: FieldConstraints,
    pub lexicon: FieldLexicon,
    pub queries: QueryLearning,
    pub field_yield: FieldYield,
    pub overrides: SourceOverrides,
    pub promotions: PromotionLog,
    pub stats: BrainStats,
    pub source_intel: SourceIntel,
    pub promotion_suggestions: PromotionSuggestions,
}

impl CategoryBrain {
    /// Kinds written back on persist.
    pub const PERSISTED_KINDS: [&'static str; 8] = [
        FieldAvailability::KIND,
        FieldConstraints::KIND,
        FieldLexicon::KIND,
        QueryLearning::KIND,
        FieldYield::KIND,
        SourceOverrides::KIND,
        PromotionLog::KIND,
        BrainStats::KIND,
    ];

    pub fn empty(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Default::default()
        }
    }

    /// Build a brain from one loader call per kind. Missing documents become
    /// empty artifacts.
    pub fn from_loader(
        category: &str,
        mut load: impl FnMut(&str) -> BrainResult<Option<Value>>,
    ) -> BrainResult<Self> {
        Ok(Self {
            category: category.to_string(),
            availability: decode_artifact(load(FieldAvailability::KIND)?),
            constraints: decode_artifact(load(FieldConstraints::KIND)?),
            lexicon: decode_artifact(load(FieldLexicon::KIND)?),
            queries: decode_artifact(load(QueryLearning::KIND)?),
            field_yield: decode_artifact(load(FieldYield::KIND)?),
            overrides: decode_artifact(load(SourceOverrides::KIND)?),
            promotions: decode_artifact(load(PromotionLog::KIND)?),
            stats: decode_artifact(load(BrainStats::KIND)?),
            source_intel: decode_artifact(load(SourceIntel::KIND)?),
            promotion_suggestions: decode_artifact(load(PromotionSuggestions::KIND)?),
        })
    }

    /// Stamp every persisted artifact with the schema version and `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.availability.touch(now);
        self.constraints.touch(now);
        self.lexicon.touch(now);
        self.queries.touch(now);
        self.field_yield.touch(now);
        self.overrides.touch(now);
        self.promotions.touch(now);
        self.stats.touch(now);
    }

    /// The persisted artifacts as (kind, document) pairs.
    pub fn documents(&self) -> Result<Vec<(&'static str, Value)>, ArtifactError> {
        Ok(vec![
            (FieldAvailability::KIND, encode_artifact(&self.availability)?),
            (FieldConstraints::KIND, encode_artifact(&self.constraints)?),
            (FieldLexicon::KIND, encode_artifact(&self.lexicon)?),
            (QueryLearning::KIND, encode_artifact(&self.queries)?),
            (FieldYield::KIND, encode_artifact(&self.field_yield)?),
            (SourceOverrides::KIND, encode_artifact(&self.overrides)?),
            (PromotionLog::KIND, encode_artifact(&self.promotions)?),
            (BrainStats::KIND, encode_artifact(&self.stats)?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_cover_persisted_kinds() {
        let brain = CategoryBrain::empty("mouse");
        let kinds: Vec<&str> = brain.documents().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, CategoryBrain::PERSISTED_KINDS.to_vec());
    }

    #[test]
    fn loader_misses_yield_empty_brain() {
        let brain = CategoryBrain::from_loader("mouse", |_| Ok(None)).unwrap();
        assert_eq!(brain, CategoryBrain::empty("mouse"));
    }
}
