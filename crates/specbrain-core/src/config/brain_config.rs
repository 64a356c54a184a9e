//! Top-level specbrain configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    AvailabilityConfig, BanditConfig, CapsConfig, DecayConfig, GateConfig, HypothesisConfig,
    PromotionConfig, StorageConfig,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`SPECBRAIN_*`)
/// 2. Project config (`specbrain.toml` in project root)
/// 3. User config (`~/.specbrain/config.toml`)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BrainConfig {
    pub storage: StorageConfig,
    pub availability: AvailabilityConfig,
    pub gate: GateConfig,
    pub bandit: BanditConfig,
    pub hypothesis: HypothesisConfig,
    pub decay: DecayConfig,
    pub promotion: PromotionConfig,
    pub caps: CapsConfig,
}

/// Copy every `Some` field of `$other.$section` over `$base.$section`.
macro_rules! merge_some {
    ($base:expr, $other:expr, $section:ident: $($field:ident),+ $(,)?) => {
        $(
            if $other.$section.$field.is_some() {
                $base.$section.$field = $other.$section.$field.clone();
            }
        )+
    };
}

impl BrainConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Parse errors are fatal, unreadable files are not.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join("specbrain.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &BrainConfig) -> Result<(), ConfigError> {
        let mut rates: Vec<(String, Option<f64>)> = vec![
            (
                "gate.confidence_threshold".to_string(),
                config.gate.confidence_threshold,
            ),
            (
                "promotion.min_identity_match_rate".to_string(),
                config.promotion.min_identity_match_rate,
            ),
            (
                "promotion.max_major_conflict_rate".to_string(),
                config.promotion.max_major_conflict_rate,
            ),
            (
                "promotion.min_field_yield_rate".to_string(),
                config.promotion.min_field_yield_rate,
            ),
        ];
        let mut push_availability = |prefix: &str, o: &super::AvailabilityOverride| {
            rates.push((format!("{prefix}expected_rate"), o.expected_rate));
            rates.push((format!("{prefix}rare_rate"), o.rare_rate));
            rates.push((
                format!("{prefix}rare_override_not_publicly_disclosed_ratio"),
                o.rare_override_not_publicly_disclosed_ratio,
            ));
        };
        push_availability("availability.", &config.availability.global());
        for (category, overrides) in &config.availability.categories {
            push_availability(
                &format!("availability.categories.{category}."),
                overrides,
            );
        }

        for (field, value) in rates {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(ConfigError::ValidationFailed {
                        field,
                        message: "must be between 0.0 and 1.0".to_string(),
                    });
                }
            }
        }

        let caps = [
            ("caps.max_allowed_values", config.caps.max_allowed_values),
            ("caps.max_lexicon_synonyms", config.caps.max_lexicon_synonyms),
            ("caps.max_lexicon_units", config.caps.max_lexicon_units),
            ("caps.max_query_rows", config.caps.max_query_rows),
            ("caps.max_query_view", config.caps.max_query_view),
            ("caps.max_top_domains", config.caps.max_top_domains),
            ("caps.max_promotion_log", config.caps.max_promotion_log),
            ("hypothesis.max_items", config.hypothesis.max_items),
            ("hypothesis.per_field_limit", config.hypothesis.per_field_limit),
            ("storage.read_pool_size", config.storage.read_pool_size),
        ];
        for (field, value) in caps {
            if value == Some(0) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        for (name, window) in [
            ("decay.component_lexicon", config.decay.component_lexicon),
            ("decay.field_anchors", config.decay.field_anchors),
            ("decay.url_memory", config.decay.url_memory),
            ("decay.domain_field_yield", config.decay.domain_field_yield),
        ] {
            if let Some(w) = window {
                if matches!(w.expire_days, Some(expire) if expire < w.decay_days) {
                    return Err(ConfigError::ValidationFailed {
                        field: name.to_string(),
                        message: "expire_days must not be earlier than decay_days".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns the user config path: `~/.specbrain/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut BrainConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: BrainConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` override.
    fn merge(base: &mut BrainConfig, other: &BrainConfig) {
        merge_some!(base, other, storage: db_path, json_root, persist_mode, read_pool_size);
        merge_some!(base, other, gate: confidence_threshold, min_refs, max_authoritative_tier);
        merge_some!(base, other, bandit: mode, seed);
        merge_some!(base, other, hypothesis: max_items, per_field_limit);
        merge_some!(
            base,
            other,
            decay: component_lexicon,
            field_anchors,
            url_memory,
            domain_field_yield
        );
        merge_some!(
            base,
            other,
            promotion: enabled,
            min_attempts,
            min_identity_match_rate,
            max_major_conflict_rate,
            min_field_yield_rate
        );
        merge_some!(
            base,
            other,
            caps: max_allowed_values,
            max_lexicon_synonyms,
            max_lexicon_units,
            max_query_rows,
            max_query_view,
            max_top_domains,
            max_promotion_log
        );

        merge_some!(
            base,
            other,
            availability: min_validated_seen,
            expected_rate,
            rare_rate,
            rare_override_min_seen,
            rare_override_not_publicly_disclosed_ratio
        );
        for (category, overrides) in &other.availability.categories {
            base.availability
                .categories
                .insert(category.clone(), overrides.clone());
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SPECBRAIN_STORAGE_PERSIST_MODE`, `SPECBRAIN_GATE_MIN_REFS`, etc.
    fn apply_env_overrides(config: &mut BrainConfig) {
        if let Ok(val) = std::env::var("SPECBRAIN_STORAGE_DB_PATH") {
            config.storage.db_path = Some(val);
        }
        if let Ok(val) = std::env::var("SPECBRAIN_STORAGE_JSON_ROOT") {
            config.storage.json_root = Some(val);
        }
        if let Ok(val) = std::env::var("SPECBRAIN_STORAGE_PERSIST_MODE") {
            if let Ok(v) = val.parse() {
                config.storage.persist_mode = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SPECBRAIN_GATE_CONFIDENCE_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.gate.confidence_threshold = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SPECBRAIN_GATE_MIN_REFS") {
            if let Ok(v) = val.parse::<u32>() {
                config.gate.min_refs = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SPECBRAIN_BANDIT_MODE") {
            if let Ok(v) = val.parse() {
                config.bandit.mode = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SPECBRAIN_BANDIT_SEED") {
            config.bandit.seed = Some(val);
        }
        if let Ok(val) = std::env::var("SPECBRAIN_HYPOTHESIS_MAX_ITEMS") {
            if let Ok(v) = val.parse::<usize>() {
                config.hypothesis.max_items = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SPECBRAIN_PROMOTION_ENABLED") {
            if let Ok(v) = val.parse::<bool>() {
                config.promotion.enabled = Some(v);
            }
        }
    }
}

/// Returns the user-level config directory: `~/.specbrain/`.
fn dirs_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".specbrain"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
