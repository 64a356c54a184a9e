/// specbrain version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version written into every persisted artifact.
pub const ARTIFACT_VERSION: u32 = 1;

/// Maximum entries kept in a field's `allowed_values` map.
pub const MAX_ALLOWED_VALUES: usize = 120;

/// Maximum synonym tokens kept per field lexicon row.
pub const MAX_LEXICON_SYNONYMS: usize = 120;

/// Maximum unit tokens kept per field lexicon row.
pub const MAX_LEXICON_UNITS: usize = 50;

/// Maximum hosts tracked per synonym token.
pub const MAX_SYNONYM_HOSTS: usize = 24;

/// Maximum rows in the global query-learning map.
pub const MAX_QUERY_ROWS: usize = 1_500;

/// Maximum queries kept in each per-field / per-brand top view.
pub const MAX_QUERY_VIEW: usize = 8;

/// Maximum domains kept in a field availability row's `top_domains`.
pub const MAX_TOP_DOMAINS: usize = 12;

/// Maximum preferred URLs kept in a learning profile.
pub const MAX_PREFERRED_URLS: usize = 20;

/// Maximum feedback URLs kept in a learning profile.
pub const MAX_FEEDBACK_URLS: usize = 40;

/// Maximum entries retained in the promotion log.
pub const MAX_PROMOTION_LOG: usize = 200;

/// Reason code that marks an unknown field as not publicly disclosed.
pub const NOT_PUBLICLY_DISCLOSED: &str = "not_publicly_disclosed";

/// Source tier used for auto-promoted domains.
pub const QUARANTINE_TIER: &str = "quarantine";
