//! V002: brain_artifacts, one JSON payload per (category, kind).

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS brain_artifacts (
    category TEXT NOT NULL,
    kind TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    payload TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (category, kind)
);
"#;
