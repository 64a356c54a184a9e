//! V001: the four decay-aware memory tables.
//! component_lexicon, field_anchors, url_memory, domain_field_yield.

pub const MIGRATION_SQL: &str = r#"
-- Component names learned per field (sensor, switch, ...), with the canonical
-- component they resolve to.
CREATE TABLE IF NOT EXISTS component_lexicon (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    field TEXT NOT NULL,
    category TEXT NOT NULL,
    value TEXT NOT NULL,
    canonical TEXT NOT NULL DEFAULT '',
    usage_count INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(field, category, value)
);

CREATE INDEX IF NOT EXISTS idx_component_lexicon_lookup
    ON component_lexicon(field, category);

-- Anchor phrases (key paths, labels) that located a field's value.
CREATE TABLE IF NOT EXISTS field_anchors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    field TEXT NOT NULL,
    category TEXT NOT NULL,
    phrase TEXT NOT NULL,
    usage_count INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(field, category, phrase)
);

CREATE INDEX IF NOT EXISTS idx_field_anchors_lookup
    ON field_anchors(field, category);

-- URLs that supplied an accepted value for a field.
CREATE TABLE IF NOT EXISTS url_memory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    field TEXT NOT NULL,
    category TEXT NOT NULL,
    url TEXT NOT NULL,
    root_domain TEXT NOT NULL DEFAULT '',
    usage_count INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(field, category, url)
);

CREATE INDEX IF NOT EXISTS idx_url_memory_lookup
    ON url_memory(field, category);

-- Per domain and field: how often the domain offered a candidate (seen)
-- and how often the accepted value cited it (used).
CREATE TABLE IF NOT EXISTS domain_field_yield (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    field TEXT NOT NULL,
    category TEXT NOT NULL,
    seen_count INTEGER NOT NULL DEFAULT 0,
    used_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE(domain, field, category)
);

CREATE INDEX IF NOT EXISTS idx_domain_field_yield_lookup
    ON domain_field_yield(field, category);
CREATE INDEX IF NOT EXISTS idx_domain_field_yield_category
    ON domain_field_yield(category, domain);
"#;
