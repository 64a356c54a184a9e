//! Tests for the memory table queries against a migrated connection.

use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use specbrain_storage::migrations::{current_version, run_migrations, LATEST_VERSION};
use specbrain_storage::queries::{component_lexicon, domain_field_yield, field_anchors, url_memory};

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

#[test]
fn migrations_are_idempotent() {
    let conn = setup_db();
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
    run_migrations(&conn).unwrap();
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
}

#[test]
fn component_upsert_increments_usage() {
    let conn = setup_db();
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let t1 = t0 + Duration::days(10);

    component_lexicon::upsert_at(&conn, "sensor", "mouse", "HERO 25K", "hero_25k", t0).unwrap();
    component_lexicon::upsert_at(&conn, "sensor", "mouse", "HERO 25K", "", t1).unwrap();
    component_lexicon::upsert_at(&conn, "sensor", "mouse", "PAW3395", "paw3395", t1).unwrap();
    component_lexicon::upsert_at(&conn, "sensor", "keyboard", "HERO 25K", "", t1).unwrap();

    let rows = component_lexicon::query(&conn, "sensor", "mouse").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, "HERO 25K");
    assert_eq!(rows[0].usage_count, 2);
    assert_eq!(rows[0].canonical, "hero_25k");
    assert_eq!(rows[0].created_at, t0);
    assert_eq!(rows[0].updated_at, t1);
    assert_eq!(component_lexicon::count(&conn).unwrap(), 3);
}

#[test]
fn anchors_and_urls_are_keyed_by_field_and_category() {
    let conn = setup_db();
    let now = Utc::now();
    field_anchors::upsert_at(&conn, "dpi", "mouse", "max dpi", now).unwrap();
    field_anchors::upsert_at(&conn, "dpi", "mouse", "max dpi", now).unwrap();
    field_anchors::upsert_at(&conn, "dpi", "mouse", "resolution", now).unwrap();
    let anchors = field_anchors::query(&conn, "dpi", "mouse").unwrap();
    assert_eq!(
        anchors.iter().map(|a| (a.phrase.as_str(), a.usage_count)).collect::<Vec<_>>(),
        vec![("max dpi", 2), ("resolution", 1)]
    );

    url_memory::upsert_at(&conn, "dpi", "mouse", "https://a.com/x", "a.com", now).unwrap();
    url_memory::upsert_at(&conn, "weight", "mouse", "https://a.com/x", "a.com", now).unwrap();
    assert_eq!(url_memory::query(&conn, "dpi", "mouse").unwrap().len(), 1);
    assert!(url_memory::query(&conn, "dpi", "keyboard").unwrap().is_empty());
}

#[test]
fn domain_yield_accumulates_and_flags_low_yield() {
    let conn = setup_db();
    let now = Utc::now();
    for _ in 0..10 {
        domain_field_yield::upsert_at(&conn, "spam.com", "dpi", "mouse", 1, 0, now).unwrap();
    }
    for i in 0..10 {
        let used = i64::from(i % 2 == 0);
        domain_field_yield::upsert_at(&conn, "good.com", "dpi", "mouse", 1, used, now).unwrap();
    }
    domain_field_yield::upsert_at(&conn, "rare.com", "dpi", "mouse", 2, 0, now).unwrap();

    let rows = domain_field_yield::query(&conn, "dpi", "mouse").unwrap();
    let good = rows.iter().find(|r| r.domain == "good.com").unwrap();
    assert_eq!(good.seen_count, 10);
    assert_eq!(good.used_count, 5);
    assert!((good.yield_ratio() - 0.5).abs() < 1e-12);

    let low = domain_field_yield::low_yield_domains(&conn, "mouse", 5, 0.2).unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].domain, "spam.com");
    assert_eq!(low[0].yield_ratio, 0.0);
}

#[test]
fn negative_deltas_never_decrement() {
    let conn = setup_db();
    let now = Utc::now();
    domain_field_yield::upsert_at(&conn, "a.com", "dpi", "mouse", 3, 2, now).unwrap();
    domain_field_yield::upsert_at(&conn, "a.com", "dpi", "mouse", -5, -5, now).unwrap();
    let rows = domain_field_yield::query(&conn, "dpi", "mouse").unwrap();
    assert_eq!((rows[0].seen_count, rows[0].used_count), (3, 2));
}

#[test]
fn default_timestamps_are_parseable() {
    let conn = setup_db();
    conn.execute(
        "INSERT INTO field_anchors (field, category, phrase) VALUES ('dpi', 'mouse', 'cpi')",
        [],
    )
    .unwrap();
    let rows = field_anchors::query(&conn, "dpi", "mouse").unwrap();
    assert_eq!(rows.len(), 1);
    assert!((Utc::now() - rows[0].created_at).num_minutes() < 5);
}
