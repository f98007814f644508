//! Integration tests for the deckstats-sqlite crate.

use deckstats_core::{
    CardInfo, CardMetadata, CardStore, MergeOutcome, PipelineConfig, analyze,
};
use deckstats_db::JsonCardStore;
use deckstats_sqlite::{Migration, SqliteCardStore, SqliteError};
use rusqlite::Connection;

fn migrated(prefix: &str) -> Migration {
    let conn = Connection::open_in_memory().unwrap();
    let mut migration = Migration::new(conn, prefix).unwrap();
    migration.up().unwrap();
    migration
}

fn goblin_rows() -> Vec<CardMetadata> {
    vec![
        CardMetadata::new("Premodern", "Goblin Lackey", CardInfo::new("Creature", "Goblin", "R")),
        CardMetadata::new("Premodern", "Mountain", CardInfo::new("Land", "Basic", "C")),
        CardMetadata::new("Premodern", "Pyroblast", CardInfo::new("Instant", "Hate", "R")),
    ]
}

// ---------------------------------------------------------------------------
// Upsert semantics
// ---------------------------------------------------------------------------

#[test]
fn test_missing_card_is_inserted_once() {
    let migration = migrated("ds_");
    let mut store = migration.store().unwrap();

    let outcome = store
        .merge("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Inserted);
    let outcome = store
        .merge("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_unknown_entry_is_upgraded() {
    let migration = migrated("ds_");
    let mut store = migration.store().unwrap();

    let lookup = store.lookup("Premodern", "Goblin Lackey").unwrap();
    assert!(lookup.newly_registered);
    assert!(!store.lookup("premodern", "Goblin Lackey").unwrap().newly_registered);

    let outcome = store
        .merge("premodern", "Goblin Lackey", CardInfo::new("Creature", "Goblin", "R"))
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Upgraded);
    assert_eq!(
        store.get("premodern", "Goblin Lackey").unwrap(),
        Some(CardInfo::new("Creature", "Goblin", "R"))
    );
}

#[test]
fn test_known_entry_is_never_overwritten() {
    let migration = migrated("ds_");
    let mut store = migration.store().unwrap();
    store
        .merge("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
        .unwrap();

    let outcome = store
        .merge("premodern", "Mountain", CardInfo::new("Creature", "Elf", "G"))
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);
    let outcome = store.merge("premodern", "Mountain", CardInfo::unknown()).unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);
    assert_eq!(
        store.get("premodern", "Mountain").unwrap(),
        Some(CardInfo::new("Land", "Basic", "C"))
    );
}

#[test]
fn test_import_twice_leaves_table_unchanged() {
    let mut migration = migrated("ds_");
    let first = migration.import(goblin_rows()).unwrap();
    assert_eq!(first.inserted, 3);
    let snapshot = migration.store().unwrap().rows().unwrap();

    let second = migration.import(goblin_rows()).unwrap();
    assert!(!second.changed());
    assert_eq!(second.unchanged, 3);
    assert_eq!(migration.store().unwrap().rows().unwrap(), snapshot);
}

#[test]
fn test_store_on_missing_table_reports_database_error() {
    let conn = Connection::open_in_memory().unwrap();
    let store = SqliteCardStore::new(&conn, "ds_").unwrap();
    assert!(matches!(
        store.get("premodern", "Mountain"),
        Err(SqliteError::DatabaseError(_))
    ));
}

// ---------------------------------------------------------------------------
// Seeding from the JSON card database
// ---------------------------------------------------------------------------

#[test]
fn test_seed_from_json_card_db() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("cards.json");
    let mut json = JsonCardStore::open(&json_path).unwrap();
    json.bulk_import(goblin_rows()).unwrap();
    json.lookup("premodern", "Mystery Card").unwrap();
    json.persist().unwrap();

    let mut migration = migrated("ds_");
    let report = migration.seed(&json_path).unwrap();
    assert_eq!(report.inserted, 4);

    let status = migration.status().unwrap();
    assert_eq!(status.card_count, 4);
    assert_eq!(status.unknown_count, 1);
    assert_eq!(
        migration.store().unwrap().unknown_cards("premodern").unwrap(),
        vec!["Mystery Card"]
    );
    assert_eq!(migration.store().unwrap().to_memory().unwrap(), *json.cards());
}

#[test]
fn test_refresh_replaces_table_contents() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("cards.json");
    let mut json = JsonCardStore::open(&json_path).unwrap();
    json.bulk_import(goblin_rows()).unwrap();
    json.persist().unwrap();

    let mut migration = migrated("ds_");
    migration.store().unwrap().lookup("legacy", "Brainstorm").unwrap();
    migration.refresh(&json_path).unwrap();

    let store = migration.store().unwrap();
    assert_eq!(store.formats().unwrap(), vec!["premodern"]);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_seed_missing_file_is_loader_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut migration = migrated("ds_");
    let err = migration.seed(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, SqliteError::LoaderError(_)));
}

// ---------------------------------------------------------------------------
// Pipeline on top of SQLite
// ---------------------------------------------------------------------------

#[test]
fn test_analysis_registers_unknown_cards_in_table() {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::open(dir.path().join("cards.db")).unwrap();
    let mut migration = Migration::new(conn, "ds_").unwrap();
    migration.up().unwrap();
    migration.import(goblin_rows()).unwrap();

    let blobs = [
        "4 Goblin Lackey\n20 Mountain\n\n3 Pyroblast",
        "4 Goblin Lackey\n19 Mountain\n1 Goblin Ringleader\n\n3 Pyroblast",
    ];
    let mut store = migration.store().unwrap();
    let run = analyze(&blobs, "Premodern", &mut store, &PipelineConfig::default()).unwrap();

    assert_eq!(run.unknown_cards.len(), 1);
    assert_eq!(run.unknown_cards[0].name, "Goblin Ringleader");
    assert!(run.unknown_cards[0].newly_registered);
    assert_eq!(store.unknown_cards("premodern").unwrap(), vec!["Goblin Ringleader"]);
    assert!(run.partition("R").is_some());
}
