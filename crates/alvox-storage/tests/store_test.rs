//! Persistence round trips for masks, selections and statistics.

use std::collections::BTreeMap;

use alvox_core::traits::{CloudMaskRecord, MaskStore, RoundRecord};
use alvox_core::{CloudId, Criterion, Granularity, Selection};
use alvox_storage::migrations::{self, LATEST_VERSION};
use alvox_storage::{DatabaseManager, SqliteMaskStore};
use tempfile::TempDir;

fn mask(id: u32, bits: Vec<bool>) -> CloudMaskRecord {
    CloudMaskRecord {
        cloud_id: CloudId(id),
        path: format!("/data/cloud_{id}.json"),
        mask: bits,
    }
}

fn round(n: u32, selection: Selection, masks: Vec<CloudMaskRecord>) -> RoundRecord {
    let mut stats = BTreeMap::new();
    stats.insert(
        "unweighted".to_string(),
        serde_json::json!({ "criterion": "EntropyUncertainty", "selected": { "count": 3 } }),
    );
    RoundRecord {
        round: n,
        criterion: Criterion::EntropyUncertainty,
        granularity: Granularity::Superpoints,
        percentage: 10.0,
        selection,
        masks,
        labeled_ratio: 0.25,
        metric_statistics: stats,
    }
}

#[test]
fn masks_round_trip_exactly_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alvox.db");

    // 13 units: exercises a partial trailing byte.
    let bits: Vec<bool> = (0..13).map(|i| i % 3 == 0).collect();
    let mut selection = Selection::new();
    selection.insert(CloudId(0), [0, 3, 6, 9, 12]);
    selection.insert(CloudId(1), [70_000]);
    let mut large = vec![false; 70_001];
    large[70_000] = true;

    {
        let store = SqliteMaskStore::open(&path).unwrap();
        store
            .record_round(&round(1, selection.clone(), vec![mask(0, bits.clone()), mask(1, large.clone())]))
            .unwrap();
    }

    let store = SqliteMaskStore::open(&path).unwrap();
    let loaded = store.load_masks().unwrap();
    assert_eq!(loaded, vec![mask(0, bits), mask(1, large)]);
    assert_eq!(store.latest_round().unwrap(), Some(1));
    assert_eq!(store.load_selection(1).unwrap(), Some(selection));
    assert_eq!(store.load_selection(2).unwrap(), None);
}

#[test]
fn statistics_and_history_are_queryable() {
    let store = SqliteMaskStore::open_in_memory().unwrap();
    let mut first = Selection::new();
    first.insert(CloudId(0), [1]);
    store.record_round(&round(1, first, vec![mask(0, vec![false, true, false])])).unwrap();

    let mut second = Selection::new();
    second.insert(CloudId(0), [2]);
    store
        .record_round(&round(2, second, vec![mask(0, vec![false, true, true])]))
        .unwrap();

    let rounds = store.rounds().unwrap();
    assert_eq!(rounds.iter().map(|r| r.round).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rounds[0].criterion, "EntropyUncertainty");
    assert_eq!(rounds[0].granularity, "Superpoints");
    assert_eq!(rounds[1].selected_units, 1);

    let stats = store.statistics(2).unwrap();
    assert_eq!(stats["unweighted"]["selected"]["count"], 3);
    assert_eq!(store.rounds_for_cloud(CloudId(0)).unwrap(), vec![1, 2]);
    assert_eq!(store.label_totals().unwrap(), (3, 2));

    let stored = store.mask(CloudId(0)).unwrap().unwrap();
    assert_eq!(stored.mask, vec![false, true, true]);
}

#[test]
fn empty_store_has_no_rounds() {
    let store = SqliteMaskStore::open_in_memory().unwrap();
    assert_eq!(store.latest_round().unwrap(), None);
    assert!(store.load_masks().unwrap().is_empty());
    assert_eq!(store.label_totals().unwrap(), (0, 0));
}

#[test]
fn mask_length_change_is_rejected() {
    let store = SqliteMaskStore::open_in_memory().unwrap();
    store.seed_masks(&[mask(4, vec![false; 8])]).unwrap();
    assert!(store.seed_masks(&[mask(4, vec![false; 9])]).is_err());
}

#[test]
fn migrations_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m.db");
    let db = DatabaseManager::open(&path).unwrap();
    db.with_conn(|conn| {
        assert_eq!(migrations::current_version(conn)?, LATEST_VERSION);
        migrations::run_migrations(conn)?;
        assert_eq!(migrations::current_version(conn)?, LATEST_VERSION);
        Ok(())
    })
    .unwrap();
    drop(db);
    DatabaseManager::open(&path).unwrap();
}

#[test]
fn file_database_runs_in_wal_mode() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open(&dir.path().join("wal.db")).unwrap();
    assert!(db
        .with_conn(alvox_storage::connection::pragmas::verify_wal_mode)
        .unwrap());
    assert!(db.path().is_some());
}
