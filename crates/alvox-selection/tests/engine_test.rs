//! Round orchestration against the SQLite mask store.

use std::sync::Arc;

use alvox_core::traits::{MaskStore, ReportValue};
use alvox_core::{AlvoxConfig, CloudId, Criterion, Granularity};
use alvox_selection::{AnySelector, MemorySink, SelectionEngine, SelectorSettings};
use alvox_storage::SqliteMaskStore;
use test_fixtures::{CloudDir, FixtureCloud, InMemoryDataset, RampModel};

fn config(criterion: &str, percentage: f64) -> AlvoxConfig {
    AlvoxConfig::from_toml(&format!(
        r#"
        [selection]
        criterion = "{criterion}"
        percentage = {percentage:.1}
        seed = 9
        "#
    ))
    .unwrap()
}

fn build_engine(
    dir: &CloudDir,
    store: SqliteMaskStore,
    config: &AlvoxConfig,
) -> (SelectionEngine<SqliteMaskStore>, Arc<MemorySink>) {
    let loaded = AnySelector::from_config(&dir.paths, config).unwrap();
    assert!(loaded.is_clean());
    let sink = Arc::new(MemorySink::new());
    let engine = SelectionEngine::new(loaded.value, store, Box::new(Arc::clone(&sink)), config);
    (engine, sink)
}

#[test]
fn first_round_is_random_then_configured_criterion() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(10), FixtureCloud::voxels(10)]);
    let config = config("entropy", 10.0);
    let (mut engine, sink) = build_engine(&dir, SqliteMaskStore::open_in_memory().unwrap(), &config);
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[10, 10]);

    // No model needed for the bootstrap round.
    let first = engine.run_round(&mut dataset, None).unwrap();
    assert_eq!(first.round, 1);
    assert_eq!(first.criterion, Criterion::Random);
    assert_eq!(first.selected_voxels, 2);
    assert!(first.unweighted.is_none());

    let second = engine.run_round(&mut dataset, Some(&RampModel)).unwrap();
    assert_eq!(second.round, 2);
    assert_eq!(second.criterion, Criterion::EntropyUncertainty);
    assert!(second.unweighted.is_some());
    assert!((engine.selector().labeled_ratio() - 0.2).abs() < 1e-9);

    let rounds = engine.store().rounds().unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0].criterion, "Random");
    assert_eq!(rounds[1].criterion, "EntropyUncertainty");
    assert!(engine.store().statistics(2).unwrap().contains_key("unweighted"));
    assert!(engine.store().statistics(1).unwrap().is_empty());

    let round_reports = sink.named("selection_round");
    assert_eq!(round_reports.len(), 2);
    assert_eq!(round_reports[1]["round"], ReportValue::Count(2));
    assert_eq!(sink.named("metric_statistics.unweighted").len(), 1);
    assert_eq!(sink.named("dataset_statistics").len(), 2);
}

#[test]
fn round_size_follows_selector_settings() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(10)]);
    let mut settings = SelectorSettings::default();
    settings.percentage = 50.0;
    let selector = AnySelector::load(&dir.paths, Granularity::Voxels, settings).value;
    let mut engine = SelectionEngine::new(
        selector,
        SqliteMaskStore::open_in_memory().unwrap(),
        Box::new(MemorySink::new()),
        &AlvoxConfig::default(),
    );
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[10]);

    let summary = engine.run_round(&mut dataset, None).unwrap();
    assert_eq!(summary.selected_voxels, 5);
    assert_eq!(engine.store().rounds().unwrap()[0].percentage, 50.0);
}

#[test]
fn persisted_selection_matches_merged_masks() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(8), FixtureCloud::voxels(4)]);
    let config = config("random", 25.0);
    let (mut engine, _sink) = build_engine(&dir, SqliteMaskStore::open_in_memory().unwrap(), &config);
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[8, 4]);

    let summary = engine.run_round(&mut dataset, None).unwrap();
    let stored = engine.store().load_selection(1).unwrap().unwrap();
    assert_eq!(stored.total_units(), summary.selected_voxels);

    let masks = engine.store().load_masks().unwrap();
    assert_eq!(masks.len(), 2);
    for record in &masks {
        assert_eq!(Some(record.mask.as_slice()), dataset.mask(record.cloud_id));
        let labeled = record.mask.iter().filter(|l| **l).count();
        assert_eq!(labeled, stored.get(record.cloud_id).map_or(0, <[u32]>::len));
    }
}

#[test]
fn reopened_store_restores_masks_and_continues_numbering() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(10), FixtureCloud::voxels(5)]);
    let db = tempfile::tempdir().unwrap();
    let db_path = db.path().join("alvox.db");
    let config = config("random", 20.0);

    let first_mask = {
        let (mut engine, _) = build_engine(&dir, SqliteMaskStore::open(&db_path).unwrap(), &config);
        let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[10, 5]);
        engine.run_round(&mut dataset, None).unwrap();
        engine.selector().masks()
    };

    let (mut engine, _) = build_engine(&dir, SqliteMaskStore::open(&db_path).unwrap(), &config);
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[10, 5]);
    let restored = engine.restore(&mut dataset).unwrap();
    assert!(restored.is_clean());
    assert_eq!(restored.newly_labeled, 3);
    assert_eq!(engine.selector().masks(), first_mask);
    assert_eq!(dataset.mask(CloudId(1)), Some(first_mask[1].mask.as_slice()));

    let next = engine.run_round(&mut dataset, None).unwrap();
    assert_eq!(next.round, 2);
    assert_eq!(next.eligible_units, 12);
    assert_eq!(next.merge.newly_labeled, 3);
}

#[test]
fn restore_runs_once() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(4).labeled(&[0])]);
    let store = SqliteMaskStore::open_in_memory().unwrap();
    store
        .seed_masks(&[alvox_core::traits::CloudMaskRecord {
            cloud_id: CloudId(0),
            path: dir.paths[0].display().to_string(),
            mask: vec![true, true, false, false],
        }])
        .unwrap();
    let (mut engine, _) = build_engine(&dir, store, &config("random", 10.0));
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[4]);

    assert_eq!(engine.restore(&mut dataset).unwrap().newly_labeled, 1);
    assert_eq!(engine.restore(&mut dataset).unwrap(), Default::default());
    assert_eq!(dataset.update_count(), 1);
}

#[test]
fn runs_until_target_reached() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(6), FixtureCloud::voxels(6)]);
    let config = AlvoxConfig::from_toml(
        r#"
        [selection]
        criterion = "least_confidence"
        percentage = 25.0
        target_percentage = 100.0
        "#,
    )
    .unwrap();
    let (mut engine, sink) = build_engine(&dir, SqliteMaskStore::open_in_memory().unwrap(), &config);
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[6, 6]);

    let summaries = engine.run_until_finished(&mut dataset, Some(&RampModel), 50).unwrap();
    assert!(engine.is_finished());
    assert!(summaries.last().unwrap().finished);
    assert!(summaries.iter().all(|s| s.selected_units > 0));
    assert_eq!(engine.selector().labeled_ratio(), 1.0);
    engine.selector().statistics().ensure_fully_labeled().unwrap();
    assert_eq!(engine.store().rounds().unwrap().len(), summaries.len());
    assert_eq!(sink.named("selection_round").len(), summaries.len());
    assert_eq!(engine.store().label_totals().unwrap(), (12, 12));
}

#[test]
fn max_rounds_bounds_the_loop() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(100)]);
    let (mut engine, _) = build_engine(
        &dir,
        SqliteMaskStore::open_in_memory().unwrap(),
        &config("random", 1.0),
    );
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[100]);
    let summaries = engine.run_until_finished(&mut dataset, None, 3).unwrap();
    assert_eq!(summaries.len(), 3);
    assert!(!engine.is_finished());
}

#[test]
fn uncertainty_round_without_model_fails_and_records_nothing() {
    let dir = CloudDir::new(&[FixtureCloud::voxels(4)]);
    let config = AlvoxConfig::from_toml(
        r#"
        [selection]
        criterion = "margin"
        initial_random = false
        "#,
    )
    .unwrap();
    let (mut engine, _) = build_engine(&dir, SqliteMaskStore::open_in_memory().unwrap(), &config);
    let mut dataset = InMemoryDataset::new(dir.paths.clone(), &[4]);
    assert!(engine.run_round(&mut dataset, None).is_err());
    assert_eq!(engine.store().latest_round().unwrap(), None);
    assert_eq!(engine.selector().labeled_ratio(), 0.0);
}
