//! Tests for Engine
//!
//! These tests verify:
//! - Data directory and file layout
//! - Basic insert/find/edit/delete through the facade
//! - Manifest handling on reopen
//! - Stores of different record types
//! - The sequence generator used for test codes

use linhashdb::config::Config;
use linhashdb::engine::Engine;
use linhashdb::manifest::StoreManifest;
use linhashdb::record::{PcrTest, Person, Record};
use linhashdb::sequence::SequenceGenerator;
use linhashdb::LinHashError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn small_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .initial_buckets(4)
        .primary_block_size(8 + 2 * PcrTest::SIZE)
        .overflow_block_size(8 + 2 * PcrTest::SIZE)
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine<PcrTest>) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(small_config(&temp_dir)).unwrap();
    (temp_dir, engine)
}

fn test_record(code: i32) -> PcrTest {
    PcrTest::new(1_700_000_000_000, "pat-1", code, false, 0.5, "routine")
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_files() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("store");

    let config = Config::builder().data_dir(&data_dir).build();
    let engine: Engine<PcrTest> = Engine::open(config).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("manifest.bin").exists());
    assert!(engine.primary_path().exists());
    assert!(engine.overflow_path().exists());
    assert!(data_dir.join("primary.bin_dir.txt").exists());
    assert!(data_dir.join("overflow.bin_header.txt").exists());
    assert_eq!(engine.bucket_count(), 4);
}

#[test]
fn test_engine_open_path_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let engine: Engine<PcrTest> = Engine::open_path(temp_dir.path()).unwrap();

    assert_eq!(engine.config().initial_buckets, 4);
    assert_eq!(engine.manifest().primary_block_size, 1024);
    assert_eq!(engine.manifest().overflow_block_size, 512);
    assert_eq!(engine.hash_file().primary().block_factor(), (1024 - 8) / PcrTest::SIZE);
}

#[test]
fn test_engine_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("bad"))
        .initial_buckets(3)
        .build();

    let result: linhashdb::Result<Engine<PcrTest>> = Engine::open(config);
    assert!(matches!(result, Err(LinHashError::Config(_))));
    assert!(!temp_dir.path().join("bad").exists());
}

#[test]
fn test_engine_close() {
    let (_temp, mut engine) = setup_temp_engine();
    engine.insert(test_record(1)).unwrap();
    engine.close().unwrap();
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_insert_find() {
    let (_temp, mut engine) = setup_temp_engine();

    assert!(engine.insert(test_record(100)).unwrap());
    assert!(!engine.insert(test_record(100)).unwrap());

    assert_eq!(engine.find(&PcrTest::with_code(100)).unwrap(), Some(test_record(100)));
    assert_eq!(engine.find(&PcrTest::with_code(101)).unwrap(), None);
}

#[test]
fn test_engine_edit() {
    let (_temp, mut engine) = setup_temp_engine();
    engine.insert(test_record(7)).unwrap();

    let mut edited = test_record(7);
    edited.positive = true;
    edited.value = 31.5;
    assert!(engine.edit(&edited).unwrap());
    assert_eq!(engine.find(&PcrTest::with_code(7)).unwrap(), Some(edited));

    assert!(!engine.edit(&test_record(8)).unwrap());
}

#[test]
fn test_engine_delete() {
    let (_temp, mut engine) = setup_temp_engine();
    engine.insert(test_record(9)).unwrap();

    assert_eq!(engine.delete(&PcrTest::with_code(9)).unwrap(), Some(test_record(9)));
    assert_eq!(engine.delete(&PcrTest::with_code(9)).unwrap(), None);
    assert_eq!(engine.stats().total_records(), 0);
}

#[test]
fn test_engine_bucket_enumeration() {
    let (_temp, mut engine) = setup_temp_engine();
    for code in [2, 6, 10] {
        engine.insert(test_record(code)).unwrap();
    }

    assert_eq!(engine.bucket_record_count(2).unwrap(), 3);
    assert_eq!(engine.bucket_chain(2).unwrap().len(), 2);
    assert_eq!(engine.bucket_record_count(0).unwrap(), 0);
}

// =============================================================================
// Manifest Tests
// =============================================================================

#[test]
fn test_engine_reopen_uses_stored_parameters() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut engine: Engine<PcrTest> = Engine::open(small_config(&temp_dir)).unwrap();
        for code in 1..=12 {
            engine.insert(test_record(code)).unwrap();
        }
        engine.close().unwrap();
    }

    // Different layout parameters are overridden by the manifest
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .initial_buckets(32)
        .primary_block_size(4096)
        .build();
    let engine: Engine<PcrTest> = Engine::open(config).unwrap();

    assert_eq!(engine.manifest().initial_buckets, 4);
    assert_eq!(engine.hash_file().primary().block_size(), 8 + 2 * PcrTest::SIZE);
    assert_eq!(engine.stats().total_records(), 12);
    for code in 1..=12 {
        assert!(engine.find(&PcrTest::with_code(code)).unwrap().is_some());
    }
}

#[test]
fn test_engine_rejects_other_record_type() {
    let temp_dir = TempDir::new().unwrap();
    {
        let _engine: Engine<PcrTest> = Engine::open_path(temp_dir.path()).unwrap();
    }

    let result: linhashdb::Result<Engine<Person>> = Engine::open_path(temp_dir.path());
    assert!(matches!(result, Err(LinHashError::Config(_))));
}

#[test]
fn test_engine_reopen_ignores_overridden_parameters() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut engine: Engine<PcrTest> = Engine::open(small_config(&temp_dir)).unwrap();
        engine.insert(test_record(1)).unwrap();
    }

    // Not a power of two, but the stored value is used instead
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .initial_buckets(3)
        .build();
    let engine: Engine<PcrTest> = Engine::open(config).unwrap();
    assert_eq!(engine.bucket_count(), 4);
    assert!(engine.find(&PcrTest::with_code(1)).unwrap().is_some());

    // The split threshold is not stored and is still checked
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .split_threshold(-1.0)
        .build();
    let result: linhashdb::Result<Engine<PcrTest>> = Engine::open(config);
    assert!(matches!(result, Err(LinHashError::Config(_))));
}

#[test]
fn test_manifest_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.bin");

    let manifest = StoreManifest::new::<Person>(&small_config(&temp_dir).hash_params()).unwrap();
    manifest.save(&path).unwrap();

    let loaded = StoreManifest::load(&path).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.record_size, 126);
    assert!(loaded.check_record::<Person>().is_ok());
    assert!(loaded.check_record::<PcrTest>().is_err());
}

#[test]
fn test_manifest_version_checked() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.bin");

    let mut manifest = StoreManifest::new::<PcrTest>(&small_config(&temp_dir).hash_params()).unwrap();
    manifest.format_version = 99;
    manifest.save(&path).unwrap();

    assert!(matches!(
        StoreManifest::load(&path),
        Err(LinHashError::Metadata(_))
    ));
}

// =============================================================================
// Person Store Tests
// =============================================================================

#[test]
fn test_person_store() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .primary_block_size(8 + 3 * Person::SIZE)
        .overflow_block_size(8 + Person::SIZE)
        .build();
    let mut engine: Engine<Person> = Engine::open(config).unwrap();

    for n in 0..40 {
        let mut person = Person::new("First", format!("Last{}", n), 0, format!("uuid-{}", n));
        person.add_test(n);
        assert!(engine.insert(person).unwrap());
    }

    assert!(engine.bucket_count() > 4);
    for n in 0..40 {
        let person = engine.find(&Person::with_uuid(format!("uuid-{}", n))).unwrap().unwrap();
        assert_eq!(person.last_name, format!("Last{}", n));
        assert_eq!(person.tests(), &[n]);
    }

    let mut person = engine.find(&Person::with_uuid("uuid-3")).unwrap().unwrap();
    person.add_test(1000);
    assert!(engine.edit(&person).unwrap());
    assert_eq!(
        engine.find(&Person::with_uuid("uuid-3")).unwrap().unwrap().tests(),
        &[3, 1000]
    );
}

#[test]
fn test_person_store_long_uuid() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine: Engine<Person> = Engine::open_path(temp_dir.path()).unwrap();

    assert!(engine.insert(Person::new("A", "B", 0, "0123456789AB")).unwrap());

    let found = engine.find(&Person::with_uuid("0123456789AB")).unwrap().unwrap();
    assert_eq!(found.uuid(), "0123456789");
    assert!(!engine.insert(Person::new("A", "B", 0, "0123456789AB")).unwrap());
    assert_eq!(engine.stats().total_records(), 1);
}

// =============================================================================
// Sequence Tests
// =============================================================================

#[test]
fn test_sequence_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seq.txt");

    {
        let mut seq = SequenceGenerator::open(&path).unwrap();
        assert_eq!(seq.current_value(), 0);
        assert_eq!(seq.next_value().unwrap(), 1);
        assert_eq!(seq.next_value().unwrap(), 2);
    }

    let mut seq = SequenceGenerator::open(&path).unwrap();
    assert_eq!(seq.current_value(), 2);
    assert_eq!(seq.next_value().unwrap(), 3);

    seq.reset(100).unwrap();
    let seq = SequenceGenerator::open(&path).unwrap();
    assert_eq!(seq.current_value(), 100);
}

#[test]
fn test_sequence_rejects_garbage() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seq.txt");
    std::fs::write(&path, "not a number").unwrap();

    assert!(matches!(
        SequenceGenerator::open(&path),
        Err(LinHashError::Metadata(_))
    ));
}

#[test]
fn test_sequence_exhausted() {
    let temp_dir = TempDir::new().unwrap();
    let mut seq = SequenceGenerator::open(temp_dir.path().join("seq.txt")).unwrap();

    seq.reset(i32::MAX).unwrap();
    assert!(seq.next_value().is_err());
    assert_eq!(seq.current_value(), i32::MAX);
}
