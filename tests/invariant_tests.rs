//! Structural invariants hold across mixed workloads and restarts

use sc_strings::testing::prelude::*;
use sc_strings::testing::{LinkedContentIndexed, OffsetsWithinLog, OwnersMatchReferences};
use sc_strings::{StoreConfig, StringStore, TermMode};
use tempfile::TempDir;

fn assert_consistent(store: &StringStore) {
    let violations = check_all_invariants(store, &default_invariants());
    for violation in &violations {
        eprintln!("{}", violation);
    }
    assert!(violations.is_empty(), "{} invariant violations", violations.len());
}

#[test]
fn test_invariants_after_mixed_workload() {
    let tmp = TempDir::new().unwrap();
    let mut store = StringStore::initialize(StoreConfig::new(tmp.path())).unwrap();

    let labels = ["rust", "python", "go", "zig", "rust systems", "python tooling"];
    for link in 0..200u64 {
        let label = labels[(link as usize * 7) % labels.len()];
        store.link_string(link, &format!("{} node {}", label, link % 13)).unwrap();
    }
    // relink a slice of identifiers onto shared content
    for link in (0..200u64).step_by(5) {
        store.link_string(link, "shared concept").unwrap();
    }
    store.link_string(1000, &"z".repeat(2048)).unwrap();

    assert_consistent(&store);
    assert_eq!(store.owners_of(store.offset_of(0).unwrap()).len(), 40);
}

#[test]
fn test_invariants_survive_restart() {
    let tmp = TempDir::new().unwrap();
    let config = StoreConfig::new(tmp.path());

    let mut store = StringStore::initialize(config.clone()).unwrap();
    for link in 0..50u64 {
        store.link_string(link, &format!("entry {}", link % 10)).unwrap();
    }
    store.save().unwrap();
    store.shutdown();

    let mut reopened = StringStore::open(config).unwrap();
    assert_consistent(&reopened);

    for link in 25..75u64 {
        reopened.link_string(link, &format!("entry {}", link % 4)).unwrap();
    }
    assert_consistent(&reopened);
    assert_eq!(
        reopened
            .identifiers_for_terms(["entry", "3"], TermMode::And)
            .unwrap()
            .len(),
        reopened.identifiers_for_string("entry 3").unwrap().len()
    );
}

#[test]
fn test_individual_invariants_on_empty_store() {
    let tmp = TempDir::new().unwrap();
    let store = StringStore::initialize(StoreConfig::new(tmp.path())).unwrap();

    assert!(OwnersMatchReferences.check(&store).is_ok());
    assert!(OffsetsWithinLog.check(&store).is_ok());
    assert!(LinkedContentIndexed.check(&store).is_ok());
}
