//! Cross-module tests for the Manu Cuckoo Filter.
//!
//! Covers membership guarantees under growth, snapshot round trips through
//! the public API and hook delivery.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::data_structures::manu_cuckoo_filter::{
    FilterHooks, HashAlgorithm, ManuCuckooFilter, ManuCuckooFilterConfig, ManuCuckooFilterError,
    PersistFormat,
};
use crate::tests::{create_test_dir, item_strategy, seeded_filter, write_file};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every inserted item is found, however many resizes it took.
    #[test]
    fn proptest_no_false_negatives(items in prop::collection::hash_set(item_strategy(), 1..400)) {
        let mut filter = seeded_filter(4, 2, 16);
        for item in &items {
            prop_assert!(filter.insert(item).unwrap());
        }
        for item in &items {
            prop_assert!(filter.contains(item));
        }
        prop_assert_eq!(filter.len(), items.len());
        prop_assert!(filter.load_factor() <= 1.0);
    }

    /// Deleting half the items keeps the other half.
    #[test]
    fn proptest_delete_keeps_the_rest(items in prop::collection::hash_set(item_strategy(), 2..200)) {
        let mut filter = seeded_filter(16, 4, 24);
        let items: Vec<_> = items.into_iter().collect();
        for item in &items {
            filter.insert(item).unwrap();
        }
        let (gone, kept) = items.split_at(items.len() / 2);
        for item in gone {
            prop_assert!(filter.delete(item));
        }
        for item in kept {
            prop_assert!(filter.contains(item));
        }
        prop_assert_eq!(filter.len(), kept.len());
    }

    /// A reopened snapshot answers every query like the original.
    #[test]
    fn proptest_snapshot_answers_match(
        items in prop::collection::vec(item_strategy(), 0..150),
        queries in prop::collection::vec(item_strategy(), 1..50),
        text in any::<bool>(),
    ) {
        let dir = create_test_dir().unwrap();
        let path = dir.path().join(if text { "round.txt" } else { "round.json" });

        let mut filter = seeded_filter(8, 4, 10);
        for item in &items {
            filter.insert(item).unwrap();
        }
        filter.persist(&path).unwrap();
        let reopened = ManuCuckooFilter::open(&path).unwrap();

        for query in items.iter().chain(&queries) {
            prop_assert_eq!(reopened.contains(query), filter.contains(query));
        }
        prop_assert_eq!(reopened.stats(), filter.stats());
    }
}

/// Absent items are rarely reported present at 8-bit fingerprints.
#[test]
fn test_false_positive_rate_is_low() {
    let mut filter = seeded_filter(16, 4, 8);
    for fruit in ["apple", "banana", "orange"] {
        filter.insert(fruit.as_bytes()).unwrap();
    }

    let queries = 10_000;
    let false_positives = (0..queries)
        .filter(|i| filter.contains(format!("grape-{i}").as_bytes()))
        .count();
    // Three fingerprints over two buckets each gives roughly 6 / 255.
    assert!(false_positives < queries / 20, "{false_positives} false positives");
}

#[test]
fn test_growth_from_tiny_filter() {
    let mut filter = seeded_filter(32, 4, 16);
    let items: Vec<String> = (0..200).map(|i| format!("item-{i}")).collect();

    let mut confirmed = Vec::new();
    for item in &items {
        filter.insert(item.as_bytes()).unwrap();
        confirmed.push(item);
        assert!(confirmed.iter().all(|c| filter.contains(c.as_bytes())));
    }

    let stats = filter.stats();
    assert!(stats.bucket_count > 32);
    assert!(stats.bucket_count.is_power_of_two());
    assert_eq!(stats.occupied, 200);
    assert_eq!(stats.insertions, 200);
}

#[test]
fn test_json_and_text_round_trip() {
    let dir = create_test_dir().unwrap();

    for (name, expected) in [("filter.json", PersistFormat::Json), ("filter.txt", PersistFormat::Text)] {
        let mut filter = seeded_filter(8, 4, 12);
        for i in 0..100u32 {
            filter.insert(&i.to_be_bytes()).unwrap();
        }
        filter.delete(&7u32.to_be_bytes());

        let path = dir.path().join(name);
        filter.persist(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.starts_with('{'), expected == PersistFormat::Json);

        let reopened = ManuCuckooFilter::open(&path).unwrap();
        assert_eq!(reopened.stats(), filter.stats());
        for i in (0..100u32).filter(|&i| i != 7) {
            assert!(reopened.contains(&i.to_be_bytes()), "{name}: {i} lost");
        }
    }
}

#[test]
fn test_persist_as_overrides_extension() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("filter.json");

    let mut filter = seeded_filter(8, 4, 8);
    filter.insert(b"text").unwrap();
    filter.persist_as(&path, PersistFormat::Text).unwrap();

    assert!(std::fs::read_to_string(&path).unwrap().starts_with("manu-cuckoo-filter 1"));
    assert!(ManuCuckooFilter::open(&path).unwrap().contains(b"text"));
}

#[test]
fn test_restore_adopts_snapshot_geometry() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("big.json");

    let mut source = seeded_filter(4, 2, 20);
    for i in 0..50u32 {
        source.insert(&i.to_le_bytes()).unwrap();
    }
    source.persist(&path).unwrap();

    let mut target = seeded_filter(64, 4, 8);
    target.insert(b"overwritten").unwrap();
    target.restore(&path).unwrap();

    assert_eq!(target.stats(), source.stats());
    assert_eq!(target.config().fingerprint_bits, 20);
    assert!((0..50u32).all(|i| target.contains(&i.to_le_bytes())));

    // The restored filter keeps working, including growth.
    for i in 50..200u32 {
        target.insert(&i.to_le_bytes()).unwrap();
    }
    assert!((0..200u32).all(|i| target.contains(&i.to_le_bytes())));
}

#[test]
fn test_failed_restore_leaves_filter_untouched() {
    let dir = create_test_dir().unwrap();
    let mut filter = seeded_filter(8, 4, 12);
    filter.insert(b"resident").unwrap();
    let before = filter.stats();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        filter.restore(&missing),
        Err(ManuCuckooFilterError::PersistenceIo { .. })
    ));

    let garbage = write_file(dir.path(), "garbage.txt", "manu-cuckoo-filter 1\nbucket_count=oops\n");
    assert!(matches!(
        filter.restore(&garbage),
        Err(ManuCuckooFilterError::CorruptSnapshot(_))
    ));

    let huge = write_file(
        dir.path(),
        "huge.txt",
        "manu-cuckoo-filter 1\nhasher=fnv1a\nbase_bucket_count=16\nbucket_count=1099511627776\n\
         bucket_size=1024\nfingerprint_bits=8\nmax_kicks=50\nrecords\n",
    );
    assert!(matches!(
        filter.restore(&huge),
        Err(ManuCuckooFilterError::CorruptSnapshot(_))
    ));

    let sha_path = dir.path().join("sha.json");
    let sha = ManuCuckooFilter::with_config(
        ManuCuckooFilterConfig::new()
            .with_bucket_count(8)
            .with_hash_algorithm(HashAlgorithm::Sha256),
    )
    .unwrap();
    sha.persist(&sha_path).unwrap();
    assert!(matches!(
        filter.restore(&sha_path),
        Err(ManuCuckooFilterError::HasherMismatch { .. })
    ));

    assert_eq!(filter.stats(), before);
    assert!(filter.contains(b"resident"));
}

#[test]
fn test_open_uses_recorded_hasher() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("sha.txt");

    let mut filter = ManuCuckooFilter::with_config(
        ManuCuckooFilterConfig::new()
            .with_bucket_count(16)
            .with_hash_algorithm(HashAlgorithm::Sha256),
    )
    .unwrap();
    filter.insert(b"digest").unwrap();
    filter.persist(&path).unwrap();

    let reopened = ManuCuckooFilter::open(&path).unwrap();
    assert_eq!(reopened.config().hash_algorithm, HashAlgorithm::Sha256);
    assert!(reopened.contains(b"digest"));
}

#[test]
fn test_auto_persist_tracks_mutations() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("auto.json");

    let config = ManuCuckooFilterConfig::new()
        .with_bucket_count(8)
        .with_rng_seed(5)
        .with_auto_persist(&path);
    let mut filter = ManuCuckooFilter::with_config(config).unwrap();

    filter.insert(b"first").unwrap();
    assert!(ManuCuckooFilter::open(&path).unwrap().contains(b"first"));

    filter.delete(b"first");
    assert!(ManuCuckooFilter::open(&path).unwrap().is_empty());

    // Lookups and failed deletes do not rewrite the file.
    std::fs::remove_file(&path).unwrap();
    filter.contains(b"first");
    filter.delete(b"never-there");
    assert!(!path.exists());
}

#[test]
fn test_hooks_fire_after_each_event() {
    let inserts = Arc::new(AtomicUsize::new(0));
    let deleted = Arc::new(Mutex::new(HashSet::new()));
    let resizes = Arc::new(Mutex::new(Vec::new()));

    let hooks = FilterHooks::new()
        .on_insert({
            let inserts = Arc::clone(&inserts);
            move |_, _| {
                inserts.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_delete({
            let deleted = Arc::clone(&deleted);
            move |item, _| {
                deleted.lock().unwrap().insert(item.to_vec());
            }
        })
        .on_resize({
            let resizes = Arc::clone(&resizes);
            move |bucket_count| resizes.lock().unwrap().push(bucket_count)
        });

    let mut filter = seeded_filter(2, 2, 16).with_hooks(hooks);
    for i in 0..40u32 {
        filter.insert(&i.to_le_bytes()).unwrap();
    }
    filter.delete(&3u32.to_le_bytes());
    filter.delete(b"absent");

    assert_eq!(inserts.load(Ordering::SeqCst), 40);
    assert_eq!(*deleted.lock().unwrap(), HashSet::from([3u32.to_le_bytes().to_vec()]));

    let resizes = resizes.lock().unwrap();
    assert_eq!(resizes.len() as u64, filter.stats().resizes);
    assert!(resizes.windows(2).all(|w| w[1] == w[0] * 2));
    assert_eq!(resizes.last().copied(), Some(filter.bucket_count()));
}

#[test]
fn test_same_seed_same_layout() {
    let build = || {
        let mut filter = seeded_filter(4, 2, 16);
        for i in 0..64u32 {
            filter.insert(&i.to_le_bytes()).unwrap();
        }
        filter
    };
    let dir = create_test_dir().unwrap();
    let (a, b) = (dir.path().join("a.txt"), dir.path().join("b.txt"));
    build().persist(&a).unwrap();
    build().persist(&b).unwrap();

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}
