// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Main implementation of the Manu Cuckoo Filter.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data_structures::manu_cuckoo_filter::bucket::BucketStore;
use crate::data_structures::manu_cuckoo_filter::config::ManuCuckooFilterConfig;
use crate::data_structures::manu_cuckoo_filter::error::{ManuCuckooFilterError, Result};
use crate::data_structures::manu_cuckoo_filter::eviction::{self, Placement};
use crate::data_structures::manu_cuckoo_filter::fingerprint::{Fingerprint, Fingerprinter};
use crate::data_structures::manu_cuckoo_filter::hash::{FilterHasher, HashAlgorithm};
use crate::data_structures::manu_cuckoo_filter::hooks::FilterHooks;
use crate::data_structures::manu_cuckoo_filter::index::IndexScheme;
use crate::data_structures::manu_cuckoo_filter::persistence::{
    read_snapshot, write_snapshot, FilterSnapshot, PersistFormat,
};
use crate::data_structures::manu_cuckoo_filter::resize;
use crate::data_structures::manu_cuckoo_filter::stats::{Counters, FilterStats};
use crate::error::{error_reporter, ErrorContext, ErrorReporter, ManuError};

/// A resizable cuckoo filter over byte-string items.
///
/// Membership answers may be false positives, never false negatives for
/// items still resident. The filter doubles its bucket count whenever an
/// insertion exhausts its eviction budget, so ordinary insertions do not
/// fail for lack of room.
///
/// All mutation goes through `&mut self`; wrap the filter in
/// [`SharedManuCuckooFilter`](super::SharedManuCuckooFilter) to share it
/// between threads.
///
/// # Deletion hazard
///
/// Deletion matches on fingerprint only. Deleting an item that was never
/// inserted but shares a fingerprint and bucket with a resident item
/// removes the resident one, which then reads as absent.
///
/// # Examples
///
/// ```
/// use manu_filter_lib::data_structures::manu_cuckoo_filter::ManuCuckooFilter;
///
/// let mut filter = ManuCuckooFilter::create(16, 4, 8, 50).unwrap();
/// filter.insert(b"apple").unwrap();
/// filter.insert(b"banana").unwrap();
///
/// assert!(filter.contains(b"apple"));
/// assert!(filter.delete(b"apple"));
/// assert_eq!(filter.stats().occupied, 1);
/// ```
pub struct ManuCuckooFilter {
    config: ManuCuckooFilterConfig,
    hasher: Arc<dyn FilterHasher>,
    fingerprinter: Fingerprinter,
    scheme: IndexScheme,
    store: BucketStore,
    counters: Counters,
    rng: StdRng,
    hooks: FilterHooks,
    reporter: Arc<dyn ErrorReporter>,
}

impl ManuCuckooFilter {
    /// Create a filter with default configuration.
    pub fn new() -> Self {
        let config = ManuCuckooFilterConfig::default();
        let hasher = config.hash_algorithm.build();
        Self::assemble(config, hasher)
    }

    /// Create an empty filter from explicit geometry.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a size is zero, `bucket_count` is not a power of
    /// two or `fingerprint_bits` is outside `1..=32`.
    pub fn create(
        bucket_count: usize,
        bucket_size: usize,
        fingerprint_bits: u32,
        max_kicks: usize,
    ) -> Result<Self> {
        Self::with_config(
            ManuCuckooFilterConfig::new()
                .with_bucket_count(bucket_count)
                .with_bucket_size(bucket_size)
                .with_fingerprint_bits(fingerprint_bits)
                .with_max_kicks(max_kicks),
        )
    }

    /// Create a filter with the given configuration.
    pub fn with_config(config: ManuCuckooFilterConfig) -> Result<Self> {
        let hasher = config.hash_algorithm.build();
        Self::with_hasher(config, hasher)
    }

    /// Create a filter hashing with a caller-supplied primitive.
    ///
    /// `config.hash_algorithm` is ignored.
    pub fn with_hasher(config: ManuCuckooFilterConfig, hasher: Arc<dyn FilterHasher>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, hasher))
    }

    /// Load a filter from a snapshot written by [`persist`](Self::persist).
    ///
    /// The snapshot must name one of the built-in hashers.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let snapshot = read_snapshot(path.as_ref())?;
        let algorithm = HashAlgorithm::from_name(&snapshot.hasher).ok_or_else(|| {
            ManuCuckooFilterError::CorruptSnapshot(format!("unknown hasher {:?}", snapshot.hasher))
        })?;
        let config = ManuCuckooFilterConfig::new().with_hash_algorithm(algorithm);
        let mut filter = Self::assemble(config, algorithm.build());
        filter.adopt(snapshot)?;
        Ok(filter)
    }

    fn assemble(config: ManuCuckooFilterConfig, hasher: Arc<dyn FilterHasher>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            fingerprinter: Fingerprinter::new(config.fingerprint_bits, Arc::clone(&hasher)),
            scheme: IndexScheme::new(config.bucket_count, config.bucket_count, Arc::clone(&hasher)),
            store: BucketStore::new(config.bucket_count, config.bucket_size),
            counters: Counters::default(),
            rng,
            hooks: FilterHooks::default(),
            reporter: error_reporter(),
            hasher,
            config,
        }
    }

    /// Install lifecycle hooks, replacing any previous set.
    pub fn with_hooks(mut self, hooks: FilterHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Report best-effort failures to `reporter` instead of the global one.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Insert an item.
    ///
    /// Returns `Ok(true)` once the fingerprint is stored. When both
    /// candidate buckets are full and the eviction budget runs out, the
    /// filter doubles and the item is retried once against the grown store.
    ///
    /// # Errors
    ///
    /// `InsertFailed` without resizing when both candidate buckets are
    /// already full of this fingerprint (for example the same item inserted
    /// many times), since growth cannot make room for it. Also returned if
    /// the grown store cannot be allocated or the retry after growth fails.
    /// `ResizeInvariantBroken` if growth itself failed; the filter is then
    /// unchanged.
    pub fn insert(&mut self, item: &[u8]) -> Result<bool> {
        let fp = self.fingerprinter.fingerprint(item);

        if !self.try_insert(item, fp) {
            let (primary, alternate) = self.scheme.candidates(item, fp);
            if self.store.only_holds(primary, fp) && self.store.only_holds(alternate, fp) {
                // Doubling carries every copy into the new candidate pair.
                warn!(
                    bucket_count = self.scheme.bucket_count(),
                    "candidate buckets saturated with this fingerprint"
                );
                return Err(ManuCuckooFilterError::InsertFailed {
                    bucket_count: self.scheme.bucket_count(),
                });
            }
            self.grow()?;
            if !self.try_insert(item, fp) {
                warn!(
                    bucket_count = self.scheme.bucket_count(),
                    "insertion failed after resize"
                );
                return Err(ManuCuckooFilterError::InsertFailed {
                    bucket_count: self.scheme.bucket_count(),
                });
            }
        }

        self.counters.insertions += 1;
        self.hooks.fire_insert(item, fp);
        self.auto_persist("insert");
        Ok(true)
    }

    /// Insert any serializable value, encoded as JSON bytes.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the value cannot be serialized, before any hashing.
    pub fn insert_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<bool> {
        let item = encode_item(value)?;
        self.insert(&item)
    }

    /// Whether the item may be present.
    pub fn contains(&self, item: &[u8]) -> bool {
        let fp = self.fingerprinter.fingerprint(item);
        let (primary, alternate) = self.scheme.candidates(item, fp);
        self.store.contains(primary, fp) || self.store.contains(alternate, fp)
    }

    /// [`contains`](Self::contains) for a serializable value.
    pub fn contains_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        let item = encode_item(value)?;
        Ok(self.contains(&item))
    }

    /// Remove one copy of the item's fingerprint.
    ///
    /// Returns `false` if neither candidate bucket holds it.
    pub fn delete(&mut self, item: &[u8]) -> bool {
        let fp = self.fingerprinter.fingerprint(item);
        let (primary, alternate) = self.scheme.candidates(item, fp);
        if !(self.store.try_remove(primary, fp) || self.store.try_remove(alternate, fp)) {
            return false;
        }

        self.counters.deletions += 1;
        self.hooks.fire_delete(item, fp);
        self.auto_persist("delete");
        true
    }

    /// [`delete`](Self::delete) for a serializable value.
    pub fn delete_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<bool> {
        let item = encode_item(value)?;
        Ok(self.delete(&item))
    }

    /// Fraction of slots holding a fingerprint, in `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        self.store.occupied() as f64 / self.store.capacity() as f64
    }

    /// Geometry and cumulative counters.
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            bucket_count: self.scheme.bucket_count(),
            bucket_size: self.store.bucket_size(),
            fingerprint_bits: self.fingerprinter.bits(),
            occupied: self.store.occupied(),
            load_factor: self.load_factor(),
            insertions: self.counters.insertions,
            deletions: self.counters.deletions,
            kicks: self.counters.kicks,
            resizes: self.counters.resizes,
        }
    }

    /// Empty every bucket and zero the counters. The bucket count is kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.counters = Counters::default();
        debug!(bucket_count = self.scheme.bucket_count(), "filter cleared");
    }

    /// Number of stored fingerprints.
    pub fn len(&self) -> usize {
        self.store.occupied()
    }

    /// Whether no fingerprint is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slot capacity at the current size.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.scheme.bucket_count()
    }

    /// Configuration the filter was built or restored with.
    pub fn config(&self) -> &ManuCuckooFilterConfig {
        &self.config
    }

    /// Fingerprint the filter would store for `item`.
    pub fn fingerprint(&self, item: &[u8]) -> Fingerprint {
        self.fingerprinter.fingerprint(item)
    }

    /// Write a snapshot; `.txt` paths use the text encoding, others JSON.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.persist_as(path, PersistFormat::for_path(path))
    }

    /// Write a snapshot in an explicit format.
    pub fn persist_as(&self, path: impl AsRef<Path>, format: PersistFormat) -> Result<()> {
        write_snapshot(path.as_ref(), &self.snapshot(), format)
    }

    /// Replace the filter state with a snapshot.
    ///
    /// Geometry and counters come from the snapshot. On any error the
    /// filter is left exactly as it was.
    ///
    /// # Errors
    ///
    /// `PersistenceIo` if the file cannot be read, `CorruptSnapshot` if it
    /// does not decode, `HasherMismatch` if it was written with another
    /// hash primitive.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = read_snapshot(path.as_ref())?;
        self.adopt(snapshot)?;
        info!(
            path = ?path.as_ref(),
            bucket_count = self.scheme.bucket_count(),
            occupied = self.store.occupied(),
            "filter restored"
        );
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot::capture(
            &self.store,
            self.hasher.name(),
            self.scheme.base_bucket_count(),
            self.fingerprinter.bits(),
            self.config.max_kicks,
            self.counters,
        )
    }

    fn adopt(&mut self, snapshot: FilterSnapshot) -> Result<()> {
        if snapshot.hasher != self.hasher.name() {
            return Err(ManuCuckooFilterError::HasherMismatch {
                expected: self.hasher.name().to_string(),
                found: snapshot.hasher,
            });
        }
        let store = snapshot.build_store()?;

        // Nothing below can fail.
        self.config.bucket_count = snapshot.base_bucket_count;
        self.config.bucket_size = snapshot.bucket_size;
        self.config.fingerprint_bits = snapshot.fingerprint_bits;
        self.config.max_kicks = snapshot.max_kicks;
        self.fingerprinter = Fingerprinter::new(snapshot.fingerprint_bits, Arc::clone(&self.hasher));
        self.scheme = IndexScheme::new(
            snapshot.base_bucket_count,
            snapshot.bucket_count,
            Arc::clone(&self.hasher),
        );
        self.store = store;
        self.counters = snapshot.counters;
        Ok(())
    }

    fn try_insert(&mut self, item: &[u8], fp: Fingerprint) -> bool {
        let candidates = self.scheme.candidates(item, fp);
        let placement = eviction::place(
            &mut self.store,
            &self.scheme,
            &mut self.rng,
            fp,
            candidates,
            self.config.max_kicks,
        );
        self.counters.kicks += placement.kicks() as u64;
        matches!(placement, Placement::Placed { .. })
    }

    fn grow(&mut self) -> Result<()> {
        let doubled = self.store.capacity().checked_mul(2);
        if doubled.is_none() {
            return Err(ManuCuckooFilterError::InsertFailed {
                bucket_count: self.scheme.bucket_count(),
            });
        }

        let (store, scheme) = resize::grow(&self.store, &self.scheme)?;
        self.store = store;
        self.scheme = scheme;
        self.counters.resizes += 1;

        let bucket_count = self.scheme.bucket_count();
        info!(bucket_count, occupied = self.store.occupied(), "filter resized");
        self.hooks.fire_resize(bucket_count);
        Ok(())
    }

    fn auto_persist(&self, operation: &str) {
        let Some(path) = &self.config.auto_persist else {
            return;
        };
        if let Err(e) = self.persist(path) {
            warn!(?path, error = %e, operation, "auto-persist failed; in-memory change kept");
            self.reporter.report(
                ErrorContext::new(ManuError::Filter(e), "manu_cuckoo_filter")
                    .with_details(format!("auto-persist after {operation} to {}", path.display())),
            );
        }
    }
}

impl Default for ManuCuckooFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManuCuckooFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManuCuckooFilter")
            .field("hasher", &self.hasher.name())
            .field("bucket_count", &self.scheme.bucket_count())
            .field("bucket_size", &self.store.bucket_size())
            .field("fingerprint_bits", &self.fingerprinter.bits())
            .field("occupied", &self.store.occupied())
            .field("counters", &self.counters)
            .field("hooks", &self.hooks)
            .finish()
    }
}

fn encode_item<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ManuCuckooFilterError::InvalidInput(e.to_string()))
}
