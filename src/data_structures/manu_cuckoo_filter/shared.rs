// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Thread-safe handle around a [`ManuCuckooFilter`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::data_structures::manu_cuckoo_filter::error::{ManuCuckooFilterError, Result};
use crate::data_structures::manu_cuckoo_filter::filter::ManuCuckooFilter;
use crate::data_structures::manu_cuckoo_filter::persistence::{write_snapshot, PersistFormat};
use crate::data_structures::manu_cuckoo_filter::stats::FilterStats;

/// Cloneable, lock-protected filter.
///
/// Lookups share a read lock; insertions, deletions and resizes take the
/// write lock, so a reader never observes a half-finished resize.
#[derive(Debug, Clone)]
pub struct SharedManuCuckooFilter {
    inner: Arc<RwLock<ManuCuckooFilter>>,
}

impl SharedManuCuckooFilter {
    pub fn new(filter: ManuCuckooFilter) -> Self {
        Self {
            inner: Arc::new(RwLock::new(filter)),
        }
    }

    pub fn insert(&self, item: &[u8]) -> Result<bool> {
        self.inner.write().insert(item)
    }

    pub fn insert_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        self.inner.write().insert_value(value)
    }

    pub fn contains(&self, item: &[u8]) -> bool {
        self.inner.read().contains(item)
    }

    pub fn contains_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        self.inner.read().contains_value(value)
    }

    pub fn delete(&self, item: &[u8]) -> bool {
        self.inner.write().delete(item)
    }

    pub fn delete_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        self.inner.write().delete_value(value)
    }

    pub fn load_factor(&self) -> f64 {
        self.inner.read().load_factor()
    }

    pub fn stats(&self) -> FilterStats {
        self.inner.read().stats()
    }

    pub fn clear(&self) {
        self.inner.write().clear()
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.read().persist(path)
    }

    pub fn restore(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.write().restore(path)
    }

    /// Persist without blocking the async runtime.
    ///
    /// The snapshot is captured under a read lock before the blocking
    /// write starts, so mutations made afterwards are not included.
    pub async fn persist_async(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let format = PersistFormat::for_path(&path);
        let snapshot = self.inner.read().snapshot();

        let task = tokio::task::spawn_blocking(move || write_snapshot(&path, &snapshot, format));
        match task.await {
            Ok(result) => result,
            Err(e) => Err(ManuCuckooFilterError::io(
                "<persist task>",
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )),
        }
    }

    /// Run `f` with exclusive access to the filter.
    pub fn with_filter<R>(&self, f: impl FnOnce(&mut ManuCuckooFilter) -> R) -> R {
        f(&mut *self.inner.write())
    }
}

impl From<ManuCuckooFilter> for SharedManuCuckooFilter {
    fn from(filter: ManuCuckooFilter) -> Self {
        Self::new(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::manu_cuckoo_filter::ManuCuckooFilterConfig;
    use std::thread;

    fn shared() -> SharedManuCuckooFilter {
        let config = ManuCuckooFilterConfig::new()
            .with_bucket_count(16)
            .with_bucket_size(4)
            .with_fingerprint_bits(16)
            .with_rng_seed(11);
        ManuCuckooFilter::with_config(config).unwrap().into()
    }

    #[test]
    fn test_concurrent_inserts() {
        let filter = shared();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let filter = filter.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        filter.insert(format!("t{t}-{i}").as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(filter.stats().occupied, 400);
        for t in 0..4 {
            for i in 0..100 {
                assert!(filter.contains(format!("t{t}-{i}").as_bytes()));
            }
        }
    }

    #[test]
    fn test_persist_async_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");

        let filter = shared();
        filter.insert(b"alpha").unwrap();
        filter.insert_value(&7u32).unwrap();

        tokio_test::block_on(filter.persist_async(path.clone())).unwrap();

        let restored = shared();
        restored.restore(&path).unwrap();
        assert!(restored.contains(b"alpha"));
        assert!(restored.contains_value(&7u32).unwrap());
        assert_eq!(restored.stats().insertions, 2);
    }

    #[test]
    fn test_with_filter_gives_mutable_access() {
        let filter = shared();
        let len = filter.with_filter(|f| {
            f.insert(b"x").unwrap();
            f.len()
        });
        assert_eq!(len, 1);
        assert!(filter.delete(b"x"));
    }
}
