// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Fixed-capacity bucket storage.

use crate::data_structures::manu_cuckoo_filter::fingerprint::Fingerprint;

/// A flat array of `bucket_count * bucket_size` slots.
///
/// Bucket `i` owns slots `i * bucket_size .. (i + 1) * bucket_size`.
/// `None` marks an empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BucketStore {
    slots: Vec<Option<Fingerprint>>,
    bucket_size: usize,
    occupied: usize,
}

impl BucketStore {
    pub(crate) fn new(bucket_count: usize, bucket_size: usize) -> Self {
        Self {
            slots: vec![None; bucket_count * bucket_size],
            bucket_size,
            occupied: 0,
        }
    }

    /// Like [`new`](Self::new), but returns `None` instead of aborting when
    /// the slot array cannot be allocated.
    pub(crate) fn try_new(bucket_count: usize, bucket_size: usize) -> Option<Self> {
        let len = bucket_count.checked_mul(bucket_size)?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(len).ok()?;
        slots.resize(len, None);
        Some(Self {
            slots,
            bucket_size,
            occupied: 0,
        })
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.slots.len() / self.bucket_size
    }

    pub(crate) fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Total slot capacity.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored fingerprints.
    pub(crate) fn occupied(&self) -> usize {
        self.occupied
    }

    /// The slots of one bucket, in insertion order.
    pub(crate) fn bucket(&self, index: usize) -> &[Option<Fingerprint>] {
        let start = index * self.bucket_size;
        &self.slots[start..start + self.bucket_size]
    }

    fn bucket_mut(&mut self, index: usize) -> &mut [Option<Fingerprint>] {
        let start = index * self.bucket_size;
        &mut self.slots[start..start + self.bucket_size]
    }

    /// Store `fp` in the first free slot of bucket `index`.
    pub(crate) fn try_place(&mut self, index: usize, fp: Fingerprint) -> bool {
        match self.bucket_mut(index).iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(fp);
                self.occupied += 1;
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, index: usize, fp: Fingerprint) -> bool {
        self.bucket(index).contains(&Some(fp))
    }

    /// Whether bucket `index` is full and every slot holds `fp`.
    pub(crate) fn only_holds(&self, index: usize, fp: Fingerprint) -> bool {
        self.bucket(index).iter().all(|slot| *slot == Some(fp))
    }

    /// Remove the first copy of `fp` from bucket `index`.
    pub(crate) fn try_remove(&mut self, index: usize, fp: Fingerprint) -> bool {
        match self
            .bucket_mut(index)
            .iter_mut()
            .find(|slot| **slot == Some(fp))
        {
            Some(slot) => {
                *slot = None;
                self.occupied -= 1;
                true
            }
            None => false,
        }
    }

    /// Positions of the occupied slots in bucket `index`.
    pub(crate) fn occupied_slots(&self, index: usize) -> Vec<usize> {
        self.bucket(index)
            .iter()
            .enumerate()
            .filter_map(|(slot, fp)| fp.map(|_| slot))
            .collect()
    }

    /// Put `fp` into an occupied slot and hand back the fingerprint it displaced.
    ///
    /// Occupancy is unchanged.
    pub(crate) fn swap(&mut self, index: usize, slot: usize, fp: Fingerprint) -> Option<Fingerprint> {
        self.bucket_mut(index)[slot].replace(fp)
    }

    /// Every stored fingerprint with its bucket index.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, Fingerprint)> + '_ {
        let bucket_size = self.bucket_size;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(pos, slot)| slot.map(|fp| (pos / bucket_size, fp)))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.occupied = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(value: u32) -> Fingerprint {
        Fingerprint::new(value).unwrap()
    }

    #[test]
    fn test_place_until_full() {
        let mut store = BucketStore::new(4, 2);
        assert!(store.try_place(1, fp(7)));
        assert!(store.try_place(1, fp(8)));
        assert!(!store.try_place(1, fp(9)));
        assert_eq!(store.occupied(), 2);
        assert_eq!(store.bucket(1), &[Some(fp(7)), Some(fp(8))]);
        assert_eq!(store.bucket(0), &[None, None]);
    }

    #[test]
    fn test_remove_first_match_only() {
        let mut store = BucketStore::new(2, 4);
        store.try_place(0, fp(5));
        store.try_place(0, fp(5));

        assert!(store.try_remove(0, fp(5)));
        assert!(store.contains(0, fp(5)));
        assert_eq!(store.occupied(), 1);

        assert!(!store.try_remove(1, fp(5)));
        assert!(!store.try_remove(0, fp(6)));
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut store = BucketStore::new(1, 2);
        store.try_place(0, fp(1));
        store.try_place(0, fp(2));
        store.try_remove(0, fp(1));

        assert_eq!(store.occupied_slots(0), vec![1]);
        assert!(store.try_place(0, fp(3)));
        assert_eq!(store.bucket(0), &[Some(fp(3)), Some(fp(2))]);
    }

    #[test]
    fn test_swap_keeps_occupancy() {
        let mut store = BucketStore::new(2, 1);
        store.try_place(1, fp(4));
        assert_eq!(store.swap(1, 0, fp(6)), Some(fp(4)));
        assert_eq!(store.occupied(), 1);
        assert!(store.contains(1, fp(6)));
    }

    #[test]
    fn test_only_holds_needs_a_full_bucket_of_one_fingerprint() {
        let mut store = BucketStore::new(2, 2);
        assert!(!store.only_holds(0, fp(5)));
        store.try_place(0, fp(5));
        assert!(!store.only_holds(0, fp(5)));
        store.try_place(0, fp(5));
        assert!(store.only_holds(0, fp(5)));
        assert!(!store.only_holds(0, fp(6)));

        store.try_place(1, fp(5));
        store.try_place(1, fp(6));
        assert!(!store.only_holds(1, fp(5)));
    }

    #[test]
    fn test_try_new_refuses_impossible_sizes() {
        assert!(BucketStore::try_new(usize::MAX, 2).is_none());
        assert!(BucketStore::try_new(1 << 40, 1 << 10).is_none());
        assert_eq!(BucketStore::try_new(4, 2), Some(BucketStore::new(4, 2)));
    }

    #[test]
    fn test_iter_and_clear() {
        let mut store = BucketStore::new(4, 2);
        store.try_place(0, fp(1));
        store.try_place(3, fp(2));
        store.try_place(3, fp(3));

        let stored: Vec<_> = store.iter().collect();
        assert_eq!(stored, vec![(0, fp(1)), (3, fp(2)), (3, fp(3))]);
        assert_eq!(store.bucket_count(), 4);
        assert_eq!(store.capacity(), 8);

        store.clear();
        assert_eq!(store.occupied(), 0);
        assert_eq!(store.iter().count(), 0);
    }
}
