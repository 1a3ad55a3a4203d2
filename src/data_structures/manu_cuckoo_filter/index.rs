// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Candidate bucket computation.
//!
//! Every fingerprint may live in exactly two buckets, its *primary* and
//! *alternate*. The alternate is derived from any one index plus the
//! fingerprint:
//!
//! ```text
//! alternate(i, fp) = (i ^ H_alt(fp)) & (bucket_count - 1)
//! ```
//!
//! which is its own inverse, so a displaced fingerprint can always find
//! its other home without the item that produced it.
//!
//! # Growth
//!
//! The filter remembers the bucket count it was created with (the
//! *base*). At the base level the primary index is `H_idx(item) & (base - 1)`.
//! Each doubling from `s` to `2s` maps a pair at level `s` onto a pair at
//! level `2s` using only the fingerprint:
//!
//! ```text
//! lift(i, fp, s) = min(i, alternate_s(i, fp)) + s * bit_s(H_lift(fp))
//! ```
//!
//! `lift` gives the same answer for both members of a pair, so stored
//! fingerprints can be moved to the grown store knowing only their bucket
//! (see [`IndexScheme::relocate`]), and lookups recompute the same pair by
//! lifting the base primary through every doubling.

use std::sync::Arc;

use crate::data_structures::manu_cuckoo_filter::fingerprint::Fingerprint;
use crate::data_structures::manu_cuckoo_filter::hash::{
    FilterHasher, ALTERNATE_SEED, INDEX_SEED, LIFT_SEED,
};

/// Domain-separation tag for the index hash.
const INDEX_TAG: &[u8] = b"\x00manu/ix";

/// Maps items and fingerprints onto bucket indices.
#[derive(Debug, Clone)]
pub(crate) struct IndexScheme {
    base_bucket_count: usize,
    bucket_count: usize,
    hasher: Arc<dyn FilterHasher>,
}

impl IndexScheme {
    /// Both counts must be powers of two with `base <= bucket_count`.
    pub(crate) fn new(
        base_bucket_count: usize,
        bucket_count: usize,
        hasher: Arc<dyn FilterHasher>,
    ) -> Self {
        debug_assert!(base_bucket_count.is_power_of_two());
        debug_assert!(bucket_count.is_power_of_two());
        debug_assert!(base_bucket_count <= bucket_count);
        Self {
            base_bucket_count,
            bucket_count,
            hasher,
        }
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub(crate) fn base_bucket_count(&self) -> usize {
        self.base_bucket_count
    }

    /// The same scheme at twice the bucket count.
    pub(crate) fn doubled(&self) -> Self {
        Self {
            base_bucket_count: self.base_bucket_count,
            bucket_count: self.bucket_count * 2,
            hasher: Arc::clone(&self.hasher),
        }
    }

    /// Primary bucket of `item` whose fingerprint is `fp`.
    pub(crate) fn primary_index(&self, item: &[u8], fp: Fingerprint) -> usize {
        let digest = self.hasher.digest(&[item, INDEX_TAG], INDEX_SEED);
        let mut index = (digest as usize) & (self.base_bucket_count - 1);
        if self.bucket_count == self.base_bucket_count {
            return index;
        }

        let alt_hash = self.alt_hash(fp);
        let lift_hash = self.lift_hash(fp);
        let mut level = self.base_bucket_count;
        while level < self.bucket_count {
            let partner = alternate_at(alt_hash, index, level);
            index = index.min(partner) + level * bit_at(lift_hash, level);
            level *= 2;
        }
        index
    }

    /// The other candidate bucket. Self-inverse for a fixed bucket count.
    pub(crate) fn alternate_index(&self, index: usize, fp: Fingerprint) -> usize {
        alternate_at(self.alt_hash(fp), index, self.bucket_count)
    }

    /// Both candidate buckets of an item.
    pub(crate) fn candidates(&self, item: &[u8], fp: Fingerprint) -> (usize, usize) {
        let primary = self.primary_index(item, fp);
        (primary, self.alternate_index(primary, fp))
    }

    /// Bucket in the doubled store for a fingerprint resident in `bucket`.
    ///
    /// The result is always `bucket` or `bucket + bucket_count`, and it is a
    /// member of the fingerprint's candidate pair at the doubled level.
    pub(crate) fn relocate(&self, bucket: usize, fp: Fingerprint) -> usize {
        let level = self.bucket_count;
        let alt_hash = self.alt_hash(fp);
        let partner = alternate_at(alt_hash, bucket, level);
        let lift_bit = bit_at(self.lift_hash(fp), level);
        let alt_bit = bit_at(alt_hash, level);
        if bucket == bucket.min(partner) {
            bucket + level * lift_bit
        } else {
            bucket + level * (lift_bit ^ alt_bit)
        }
    }

    fn alt_hash(&self, fp: Fingerprint) -> u64 {
        self.hasher.digest(&[&fp.get().to_le_bytes()], ALTERNATE_SEED)
    }

    fn lift_hash(&self, fp: Fingerprint) -> u64 {
        self.hasher.digest(&[&fp.get().to_le_bytes()], LIFT_SEED)
    }
}

fn alternate_at(alt_hash: u64, index: usize, bucket_count: usize) -> usize {
    (index ^ alt_hash as usize) & (bucket_count - 1)
}

/// Bit of `hash` at the position of the power of two `level`.
fn bit_at(hash: u64, level: usize) -> usize {
    ((hash >> level.trailing_zeros()) & 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::manu_cuckoo_filter::hash::Fnv1aHasher;
    use proptest::prelude::*;

    fn scheme(base: usize, count: usize) -> IndexScheme {
        IndexScheme::new(base, count, Arc::new(Fnv1aHasher))
    }

    fn fp(value: u32) -> Fingerprint {
        Fingerprint::new(value).unwrap()
    }

    #[test]
    fn test_indices_in_range() {
        let scheme = scheme(16, 64);
        for i in 0..500u32 {
            let (a, b) = scheme.candidates(&i.to_le_bytes(), fp(i % 255 + 1));
            assert!(a < 64 && b < 64);
        }
    }

    #[test]
    fn test_base_level_primary_is_masked_hash() {
        let scheme = scheme(32, 32);
        let digest = Fnv1aHasher.digest(&[b"apple", INDEX_TAG], INDEX_SEED);
        assert_eq!(scheme.primary_index(b"apple", fp(9)), digest as usize & 31);
    }

    #[test]
    fn test_relocate_lands_in_grown_pair() {
        let small = scheme(8, 8);
        let mut grown = small.clone();
        for _ in 0..4 {
            let next = grown.doubled();
            for i in 0..400u32 {
                let item = i.to_le_bytes();
                let f = fp(i % 200 + 1);
                let (p, a) = grown.candidates(&item, f);
                let (np, na) = next.candidates(&item, f);
                for resident in [p, a] {
                    let moved = grown.relocate(resident, f);
                    assert!(moved == resident || moved == resident + grown.bucket_count());
                    assert!(moved == np || moved == na, "item {i} lost on growth");
                }
            }
            grown = next;
        }
    }

    #[test]
    fn test_doubled_keeps_base() {
        let grown = scheme(4, 4).doubled().doubled();
        assert_eq!(grown.base_bucket_count(), 4);
        assert_eq!(grown.bucket_count(), 16);
    }

    proptest! {
        #[test]
        fn proptest_alternate_is_involution(
            shift in 0u32..20,
            index in any::<usize>(),
            value in 1u32..=u32::MAX,
        ) {
            let count = 1usize << shift;
            let scheme = scheme(1, count);
            let index = index & (count - 1);
            let f = fp(value);
            prop_assert_eq!(scheme.alternate_index(scheme.alternate_index(index, f), f), index);
        }
    }
}
