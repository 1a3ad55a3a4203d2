// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Configuration options for the Manu Cuckoo Filter.

use std::path::PathBuf;

use crate::data_structures::manu_cuckoo_filter::error::{ManuCuckooFilterError, Result};
use crate::data_structures::manu_cuckoo_filter::fingerprint::MAX_FINGERPRINT_BITS;
use crate::data_structures::manu_cuckoo_filter::hash::HashAlgorithm;

/// Configuration for the Manu Cuckoo Filter.
///
/// Builder methods store values as given; nothing is clamped or rounded.
/// [`validate`](Self::validate) runs when a filter is created and rejects
/// anything unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct ManuCuckooFilterConfig {
    /// Initial number of buckets. Must be a power of two.
    pub bucket_count: usize,

    /// Fingerprint slots per bucket.
    pub bucket_size: usize,

    /// Fingerprint width in bits, `1..=32`.
    /// Wider fingerprints lower the false positive rate and cost memory.
    pub fingerprint_bits: u32,

    /// Displacements tried per insertion before the filter doubles.
    /// Zero grows as soon as both candidate buckets are full.
    pub max_kicks: usize,

    /// Seed for eviction choices. `None` seeds from the OS.
    pub rng_seed: Option<u64>,

    /// Hash primitive used for fingerprints and indices.
    pub hash_algorithm: HashAlgorithm,

    /// Snapshot written after every successful insert and delete.
    pub auto_persist: Option<PathBuf>,
}

impl ManuCuckooFilterConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest power-of-two geometry holding `items` fingerprints at the
    /// default bucket size.
    pub fn for_capacity(items: usize) -> Self {
        let defaults = Self::default();
        let buckets = items.div_ceil(defaults.bucket_size).max(1);
        defaults.with_bucket_count(buckets.next_power_of_two())
    }

    /// Sets the initial number of buckets.
    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Sets the number of slots per bucket.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Sets the fingerprint width in bits.
    pub fn with_fingerprint_bits(mut self, fingerprint_bits: u32) -> Self {
        self.fingerprint_bits = fingerprint_bits;
        self
    }

    /// Sets the eviction budget per insertion.
    pub fn with_max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    /// Makes eviction choices reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Selects the hash primitive.
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    /// Persist to `path` after every successful mutation.
    pub fn with_auto_persist(mut self, path: impl Into<PathBuf>) -> Self {
        self.auto_persist = Some(path.into());
        self
    }

    /// Checks that a filter can be built from this configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(ManuCuckooFilterError::InvalidConfig(
                "bucket_count must be greater than 0".to_string(),
            ));
        }
        if !self.bucket_count.is_power_of_two() {
            return Err(ManuCuckooFilterError::InvalidConfig(format!(
                "bucket_count must be a power of two, got {}",
                self.bucket_count
            )));
        }
        if self.bucket_size == 0 {
            return Err(ManuCuckooFilterError::InvalidConfig(
                "bucket_size must be greater than 0".to_string(),
            ));
        }
        if self.bucket_count.checked_mul(self.bucket_size).is_none() {
            return Err(ManuCuckooFilterError::InvalidConfig(
                "bucket_count * bucket_size overflows".to_string(),
            ));
        }
        if self.fingerprint_bits == 0 || self.fingerprint_bits > MAX_FINGERPRINT_BITS {
            return Err(ManuCuckooFilterError::InvalidConfig(format!(
                "fingerprint_bits must be between 1 and {MAX_FINGERPRINT_BITS}, got {}",
                self.fingerprint_bits
            )));
        }
        Ok(())
    }
}

impl Default for ManuCuckooFilterConfig {
    fn default() -> Self {
        Self {
            bucket_count: 1_024,
            bucket_size: 4,       // (2, 4) filters are space optimal for practical rates
            fingerprint_bits: 16, // ~0.1% false positives at 95% load
            max_kicks: 500,
            rng_seed: None,
            hash_algorithm: HashAlgorithm::Fnv1a,
            auto_persist: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ManuCuckooFilterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bucket_size, 4);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_config_builder() {
        let config = ManuCuckooFilterConfig::new()
            .with_bucket_count(16)
            .with_bucket_size(2)
            .with_fingerprint_bits(8)
            .with_max_kicks(50)
            .with_rng_seed(42)
            .with_hash_algorithm(HashAlgorithm::Sha256)
            .with_auto_persist("/tmp/filter.json");

        assert_eq!(config.bucket_count, 16);
        assert_eq!(config.bucket_size, 2);
        assert_eq!(config.fingerprint_bits, 8);
        assert_eq!(config.max_kicks, 50);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.auto_persist, Some(PathBuf::from("/tmp/filter.json")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_capacity_rounds_up() {
        assert_eq!(ManuCuckooFilterConfig::for_capacity(100).bucket_count, 32);
        assert_eq!(ManuCuckooFilterConfig::for_capacity(128).bucket_count, 32);
        assert_eq!(ManuCuckooFilterConfig::for_capacity(0).bucket_count, 1);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = ManuCuckooFilterConfig::new();
        for bad in [
            base.clone().with_bucket_count(0),
            base.clone().with_bucket_count(24),
            base.clone().with_bucket_size(0),
            base.clone().with_fingerprint_bits(0),
            base.clone().with_fingerprint_bits(33),
        ] {
            assert!(matches!(
                bad.validate(),
                Err(ManuCuckooFilterError::InvalidConfig(_))
            ));
        }
    }
}
