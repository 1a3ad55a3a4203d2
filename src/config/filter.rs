//! Filter configuration module.
//!
//! File-level settings for the cuckoo filter, mapped onto
//! [`ManuCuckooFilterConfig`] when a filter is built.

use serde::{Deserialize, Serialize};

use super::{ConfigResult, Validate};
use crate::data_structures::manu_cuckoo_filter::{HashAlgorithm, ManuCuckooFilterConfig};
use crate::error::config::ConfigError;

/// Filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Initial number of buckets (power of two)
    pub bucket_count: usize,

    /// Slots per bucket
    pub bucket_size: usize,

    /// Fingerprint width in bits
    pub fingerprint_bits: u32,

    /// Eviction budget per insertion
    pub max_kicks: usize,

    /// Seed for eviction choices
    pub rng_seed: Option<u64>,

    /// Hash primitive (`fnv1a` or `sha256`)
    pub hash_algorithm: HashAlgorithm,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let defaults = ManuCuckooFilterConfig::default();
        Self {
            bucket_count: defaults.bucket_count,
            bucket_size: defaults.bucket_size,
            fingerprint_bits: defaults.fingerprint_bits,
            max_kicks: defaults.max_kicks,
            rng_seed: defaults.rng_seed,
            hash_algorithm: defaults.hash_algorithm,
        }
    }
}

impl FilterSettings {
    pub fn to_filter_config(&self) -> ManuCuckooFilterConfig {
        let config = ManuCuckooFilterConfig::new()
            .with_bucket_count(self.bucket_count)
            .with_bucket_size(self.bucket_size)
            .with_fingerprint_bits(self.fingerprint_bits)
            .with_max_kicks(self.max_kicks)
            .with_hash_algorithm(self.hash_algorithm);
        match self.rng_seed {
            Some(seed) => config.with_rng_seed(seed),
            None => config,
        }
    }
}

impl Validate for FilterSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_kicks > 100_000 {
            return Err(ConfigError::ValueOutOfRange {
                key: "filter.max_kicks".to_string(),
                message: format!("{} exceeds 100000", self.max_kicks),
            });
        }
        self.to_filter_config()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
