// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Point-in-time filter statistics.

use serde::{Deserialize, Serialize};

/// Geometry and cumulative counters of a filter.
///
/// Counters only reset on [`clear`](super::ManuCuckooFilter::clear).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Current number of buckets
    pub bucket_count: usize,
    /// Slots per bucket
    pub bucket_size: usize,
    /// Fingerprint width in bits
    pub fingerprint_bits: u32,
    /// Stored fingerprints
    pub occupied: usize,
    /// `occupied / (bucket_count * bucket_size)`
    pub load_factor: f64,
    /// Successful insertions
    pub insertions: u64,
    /// Successful deletions
    pub deletions: u64,
    /// Eviction swaps performed, including ones undone before a resize
    pub kicks: u64,
    /// Times the bucket store was doubled
    pub resizes: u64,
}

/// Cumulative counters owned by one filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Counters {
    pub(crate) insertions: u64,
    #[serde(default)]
    pub(crate) deletions: u64,
    pub(crate) kicks: u64,
    #[serde(default)]
    pub(crate) resizes: u64,
}
