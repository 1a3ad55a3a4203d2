// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Manu Cuckoo Filter: an approximate-membership set with deletion.
//!
//! Each item is reduced to a short fingerprint stored in one of two
//! candidate buckets. Lookups may return false positives at a rate set by
//! the fingerprint width; they never return false negatives for items
//! still resident.
//!
//! # Features
//!
//! - Bounded cuckoo eviction, undone cleanly when the budget runs out.
//! - Automatic doubling that re-seats fingerprints without the original items.
//! - Snapshots in JSON or a line-oriented text format, with optional
//!   persistence after every mutation.
//! - Pluggable hash primitive (FNV-1a or SHA-256 built in).
//! - Insert, delete and resize hooks.
//!
//! # Example
//!
//! ```
//! use manu_filter_lib::data_structures::manu_cuckoo_filter::{
//!     ManuCuckooFilter, ManuCuckooFilterConfig,
//! };
//!
//! let config = ManuCuckooFilterConfig::new()
//!     .with_bucket_count(16)
//!     .with_fingerprint_bits(12)
//!     .with_rng_seed(7);
//! let mut filter = ManuCuckooFilter::with_config(config).unwrap();
//!
//! filter.insert(b"hello").unwrap();
//! assert!(filter.contains(b"hello"));
//!
//! filter.delete(b"hello");
//! assert_eq!(filter.len(), 0);
//! ```
//!
//! # Persistence
//!
//! ```no_run
//! use manu_filter_lib::data_structures::manu_cuckoo_filter::ManuCuckooFilter;
//!
//! let mut filter = ManuCuckooFilter::new();
//! filter.insert(b"session-42").unwrap();
//! filter.persist("/var/lib/manu/sessions.json").unwrap();
//!
//! let reopened = ManuCuckooFilter::open("/var/lib/manu/sessions.json").unwrap();
//! assert!(reopened.contains(b"session-42"));
//! ```

// Module declarations
mod bucket;
mod config;
mod error;
mod eviction;
mod filter;
mod fingerprint;
mod hash;
mod hooks;
mod index;
mod persistence;
mod resize;
mod shared;
mod stats;

// Re-exports
pub use config::ManuCuckooFilterConfig;
pub use error::{ManuCuckooFilterError, Result};
pub use filter::ManuCuckooFilter;
pub use fingerprint::{Fingerprint, MAX_FINGERPRINT_BITS};
pub use hash::{FilterHasher, Fnv1aHasher, HashAlgorithm, Sha256Hasher};
pub use hooks::{FilterHooks, ItemHook, ResizeHook};
pub use persistence::PersistFormat;
pub use shared::SharedManuCuckooFilter;
pub use stats::FilterStats;
