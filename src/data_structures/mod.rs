//! Data structures for Manu Filter.
//!
//! Probabilistic set membership built on cuckoo hashing. The filter keeps
//! short fingerprints in fixed-size buckets, grows by doubling and can be
//! snapshotted to disk.

pub mod manu_cuckoo_filter;

// Re-export common data structures
pub use manu_cuckoo_filter::{ManuCuckooFilter, ManuCuckooFilterConfig, SharedManuCuckooFilter};
