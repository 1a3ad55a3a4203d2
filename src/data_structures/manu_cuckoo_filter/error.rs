// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the Manu Cuckoo Filter.

use std::path::PathBuf;

/// Errors that can occur in Manu Cuckoo Filter operations.
///
/// Lookups and deletions never produce these for well-formed input;
/// absence is reported as `false`.
#[derive(Debug, thiserror::Error)]
pub enum ManuCuckooFilterError {
    /// Constructor parameters were rejected
    #[error("Invalid filter configuration: {0}")]
    InvalidConfig(String),

    /// The item could not be turned into bytes
    #[error("Invalid input item: {0}")]
    InvalidInput(String),

    /// Insertion failed even after growing the filter
    #[error("Insertion failed after resizing to {bucket_count} buckets")]
    InsertFailed {
        /// Bucket count after the resize attempt
        bucket_count: usize,
    },

    /// A fingerprint could not be re-seated while doubling the bucket store
    #[error("Resize invariant broken: no room for fingerprint from bucket {bucket} in {bucket_count} buckets")]
    ResizeInvariantBroken {
        /// Bucket the fingerprint was carried over from
        bucket: usize,
        /// Bucket count of the store being built
        bucket_count: usize,
    },

    /// Reading or writing a snapshot failed at the storage layer
    #[error("Persistence I/O error on {path:?}: {source}")]
    PersistenceIo {
        /// Snapshot path
        path: PathBuf,
        /// Underlying storage failure
        #[source]
        source: std::io::Error,
    },

    /// A snapshot was read but its contents are not a valid filter
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A snapshot was written with a different hash primitive
    #[error("Snapshot hasher mismatch: filter uses {expected}, snapshot uses {found}")]
    HasherMismatch {
        /// Hasher of the in-memory filter
        expected: String,
        /// Hasher recorded in the snapshot
        found: String,
    },
}

impl ManuCuckooFilterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for Manu Cuckoo Filter operations
pub type Result<T> = std::result::Result<T, ManuCuckooFilterError>;
