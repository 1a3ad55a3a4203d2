// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Growth by doubling the bucket count.

use tracing::{debug, error};

use crate::data_structures::manu_cuckoo_filter::bucket::BucketStore;
use crate::data_structures::manu_cuckoo_filter::error::{ManuCuckooFilterError, Result};
use crate::data_structures::manu_cuckoo_filter::index::IndexScheme;

/// Build a store with twice the buckets holding every fingerprint of `store`.
///
/// Fingerprints are re-seated from their current bucket alone; old
/// bucket `b` feeds only new buckets `b` and `b + n`, so a correct index
/// scheme never overflows. The inputs are left untouched and the caller
/// swaps the result in only on success.
pub(crate) fn grow(
    store: &BucketStore,
    scheme: &IndexScheme,
) -> Result<(BucketStore, IndexScheme)> {
    let grown_scheme = scheme.doubled();
    let mut grown = BucketStore::try_new(grown_scheme.bucket_count(), store.bucket_size())
        .ok_or_else(|| {
            error!(to = grown_scheme.bucket_count(), "cannot allocate grown bucket store");
            ManuCuckooFilterError::InsertFailed {
                bucket_count: scheme.bucket_count(),
            }
        })?;

    for (bucket, fp) in store.iter() {
        let target = scheme.relocate(bucket, fp);
        if !grown.try_place(target, fp) {
            error!(
                bucket,
                target,
                bucket_count = grown_scheme.bucket_count(),
                "no room while re-seating fingerprint"
            );
            return Err(ManuCuckooFilterError::ResizeInvariantBroken {
                bucket,
                bucket_count: grown_scheme.bucket_count(),
            });
        }
    }

    debug!(
        from = scheme.bucket_count(),
        to = grown_scheme.bucket_count(),
        moved = grown.occupied(),
        "bucket store doubled"
    );
    Ok((grown, grown_scheme))
}
