// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Insertion with bounded cuckoo displacement.
//!
//! Placement first tries both candidate buckets directly. When both are
//! full it walks a random eviction chain of at most `max_kicks` swaps.
//! A walk that runs out of kicks is undone slot by slot, so the store is
//! left exactly as it was and the caller can grow it and retry.

use rand::Rng;
use tracing::trace;

use crate::data_structures::manu_cuckoo_filter::bucket::BucketStore;
use crate::data_structures::manu_cuckoo_filter::fingerprint::Fingerprint;
use crate::data_structures::manu_cuckoo_filter::index::IndexScheme;

/// How a placement attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Stored after `kicks` displacements (zero for a direct hit).
    Placed { kicks: usize },
    /// Every kick was used without finding room; the store is unchanged.
    Exhausted { kicks: usize },
}

impl Placement {
    pub(crate) fn kicks(self) -> usize {
        match self {
            Self::Placed { kicks } | Self::Exhausted { kicks } => kicks,
        }
    }
}

/// Place `fp`, whose candidate buckets are `primary` and `alternate`.
pub(crate) fn place<R: Rng>(
    store: &mut BucketStore,
    scheme: &IndexScheme,
    rng: &mut R,
    fp: Fingerprint,
    (primary, alternate): (usize, usize),
    max_kicks: usize,
) -> Placement {
    if store.try_place(primary, fp) || store.try_place(alternate, fp) {
        return Placement::Placed { kicks: 0 };
    }

    let mut index = if rng.gen_bool(0.5) { primary } else { alternate };
    let mut incoming = fp;
    let mut path: Vec<(usize, usize)> = Vec::new();

    for kick in 1..=max_kicks {
        let occupied = store.occupied_slots(index);
        if occupied.is_empty() {
            // Only reachable with a zero-sized bucket, which config rejects.
            break;
        }
        let slot = occupied[rng.gen_range(0..occupied.len())];
        let Some(displaced) = store.swap(index, slot, incoming) else {
            break;
        };
        path.push((index, slot));
        trace!(bucket = index, slot, %displaced, "kicked fingerprint");

        incoming = displaced;
        index = scheme.alternate_index(index, incoming);
        if store.try_place(index, incoming) {
            return Placement::Placed { kicks: kick };
        }
    }

    let kicks = path.len();
    for (bucket, slot) in path.into_iter().rev() {
        if let Some(previous) = store.swap(bucket, slot, incoming) {
            incoming = previous;
        }
    }
    debug_assert_eq!(incoming, fp);
    Placement::Exhausted { kicks }
}
