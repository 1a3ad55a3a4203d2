// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Hashing utilities for the Manu Cuckoo Filter.
//!
//! The filter never talks to a hash primitive directly. Everything goes
//! through [`FilterHasher`], a seeded digest over a sequence of byte
//! slices, so the primitive can be swapped without touching the
//! fingerprint or index logic.

use std::fmt::Debug;
use std::hash::Hasher;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Seeds used to derive independent hash functions from one primitive.
#[allow(clippy::unreadable_literal)]
pub(crate) const INDEX_SEED: u64 = 0x517cc1b727220a95;
#[allow(clippy::unreadable_literal)]
pub(crate) const FINGERPRINT_SEED: u64 = 0x83588256c732eb1f;
#[allow(clippy::unreadable_literal)]
pub(crate) const ALTERNATE_SEED: u64 = 0xabe33b1c9b32d199;
#[allow(clippy::unreadable_literal)]
pub(crate) const LIFT_SEED: u64 = 0x4cf18d443988208f;

/// A seeded hash primitive producing 64-bit digests.
///
/// Implementations must be deterministic: the same parts and seed always
/// produce the same digest, across processes, or persisted snapshots
/// become unreadable.
pub trait FilterHasher: Send + Sync + Debug {
    /// Stable name recorded in snapshots.
    fn name(&self) -> &'static str;

    /// Digest the concatenation of `parts` under `seed`.
    fn digest(&self, parts: &[&[u8]], seed: u64) -> u64;
}

/// FNV-1a with a 64-bit avalanche finalizer.
///
/// Plain FNV-1a has weak low bits, and bucket indices are taken from the
/// low bits, so the output is passed through the murmur3 `fmix64` step.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fnv1aHasher;

impl FilterHasher for Fnv1aHasher {
    fn name(&self) -> &'static str {
        "fnv1a"
    }

    fn digest(&self, parts: &[&[u8]], seed: u64) -> u64 {
        let mut hasher = fnv::FnvHasher::default();
        hasher.write(&seed.to_le_bytes());
        for part in parts {
            hasher.write(part);
        }
        fmix64(hasher.finish())
    }
}

/// SHA-256 truncated to its first eight bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl FilterHasher for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn digest(&self, parts: &[&[u8]], seed: u64) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(seed.to_le_bytes());
        for part in parts {
            hasher.update(part);
        }
        let out = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&out[..8]);
        u64::from_le_bytes(word)
    }
}

/// Built-in hash primitives, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// FNV-1a, fast and non-cryptographic
    #[default]
    Fnv1a,
    /// SHA-256, slower but resistant to crafted collisions
    Sha256,
}

impl HashAlgorithm {
    /// Instantiate the hasher.
    pub fn build(self) -> Arc<dyn FilterHasher> {
        match self {
            Self::Fnv1a => Arc::new(Fnv1aHasher),
            Self::Sha256 => Arc::new(Sha256Hasher),
        }
    }

    /// Look up a built-in hasher by the name it records in snapshots.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fnv1a" => Some(Self::Fnv1a),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^= k >> 33;
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_digest_stability() {
        for hasher in [HashAlgorithm::Fnv1a.build(), HashAlgorithm::Sha256.build()] {
            let first = hasher.digest(&[b"stable", b"_input"], INDEX_SEED);
            let second = hasher.digest(&[b"stable", b"_input"], INDEX_SEED);
            assert_eq!(first, second, "{} must be deterministic", hasher.name());
        }
    }

    #[test]
    fn test_parts_are_concatenated() {
        let hasher = Fnv1aHasher;
        assert_eq!(
            hasher.digest(&[b"ab", b"cd"], 7),
            hasher.digest(&[b"abcd"], 7)
        );
    }

    #[test]
    fn test_seeds_separate_domains() {
        let hasher = Fnv1aHasher;
        let a = hasher.digest(&[b"apple"], INDEX_SEED);
        let b = hasher.digest(&[b"apple"], FINGERPRINT_SEED);
        assert_ne!(a, b);
    }

    #[test]
    fn test_low_bits_spread() {
        let hasher = Fnv1aHasher;
        let buckets: HashSet<u64> = (0..256u32)
            .map(|i| hasher.digest(&[&i.to_le_bytes()], INDEX_SEED) & 63)
            .collect();
        // 256 keys over 64 buckets should touch nearly all of them
        assert!(buckets.len() > 48, "only {} buckets hit", buckets.len());
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in [HashAlgorithm::Fnv1a, HashAlgorithm::Sha256] {
            let name = algorithm.build().name();
            assert_eq!(HashAlgorithm::from_name(name), Some(algorithm));
        }
        assert_eq!(HashAlgorithm::from_name("md5"), None);
    }
}
