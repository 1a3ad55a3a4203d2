// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Fingerprints and their derivation.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::data_structures::manu_cuckoo_filter::hash::{FilterHasher, FINGERPRINT_SEED};

/// Domain-separation tag appended to items before fingerprint hashing.
const FINGERPRINT_TAG: &[u8] = b"\x00manu/fp";

/// Widest supported fingerprint, in bits.
pub const MAX_FINGERPRINT_BITS: u32 = 32;

/// A short, never-zero stand-in for an item.
///
/// Zero is reserved for "empty slot"; `Option<Fingerprint>` uses that
/// niche, so an empty slot costs no more than an occupied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(NonZeroU32);

impl Fingerprint {
    /// Wrap a raw value, returning `None` for zero.
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// The raw integer value.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Big-endian bytes, `width` bytes long.
    pub fn to_bytes(self, width: usize) -> Vec<u8> {
        let bytes = self.get().to_be_bytes();
        bytes[bytes.len() - width..].to_vec()
    }

    /// Parse big-endian bytes back into a fingerprint.
    ///
    /// Returns `None` for an all-zero value or more than four bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 4 {
            return None;
        }
        let value = bytes
            .iter()
            .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));
        Self::new(value)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.get())
    }
}

/// Derives fingerprints of a fixed bit width.
#[derive(Debug, Clone)]
pub(crate) struct Fingerprinter {
    bits: u32,
    mask: u32,
    hasher: Arc<dyn FilterHasher>,
}

impl Fingerprinter {
    /// `bits` must already be validated to lie in `1..=MAX_FINGERPRINT_BITS`.
    pub(crate) fn new(bits: u32, hasher: Arc<dyn FilterHasher>) -> Self {
        let mask = if bits >= MAX_FINGERPRINT_BITS {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        Self { bits, mask, hasher }
    }

    /// Fingerprint an item. Pure: equal items give equal fingerprints.
    pub(crate) fn fingerprint(&self, item: &[u8]) -> Fingerprint {
        let digest = self.hasher.digest(&[item, FINGERPRINT_TAG], FINGERPRINT_SEED);
        // Upper half, so fingerprint bits never overlap index bits.
        let value = ((digest >> 32) as u32) & self.mask;
        Fingerprint::new(value).unwrap_or(Fingerprint(NonZeroU32::MIN))
    }

    pub(crate) fn bits(&self) -> u32 {
        self.bits
    }
}
