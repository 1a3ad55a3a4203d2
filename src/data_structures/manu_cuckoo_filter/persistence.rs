// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Snapshot codec for filter state.
//!
//! A snapshot is the filter geometry plus one record per occupied slot:
//! the bucket index and the fingerprint's raw big-endian bytes in hex.
//! Two encodings are supported.
//!
//! JSON container:
//!
//! ```text
//! {
//!   "format": "manu-cuckoo-filter",
//!   "version": 1,
//!   "hasher": "fnv1a",
//!   "base_bucket_count": 16,
//!   "bucket_count": 32,
//!   ...
//!   "records": [{ "bucket": 3, "fingerprint": "a1" }, ...]
//! }
//! ```
//!
//! Plain text:
//!
//! ```text
//! manu-cuckoo-filter 1
//! hasher=fnv1a
//! base_bucket_count=16
//! ...
//! records
//! 3 a1
//! ```
//!
//! Decoding validates everything and builds a fresh [`BucketStore`], so a
//! bad file can never leave a filter half restored.

use std::fmt::Write as _;
use std::ffi::OsString;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data_structures::manu_cuckoo_filter::bucket::BucketStore;
use crate::data_structures::manu_cuckoo_filter::error::{ManuCuckooFilterError, Result};
use crate::data_structures::manu_cuckoo_filter::fingerprint::{Fingerprint, MAX_FINGERPRINT_BITS};
use crate::data_structures::manu_cuckoo_filter::stats::Counters;

/// Format marker written at the top of every snapshot.
const FORMAT_NAME: &str = "manu-cuckoo-filter";

/// Snapshot format version.
const FORMAT_VERSION: u16 = 1;

/// Text line separating the header from the records.
const RECORDS_MARKER: &str = "records";

/// On-disk encoding of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistFormat {
    /// Self-describing JSON document
    #[default]
    Json,
    /// Line-oriented plain text
    Text,
}

impl PersistFormat {
    /// `.txt` and `.text` files use the text encoding, everything else JSON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt" | "text") => Self::Text,
            _ => Self::Json,
        }
    }
}

/// One occupied slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SnapshotRecord {
    pub(crate) bucket: usize,
    pub(crate) fingerprint: String,
}

/// Complete serializable filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FilterSnapshot {
    pub(crate) format: String,
    pub(crate) version: u16,
    pub(crate) hasher: String,
    pub(crate) base_bucket_count: usize,
    pub(crate) bucket_count: usize,
    pub(crate) bucket_size: usize,
    pub(crate) fingerprint_bits: u32,
    pub(crate) max_kicks: usize,
    #[serde(default)]
    pub(crate) counters: Counters,
    pub(crate) records: Vec<SnapshotRecord>,
}

impl FilterSnapshot {
    /// Capture a store. `fingerprint_bits` fixes the record width.
    pub(crate) fn capture(
        store: &BucketStore,
        hasher: &str,
        base_bucket_count: usize,
        fingerprint_bits: u32,
        max_kicks: usize,
        counters: Counters,
    ) -> Self {
        let width = width_bytes(fingerprint_bits);
        let records = store
            .iter()
            .map(|(bucket, fp)| SnapshotRecord {
                bucket,
                fingerprint: hex::encode(fp.to_bytes(width)),
            })
            .collect();

        Self {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
            hasher: hasher.to_string(),
            base_bucket_count,
            bucket_count: store.bucket_count(),
            bucket_size: store.bucket_size(),
            fingerprint_bits,
            max_kicks,
            counters,
            records,
        }
    }

    /// Rebuild the bucket store, checking every record against the header.
    pub(crate) fn build_store(&self) -> Result<BucketStore> {
        self.check_header()?;

        let width = width_bytes(self.fingerprint_bits);
        let mut store = BucketStore::try_new(self.bucket_count, self.bucket_size).ok_or_else(|| {
            corrupt(format!(
                "cannot allocate {} buckets of {} slots",
                self.bucket_count, self.bucket_size
            ))
        })?;
        for (line, record) in self.records.iter().enumerate() {
            if record.bucket >= self.bucket_count {
                return Err(corrupt(format!(
                    "record {line}: bucket {} out of range for {} buckets",
                    record.bucket, self.bucket_count
                )));
            }
            let bytes = hex::decode(&record.fingerprint)
                .map_err(|e| corrupt(format!("record {line}: {e}")))?;
            if bytes.len() != width {
                return Err(corrupt(format!(
                    "record {line}: expected {width} fingerprint bytes, found {}",
                    bytes.len()
                )));
            }
            let fp = Fingerprint::from_bytes(&bytes)
                .filter(|fp| fits(*fp, self.fingerprint_bits))
                .ok_or_else(|| {
                    corrupt(format!("record {line}: invalid fingerprint {}", record.fingerprint))
                })?;
            if !store.try_place(record.bucket, fp) {
                return Err(corrupt(format!(
                    "record {line}: bucket {} holds more than {} fingerprints",
                    record.bucket, self.bucket_size
                )));
            }
        }
        Ok(store)
    }

    fn check_header(&self) -> Result<()> {
        if self.format != FORMAT_NAME {
            return Err(corrupt(format!("unknown format {:?}", self.format)));
        }
        if self.version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", self.version)));
        }
        if !self.bucket_count.is_power_of_two()
            || !self.base_bucket_count.is_power_of_two()
            || self.base_bucket_count > self.bucket_count
        {
            return Err(corrupt(format!(
                "bucket counts {} (base {}) are not powers of two",
                self.bucket_count, self.base_bucket_count
            )));
        }
        if self.bucket_size == 0 || self.bucket_count.checked_mul(self.bucket_size).is_none() {
            return Err(corrupt(format!("invalid bucket size {}", self.bucket_size)));
        }
        if self.fingerprint_bits == 0 || self.fingerprint_bits > MAX_FINGERPRINT_BITS {
            return Err(corrupt(format!(
                "invalid fingerprint width {}",
                self.fingerprint_bits
            )));
        }
        Ok(())
    }

    /// Encode in the given format.
    pub(crate) fn encode(&self, format: PersistFormat) -> Result<String> {
        match format {
            PersistFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ManuCuckooFilterError::CorruptSnapshot(e.to_string())),
            PersistFormat::Text => Ok(self.encode_text()),
        }
    }

    /// Decode either format, detected from the first non-blank character.
    pub(crate) fn decode(contents: &str) -> Result<Self> {
        if contents.trim_start().starts_with('{') {
            serde_json::from_str(contents).map_err(|e| corrupt(e.to_string()))
        } else {
            Self::decode_text(contents)
        }
    }

    fn encode_text(&self) -> String {
        let mut out = String::with_capacity(128 + self.records.len() * 16);
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{} {}", self.format, self.version);
        let _ = writeln!(out, "hasher={}", self.hasher);
        let _ = writeln!(out, "base_bucket_count={}", self.base_bucket_count);
        let _ = writeln!(out, "bucket_count={}", self.bucket_count);
        let _ = writeln!(out, "bucket_size={}", self.bucket_size);
        let _ = writeln!(out, "fingerprint_bits={}", self.fingerprint_bits);
        let _ = writeln!(out, "max_kicks={}", self.max_kicks);
        let _ = writeln!(out, "insertions={}", self.counters.insertions);
        let _ = writeln!(out, "deletions={}", self.counters.deletions);
        let _ = writeln!(out, "kicks={}", self.counters.kicks);
        let _ = writeln!(out, "resizes={}", self.counters.resizes);
        let _ = writeln!(out, "{RECORDS_MARKER}");
        for record in &self.records {
            let _ = writeln!(out, "{} {}", record.bucket, record.fingerprint);
        }
        out
    }

    fn decode_text(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

        let first = lines.next().ok_or_else(|| corrupt("empty snapshot"))?;
        let (format, version) = first
            .split_once(' ')
            .ok_or_else(|| corrupt(format!("bad first line {first:?}")))?;
        let version = parse_number(version, "version")?;

        let mut header = TextHeader::default();
        let mut in_records = false;
        let mut records = Vec::new();
        for line in lines {
            if in_records {
                let (bucket, fingerprint) = line
                    .split_once(' ')
                    .ok_or_else(|| corrupt(format!("bad record line {line:?}")))?;
                records.push(SnapshotRecord {
                    bucket: parse_number(bucket, "bucket")?,
                    fingerprint: fingerprint.trim().to_string(),
                });
            } else if line == RECORDS_MARKER {
                in_records = true;
            } else {
                let (key, value) = line
                    .split_once('=')
                    .ok_or_else(|| corrupt(format!("bad header line {line:?}")))?;
                header.set(key.trim(), value.trim())?;
            }
        }
        if !in_records {
            return Err(corrupt("missing records section"));
        }

        Ok(Self {
            format: format.to_string(),
            version,
            hasher: required(header.hasher, "hasher")?,
            base_bucket_count: required(header.base_bucket_count, "base_bucket_count")?,
            bucket_count: required(header.bucket_count, "bucket_count")?,
            bucket_size: required(header.bucket_size, "bucket_size")?,
            fingerprint_bits: required(header.fingerprint_bits, "fingerprint_bits")?,
            max_kicks: required(header.max_kicks, "max_kicks")?,
            counters: header.counters,
            records,
        })
    }
}

/// Header fields collected while scanning a text snapshot.
#[derive(Debug, Default)]
struct TextHeader {
    hasher: Option<String>,
    base_bucket_count: Option<usize>,
    bucket_count: Option<usize>,
    bucket_size: Option<usize>,
    fingerprint_bits: Option<u32>,
    max_kicks: Option<usize>,
    counters: Counters,
}

impl TextHeader {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hasher" => self.hasher = Some(value.to_string()),
            "base_bucket_count" => self.base_bucket_count = Some(parse_number(value, key)?),
            "bucket_count" => self.bucket_count = Some(parse_number(value, key)?),
            "bucket_size" => self.bucket_size = Some(parse_number(value, key)?),
            "fingerprint_bits" => self.fingerprint_bits = Some(parse_number(value, key)?),
            "max_kicks" => self.max_kicks = Some(parse_number(value, key)?),
            "insertions" => self.counters.insertions = parse_number(value, key)?,
            "deletions" => self.counters.deletions = parse_number(value, key)?,
            "kicks" => self.counters.kicks = parse_number(value, key)?,
            "resizes" => self.counters.resizes = parse_number(value, key)?,
            // Unknown keys are tolerated so newer writers stay readable.
            _ => debug!(key, "ignoring unknown snapshot header key"),
        }
        Ok(())
    }
}

/// Write `snapshot` to `path`, replacing any previous file.
///
/// The data goes to a sibling temporary file first and is renamed into
/// place, so readers see either the old or the new snapshot.
pub(crate) fn write_snapshot(path: &Path, snapshot: &FilterSnapshot, format: PersistFormat) -> Result<()> {
    let encoded = snapshot.encode(format)?;
    let tmp_path = temp_path(path);

    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ManuCuckooFilterError::io(path, e)
    })?;

    debug!(?path, ?format, records = snapshot.records.len(), "snapshot written");
    Ok(())
}

/// Read and decode the snapshot at `path`.
pub(crate) fn read_snapshot(path: &Path) -> Result<FilterSnapshot> {
    let contents = fs::read_to_string(path).map_err(|e| ManuCuckooFilterError::io(path, e))?;
    let snapshot = FilterSnapshot::decode(&contents)?;
    debug!(?path, records = snapshot.records.len(), "snapshot read");
    Ok(snapshot)
}

/// Sibling of `path` with `.manu-tmp` appended to the full file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".manu-tmp");
    path.with_file_name(name)
}

fn width_bytes(fingerprint_bits: u32) -> usize {
    fingerprint_bits.div_ceil(8) as usize
}

fn fits(fp: Fingerprint, fingerprint_bits: u32) -> bool {
    fingerprint_bits >= MAX_FINGERPRINT_BITS || fp.get() >> fingerprint_bits == 0
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| corrupt(format!("{key}: not a number: {value:?}")))
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| corrupt(format!("missing {key}")))
}

fn corrupt(message: impl Into<String>) -> ManuCuckooFilterError {
    ManuCuckooFilterError::CorruptSnapshot(message.into())
}
