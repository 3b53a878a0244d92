//! Item manifest and package report types.
//!
//! The manifest is the ordered list of item names a release must contain.
//! The report is what a successful run hands back: the archive location and
//! one checksummed entry per item, in write order.

use crate::{PackageError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::PathBuf;

/// Ordered, non-empty list of item names to package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemManifest {
    items: Vec<String>,
}

impl ItemManifest {
    /// Create a manifest, rejecting an empty item list.
    pub fn new<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(PackageError::EmptyManifest);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}

/// One entry written into the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Entry name inside the archive (the item name).
    pub name: String,

    /// SHA-256 checksum of the uncompressed content (64 hex characters).
    pub sha256: String,

    /// Uncompressed size in bytes.
    pub bytes: u64,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, sha256: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            sha256: sha256.into(),
            bytes,
        }
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}

/// Reader adapter that checksums content as it streams through.
pub(crate) struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    bytes: u64,
}

impl<R: Read> HashingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    pub(crate) fn into_entry(self, name: impl Into<String>) -> ArchiveEntry {
        ArchiveEntry::new(name, hex::encode(self.hasher.finalize()), self.bytes)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}

/// Result of a successful packaging run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    /// Full path of the written archive.
    pub archive_path: PathBuf,

    /// Directory holding the archive.
    pub out_dir: PathBuf,

    /// Entries in archive order.
    pub entries: Vec<ArchiveEntry>,

    pub created_at: DateTime<Utc>,
}

impl PackageReport {
    pub fn new(archive_path: PathBuf, out_dir: PathBuf, entries: Vec<ArchiveEntry>) -> Self {
        Self {
            archive_path,
            out_dir,
            entries,
            created_at: Utc::now(),
        }
    }

    /// Total uncompressed size of all entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.bytes).sum()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn find_entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
