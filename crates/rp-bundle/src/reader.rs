//! Archive reader for inspecting and verifying release archives.

use crate::{ArchiveEntry, ItemManifest, PackageError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Reader for release archives.
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl ArchiveReader<File> {
    /// Open an archive from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    /// Open an archive from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Create a reader from any Read + Seek source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        debug!(entries = archive.len(), "Archive opened");
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Entry names in archive order.
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.archive.len());
        for idx in 0..self.archive.len() {
            let file = self.archive.by_index(idx)?;
            names.push(file.name().to_string());
        }
        Ok(names)
    }

    /// Read one entry's uncompressed content.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| PackageError::EntryMissing(name.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Checksummed listing of every entry, in archive order.
    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for idx in 0..self.archive.len() {
            let mut file = self.archive.by_index(idx)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(ArchiveEntry::new(
                file.name(),
                ArchiveEntry::compute_checksum(&data),
                data.len() as u64,
            ));
        }
        Ok(entries)
    }

    /// Check that the archive holds exactly the manifest items, each
    /// byte-identical to its source under `base_dir`.
    pub fn verify_against(
        &mut self,
        manifest: &ItemManifest,
        base_dir: &Path,
    ) -> Result<Vec<ArchiveEntry>> {
        let entries = self.entries()?;
        let by_name = match_manifest(&entries, manifest)?;

        for item in manifest.iter() {
            let entry = by_name
                .get(item)
                .ok_or_else(|| PackageError::EntryMissing(item.to_string()))?;

            let source_path = base_dir.join(item);
            if !source_path.is_file() {
                return Err(PackageError::MissingItem {
                    item: item.to_string(),
                    path: source_path,
                });
            }
            let source = std::fs::read(&source_path)?;
            if !entry.verify(&source) {
                return Err(PackageError::ChecksumMismatch {
                    name: item.to_string(),
                    expected: ArchiveEntry::compute_checksum(&source),
                    actual: entry.sha256.clone(),
                });
            }
        }

        info!(entries = entries.len(), "Archive verified against sources");
        Ok(entries)
    }
}

/// Index `entries` by name, requiring exactly one entry per manifest item
/// and nothing else.
fn match_manifest<'a>(
    entries: &'a [ArchiveEntry],
    manifest: &ItemManifest,
) -> Result<HashMap<&'a str, &'a ArchiveEntry>> {
    let mut by_name = HashMap::with_capacity(entries.len());
    for entry in entries {
        if !manifest.contains(&entry.name) {
            return Err(PackageError::UnexpectedEntry(entry.name.clone()));
        }
        if by_name.insert(entry.name.as_str(), entry).is_some() {
            return Err(PackageError::DuplicateEntry(entry.name.clone()));
        }
    }

    if let Some(item) = manifest.iter().find(|item| !by_name.contains_key(item)) {
        return Err(PackageError::EntryMissing(item.to_string()));
    }
    Ok(by_name)
}
