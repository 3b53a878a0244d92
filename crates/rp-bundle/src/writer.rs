//! Release packager.
//!
//! Writes every manifest item into a deflate-compressed ZIP archive, or
//! leaves nothing behind when an item is missing or a write fails.

use crate::events::{event_names, NullEmitter, Phase, ProgressEmitter, ProgressEvent};
use crate::manifest::HashingReader;
use crate::{ArchiveEntry, ItemManifest, PackageError, PackageReport, Result};
use rp_config::{CleanupPolicy, ReleaseConfig};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Destination for archive entries.
///
/// `finish` is called exactly once per run, after the last write attempt,
/// whether or not the writes succeeded.
pub trait EntrySink {
    /// Stream `source` into a new entry named `name`.
    fn add_entry(&mut self, name: &str, source: &mut dyn Read) -> Result<()>;

    /// Flush and close the destination.
    fn finish(&mut self) -> Result<()>;
}

fn entry_options() -> FileOptions<'static, ()> {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
}

/// ZIP file sink. The file is created on the first entry.
pub struct ZipSink {
    path: PathBuf,
    writer: Option<ZipWriter<File>>,
    created: bool,
}

impl ZipSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            created: false,
        }
    }

    /// Whether this sink created the archive file.
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut ZipWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let file = File::create(&self.path)?;
                self.created = true;
                debug!(path = %self.path.display(), "Archive created");
                ZipWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl EntrySink for ZipSink {
    fn add_entry(&mut self, name: &str, source: &mut dyn Read) -> Result<()> {
        let zip = self.writer()?;
        zip.start_file(name, entry_options())?;
        std::io::copy(source, zip)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(zip) = self.writer.take() {
            zip.finish()?;
        }
        Ok(())
    }
}

/// Assembles manifest items into a single release archive.
pub struct Packager {
    manifest: ItemManifest,
    base_dir: PathBuf,
    out_dir: PathBuf,
    archive_name: String,
    cleanup: CleanupPolicy,
    emitter: Arc<dyn ProgressEmitter>,
    run_id: Option<String>,
}

impl Packager {
    /// Create a packager.
    ///
    /// Items resolve as `base_dir/<item>`; the archive is written to
    /// `out_dir/<archive_name>`.
    pub fn new(
        manifest: ItemManifest,
        base_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        archive_name: impl Into<String>,
    ) -> Self {
        Self {
            manifest,
            base_dir: base_dir.into(),
            out_dir: out_dir.into(),
            archive_name: archive_name.into(),
            cleanup: CleanupPolicy::default(),
            emitter: Arc::new(NullEmitter),
            run_id: None,
        }
    }

    /// Build a packager from a release config rooted at `base_dir`.
    pub fn from_release(config: &ReleaseConfig, base_dir: &Path) -> Result<Self> {
        let manifest = ItemManifest::new(config.items.iter().cloned())?;
        Ok(Self::new(
            manifest,
            base_dir,
            config.out_dir_for(base_dir),
            config.archive_name_for(base_dir),
        )
        .with_cleanup(config.cleanup))
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Report progress through `emitter`.
    pub fn with_emitter(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Tag every progress event with a run ID.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn manifest(&self) -> &ItemManifest {
        &self.manifest
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn cleanup(&self) -> CleanupPolicy {
        self.cleanup
    }

    pub fn archive_path(&self) -> PathBuf {
        self.out_dir.join(&self.archive_name)
    }

    /// Run the packaging pass.
    ///
    /// On success the archive holds one entry per manifest item. On any
    /// failure the archive is closed and removed according to the cleanup
    /// policy before the error is returned.
    pub fn package(&self) -> Result<PackageReport> {
        self.emit(
            ProgressEvent::new(event_names::BUILD_STARTED, Phase::Start)
                .with_detail("items", self.manifest.len()),
        );
        self.emit(
            ProgressEvent::new(event_names::IMPORTING, Phase::Importing)
                .with_detail("base_dir", self.base_dir.display().to_string()),
        );

        let created_dir = match self.check_out_dir().and_then(|()| self.ensure_out_dir()) {
            Ok(created) => created,
            Err(err) => {
                warn!(error = %err, "Output directory unavailable");
                self.emit_aborted(&err);
                return Err(err);
            }
        };

        self.emit(
            ProgressEvent::new(event_names::BUILDING, Phase::Building)
                .with_detail("archive", self.archive_path().display().to_string()),
        );

        let archive_path = self.archive_path();
        let mut sink = ZipSink::new(&archive_path);
        let written = self.write_items(&mut sink);
        let closed = sink.finish();

        let outcome = match (written, closed) {
            (Ok(entries), Ok(())) => Ok(entries),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    debug!(error = %close_err, "Archive close failed after aborted write");
                }
                Err(err)
            }
        };

        match outcome {
            Ok(entries) => {
                let report = PackageReport::new(archive_path, self.out_dir.clone(), entries);
                info!(
                    path = %report.archive_path.display(),
                    files = report.entry_count(),
                    bytes = report.total_bytes(),
                    "Release archive written"
                );
                self.emit(
                    ProgressEvent::new(event_names::BUILD_FINISHED, Phase::Finalizing)
                        .with_progress(report.entry_count() as u64, Some(self.manifest.len() as u64))
                        .with_detail("out_dir", self.out_dir.display().to_string())
                        .with_detail("archive", report.archive_path.display().to_string()),
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    cleanup = %self.cleanup,
                    archive_created = sink.created(),
                    "Packaging failed, cleaning up"
                );
                self.clean_up(created_dir);
                self.emit_aborted(&err);
                Err(err)
            }
        }
    }

    /// Write manifest items into `sink` in order, stopping at the first
    /// missing item or write error. Does not call `finish` on the sink.
    pub fn write_items(&self, sink: &mut dyn EntrySink) -> Result<Vec<ArchiveEntry>> {
        let total = self.manifest.len() as u64;
        let mut entries = Vec::with_capacity(self.manifest.len());

        for (idx, item) in self.manifest.iter().enumerate() {
            let path = self.base_dir.join(item);

            if !path.is_file() {
                return Err(PackageError::MissingItem {
                    item: item.to_string(),
                    path,
                });
            }

            let mut reader = HashingReader::new(File::open(&path)?);
            sink.add_entry(item, &mut reader)?;
            let entry = reader.into_entry(item);

            debug!(item, bytes = entry.bytes, "Added item to archive");
            self.emit(
                ProgressEvent::new(event_names::ITEM_ADDED, Phase::Building)
                    .with_progress(idx as u64 + 1, Some(total))
                    .with_detail("item", item),
            );
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Refuse an output directory that is the base directory or one of its
    /// ancestors, since cleanup would remove the project sources with it.
    fn check_out_dir(&self) -> Result<()> {
        let out_dir = comparable_path(&self.out_dir);
        let base_dir = comparable_path(&self.base_dir);
        if base_dir.starts_with(&out_dir) {
            return Err(PackageError::OutputDirContainsBase {
                out_dir: self.out_dir.clone(),
                base_dir: self.base_dir.clone(),
            });
        }
        Ok(())
    }

    /// Create the output directory if needed. Returns whether it was created.
    fn ensure_out_dir(&self) -> Result<bool> {
        if self.out_dir.is_dir() {
            return Ok(false);
        }

        fs::create_dir_all(&self.out_dir).map_err(|source| PackageError::DirectoryCreation {
            path: self.out_dir.clone(),
            source,
        })?;

        debug!(path = %self.out_dir.display(), "Output directory created");
        Ok(true)
    }

    fn clean_up(&self, created_dir: bool) {
        match self.cleanup {
            CleanupPolicy::RemoveOutputDir => {
                if let Err(err) = fs::remove_dir_all(&self.out_dir) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %self.out_dir.display(), error = %err, "Failed to remove output directory");
                    }
                }
            }
            CleanupPolicy::CreatedOnly => {
                // Includes an archive left by an earlier run.
                let archive_path = self.archive_path();
                if let Err(err) = fs::remove_file(&archive_path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %archive_path.display(), error = %err, "Failed to remove archive");
                    }
                }
                // Only succeeds when nothing else lives there.
                if created_dir {
                    if let Err(err) = fs::remove_dir(&self.out_dir) {
                        debug!(path = %self.out_dir.display(), error = %err, "Output directory kept");
                    }
                }
            }
        }
    }

    fn emit_aborted(&self, err: &PackageError) {
        let mut event = ProgressEvent::new(event_names::BUILD_ABORTED, Phase::CleaningUp)
            .with_detail("reason", err.to_string());
        if let PackageError::MissingItem { item, path } = err {
            event = event
                .with_detail("item", item)
                .with_detail("path", path.display().to_string());
        }
        self.emit(event);
    }

    fn emit(&self, event: ProgressEvent) {
        let event = match &self.run_id {
            Some(run_id) => event.with_run_id(run_id.clone()),
            None => event,
        };
        self.emitter.emit(event);
    }
}

/// Absolute, `.`/`..`-free form of `path` for containment checks.
///
/// The longest existing prefix is canonicalized so symlinked and plain
/// spellings of the same directory compare equal.
fn comparable_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing) {
            resolved.extend(missing.iter().rev());
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return lexical.clone(),
        }
    }
}
