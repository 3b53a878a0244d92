//! Release archive packager for relpack.
//!
//! Assembles a fixed, ordered manifest of project files into a single
//! deflate-compressed ZIP archive, all or nothing: if any item is missing,
//! or a write fails, the partial output is removed before the error is
//! returned.
//!
//! # Archive Format
//!
//! One top-level entry per manifest item, named exactly by the item name,
//! in manifest order. No directory prefix from the base directory leaks into
//! entry names.
//!
//! # Example
//!
//! ```no_run
//! use rp_bundle::{ArchiveReader, ItemManifest, Packager};
//!
//! let manifest = ItemManifest::new(["readme.md", "LICENSE"]).unwrap();
//! let packager = Packager::new(manifest, "/work/mymod", "/work/mymod/_release", "mymod.zip");
//! let report = packager.package().unwrap();
//!
//! let mut reader = ArchiveReader::open(&report.archive_path).unwrap();
//! let names = reader.entry_names().unwrap();
//! assert_eq!(names, vec!["readme.md", "LICENSE"]);
//! ```

pub mod error;
pub mod events;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use error::{PackageError, Result};
pub use events::{CallbackEmitter, JsonlWriter, Phase, ProgressEmitter, ProgressEvent};
pub use manifest::{ArchiveEntry, ItemManifest, PackageReport};
pub use reader::ArchiveReader;
pub use rp_config::CleanupPolicy;
pub use writer::{EntrySink, Packager, ZipSink};
