//! Error types for packaging operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging or verifying a release archive.
#[derive(Error, Debug)]
pub enum PackageError {
    /// I/O error while reading an item or writing the archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest names no items
    #[error("manifest has no items to package")]
    EmptyManifest,

    /// A manifest item does not resolve to a regular file
    #[error("file '{}' not found, release aborted", .path.display())]
    MissingItem { item: String, path: PathBuf },

    /// The output directory is the base directory or one of its ancestors
    #[error(
        "output directory '{}' contains the project directory '{}', refusing to package",
        .out_dir.display(),
        .base_dir.display()
    )]
    OutputDirContainsBase { out_dir: PathBuf, base_dir: PathBuf },

    /// The output directory could not be created
    #[error("cannot create output directory '{}': {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive entry content differs from its source file
    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Manifest item has no entry in the archive
    #[error("archive is missing entry: {0}")]
    EntryMissing(String),

    /// Archive holds more than one entry with the same name
    #[error("archive has duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Archive holds an entry not named by the manifest
    #[error("archive has unexpected entry: {0}")]
    UnexpectedEntry(String),
}

impl PackageError {
    /// Name of the missing manifest item, if this is a `MissingItem` error.
    pub fn missing_item(&self) -> Option<&str> {
        match self {
            PackageError::MissingItem { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Whether the error came from verifying an existing archive.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            PackageError::ChecksumMismatch { .. }
                | PackageError::EntryMissing(_)
                | PackageError::DuplicateEntry(_)
                | PackageError::UnexpectedEntry(_)
        )
    }
}

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, PackageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_item_message_names_path() {
        let err = PackageError::MissingItem {
            item: "missing.txt".to_string(),
            path: PathBuf::from("/proj/missing.txt"),
        };
        assert_eq!(
            err.to_string(),
            "file '/proj/missing.txt' not found, release aborted"
        );
        assert_eq!(err.missing_item(), Some("missing.txt"));
        assert!(!err.is_verification_failure());
    }

    #[test]
    fn test_verification_failures() {
        assert!(PackageError::EntryMissing("a".into()).is_verification_failure());
        assert!(PackageError::UnexpectedEntry("b".into()).is_verification_failure());
        assert!(PackageError::DuplicateEntry("c".into()).is_verification_failure());
        assert!(!PackageError::EmptyManifest.is_verification_failure());
        assert!(PackageError::EmptyManifest.missing_item().is_none());
    }
}
