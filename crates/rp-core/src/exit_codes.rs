//! Exit codes for the relpack CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use rp_bundle::PackageError;
use rp_config::ValidationError;

/// Exit codes for relpack operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Archive written (or verified) successfully
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Release config missing, malformed or invalid
    ConfigError = 11,

    /// A manifest item was not found; release aborted
    MissingItem = 12,

    /// Archive does not match its sources
    VerifyFailed = 13,

    /// Output directory could not be created
    PermissionError = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error while reading items or writing the archive
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::MissingItem => "ERR_MISSING_ITEM",
            ExitCode::VerifyFailed => "ERR_VERIFY",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&PackageError> for ExitCode {
    fn from(err: &PackageError) -> Self {
        if err.is_verification_failure() {
            return ExitCode::VerifyFailed;
        }
        match err {
            PackageError::MissingItem { .. } => ExitCode::MissingItem,
            PackageError::DirectoryCreation { .. } => ExitCode::PermissionError,
            PackageError::EmptyManifest | PackageError::OutputDirContainsBase { .. } => {
                ExitCode::ConfigError
            }
            PackageError::Io(_) | PackageError::Zip(_) => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<&ValidationError> for ExitCode {
    fn from(_: &ValidationError) -> Self {
        ExitCode::ConfigError
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::MissingItem.is_user_error());
        assert!(!ExitCode::MissingItem.is_internal_error());
        assert!(ExitCode::IoError.is_internal_error());
    }

    #[test]
    fn test_package_error_mapping() {
        let missing = PackageError::MissingItem {
            item: "LICENSE".to_string(),
            path: PathBuf::from("/p/LICENSE"),
        };
        assert_eq!(ExitCode::from(&missing), ExitCode::MissingItem);

        let dir = PackageError::DirectoryCreation {
            path: PathBuf::from("/p/out"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(ExitCode::from(&dir), ExitCode::PermissionError);

        let io = PackageError::Io(std::io::Error::other("disk full"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);

        let verify = PackageError::EntryMissing("a".to_string());
        assert_eq!(ExitCode::from(&verify), ExitCode::VerifyFailed);

        let dup = PackageError::DuplicateEntry("a".to_string());
        assert_eq!(ExitCode::from(&dup), ExitCode::VerifyFailed);

        let unsafe_out = PackageError::OutputDirContainsBase {
            out_dir: PathBuf::from("/p"),
            base_dir: PathBuf::from("/p"),
        };
        assert_eq!(ExitCode::from(&unsafe_out), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::MissingItem.to_string(), "ERR_MISSING_ITEM (12)");
        assert_eq!(i32::from(ExitCode::ConfigError), 11);
    }
}
