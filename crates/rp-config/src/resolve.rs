//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → environment variable → base directory → builtin default.

use crate::release::ReleaseConfig;
use crate::validate::{validate_release, ValidationResult};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG_PATH: &str = "RELPACK_CONFIG";

/// Config file looked up in the base directory.
pub const CONFIG_FILENAME: &str = "release.json";

/// Where the release config was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found as `release.json` in the base directory.
    BaseDirectory,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::BaseDirectory => write!(f, "base directory"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Discovered config file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPath {
    /// Path to the config file (None when using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// A loaded and validated release config with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedRelease {
    pub config: ReleaseConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve the release config path.
///
/// An explicit CLI path is returned as-is so that a missing file is
/// reported instead of silently falling back to defaults.
pub fn resolve_release_config(cli_path: Option<&Path>, base_dir: &Path) -> ConfigPath {
    if let Some(path) = cli_path {
        return ConfigPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    let local = base_dir.join(CONFIG_FILENAME);
    if local.is_file() {
        return ConfigPath {
            path: Some(local),
            source: ConfigSource::BaseDirectory,
        };
    }

    ConfigPath::default()
}

/// Resolve, load and validate the release config.
pub fn load_release_config(
    cli_path: Option<&Path>,
    base_dir: &Path,
) -> ValidationResult<ResolvedRelease> {
    let resolved = resolve_release_config(cli_path, base_dir);

    let config = match &resolved.path {
        Some(path) => ReleaseConfig::from_file(path)?,
        None => ReleaseConfig::default(),
    };

    validate_release(&config)?;

    Ok(ResolvedRelease {
        config,
        path: resolved.path,
        source: resolved.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::BaseDirectory), "base directory");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_cli_path_wins_even_if_missing() {
        let resolved = resolve_release_config(
            Some(Path::new("/nonexistent/release.json")),
            Path::new("/nonexistent"),
        );
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(
            resolved.path,
            Some(PathBuf::from("/nonexistent/release.json"))
        );
    }
}
