//! Release resolution for CLI commands.
//!
//! Combines the resolved `release.json` with command-line overrides and
//! turns the result into a ready-to-run `Packager`.

use crate::exit_codes::ExitCode;
use rp_bundle::{PackageError, Packager};
use rp_config::{load_release_config, validate_release, CleanupPolicy, ResolvedRelease, ValidationError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot resolve base directory: {0}")]
    BaseDir(#[source] std::io::Error),

    #[error("invalid release config: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Package(#[from] PackageError),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::BaseDir(_) => ExitCode::ArgsError,
            CliError::Config(err) => ExitCode::from(err),
            CliError::Package(err) => ExitCode::from(err),
        }
    }

    /// Validation code for config errors (see `ValidationError::code`).
    pub fn config_code(&self) -> Option<u32> {
        match self {
            CliError::Config(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Command-line overrides applied on top of the release config.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOverrides {
    /// Replaces the manifest when non-empty.
    pub items: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub archive_name: Option<String>,
    pub cleanup: Option<CleanupPolicy>,
}

/// Fully resolved release, ready to package.
#[derive(Debug, Clone)]
pub struct Release {
    pub base_dir: PathBuf,
    pub resolved: ResolvedRelease,
}

/// Summary of a resolved release for the `manifest` command.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSummary {
    pub base_dir: PathBuf,
    pub config_source: String,
    pub config_path: Option<PathBuf>,
    pub items: Vec<String>,
    pub out_dir: PathBuf,
    pub archive_path: PathBuf,
    pub cleanup: String,
}

/// Resolve the base directory to an absolute path (default: CWD).
pub fn resolve_base_dir(base_dir: Option<&Path>) -> Result<PathBuf, CliError> {
    match base_dir {
        Some(dir) => std::path::absolute(dir).map_err(CliError::BaseDir),
        None => std::env::current_dir().map_err(CliError::BaseDir),
    }
}

/// Load the release config for `base_dir` and apply overrides.
pub fn load_release(
    config_path: Option<&Path>,
    base_dir: PathBuf,
    overrides: &ReleaseOverrides,
) -> Result<Release, CliError> {
    let mut resolved = load_release_config(config_path, &base_dir)?;

    let mut config = resolved.config;
    if !overrides.items.is_empty() {
        config = config.with_items(overrides.items.iter().cloned());
    }
    if let Some(out_dir) = &overrides.out_dir {
        config = config.with_out_dir(out_dir.clone());
    }
    if let Some(archive_name) = &overrides.archive_name {
        config = config.with_archive_name(archive_name.clone());
    }
    if let Some(cleanup) = overrides.cleanup {
        config = config.with_cleanup(cleanup);
    }
    validate_release(&config)?;
    resolved.config = config;

    Ok(Release { base_dir, resolved })
}

impl Release {
    pub fn packager(&self) -> Result<Packager, CliError> {
        Ok(Packager::from_release(&self.resolved.config, &self.base_dir)?)
    }

    pub fn archive_path(&self) -> PathBuf {
        let config = &self.resolved.config;
        config
            .out_dir_for(&self.base_dir)
            .join(config.archive_name_for(&self.base_dir))
    }

    pub fn summary(&self) -> ReleaseSummary {
        let config = &self.resolved.config;
        ReleaseSummary {
            base_dir: self.base_dir.clone(),
            config_source: self.resolved.source.to_string(),
            config_path: self.resolved.path.clone(),
            items: config.items.clone(),
            out_dir: config.out_dir_for(&self.base_dir),
            archive_path: self.archive_path(),
            cleanup: config.cleanup.to_string(),
        }
    }
}
