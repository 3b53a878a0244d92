//! Release configuration loading and validation.
//!
//! This crate provides:
//! - The typed `release.json` structure (manifest, output location, cleanup policy)
//! - Config resolution (CLI → env → base directory → builtin default)
//! - Semantic validation of the manifest

pub mod release;
pub mod resolve;
pub mod validate;

pub use release::{CleanupPolicy, ReleaseConfig, DEFAULT_ITEMS, DEFAULT_OUT_DIR};
pub use resolve::{load_release_config, resolve_release_config, ConfigPath, ConfigSource, ResolvedRelease};
pub use validate::{validate_release, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
