//! `release.json` configuration types.

use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Items packaged when no configuration file is found.
pub const DEFAULT_ITEMS: &[&str] = &["readme.md", "LICENSE", "mod.conf", "init.lua", "screenshot.png"];

/// Output directory used when the config does not name one.
pub const DEFAULT_OUT_DIR: &str = "_release";

/// What to remove when a packaging run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    /// Remove the whole output directory, including anything that was
    /// already in it before the run.
    #[default]
    RemoveOutputDir,
    /// Remove only the target archive, plus the output directory if this
    /// run created it and it is left empty. Other files in the output
    /// directory survive.
    CreatedOnly,
}

impl std::str::FromStr for CleanupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove-output-dir" | "remove-dir" | "all" => Ok(CleanupPolicy::RemoveOutputDir),
            "created-only" | "created" => Ok(CleanupPolicy::CreatedOnly),
            _ => Err(format!("unknown cleanup policy: {}", s)),
        }
    }
}

impl std::fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupPolicy::RemoveOutputDir => write!(f, "remove-output-dir"),
            CleanupPolicy::CreatedOnly => write!(f, "created-only"),
        }
    }
}

/// Release packaging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Project name; used to derive the archive name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ordered list of item names resolved against the base directory.
    #[serde(default = "default_items")]
    pub items: Vec<String>,

    /// Output directory, relative to the base directory unless absolute.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Archive file name placed inside `out_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,

    #[serde(default)]
    pub cleanup: CleanupPolicy,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_items() -> Vec<String> {
    DEFAULT_ITEMS.iter().map(|s| s.to_string()).collect()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUT_DIR)
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: None,
            items: default_items(),
            out_dir: default_out_dir(),
            archive_name: None,
            cleanup: CleanupPolicy::default(),
        }
    }
}

impl ReleaseConfig {
    /// Load a release config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_str(&content)
    }

    /// Parse a release config from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Project name, falling back to the base directory's file name.
    pub fn project_name(&self, base_dir: &Path) -> String {
        self.name
            .clone()
            .or_else(|| {
                base_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "release".to_string())
    }

    /// Archive file name, defaulting to `<project name>.zip`.
    pub fn archive_name_for(&self, base_dir: &Path) -> String {
        match &self.archive_name {
            Some(name) => name.clone(),
            None => format!("{}.zip", self.project_name(base_dir)),
        }
    }

    /// Absolute output directory for a base directory.
    pub fn out_dir_for(&self, base_dir: &Path) -> PathBuf {
        if self.out_dir.is_absolute() {
            self.out_dir.clone()
        } else {
            base_dir.join(&self.out_dir)
        }
    }

    /// Replace the manifest.
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = Some(archive_name.into());
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let config = ReleaseConfig::default();
        assert_eq!(
            config.items,
            vec!["readme.md", "LICENSE", "mod.conf", "init.lua", "screenshot.png"]
        );
        assert_eq!(config.out_dir, PathBuf::from("_release"));
        assert_eq!(config.cleanup, CleanupPolicy::RemoveOutputDir);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ReleaseConfig::from_str(r#"{"items": ["a.txt"]}"#).unwrap();
        assert_eq!(config.items, vec!["a.txt"]);
        assert_eq!(config.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(config.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert!(config.archive_name.is_none());
    }

    #[test]
    fn test_cleanup_policy_json() {
        let config = ReleaseConfig::from_str(r#"{"cleanup": "created-only"}"#).unwrap();
        assert_eq!(config.cleanup, CleanupPolicy::CreatedOnly);
        assert_eq!(
            serde_json::to_string(&CleanupPolicy::RemoveOutputDir).unwrap(),
            "\"remove-output-dir\""
        );
    }

    #[test]
    fn test_cleanup_policy_parse() {
        assert_eq!("created-only".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::CreatedOnly);
        assert_eq!("ALL".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::RemoveOutputDir);
        assert!("sometimes".parse::<CleanupPolicy>().is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = ReleaseConfig::from_str("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_archive_name_derivation() {
        let base = Path::new("/work/api_be2een");
        let config = ReleaseConfig::default();
        assert_eq!(config.archive_name_for(base), "api_be2een.zip");

        let named = ReleaseConfig {
            name: Some("mymod".to_string()),
            ..ReleaseConfig::default()
        };
        assert_eq!(named.archive_name_for(base), "mymod.zip");

        let explicit = named.with_archive_name("custom.zip");
        assert_eq!(explicit.archive_name_for(base), "custom.zip");
    }

    #[test]
    fn test_out_dir_resolution() {
        let base = Path::new("/work/project");
        let config = ReleaseConfig::default();
        assert_eq!(config.out_dir_for(base), PathBuf::from("/work/project/_release"));

        let absolute = config.with_out_dir("/tmp/out");
        assert_eq!(absolute.out_dir_for(base), PathBuf::from("/tmp/out"));
    }
}
