//! Configuration validation errors and semantic validation.

use crate::release::ReleaseConfig;
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a release configuration semantically.
pub fn validate_release(config: &ReleaseConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.items.is_empty() {
        return Err(ValidationError::SemanticError(
            "manifest must name at least one item".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, item) in config.items.iter().enumerate() {
        if item.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("items[{}]", idx),
                message: "item name is empty".to_string(),
            });
        }
        if !seen.insert(item.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: format!("items[{}]", idx),
                message: format!("duplicate item '{}'", item),
            });
        }
    }

    if let Some(name) = &config.archive_name {
        validate_archive_name(name)?;
    }

    if config.out_dir.as_os_str().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "out_dir".to_string(),
            message: "output directory is empty".to_string(),
        });
    }

    Ok(())
}

fn validate_archive_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "archive_name".to_string(),
            message: "archive name is empty".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ValidationError::InvalidValue {
            field: "archive_name".to_string(),
            message: format!("'{}' must be a plain file name", name),
        });
    }
    Ok(())
}
