//! Error types for loading rule sets and reading asset content.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving a rule set file.
#[derive(Debug, Error)]
pub enum RuleSetError {
  /// Failed to read or write the rule set file.
  #[error("failed to access {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse a JSON rule set.
  #[error("failed to parse {}: {source}", path.display())]
  Json {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// Failed to parse a YAML rule set.
  #[error("failed to parse {}: {source}", path.display())]
  Yaml {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_yaml::Error,
  },
  /// The file extension does not name a supported format.
  #[error("unsupported rule set format for {} (expected .json, .yaml or .yml)", path.display())]
  UnsupportedFormat {
    /// Path that caused the error.
    path: PathBuf,
  },
}

/// Failure to read the content of a single asset.
#[derive(Debug, Error)]
#[error("failed to read {path}: {source}")]
pub struct AssetReadError {
  /// Project-relative asset path.
  pub path: String,
  /// Source I/O error.
  pub source: std::io::Error,
}
