//! Authored rule sets: loading, saving and appending rules for a selection.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuleSetError;
use crate::matching::normalise_path;
use crate::models::{BuildRule, NamingStrategy, PatternKind};

/// Ordered collection of build rules.
///
/// Rule order is the tie-break for conflicting claims: earlier rules win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSet {
  /// Rules in evaluation order.
  #[serde(default)]
  pub rules: Vec<BuildRule>,
}

#[derive(Debug, Clone, Copy)]
enum Format {
  Json,
  Yaml,
}

fn format_of(path: &Path) -> Result<Format, RuleSetError> {
  match path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_ascii_lowercase)
    .as_deref()
  {
    Some("json") => Ok(Format::Json),
    Some("yaml" | "yml") => Ok(Format::Yaml),
    _ => Err(RuleSetError::UnsupportedFormat {
      path: path.to_path_buf(),
    }),
  }
}

impl RuleSet {
  /// Create a rule set from rules in evaluation order.
  pub fn new(rules: Vec<BuildRule>) -> Self {
    Self { rules }
  }

  /// Load a rule set from a JSON or YAML file. A missing file yields an empty set.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
    let path = path.as_ref();
    let format = format_of(path)?;
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(RuleSetError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    match format {
      Format::Json => serde_json::from_str(&contents).map_err(|err| RuleSetError::Json {
        path: path.to_path_buf(),
        source: err,
      }),
      Format::Yaml => serde_yaml::from_str(&contents).map_err(|err| RuleSetError::Yaml {
        path: path.to_path_buf(),
        source: err,
      }),
    }
  }

  /// Persist the rule set, choosing the format from the file extension.
  pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), RuleSetError> {
    let path = path.as_ref();
    let contents = match format_of(path)? {
      Format::Json => serde_json::to_string_pretty(self).map_err(|err| RuleSetError::Json {
        path: path.to_path_buf(),
        source: err,
      })?,
      Format::Yaml => serde_yaml::to_string(self).map_err(|err| RuleSetError::Yaml {
        path: path.to_path_buf(),
        source: err,
      })?,
    };

    let io_error = |source| RuleSetError::Io {
      path: path.to_path_buf(),
      source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, contents).map_err(io_error)
  }

  /// Append one rule per selected root.
  ///
  /// Directory rules bundle each root as a unit (`ByDirectory`); every other pattern names
  /// bundles by file path. Returns the number of rules added.
  pub fn apply_to_selection<I, S>(&mut self, selection: I, pattern: PatternKind) -> usize
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let naming = if pattern == PatternKind::AllFilesInDirectory {
      NamingStrategy::ByDirectory
    } else {
      NamingStrategy::ByPath
    };

    let before = self.rules.len();
    self.rules.extend(
      selection
        .into_iter()
        .map(|root| normalise_path(root.as_ref()))
        .map(|root| BuildRule::new(root, pattern, naming)),
    );
    let added = self.rules.len() - before;
    log::debug!("appended {added} {} rule(s)", pattern.short_name());
    added
  }

  /// Number of rules.
  pub fn len(&self) -> usize {
    self.rules.len()
  }

  /// Returns `true` when the set holds no rules.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn applies_path_naming_for_extension_patterns() {
    let mut rules = RuleSet::default();
    let added = rules.apply_to_selection(["Art/Icons", "UI\\Prefabs\\"], PatternKind::ByExtensionPrefab);

    assert_eq!(added, 2);
    assert_eq!(rules.rules, vec![
      BuildRule::new("Art/Icons", PatternKind::ByExtensionPrefab, NamingStrategy::ByPath),
      BuildRule::new("UI/Prefabs", PatternKind::ByExtensionPrefab, NamingStrategy::ByPath),
    ]);
  }

  #[test]
  fn applies_directory_naming_for_directory_pattern() {
    let mut rules = RuleSet::new(vec![BuildRule::new(
      "Existing",
      PatternKind::ByExtensionText,
      NamingStrategy::ByFilename,
    )]);
    rules.apply_to_selection(vec!["Audio".to_string()], PatternKind::AllFilesInDirectory);

    assert_eq!(rules.len(), 2);
    assert_eq!(rules.rules[1].naming, NamingStrategy::ByDirectory);
    assert_eq!(rules.rules[0].root, "Existing");
  }

  #[test]
  fn missing_file_yields_empty_set() {
    let temp = tempdir().expect("failed to create temp dir");
    let rules = RuleSet::load_from_path(temp.path().join("rules.yaml"))
      .expect("missing files should not produce an error");
    assert!(rules.is_empty());
  }

  #[test]
  fn loads_yaml_rules() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("rules.yml");
    fs::write(
      &path,
      "rules:\n  - root: Art/Icons\n    pattern: by_extension_png\n    naming: by_directory\n  - root: Scenes\n    pattern: by_extension_scene\n    naming: explicit\n    explicit_name: levels\n",
    )
    .unwrap();

    let rules = RuleSet::load_from_path(&path).expect("rules should load");
    assert_eq!(rules.rules, vec![
      BuildRule::new("Art/Icons", PatternKind::ByExtensionPng, NamingStrategy::ByDirectory),
      BuildRule::explicit("Scenes", PatternKind::ByExtensionScene, "levels"),
    ]);
  }

  #[test]
  fn saves_and_reloads_json() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("nested/rules.json");
    let mut rules = RuleSet::default();
    rules.apply_to_selection(["Art"], PatternKind::ByExtensionMaterial);

    rules.save_to_path(&path).expect("rules should save");
    assert_eq!(RuleSet::load_from_path(&path).unwrap(), rules);
  }

  #[test]
  fn reports_parse_and_format_errors() {
    let temp = tempdir().expect("failed to create temp dir");
    let bad = temp.path().join("rules.json");
    fs::write(&bad, "{\"rules\": [{\"root\": 1}]}").unwrap();
    assert!(matches!(RuleSet::load_from_path(&bad), Err(RuleSetError::Json { .. })));

    let unknown = temp.path().join("rules.toml");
    assert!(matches!(
      RuleSet::load_from_path(&unknown),
      Err(RuleSetError::UnsupportedFormat { .. })
    ));
  }
}
