//! Project configuration loader describing pattern tables, naming options and output paths.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::matching::PatternTable;
use crate::models::PatternKind;
use crate::naming::NamingOptions;

/// Configuration file searched for in the project directory.
pub const DEFAULT_CONFIG_FILE: &str = "asset_rules.config.json";

/// Discoverable project configuration.
///
/// Every value has a default, so a missing file or a partial file is always usable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Rule set file relative to the project directory (`.json`, `.yaml` or `.yml`).
    pub rules_file: String,
    /// Where the bundle plan JSON is written, relative to the project directory.
    pub plan_output: String,
    /// Comma-separated file name globs for each pattern kind.
    pub patterns: BTreeMap<PatternKind, String>,
    /// File extensions that are never treated as assets.
    pub ignored_extensions: Vec<String>,
    /// File extensions identifying scene files.
    pub scene_extensions: Vec<String>,
    /// Token replacing `/` inside bundle names.
    pub name_separator: String,
    /// Suffix appended to every bundle name.
    pub bundle_extension: String,
    /// Replace bundle names by the MD5 of their normalised form.
    pub hash_names: bool,
    /// Whether the runtime loads content from built bundles rather than loose files.
    pub runtime_mode: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            rules_file: "asset_rules.yaml".into(),
            plan_output: "target/bundle_plan.json".into(),
            patterns: default_patterns(),
            ignored_extensions: [".meta", ".cs", ".dll", ".js", ".boo"]
                .into_iter()
                .map(String::from)
                .collect(),
            scene_extensions: vec![".unity".into()],
            name_separator: "/".into(),
            bundle_extension: String::new(),
            hash_names: false,
            runtime_mode: false,
        }
    }
}

fn default_patterns() -> BTreeMap<PatternKind, String> {
    [
        (
            PatternKind::ByExtensionText,
            "*.txt,*.bytes,*.json,*.csv,*.xml,*.htm,*.html,*.yaml,*.fnt",
        ),
        (PatternKind::ByExtensionPrefab, "*.prefab"),
        (PatternKind::ByExtensionPng, "*.png"),
        (PatternKind::ByExtensionMaterial, "*.mat"),
        (PatternKind::ByExtensionController, "*.controller"),
        (PatternKind::ByExtensionAsset, "*.asset"),
        (PatternKind::ByExtensionScene, "*.unity"),
        (PatternKind::AllFilesInDirectory, "*"),
    ]
    .into_iter()
    .map(|(kind, globs)| (kind, globs.to_string()))
    .collect()
}

impl ProjectConfig {
    /// Attempt to load configuration from the provided project directory.
    ///
    /// When the configuration file does not exist or fails to parse we fall back to default
    /// values so callers can keep operating; parse failures are logged.
    pub fn discover(project_dir: &Path) -> Self {
        let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
        if !candidate.exists() {
            return Self::default();
        }
        match Self::from_path(&candidate) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err:#}; using default configuration");
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        // Partial pattern tables keep the defaults for kinds they omit.
        for (kind, globs) in default_patterns() {
            config.patterns.entry(kind).or_insert(globs);
        }
        Ok(config)
    }

    /// Compile the glob table used by the pattern matcher.
    ///
    /// The rule file, the plan output and the config file itself are excluded from matching.
    pub fn pattern_table(&self) -> Result<PatternTable> {
        PatternTable::compile(
            &self.patterns,
            &self.ignored_extensions,
            &self.scene_extensions,
        )
        .map(|table| {
            table.with_excluded_paths([
                self.rules_file.as_str(),
                self.plan_output.as_str(),
                DEFAULT_CONFIG_FILE,
            ])
        })
        .context("invalid pattern configuration")
    }

    /// Options controlling bundle name normalisation.
    pub fn naming_options(&self) -> NamingOptions {
        NamingOptions {
            separator: self.name_separator.clone(),
            bundle_extension: self.bundle_extension.clone(),
            hash_names: self.hash_names,
        }
    }

    /// Absolute path of the rule set file.
    pub fn rules_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.rules_file)
    }

    /// Absolute path of the bundle plan output.
    pub fn plan_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.plan_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_file_missing() {
        let temp = tempdir().expect("failed to create temp dir");
        let config = ProjectConfig::discover(temp.path());
        assert_eq!(config.rules_file, "asset_rules.yaml");
        assert_eq!(config.patterns.len(), PatternKind::ALL.len());
        assert!(!config.runtime_mode);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let temp = tempdir().expect("failed to create temp dir");
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            r#"{"runtime_mode": true, "patterns": {"by_extension_png": "*.png,*.jpg"}}"#,
        )
        .unwrap();

        let config = ProjectConfig::discover(temp.path());
        assert!(config.runtime_mode);
        assert_eq!(config.patterns[&PatternKind::ByExtensionPng], "*.png,*.jpg");
        assert_eq!(config.patterns[&PatternKind::ByExtensionScene], "*.unity");
        assert_eq!(config.name_separator, "/");
    }

    #[test]
    fn falls_back_to_defaults_for_invalid_json() {
        let temp = tempdir().expect("failed to create temp dir");
        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();

        let config = ProjectConfig::discover(temp.path());
        assert_eq!(config.plan_output, "target/bundle_plan.json");
    }

    #[test]
    fn resolves_paths_against_project_dir() {
        let config = ProjectConfig::default();
        let project = Path::new("/project");
        assert_eq!(config.rules_path(project), project.join("asset_rules.yaml"));
        assert_eq!(
            config.plan_path(project),
            project.join("target/bundle_plan.json")
        );
    }

    #[test]
    fn pattern_table_excludes_tooling_files() {
        let config = ProjectConfig {
            plan_output: "./build/plan.json".to_string(),
            ..ProjectConfig::default()
        };
        let table = config.pattern_table().unwrap();

        assert!(table.is_excluded_path("asset_rules.yaml"));
        assert!(table.is_excluded_path("build/plan.json"));
        assert!(table.is_excluded_path(DEFAULT_CONFIG_FILE));
        assert!(!table.is_excluded_path("target/bundle_plan.json"));
    }
}
