use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::ProjectConfig;
use crate::matching::canonical_path;
use crate::models::PatternKind;

/// Compiled file name globs for every [`PatternKind`], plus the asset filters.
#[derive(Debug, Clone)]
pub struct PatternTable {
    globs: BTreeMap<PatternKind, Vec<Regex>>,
    ignored_extensions: Vec<String>,
    scene_extensions: Vec<String>,
    excluded_paths: BTreeSet<String>,
}

impl PatternTable {
    /// Compile comma-separated glob lists (`*.txt,*.json`) into matchers.
    pub fn compile(
        patterns: &BTreeMap<PatternKind, String>,
        ignored_extensions: &[String],
        scene_extensions: &[String],
    ) -> Result<Self, regex::Error> {
        let mut globs = BTreeMap::new();
        for (kind, list) in patterns {
            let compiled = list
                .split(',')
                .map(str::trim)
                .filter(|glob| !glob.is_empty())
                .map(glob_to_regex)
                .collect::<Result<Vec<_>, _>>()?;
            globs.insert(*kind, compiled);
        }

        Ok(Self {
            globs,
            ignored_extensions: normalise_extensions(ignored_extensions),
            scene_extensions: normalise_extensions(scene_extensions),
            excluded_paths: BTreeSet::new(),
        })
    }

    /// Never match the given project-relative files (tooling inputs and outputs).
    pub fn with_excluded_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_paths.extend(
            paths
                .into_iter()
                .filter_map(|path| canonical_path(path.as_ref()))
                .filter(|path| !path.is_empty())
                .map(|path| path.to_lowercase()),
        );
        self
    }

    /// Returns `true` for canonical paths registered with [`Self::with_excluded_paths`].
    pub fn is_excluded_path(&self, path: &str) -> bool {
        !self.excluded_paths.is_empty() && self.excluded_paths.contains(&path.to_lowercase())
    }

    /// Table built from the default project configuration.
    pub fn builtin() -> &'static PatternTable {
        static TABLE: OnceLock<PatternTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            ProjectConfig::default()
                .pattern_table()
                .expect("invalid builtin pattern table")
        })
    }

    /// Returns `true` when `file_name` is an asset selected by `kind`.
    pub fn matches(&self, kind: PatternKind, file_name: &str) -> bool {
        if self.is_ignored(file_name) {
            return false;
        }
        self.globs
            .get(&kind)
            .is_some_and(|globs| globs.iter().any(|glob| glob.is_match(file_name)))
    }

    /// Hidden files and ignored extensions never count as assets.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') {
            return true;
        }
        extension_of(file_name)
            .is_some_and(|ext| self.ignored_extensions.iter().any(|ignored| *ignored == ext))
    }

    /// Returns `true` when `path` names a scene file.
    pub fn is_scene(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        extension_of(file_name)
            .is_some_and(|ext| self.scene_extensions.iter().any(|scene| *scene == ext))
    }
}

/// Lower-cased extension including the leading dot.
fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

fn normalise_extensions(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .map(|value| format!(".{value}"))
        .collect()
}

fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("(?i)^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_globs_case_insensitively() {
        let table = PatternTable::builtin();
        assert!(table.matches(PatternKind::ByExtensionPng, "icon.png"));
        assert!(table.matches(PatternKind::ByExtensionPng, "ICON.PNG"));
        assert!(!table.matches(PatternKind::ByExtensionPng, "icon.png.bak"));
        assert!(table.matches(PatternKind::ByExtensionText, "strings.csv"));
        assert!(!table.matches(PatternKind::ByExtensionText, "strings.png"));
    }

    #[test]
    fn directory_pattern_accepts_everything_but_ignored_files() {
        let table = PatternTable::builtin();
        assert!(table.matches(PatternKind::AllFilesInDirectory, "anything.bin"));
        assert!(table.matches(PatternKind::AllFilesInDirectory, "Makefile"));
        assert!(!table.matches(PatternKind::AllFilesInDirectory, "icon.png.meta"));
        assert!(!table.matches(PatternKind::AllFilesInDirectory, "Player.cs"));
        assert!(!table.matches(PatternKind::AllFilesInDirectory, ".DS_Store"));
    }

    #[test]
    fn escapes_regex_metacharacters() {
        let mut patterns = BTreeMap::new();
        patterns.insert(PatternKind::ByExtensionAsset, "data+?.asset, ".to_string());
        let table = PatternTable::compile(&patterns, &[], &[]).unwrap();

        assert!(table.matches(PatternKind::ByExtensionAsset, "data+1.asset"));
        assert!(!table.matches(PatternKind::ByExtensionAsset, "dataa1.asset"));
        assert!(!table.matches(PatternKind::ByExtensionPng, "data+1.asset"));
    }

    #[test]
    fn excludes_registered_paths_only() {
        let table = PatternTable::compile(&BTreeMap::new(), &[], &[])
            .unwrap()
            .with_excluded_paths(["./asset_rules.yaml", "target\\bundle_plan.json", "../outside.json"]);

        assert!(table.is_excluded_path("asset_rules.yaml"));
        assert!(table.is_excluded_path("target/bundle_plan.json"));
        assert!(!table.is_excluded_path("data/bundle_plan.json"));
        assert!(!table.is_excluded_path("outside.json"));
    }

    #[test]
    fn detects_scenes_by_extension() {
        let table = PatternTable::builtin();
        assert!(table.is_scene("Scenes/Main.unity"));
        assert!(table.is_scene("Scenes/Main.UNITY"));
        assert!(!table.is_scene("Scenes/Main.prefab"));
    }
}
