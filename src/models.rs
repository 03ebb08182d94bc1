//! Data structures shared by rule authoring, resolution and planning.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::hasher::{crc32_hex, md5_hex};

/// Fixed set of file patterns a rule can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
  /// Text-like data files (`.txt`, `.json`, `.csv`, ...).
  ByExtensionText,
  /// Prefab files.
  ByExtensionPrefab,
  /// PNG images.
  ByExtensionPng,
  /// Material files.
  ByExtensionMaterial,
  /// Animation controllers.
  ByExtensionController,
  /// Generic serialized assets.
  ByExtensionAsset,
  /// Scene files.
  ByExtensionScene,
  /// Every immediate file of the rule root, without recursion.
  AllFilesInDirectory,
}

impl PatternKind {
  /// All pattern kinds in declaration order.
  pub const ALL: [PatternKind; 8] = [
    PatternKind::ByExtensionText,
    PatternKind::ByExtensionPrefab,
    PatternKind::ByExtensionPng,
    PatternKind::ByExtensionMaterial,
    PatternKind::ByExtensionController,
    PatternKind::ByExtensionAsset,
    PatternKind::ByExtensionScene,
    PatternKind::AllFilesInDirectory,
  ];

  /// Short name accepted on the command line.
  pub fn short_name(self) -> &'static str {
    match self {
      PatternKind::ByExtensionText => "text",
      PatternKind::ByExtensionPrefab => "prefab",
      PatternKind::ByExtensionPng => "png",
      PatternKind::ByExtensionMaterial => "material",
      PatternKind::ByExtensionController => "controller",
      PatternKind::ByExtensionAsset => "asset",
      PatternKind::ByExtensionScene => "scene",
      PatternKind::AllFilesInDirectory => "directory",
    }
  }
}

impl FromStr for PatternKind {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let value = value.trim().to_ascii_lowercase();
    PatternKind::ALL
      .into_iter()
      .find(|kind| kind.short_name() == value)
      .ok_or_else(|| {
        let known: Vec<&str> = PatternKind::ALL.iter().map(|kind| kind.short_name()).collect();
        format!("unknown pattern kind '{value}' (expected one of {})", known.join(", "))
      })
  }
}

/// How the bundle name of a matched file is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
  /// Full file path without extension.
  #[default]
  ByPath,
  /// The rule's root directory.
  ByDirectory,
  /// First directory below the rule root.
  ByTopDirectory,
  /// File name without extension.
  ByFilename,
  /// The rule's `explicit_name` for every matched file.
  Explicit,
}

/// One declarative bundling rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildRule {
  /// Project-relative directory searched by the rule.
  pub root: String,
  /// Pattern selecting files below the root.
  pub pattern: PatternKind,
  /// Naming strategy for matched files.
  #[serde(default)]
  pub naming: NamingStrategy,
  /// Fixed bundle name used by [`NamingStrategy::Explicit`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub explicit_name: Option<String>,
}

impl BuildRule {
  /// Create a rule without an explicit name.
  pub fn new(root: impl Into<String>, pattern: PatternKind, naming: NamingStrategy) -> Self {
    Self {
      root: root.into(),
      pattern,
      naming,
      explicit_name: None,
    }
  }

  /// Create a rule that places every match into the named bundle.
  pub fn explicit(root: impl Into<String>, pattern: PatternKind, name: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      pattern,
      naming: NamingStrategy::Explicit,
      explicit_name: Some(name.into()),
    }
  }
}

/// Mapping from bundle name to the sorted set of member paths.
pub type BundleAssignment = BTreeMap<String, BTreeSet<String>>;

/// Content hashes of a single project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDigest {
  /// Project-relative path of the hashed file.
  pub path: String,
  /// IEEE CRC32 checksum.
  #[serde(serialize_with = "serialize_crc32")]
  pub crc32: u32,
  /// MD5 digest.
  #[serde(serialize_with = "serialize_md5")]
  pub md5: [u8; 16],
}

fn serialize_crc32<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&crc32_hex(*value))
}

fn serialize_md5<S: Serializer>(value: &[u8; 16], serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&md5_hex(value))
}

/// Rule and bundle that claimed a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOwner {
  /// Index of the claiming rule in its rule set.
  pub rule_index: usize,
  /// Bundle name produced by that rule.
  pub bundle: String,
}

/// A file claimed by two rules under different bundle names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
  /// Contested project-relative path.
  pub path: String,
  /// Owner that keeps the file.
  pub first_owner: BundleOwner,
  /// Owner whose claim was rejected.
  pub second_owner: BundleOwner,
}

/// Non-fatal problem found while resolving or hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
  /// A rule's root directory does not exist; the rule was skipped.
  RootNotFound {
    /// Index of the skipped rule.
    rule_index: usize,
    /// Root as written in the rule.
    root: String,
  },
  /// A file was claimed under two bundle names.
  Conflict(Conflict),
  /// A directory or file could not be read; it was omitted.
  IoFailure {
    /// Project-relative path that failed.
    path: String,
    /// Underlying error message.
    message: String,
  },
  /// An explicit-naming rule has no name; the rule was skipped.
  MissingExplicitName {
    /// Index of the skipped rule.
    rule_index: usize,
  },
  /// An asset's own path-derived name equals a bundle that a rule with another naming strategy
  /// also fills, so unrelated content shares one bundle.
  NameCollision {
    /// Shared bundle name.
    bundle: String,
    /// Asset whose extension-stripped path equals the bundle name.
    path: String,
    /// Rule that assigned `path`.
    rule_index: usize,
    /// Rule that assigned other members of the bundle.
    other_rule_index: usize,
  },
  /// A bundle mixes scene files with other assets.
  MixedSceneBundle {
    /// Offending bundle name.
    bundle: String,
  },
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::RootNotFound { rule_index, root } => {
        write!(f, "rule #{rule_index}: root '{root}' not found")
      }
      Self::Conflict(conflict) => write!(
        f,
        "'{}' claimed by bundle '{}' (rule #{}) and '{}' (rule #{}); keeping '{}'",
        conflict.path,
        conflict.first_owner.bundle,
        conflict.first_owner.rule_index,
        conflict.second_owner.bundle,
        conflict.second_owner.rule_index,
        conflict.first_owner.bundle,
      ),
      Self::IoFailure { path, message } => write!(f, "failed to read '{path}': {message}"),
      Self::MissingExplicitName { rule_index } => {
        write!(f, "rule #{rule_index}: explicit naming without a name")
      }
      Self::NameCollision {
        bundle,
        path,
        rule_index,
        other_rule_index,
      } => write!(
        f,
        "bundle '{bundle}' (rule #{other_rule_index}) collides with the name of '{path}' (rule #{rule_index})"
      ),
      Self::MixedSceneBundle { bundle } => {
        write!(f, "bundle '{bundle}' mixes scenes with other assets")
      }
    }
  }
}

/// Outcome of resolving a rule set against a project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
  /// Bundle name to member files.
  pub assignment: BundleAssignment,
  /// Every problem encountered, in discovery order.
  pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
  /// Conflicts among the diagnostics.
  pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
    self.diagnostics.iter().filter_map(|diagnostic| match diagnostic {
      Diagnostic::Conflict(conflict) => Some(conflict),
      _ => None,
    })
  }

  /// Bundle that owns `path`, if any.
  pub fn bundle_of(&self, path: &str) -> Option<&str> {
    self
      .assignment
      .iter()
      .find(|(_, members)| members.contains(path))
      .map(|(name, _)| name.as_str())
  }
}
