//! Build orchestrator turning a rule set into a hashed bundle plan.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::ProjectConfig;
use crate::fs_view::FileSystemView;
use crate::hasher::digest_file;
use crate::models::{Diagnostic, FileDigest, Resolution};
use crate::resolver::RuleResolver;
use crate::rules::RuleSet;

/// Generic build result type used across the crate.
pub type BuildResult<T> = Result<T>;

/// Bundle plan handed to the packaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundlePlan {
  /// Whether the runtime should load content from built bundles.
  pub runtime_mode: bool,
  /// Bundle name to sorted member paths.
  pub bundles: BTreeMap<String, Vec<String>>,
  /// Content hashes keyed by member path.
  pub digests: BTreeMap<String, FileDigest>,
  /// Every problem found while resolving and hashing.
  pub diagnostics: Vec<Diagnostic>,
}

impl BundlePlan {
  /// Serialise the plan as prettified JSON.
  pub fn to_json(&self) -> BuildResult<String> {
    serde_json::to_string_pretty(self).context("failed to serialise bundle plan")
  }

  /// Write the plan JSON, creating parent directories as needed.
  pub fn write_to(&self, path: &Path) -> BuildResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, self.to_json()?).with_context(|| format!("failed to write {}", path.display()))
  }

  /// Number of member files across all bundles.
  pub fn file_count(&self) -> usize {
    self.bundles.values().map(Vec::len).sum()
  }
}

/// High-level helper resolving rules against a project and hashing every member.
pub struct BundlePlanner<'a, V: ?Sized> {
  view: &'a V,
  config: &'a ProjectConfig,
}

impl<'a, V: FileSystemView + ?Sized> BundlePlanner<'a, V> {
  /// Create a planner for the provided project view and configuration.
  pub fn new(view: &'a V, config: &'a ProjectConfig) -> Self {
    Self { view, config }
  }

  /// Resolve the rule set without hashing.
  pub fn resolve(&self, rule_set: &RuleSet) -> BuildResult<Resolution> {
    let table = self.config.pattern_table()?;
    Ok(RuleResolver::new(self.view, &table, self.config.naming_options()).resolve(rule_set))
  }

  /// Resolve the rule set and digest every assigned file.
  ///
  /// Files that cannot be read are dropped from their bundle and reported; bundles left
  /// empty are omitted.
  pub fn plan(&self, rule_set: &RuleSet) -> BuildResult<BundlePlan> {
    let Resolution {
      assignment,
      mut diagnostics,
    } = self.resolve(rule_set)?;

    let mut bundles = BTreeMap::new();
    let mut digests = BTreeMap::new();
    for (bundle, members) in assignment {
      let mut readable = Vec::with_capacity(members.len());
      for path in members {
        match digest_file(self.view, &path) {
          Ok(digest) => {
            digests.insert(path.clone(), digest);
            readable.push(path);
          }
          Err(err) => {
            log::warn!("{err}");
            diagnostics.push(Diagnostic::IoFailure {
              path: err.path,
              message: err.source.to_string(),
            });
          }
        }
      }
      if !readable.is_empty() {
        bundles.insert(bundle, readable);
      }
    }

    log::debug!(
      "planned {} bundle(s) with {} digest(s)",
      bundles.len(),
      digests.len()
    );

    Ok(BundlePlan {
      runtime_mode: self.config.runtime_mode,
      bundles,
      digests,
      diagnostics,
    })
  }
}
