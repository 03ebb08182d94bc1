//! Expands a rule set into a bundle assignment.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::fs_view::FileSystemView;
use crate::matching::{MatchError, PatternTable, match_files};
use crate::models::{
  BuildRule, BundleAssignment, BundleOwner, Conflict, Diagnostic, NamingStrategy, Resolution,
};
use crate::naming::{NamingOptions, bundle_name, path_bundle_name};
use crate::rules::RuleSet;

/// Resolve `rule_set` with the builtin pattern table and default naming options.
pub fn resolve<V: FileSystemView + ?Sized>(view: &V, rule_set: &RuleSet) -> Resolution {
  RuleResolver::new(view, PatternTable::builtin(), NamingOptions::default()).resolve(rule_set)
}

/// Resolution engine bound to one project view and pattern table.
pub struct RuleResolver<'a, V: ?Sized> {
  view: &'a V,
  table: &'a PatternTable,
  options: NamingOptions,
}

impl<'a, V: FileSystemView + ?Sized> RuleResolver<'a, V> {
  /// Create a resolver for the provided view.
  pub fn new(view: &'a V, table: &'a PatternTable, options: NamingOptions) -> Self {
    Self {
      view,
      table,
      options,
    }
  }

  /// Expand every rule, in order, into bundle membership.
  ///
  /// Resolution never aborts: missing roots, unreadable directories and conflicting claims are
  /// collected as diagnostics. A path claimed under two different names stays in the bundle of
  /// the first claim.
  ///
  /// The reverse index keeps only that first owner. Every later claim under a name other than
  /// the first owner's is reported as its own conflict against the first owner, so a path
  /// claimed under three names yields two conflicts and the middle claimant is never compared
  /// with the last one.
  pub fn resolve(&self, rule_set: &RuleSet) -> Resolution {
    let mut assignment = BundleAssignment::new();
    let mut owners: BTreeMap<String, BundleOwner> = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for (rule_index, rule) in rule_set.rules.iter().enumerate() {
      self.apply_rule(rule_index, rule, &mut assignment, &mut owners, &mut diagnostics);
    }

    diagnostics.extend(self.name_collisions(&rule_set.rules, &assignment, &owners));
    diagnostics.extend(self.mixed_scene_bundles(&assignment));

    for diagnostic in &diagnostics {
      log::warn!("{diagnostic}");
    }
    log::info!(
      "resolved {} bundle(s) covering {} file(s) from {} rule(s), {} diagnostic(s)",
      assignment.len(),
      owners.len(),
      rule_set.len(),
      diagnostics.len()
    );

    Resolution {
      assignment,
      diagnostics,
    }
  }

  fn apply_rule(
    &self,
    rule_index: usize,
    rule: &BuildRule,
    assignment: &mut BundleAssignment,
    owners: &mut BTreeMap<String, BundleOwner>,
    diagnostics: &mut Vec<Diagnostic>,
  ) {
    if rule.naming == NamingStrategy::Explicit
      && rule
        .explicit_name
        .as_deref()
        .is_none_or(|name| name.trim().is_empty())
    {
      diagnostics.push(Diagnostic::MissingExplicitName { rule_index });
      return;
    }

    let matches = match match_files(self.view, &rule.root, rule.pattern, self.table) {
      Ok(matches) => matches,
      Err(MatchError::RootNotFound(_)) => {
        diagnostics.push(Diagnostic::RootNotFound {
          rule_index,
          root: rule.root.clone(),
        });
        return;
      }
    };

    for item in matches {
      let path = match item {
        Ok(path) => path,
        Err(err) => {
          diagnostics.push(Diagnostic::IoFailure {
            path: err.path,
            message: err.source.to_string(),
          });
          continue;
        }
      };
      let Some(bundle) = bundle_name(rule, &path, &self.options) else {
        continue;
      };

      match owners.entry(path) {
        Entry::Vacant(slot) => {
          assignment
            .entry(bundle.clone())
            .or_default()
            .insert(slot.key().clone());
          slot.insert(BundleOwner { rule_index, bundle });
        }
        Entry::Occupied(slot) if slot.get().bundle == bundle => {}
        Entry::Occupied(slot) => {
          diagnostics.push(Diagnostic::Conflict(Conflict {
            path: slot.key().clone(),
            first_owner: slot.get().clone(),
            second_owner: BundleOwner { rule_index, bundle },
          }));
        }
      }
    }
  }

  /// Bundles whose name is also the path-derived name of a member assigned by a rule whose
  /// naming strategy differs from the rule that filled the rest of the bundle.
  fn name_collisions(
    &self,
    rules: &[BuildRule],
    assignment: &BundleAssignment,
    owners: &BTreeMap<String, BundleOwner>,
  ) -> Vec<Diagnostic> {
    let mut collisions = Vec::new();
    for (bundle, members) in assignment {
      for path in members {
        let Some(owner) = owners.get(path) else {
          continue;
        };
        if path_bundle_name(path, &self.options) != *bundle {
          continue;
        }
        let naming = rules[owner.rule_index].naming;
        let other = members
          .iter()
          .filter_map(|member| owners.get(member))
          .find(|other| {
            other.rule_index != owner.rule_index && rules[other.rule_index].naming != naming
          });
        if let Some(other) = other {
          collisions.push(Diagnostic::NameCollision {
            bundle: bundle.clone(),
            path: path.clone(),
            rule_index: owner.rule_index,
            other_rule_index: other.rule_index,
          });
        }
      }
    }
    collisions
  }

  fn mixed_scene_bundles<'b>(
    &'b self,
    assignment: &'b BundleAssignment,
  ) -> impl Iterator<Item = Diagnostic> + 'b {
    assignment.iter().filter_map(|(bundle, members)| {
      let scenes = members.iter().filter(|path| self.table.is_scene(path)).count();
      (scenes > 0 && scenes < members.len()).then(|| Diagnostic::MixedSceneBundle {
        bundle: bundle.clone(),
      })
    })
  }
}
