//! Bundle naming strategies.
//!
//! Names are a pure function of the rule, the matched path and the options, so repeated
//! resolutions over an unchanged tree reproduce the same bundle names.

use crate::hasher::md5_hex_of;
use crate::matching::normalise_path;
use crate::models::{BuildRule, NamingStrategy};

/// Options applied to every raw bundle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
  /// Token that replaces `/` inside names.
  pub separator: String,
  /// Suffix appended to every name.
  pub bundle_extension: String,
  /// Replace names by the MD5 hex of their normalised form.
  pub hash_names: bool,
}

impl Default for NamingOptions {
  fn default() -> Self {
    Self {
      separator: "/".into(),
      bundle_extension: String::new(),
      hash_names: false,
    }
  }
}

/// Bundle name for `path` matched by `rule`.
///
/// Returns `None` only for explicit rules that carry no usable name.
pub fn bundle_name(rule: &BuildRule, path: &str, options: &NamingOptions) -> Option<String> {
  let path = normalise_path(path);
  let raw = match rule.naming {
    NamingStrategy::ByDirectory => normalise_path(&rule.root),
    NamingStrategy::ByPath => strip_extension(&path).to_string(),
    NamingStrategy::ByFilename => {
      let file_name = path.rsplit('/').next().unwrap_or(&path);
      strip_extension(file_name).to_string()
    }
    NamingStrategy::ByTopDirectory => top_directory(&normalise_path(&rule.root), &path),
    NamingStrategy::Explicit => {
      let name = rule.explicit_name.as_deref()?.trim();
      if name.is_empty() {
        return None;
      }
      name.to_string()
    }
  };
  Some(normalise_bundle_name(&raw, options))
}

/// Canonical form used for bundle identity: lower-cased, `/`-separated, then decorated.
pub fn normalise_bundle_name(raw: &str, options: &NamingOptions) -> String {
  let folded = normalise_path(raw).to_lowercase();
  let name = if options.hash_names {
    md5_hex_of(&folded)
  } else if options.separator == "/" {
    folded
  } else {
    folded.replace('/', &options.separator)
  };
  format!("{name}{}", options.bundle_extension)
}

/// Name an asset would get from its own path, extension stripped.
pub(crate) fn path_bundle_name(path: &str, options: &NamingOptions) -> String {
  normalise_bundle_name(strip_extension(&normalise_path(path)), options)
}

fn strip_extension(path: &str) -> &str {
  let file_start = path.rfind('/').map_or(0, |index| index + 1);
  match path[file_start..].rfind('.') {
    Some(dot) if dot > 0 => &path[..file_start + dot],
    _ => path,
  }
}

fn top_directory(root: &str, path: &str) -> String {
  let relative = if root.is_empty() {
    Some(path)
  } else {
    path
      .strip_prefix(root)
      .and_then(|rest| rest.strip_prefix('/'))
  };

  match relative.and_then(|rest| rest.split_once('/')) {
    Some((first, _)) if root.is_empty() => first.to_string(),
    Some((first, _)) => format!("{root}/{first}"),
    None => root.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::PatternKind;

  fn rule(naming: NamingStrategy) -> BuildRule {
    BuildRule::new("Art/Icons", PatternKind::ByExtensionPng, naming)
  }

  fn name(naming: NamingStrategy, path: &str) -> Option<String> {
    bundle_name(&rule(naming), path, &NamingOptions::default())
  }

  #[test]
  fn names_by_rule_root_directory() {
    assert_eq!(name(NamingStrategy::ByDirectory, "Art/Icons/sub/c.png"), Some("art/icons".into()));
    assert_eq!(name(NamingStrategy::ByDirectory, "Art/Icons/a.png"), Some("art/icons".into()));
  }

  #[test]
  fn names_by_path_without_extension() {
    assert_eq!(name(NamingStrategy::ByPath, "Art/Icons/Sub/C.png"), Some("art/icons/sub/c".into()));
    assert_eq!(name(NamingStrategy::ByPath, "Art/Icons/v1.2/README"), Some("art/icons/v1.2/readme".into()));
  }

  #[test]
  fn names_by_filename() {
    assert_eq!(name(NamingStrategy::ByFilename, "Art/Icons/sub/Hero.Icon.png"), Some("hero.icon".into()));
  }

  #[test]
  fn names_by_top_directory() {
    assert_eq!(name(NamingStrategy::ByTopDirectory, "Art/Icons/sub/deeper/c.png"), Some("art/icons/sub".into()));
    assert_eq!(name(NamingStrategy::ByTopDirectory, "Art/Icons/a.png"), Some("art/icons".into()));

    let at_project_root = BuildRule::new("", PatternKind::ByExtensionPng, NamingStrategy::ByTopDirectory);
    let options = NamingOptions::default();
    assert_eq!(bundle_name(&at_project_root, "Art/x.png", &options), Some("art".into()));
  }

  #[test]
  fn explicit_names_require_a_value() {
    let explicit = BuildRule::explicit("Art/Icons", PatternKind::ByExtensionPng, "UI/Icons");
    let options = NamingOptions::default();
    assert_eq!(bundle_name(&explicit, "Art/Icons/a.png", &options), Some("ui/icons".into()));
    assert_eq!(bundle_name(&explicit, "Art/Icons/sub/c.png", &options), Some("ui/icons".into()));

    assert_eq!(name(NamingStrategy::Explicit, "Art/Icons/a.png"), None);
    let blank = BuildRule::explicit("Art/Icons", PatternKind::ByExtensionPng, "  ");
    assert_eq!(bundle_name(&blank, "Art/Icons/a.png", &options), None);
  }

  #[test]
  fn applies_separator_extension_and_hashing() {
    let options = NamingOptions {
      separator: "_".into(),
      bundle_extension: ".bundle".into(),
      hash_names: false,
    };
    assert_eq!(normalise_bundle_name("Art\\Icons", &options), "art_icons.bundle");

    let hashed = NamingOptions {
      hash_names: true,
      ..NamingOptions::default()
    };
    assert_eq!(
      normalise_bundle_name("Art/Icons", &hashed),
      normalise_bundle_name("art/icons", &hashed)
    );
    assert_eq!(normalise_bundle_name("art/icons", &hashed), md5_hex_of("art/icons"));
  }
}
