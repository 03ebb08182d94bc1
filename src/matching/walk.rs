//! Lazy, ordered directory walking for a single rule.

use thiserror::Error;

use crate::error::AssetReadError;
use crate::fs_view::{DirEntry, EntryKind, FileSystemView};
use crate::matching::PatternTable;
use crate::models::PatternKind;

/// Failure that prevents a rule from matching anything.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
  /// The rule root does not exist or is not a directory.
  #[error("root '{0}' not found")]
  RootNotFound(String),
}

/// Start matching `kind` below `root`.
///
/// Files are yielded in lexicographic pre-order. `AllFilesInDirectory` only considers the
/// immediate files of `root`; every other kind recurses. Directories that cannot be listed
/// yield an error item and the walk continues with their siblings. Every yielded path is in
/// canonical form, so the same file reached through `./Art` or `Art` yields one key.
pub fn match_files<'a, V: FileSystemView + ?Sized>(
  view: &'a V,
  root: &str,
  kind: PatternKind,
  table: &'a PatternTable,
) -> Result<Matches<'a, V>, MatchError> {
  let Some(root) = super::canonical_path(root) else {
    return Err(MatchError::RootNotFound(super::normalise_path(root)));
  };
  if !view.is_dir(&root) {
    return Err(MatchError::RootNotFound(root));
  }

  Ok(Matches {
    view,
    table,
    kind,
    recursive: kind != PatternKind::AllFilesInDirectory,
    pending_root: Some(root),
    stack: Vec::new(),
  })
}

/// Iterator over the files matched by one rule.
pub struct Matches<'a, V: ?Sized> {
  view: &'a V,
  table: &'a PatternTable,
  kind: PatternKind,
  recursive: bool,
  pending_root: Option<String>,
  stack: Vec<(String, std::vec::IntoIter<DirEntry>)>,
}

impl<V: FileSystemView + ?Sized> Matches<'_, V> {
  fn descend(&mut self, dir: String) -> Result<(), AssetReadError> {
    let entries = self.view.list_dir(&dir).map_err(|source| AssetReadError {
      path: dir.clone(),
      source,
    })?;
    self.stack.push((dir, entries.into_iter()));
    Ok(())
  }
}

impl<V: FileSystemView + ?Sized> Iterator for Matches<'_, V> {
  type Item = Result<String, AssetReadError>;

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(root) = self.pending_root.take() {
      if let Err(err) = self.descend(root) {
        return Some(Err(err));
      }
    }

    loop {
      let (dir, entries) = self.stack.last_mut()?;
      let Some(entry) = entries.next() else {
        self.stack.pop();
        continue;
      };
      if entry.name.starts_with('.') {
        continue;
      }

      let path = join(dir, &entry.name);
      match entry.kind {
        EntryKind::Directory if self.recursive => {
          if let Err(err) = self.descend(path) {
            return Some(Err(err));
          }
        }
        EntryKind::Directory => {}
        EntryKind::File => {
          if self.table.matches(self.kind, &entry.name) && !self.table.is_excluded_path(&path) {
            return Some(Ok(path));
          }
        }
      }
    }
  }
}

fn join(dir: &str, name: &str) -> String {
  if dir.is_empty() {
    name.to_string()
  } else {
    format!("{dir}/{name}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fs_view::MemoryView;
  use std::io::{ErrorKind, Read};

  fn tree() -> MemoryView {
    MemoryView::new()
      .with_file("Art/Icons/b.png", b"b")
      .with_file("Art/Icons/a.png", b"a")
      .with_file("Art/Icons/a.png.meta", b"meta")
      .with_file("Art/Icons/sub/c.png", b"c")
      .with_file("Art/Icons/sub/notes.txt", b"n")
      .with_file("Art/Icons/.hidden/d.png", b"d")
      .with_file("Art/Other/e.png", b"e")
  }

  fn collect(view: &MemoryView, root: &str, kind: PatternKind) -> Vec<String> {
    match_files(view, root, kind, PatternTable::builtin())
      .unwrap()
      .map(Result::unwrap)
      .collect()
  }

  #[test]
  fn walks_recursively_in_lexicographic_order() {
    let view = tree();
    assert_eq!(collect(&view, "Art/Icons", PatternKind::ByExtensionPng), vec![
      "Art/Icons/a.png".to_string(),
      "Art/Icons/b.png".to_string(),
      "Art/Icons/sub/c.png".to_string(),
    ]);
  }

  #[test]
  fn directory_pattern_is_not_recursive() {
    let view = tree();
    assert_eq!(
      collect(&view, "Art/Icons/", PatternKind::AllFilesInDirectory),
      vec!["Art/Icons/a.png".to_string(), "Art/Icons/b.png".to_string()]
    );
  }

  #[test]
  fn empty_match_is_not_an_error() {
    let view = tree();
    assert!(collect(&view, "Art/Other", PatternKind::ByExtensionScene).is_empty());
  }

  #[test]
  fn missing_root_is_reported() {
    let view = tree();
    let err = match_files(&view, "Art\\Missing", PatternKind::ByExtensionPng, PatternTable::builtin())
      .err()
      .unwrap();
    assert_eq!(err, MatchError::RootNotFound("Art/Missing".into()));
  }

  #[test]
  fn dotted_roots_yield_canonical_paths() {
    let view = tree();
    assert_eq!(
      collect(&view, "./Art/Other/../Icons/sub", PatternKind::ByExtensionPng),
      vec!["Art/Icons/sub/c.png".to_string()]
    );

    let err = match_files(&view, "../Art", PatternKind::ByExtensionPng, PatternTable::builtin())
      .err()
      .unwrap();
    assert_eq!(err, MatchError::RootNotFound("../Art".into()));
  }

  #[test]
  fn restarting_yields_identical_results() {
    let view = tree();
    let first = collect(&view, "Art", PatternKind::ByExtensionPng);
    let second = collect(&view, "Art", PatternKind::ByExtensionPng);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
  }

  struct BrokenSubdir(MemoryView);

  impl FileSystemView for BrokenSubdir {
    fn is_dir(&self, path: &str) -> bool {
      self.0.is_dir(path)
    }

    fn list_dir(&self, path: &str) -> std::io::Result<Vec<DirEntry>> {
      if path.ends_with("/sub") {
        return Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied"));
      }
      self.0.list_dir(path)
    }

    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + '_>> {
      self.0.open(path)
    }
  }

  #[test]
  fn unreadable_directory_is_skipped_with_error_item() {
    let view = BrokenSubdir(tree());
    let items: Vec<_> = match_files(&view, "Art/Icons", PatternKind::ByExtensionPng, PatternTable::builtin())
      .unwrap()
      .collect();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap(), "Art/Icons/a.png");
    assert_eq!(items[1].as_ref().unwrap(), "Art/Icons/b.png");
    assert_eq!(items[2].as_ref().unwrap_err().path, "Art/Icons/sub");
  }
}
