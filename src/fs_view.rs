//! Read-only views over a project tree.
//!
//! All paths handed to a view are project-relative and use `/` separators. The empty string
//! names the project root itself.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Kind of a directory entry returned by [`FileSystemView::list_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  /// Regular file.
  File,
  /// Directory.
  Directory,
}

/// Entry within a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  /// File name of the entry (no separators).
  pub name: String,
  /// Whether the entry is a file or a directory.
  pub kind: EntryKind,
}

/// Trait describing the file-system operations the resolver and hasher depend on.
pub trait FileSystemView {
  /// Returns `true` when `path` names an existing directory.
  fn is_dir(&self, path: &str) -> bool;

  /// List the entries directly inside `path`, sorted by name.
  fn list_dir(&self, path: &str) -> std::io::Result<Vec<DirEntry>>;

  /// Open a file for streaming reads.
  fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + '_>>;
}

/// View backed by a directory on disk.
///
/// Symbolic links to files are followed and listed as files. Links to directories are not
/// descended, since they can form cycles, and dangling links are dropped; both are logged at
/// `warn`.
#[derive(Debug, Clone)]
pub struct DiskView {
  root: PathBuf,
}

impl DiskView {
  /// Create a view rooted at the project directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Project directory this view reads from.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn resolve(&self, path: &str) -> PathBuf {
    let mut resolved = self.root.clone();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
      resolved.push(segment);
    }
    resolved
  }
}

impl FileSystemView for DiskView {
  fn is_dir(&self, path: &str) -> bool {
    self.resolve(path).is_dir()
  }

  fn list_dir(&self, path: &str) -> std::io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(self.resolve(path))? {
      let entry = entry?;
      let file_type = entry.file_type()?;
      let kind = if file_type.is_dir() {
        EntryKind::Directory
      } else if file_type.is_file() {
        EntryKind::File
      } else if file_type.is_symlink() {
        match fs::metadata(entry.path()) {
          Ok(target) if target.is_file() => EntryKind::File,
          Ok(target) if target.is_dir() => {
            log::warn!("not descending into linked directory {}", entry.path().display());
            continue;
          }
          Ok(_) => continue,
          Err(err) => {
            log::warn!("skipping dangling link {}: {err}", entry.path().display());
            continue;
          }
        }
      } else {
        continue;
      };
      entries.push(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        kind,
      });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }

  fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + '_>> {
    Ok(Box::new(fs::File::open(self.resolve(path))?))
  }
}

/// In-memory project tree, handy for embedding and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
  files: BTreeMap<String, Vec<u8>>,
}

impl MemoryView {
  /// Create an empty tree.
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a file, creating its parent directories implicitly.
  pub fn with_file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
    self.insert(path, content);
    self
  }

  /// Add or replace a file.
  pub fn insert(&mut self, path: &str, content: impl AsRef<[u8]>) {
    let key = path.replace('\\', "/").trim_matches('/').to_string();
    self.files.insert(key, content.as_ref().to_vec());
  }

  fn prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
      String::new()
    } else {
      format!("{trimmed}/")
    }
  }
}

impl FileSystemView for MemoryView {
  fn is_dir(&self, path: &str) -> bool {
    let prefix = Self::prefix(path);
    self.files.keys().any(|key| key.starts_with(&prefix))
  }

  fn list_dir(&self, path: &str) -> std::io::Result<Vec<DirEntry>> {
    if !self.is_dir(path) {
      return Err(std::io::Error::new(
        ErrorKind::NotFound,
        format!("no directory at '{path}'"),
      ));
    }

    let prefix = Self::prefix(path);
    let mut entries: BTreeMap<String, EntryKind> = BTreeMap::new();
    for key in self.files.keys() {
      let Some(rest) = key.strip_prefix(&prefix) else {
        continue;
      };
      match rest.split_once('/') {
        Some((dir, _)) => entries.insert(dir.to_string(), EntryKind::Directory),
        None => entries.insert(rest.to_string(), EntryKind::File),
      };
    }

    Ok(entries
      .into_iter()
      .map(|(name, kind)| DirEntry { name, kind })
      .collect())
  }

  fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + '_>> {
    let content = self.files.get(path.trim_matches('/')).ok_or_else(|| {
      std::io::Error::new(ErrorKind::NotFound, format!("no file at '{path}'"))
    })?;
    Ok(Box::new(Cursor::new(content.as_slice())))
  }
}
