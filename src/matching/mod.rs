//! Selecting the files a rule applies to.
//!
//! Glob compilation and asset filtering live in `glob`, the ordered lazy walk in `walk`.

mod glob;
mod walk;

pub use glob::PatternTable;
pub use walk::{MatchError, Matches, match_files};

/// Canonical project-relative form of `path`.
///
/// Separators become `/`, empty and `.` segments are dropped and `..` removes the preceding
/// segment. Returns `None` when `..` would climb above the project root.
pub fn canonical_path(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Normalise a project-relative path to its canonical form.
///
/// Paths escaping the project keep their `..` segments (slash-normalised) so callers can
/// still report them; [`match_files`] treats such roots as missing.
pub fn normalise_path(path: &str) -> String {
    canonical_path(path).unwrap_or_else(|| path.replace('\\', "/").trim_matches('/').to_string())
}
