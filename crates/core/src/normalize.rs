//! Canonicalization of logical and physical path strings
//!
//! Every path entering the index goes through [`normalize`] first, so the
//! stored strings are stable under repeated normalization and prefix
//! comparisons are meaningful.

use smallvec::SmallVec;
use thiserror::Error;

/// Error produced when a path cannot be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// `..` segments climb above the start of the path.
    #[error("path escapes above its root: {0}")]
    Escape(String),
}

/// Canonicalize a `/`-separated path.
///
/// Empty segments and `.` are dropped, `..` pops the previously retained
/// segment, and stray `\.` tails left over from segment joining are
/// stripped. The result keeps the input's absolute/relative form and is
/// idempotent: normalizing an already-normalized path returns it unchanged.
pub fn normalize(path: &str) -> Result<String, NormalizeError> {
    let mut kept: SmallVec<[&str; 16]> = SmallVec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if kept.pop().is_none() {
                    return Err(NormalizeError::Escape(path.to_string()));
                }
            }
            _ => {
                let mut segment = segment;
                while let Some(stripped) = segment.strip_suffix("\\.") {
                    segment = stripped;
                }
                if !segment.is_empty() {
                    kept.push(segment);
                }
            }
        }
    }

    let joined = kept.join("/");
    if path.starts_with('/') {
        Ok(format!("/{joined}"))
    } else {
        Ok(joined)
    }
}

/// Remainder of `path` after a literal `root` prefix.
///
/// `None` when `root` is not a prefix of `path`; equal paths yield
/// `Some("")`, which is a valid (empty) remainder and must not be confused
/// with the failure case.
pub fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    path.strip_prefix(root)
}

/// True when `path` is `prefix` itself or nested anywhere below it.
///
/// Matching happens on segment boundaries: `/ab` is not inside `/a`.
pub fn in_subtree(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix.trim_end_matches('/')) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Join a parent path and one trailing segment without doubling separators.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Split a canonical path into its parent and final segment.
///
/// Returns `None` for the separator root and for single-segment relative
/// paths, which have no parent left to resolve.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let pos = path.rfind('/')?;
    if path.len() == 1 {
        return None;
    }
    if pos == 0 {
        Some(("/", &path[1..]))
    } else {
        Some((&path[..pos], &path[pos + 1..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_separators_and_dots() {
        assert_eq!(normalize("/a//b/./c/").unwrap(), "/a/b/c");
        assert_eq!(normalize("a/./b").unwrap(), "a/b");
    }

    #[test]
    fn test_dotdot_pops_segments() {
        assert_eq!(normalize("/a/b/../c").unwrap(), "/a/c");
        assert_eq!(normalize("/a/b/..").unwrap(), "/a");
    }

    #[test]
    fn test_dotdot_escape_is_an_error() {
        assert!(matches!(normalize("/.."), Err(NormalizeError::Escape(_))));
        assert!(matches!(normalize("a/../.."), Err(NormalizeError::Escape(_))));
    }

    #[test]
    fn test_backslash_dot_residue_is_stripped() {
        assert_eq!(normalize("/a\\./b").unwrap(), "/a/b");
        // Stacked residue still collapses in a single pass.
        assert_eq!(normalize("/a\\.\\./b").unwrap(), "/a/b");
        // A segment that was nothing but residue vanishes entirely.
        assert_eq!(normalize("/\\./b").unwrap(), "/b");
    }

    #[test]
    fn test_keeps_absolute_and_relative_form() {
        assert_eq!(normalize("/a/b").unwrap(), "/a/b");
        assert_eq!(normalize("a/b").unwrap(), "a/b");
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("").unwrap(), "");
    }

    #[test]
    fn test_idempotent() {
        for input in ["/a//b/./c", "a/b/../c", "/ü ber/x", "/a\\./b", "/", ""] {
            let once = normalize(input).unwrap();
            assert_eq!(normalize(&once).unwrap(), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_strip_root() {
        assert_eq!(strip_root("/data/files/a", "/data"), Some("/files/a"));
        assert_eq!(strip_root("/data", "/data"), Some(""));
        assert_eq!(strip_root("/other/a", "/data"), None);
    }

    #[test]
    fn test_in_subtree_respects_segment_boundaries() {
        assert!(in_subtree("/a", "/a"));
        assert!(in_subtree("/a/b/c", "/a"));
        assert!(!in_subtree("/ab", "/a"));
        assert!(in_subtree("/anything", "/"));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/data", "x"), "/data/x");
        assert_eq!(join("/", "x"), "/x");
        assert_eq!(join("", "x"), "x");
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/a/b"), Some(("/a", "b")));
        assert_eq!(split_parent("/a"), Some(("/", "a")));
        assert_eq!(split_parent("/"), None);
        assert_eq!(split_parent("a"), None);
        assert_eq!(split_parent("a/b"), Some(("a", "b")));
    }
}
