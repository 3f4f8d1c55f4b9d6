//! Logical <-> physical path translation
//!
//! The mapper owns resolution policy: normalize, probe the index, and on a
//! miss synthesize a new physical name from the parent's physical path
//! plus a slugified, deduplicated final segment. Ancestor chains resolve
//! iteratively with an explicit stack, and creation races are settled by
//! the index's transactional uniqueness check rather than by locks.

use crate::error::{IndexError, Result};
use crate::index::{PathIndex, Scope};
use filemap_core::{dedup_name, in_subtree, join, normalize, slugify, split_parent, strip_root};
use smallvec::SmallVec;
use std::path::Path;

/// What a non-recursive remove does when the exact path was never mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPath {
    /// Silently succeed, removing nothing.
    #[default]
    Ignore,
    /// Fail with [`IndexError::NotMapped`].
    Error,
}

/// Tunable mapper behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperConfig {
    /// Policy for exact-match removals that match nothing.
    pub missing_path: MissingPath,
}

/// Translates logical paths to physical paths and back.
///
/// Reads are lock-free and safe to run from any number of threads; the
/// mapper is shared behind an `Arc` by concurrent callers.
pub struct Mapper {
    index: PathIndex,
    /// Canonical physical root, the base case when walking ancestor chains.
    root: String,
    config: MapperConfig,
}

impl Mapper {
    /// Open the index inside `store_dir` and bind it to a physical root.
    pub fn open(store_dir: &Path, root: &str) -> Result<Self> {
        Self::with_config(store_dir, root, MapperConfig::default())
    }

    /// Like [`Mapper::open`] with explicit configuration.
    pub fn with_config(store_dir: &Path, root: &str, config: MapperConfig) -> Result<Self> {
        Self::new(PathIndex::open(store_dir)?, root, config)
    }

    /// Wrap an already-open index.
    pub fn new(index: PathIndex, root: &str, config: MapperConfig) -> Result<Self> {
        Ok(Self {
            index,
            root: normalize(root)?,
            config,
        })
    }

    /// The configured physical root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Index access for inspection tooling.
    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Resolve a logical path to its physical path.
    ///
    /// With `create`, newly synthesized names (including any unmapped
    /// ancestors) are persisted; without it the resolution is a dry run
    /// and nothing is stored, but a physical path is still returned.
    /// Repeated calls for the same path converge on the same answer.
    pub fn logic_to_physical(&self, path: &str, create: bool) -> Result<String> {
        let logical = normalize(path)?;
        if let Some(physical) = self.index.lookup_by_logical(&logical)? {
            return Ok(physical);
        }

        // Climb to the nearest mapped ancestor (or the root) with an
        // explicit stack, then walk back down assigning names.
        let mut pending: SmallVec<[String; 16]> = SmallVec::new();
        let mut cursor = logical;
        let mut physical_cursor = loop {
            if cursor == self.root {
                break cursor.clone();
            }
            if let Some(physical) = self.index.lookup_by_logical(&cursor)? {
                break physical;
            }
            match split_parent(&cursor) {
                Some((parent, name)) => {
                    pending.push(name.to_string());
                    cursor = parent.to_string();
                }
                // No parent left; the remaining head anchors the chain
                // unchanged, like an implicit root.
                None => break cursor.clone(),
            }
        };

        while let Some(name) = pending.pop() {
            cursor = join(&cursor, &name);
            physical_cursor = self.assign_name(&cursor, &physical_cursor, &name, create)?;
        }
        Ok(physical_cursor)
    }

    /// Pick (and with `create`, persist) a free physical name for one
    /// segment under an already-resolved parent.
    fn assign_name(
        &self,
        logical: &str,
        parent_physical: &str,
        name: &str,
        create: bool,
    ) -> Result<String> {
        let slug = slugify(name);
        loop {
            let mut attempt = 0u32;
            let mut candidate = join(parent_physical, &slug);
            while self.index.lookup_by_physical(&candidate)?.is_some() {
                attempt += 1;
                candidate = join(parent_physical, &dedup_name(&slug, attempt));
            }
            if !create {
                return Ok(candidate);
            }
            match self.index.insert(logical, &candidate) {
                Ok(()) => {
                    tracing::debug!(logical, physical = %candidate, "assigned physical name");
                    return Ok(candidate);
                }
                Err(IndexError::Conflict { .. }) => {
                    // Lost a creation race. If the logical side won, adopt
                    // the winner; a stolen physical name just re-probes.
                    if let Some(winner) = self.index.lookup_by_logical(logical)? {
                        tracing::debug!(logical, physical = %winner, "adopted concurrent mapping");
                        return Ok(winner);
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Resolve a physical path back to its logical path.
    ///
    /// A path never seen before is treated as externally dropped content
    /// and registered as its own logical path; the call is idempotent.
    pub fn physical_to_logic(&self, path: &str) -> Result<String> {
        let physical = normalize(path)?;
        if let Some(logical) = self.index.lookup_by_physical(&physical)? {
            return Ok(logical);
        }
        match self.index.insert(&physical, &physical) {
            Ok(()) => Ok(physical),
            Err(IndexError::Conflict { .. }) => match self.index.lookup_by_physical(&physical)? {
                Some(logical) => Ok(logical),
                // The string is already in use as somebody's logical path;
                // identity registration cannot hold both columns.
                None => Err(IndexError::Conflict {
                    logical: physical.clone(),
                    physical,
                }),
            },
            Err(other) => Err(other),
        }
    }

    /// Remove mappings by exact path or whole subtree.
    ///
    /// `is_logical` selects the column the path is matched against.
    /// Returns the number of removed rows.
    pub fn remove_path(&self, path: &str, is_logical: bool, recursive: bool) -> Result<usize> {
        let path = normalize(path)?;
        let scope = if recursive { Scope::Subtree } else { Scope::Exact };
        let removed = if is_logical {
            self.index.delete_by_logical_prefix(&path, scope)?
        } else {
            self.index.delete_by_physical_prefix(&path, scope)?
        };
        if removed == 0 && scope == Scope::Exact && self.config.missing_path == MissingPath::Error
        {
            return Err(IndexError::NotMapped(path));
        }
        Ok(removed)
    }

    /// Duplicate a subtree's mappings under a new logical location.
    ///
    /// Both endpoints are force-registered, then every row nested under
    /// `src` is copied with its prefixes substituted, in one transaction.
    /// Source rows are retained. Returns the number of duplicated rows.
    pub fn copy_subtree(&self, src: &str, dst: &str) -> Result<usize> {
        let (src, dst, src_physical, dst_physical) = self.prepare_subtree_op(src, dst)?;
        self.index
            .copy_prefix(&src, &dst, &src_physical, &dst_physical)
    }

    /// Rename a subtree: rows nested under `src` are rewritten in one
    /// transaction, then the source's own row is dropped. Returns the
    /// number of rewritten rows.
    pub fn move_subtree(&self, src: &str, dst: &str) -> Result<usize> {
        let (src, dst, src_physical, dst_physical) = self.prepare_subtree_op(src, dst)?;
        let moved = self
            .index
            .rewrite_prefix(&src, &dst, &src_physical, &dst_physical)?;
        self.index.delete_by_logical_prefix(&src, Scope::Exact)?;
        Ok(moved)
    }

    fn prepare_subtree_op(&self, src: &str, dst: &str) -> Result<(String, String, String, String)> {
        let src = normalize(src)?;
        let dst = normalize(dst)?;
        if in_subtree(&dst, &src) {
            return Err(IndexError::NestedTarget { src, dst });
        }
        let src_physical = self.logic_to_physical(&src, true)?;
        let dst_physical = self.logic_to_physical(&dst, true)?;
        Ok((src, dst, src_physical, dst_physical))
    }

    /// Remainder of `path` after the literal `root` prefix; `None` when
    /// `root` is not a prefix. Equal paths yield `Some("")`.
    pub fn strip_root_folder<'a>(&self, path: &'a str, root: &str) -> Option<&'a str> {
        strip_root(path, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_mapper(root: &str) -> (tempfile::TempDir, Mapper) {
        let dir = tempfile::tempdir().unwrap();
        let mapper = Mapper::open(dir.path(), root).unwrap();
        (dir, mapper)
    }

    #[test]
    fn test_root_resolves_to_itself() {
        let (_dir, mapper) = open_mapper("/data");
        assert_eq!(mapper.logic_to_physical("/data", true).unwrap(), "/data");
        assert_eq!(mapper.index().len(), 0);
    }

    #[test]
    fn test_resolution_registers_ancestors() {
        let (_dir, mapper) = open_mapper("/data");
        let physical = mapper
            .logic_to_physical("/data/Projekt Plan/Übersicht.pdf", true)
            .unwrap();
        assert_eq!(physical, "/data/projekt-plan/ubersicht.pdf");

        // The intermediate directory got its own row.
        assert_eq!(
            mapper.index().lookup_by_logical("/data/Projekt Plan").unwrap(),
            Some("/data/projekt-plan".to_string())
        );
    }

    #[test]
    fn test_dry_run_persists_nothing() {
        let (_dir, mapper) = open_mapper("/data");
        let physical = mapper
            .logic_to_physical("/data/A Dir/File.txt", false)
            .unwrap();
        assert_eq!(physical, "/data/a-dir/file.txt");
        assert_eq!(mapper.index().len(), 0);

        // The dry-run answer matches what creation later assigns.
        let created = mapper.logic_to_physical("/data/A Dir/File.txt", true).unwrap();
        assert_eq!(created, physical);
    }

    #[test]
    fn test_strip_root_folder() {
        let (_dir, mapper) = open_mapper("/data");
        assert_eq!(mapper.strip_root_folder("/data/x", "/data"), Some("/x"));
        assert_eq!(mapper.strip_root_folder("/data", "/data"), Some(""));
        assert_eq!(mapper.strip_root_folder("/else/x", "/data"), None);
    }

    #[test]
    fn test_missing_path_policy_error() {
        let dir = tempfile::tempdir().unwrap();
        let mapper = Mapper::with_config(
            dir.path(),
            "/data",
            MapperConfig {
                missing_path: MissingPath::Error,
            },
        )
        .unwrap();

        assert!(matches!(
            mapper.remove_path("/data/never", true, false),
            Err(IndexError::NotMapped(_))
        ));
        // Recursive removal of nothing stays silent regardless of policy.
        assert_eq!(mapper.remove_path("/data/never", true, true).unwrap(), 0);
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let (_dir, mapper) = open_mapper("/data");
        assert!(matches!(
            mapper.move_subtree("/data/a", "/data/a/b"),
            Err(IndexError::NestedTarget { .. })
        ));
    }
}
