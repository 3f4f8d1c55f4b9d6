//! Bidirectional hash-indexed path store on sled
//!
//! Two trees hold the same bincode-encoded rows, keyed by the BLAKE3
//! digest of the logical and the physical path. The digest narrows a
//! lookup to one candidate; the candidate is only trusted after the full
//! string matches. Multi-row mutations run as one sled transaction over
//! both trees, which is also what enforces uniqueness under concurrency.

use crate::entry::MappingEntry;
use crate::error::{IndexError, Result};
use filemap_core::{hash_path, in_subtree, strip_root};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use std::path::Path;

/// How much of a subtree a prefix operation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the literal path itself.
    Exact,
    /// The path and everything nested under it.
    Subtree,
}

/// Which column of a row an operation matches against.
#[derive(Clone, Copy)]
enum Column {
    Logical,
    Physical,
}

impl Column {
    fn of(self, entry: &MappingEntry) -> &str {
        match self {
            Column::Logical => &entry.logical,
            Column::Physical => &entry.physical,
        }
    }
}

/// A planned re-keying of one row during a prefix rewrite or copy.
struct PlannedMove {
    row: MappingEntry,
    old_lkey: [u8; 32],
    old_pkey: [u8; 32],
    new_lkey: [u8; 32],
    new_pkey: [u8; 32],
    value: Vec<u8>,
}

/// Durable bidirectional store of logical <-> physical path pairs.
pub struct PathIndex {
    /// Sled database
    db: Db,
    /// Rows keyed by digest of the logical path
    by_logical: Tree,
    /// The same rows keyed by digest of the physical path
    by_physical: Tree,
}

impl PathIndex {
    /// Open or create the index inside the given store directory.
    pub fn open(dir: &Path) -> Result<Self> {
        let db = sled::open(dir.join("filemap.db"))?;
        let by_logical = db.open_tree("by-logical")?;
        let by_physical = db.open_tree("by-physical")?;

        Ok(Self {
            db,
            by_logical,
            by_physical,
        })
    }

    /// Physical path mapped to `logical`, if any.
    pub fn lookup_by_logical(&self, logical: &str) -> Result<Option<String>> {
        Ok(self
            .fetch(&self.by_logical, logical, Column::Logical)?
            .map(|entry| entry.physical))
    }

    /// Logical path mapped to `physical`, if any.
    pub fn lookup_by_physical(&self, physical: &str) -> Result<Option<String>> {
        Ok(self
            .fetch(&self.by_physical, physical, Column::Physical)?
            .map(|entry| entry.logical))
    }

    /// Hash-narrowed fetch, verified by exact string comparison.
    fn fetch(&self, tree: &Tree, path: &str, column: Column) -> Result<Option<MappingEntry>> {
        let key = hash_path(path);
        match tree.get(&key.as_bytes()[..])? {
            Some(raw) => {
                let entry = MappingEntry::decode(&raw)?;
                if column.of(&entry) == path {
                    Ok(Some(entry))
                } else {
                    tracing::warn!(
                        path,
                        candidate = column.of(&entry),
                        "digest candidate rejected by exact match"
                    );
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Insert a new pair.
    ///
    /// Uniqueness of both columns is checked and enforced inside one
    /// transaction, so a concurrent creator loses with
    /// [`IndexError::Conflict`] instead of overwriting either side.
    pub fn insert(&self, logical: &str, physical: &str) -> Result<()> {
        let row = MappingEntry::new(logical, physical);
        let value = row.encode()?;
        let lhash = hash_path(logical);
        let phash = hash_path(physical);
        let (lkey, pkey) = (&lhash.as_bytes()[..], &phash.as_bytes()[..]);

        let outcome: TransactionResult<(), IndexError> = (&self.by_logical, &self.by_physical)
            .transaction(|(by_logical, by_physical)| {
                if by_logical.get(lkey)?.is_some() || by_physical.get(pkey)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(IndexError::Conflict {
                        logical: row.logical.clone(),
                        physical: row.physical.clone(),
                    }));
                }
                by_logical.insert(lkey, value.as_slice())?;
                by_physical.insert(pkey, value.as_slice())?;
                Ok(())
            });
        unwrap_tx(outcome)?;
        self.db.flush()?;
        Ok(())
    }

    /// Delete rows whose logical path matches `prefix` under `scope`.
    ///
    /// Returns the number of removed rows.
    pub fn delete_by_logical_prefix(&self, prefix: &str, scope: Scope) -> Result<usize> {
        self.delete_where(prefix, scope, Column::Logical)
    }

    /// Delete rows whose physical path matches `prefix` under `scope`.
    pub fn delete_by_physical_prefix(&self, prefix: &str, scope: Scope) -> Result<usize> {
        self.delete_where(prefix, scope, Column::Physical)
    }

    fn delete_where(&self, prefix: &str, scope: Scope, column: Column) -> Result<usize> {
        let mut doomed = Vec::new();
        for row in self.by_logical.iter() {
            let (_, raw) = row?;
            let entry = MappingEntry::decode(&raw)?;
            let value = column.of(&entry);
            let hit = match scope {
                Scope::Exact => value == prefix,
                Scope::Subtree => in_subtree(value, prefix),
            };
            if hit {
                doomed.push(entry);
            }
        }
        if doomed.is_empty() {
            return Ok(0);
        }

        let keys: Vec<([u8; 32], [u8; 32])> = doomed
            .iter()
            .map(|entry| {
                (
                    *hash_path(&entry.logical).as_bytes(),
                    *hash_path(&entry.physical).as_bytes(),
                )
            })
            .collect();
        let outcome: TransactionResult<(), IndexError> = (&self.by_logical, &self.by_physical)
            .transaction(|(by_logical, by_physical)| {
                for (lkey, pkey) in &keys {
                    by_logical.remove(&lkey[..])?;
                    by_physical.remove(&pkey[..])?;
                }
                Ok(())
            });
        unwrap_tx(outcome)?;
        self.db.flush()?;

        tracing::debug!(prefix, removed = doomed.len(), "deleted mapping rows");
        Ok(doomed.len())
    }

    /// Rewrite every row strictly nested under `old_logical`, substituting
    /// the logical and physical prefixes, as one atomic transaction.
    ///
    /// Aborts with [`IndexError::Conflict`] and leaves the store untouched
    /// when any target key is already occupied.
    pub fn rewrite_prefix(
        &self,
        old_logical: &str,
        new_logical: &str,
        old_physical: &str,
        new_physical: &str,
    ) -> Result<usize> {
        let moves = self.plan_moves(old_logical, new_logical, old_physical, new_physical)?;
        if moves.is_empty() {
            return Ok(0);
        }

        let outcome: TransactionResult<(), IndexError> = (&self.by_logical, &self.by_physical)
            .transaction(|(by_logical, by_physical)| {
                for planned in &moves {
                    by_logical.remove(&planned.old_lkey[..])?;
                    by_physical.remove(&planned.old_pkey[..])?;
                    if by_logical.get(&planned.new_lkey[..])?.is_some()
                        || by_physical.get(&planned.new_pkey[..])?.is_some()
                    {
                        return Err(ConflictableTransactionError::Abort(IndexError::Conflict {
                            logical: planned.row.logical.clone(),
                            physical: planned.row.physical.clone(),
                        }));
                    }
                    by_logical.insert(&planned.new_lkey[..], planned.value.as_slice())?;
                    by_physical.insert(&planned.new_pkey[..], planned.value.as_slice())?;
                }
                Ok(())
            });
        unwrap_tx(outcome)?;
        self.db.flush()?;

        tracing::debug!(
            old = old_logical,
            new = new_logical,
            rows = moves.len(),
            "rewrote subtree prefix"
        );
        Ok(moves.len())
    }

    /// Duplicate every row strictly nested under `old_logical` with both
    /// prefixes substituted, as one atomic transaction. The originals stay.
    pub fn copy_prefix(
        &self,
        old_logical: &str,
        new_logical: &str,
        old_physical: &str,
        new_physical: &str,
    ) -> Result<usize> {
        let moves = self.plan_moves(old_logical, new_logical, old_physical, new_physical)?;
        if moves.is_empty() {
            return Ok(0);
        }

        let outcome: TransactionResult<(), IndexError> = (&self.by_logical, &self.by_physical)
            .transaction(|(by_logical, by_physical)| {
                for planned in &moves {
                    if by_logical.get(&planned.new_lkey[..])?.is_some()
                        || by_physical.get(&planned.new_pkey[..])?.is_some()
                    {
                        return Err(ConflictableTransactionError::Abort(IndexError::Conflict {
                            logical: planned.row.logical.clone(),
                            physical: planned.row.physical.clone(),
                        }));
                    }
                    by_logical.insert(&planned.new_lkey[..], planned.value.as_slice())?;
                    by_physical.insert(&planned.new_pkey[..], planned.value.as_slice())?;
                }
                Ok(())
            });
        unwrap_tx(outcome)?;
        self.db.flush()?;

        tracing::debug!(
            old = old_logical,
            new = new_logical,
            rows = moves.len(),
            "copied subtree prefix"
        );
        Ok(moves.len())
    }

    /// Collect the rows strictly under `old_logical` together with their
    /// current and substituted keys.
    fn plan_moves(
        &self,
        old_logical: &str,
        new_logical: &str,
        old_physical: &str,
        new_physical: &str,
    ) -> Result<Vec<PlannedMove>> {
        let mut moves = Vec::new();
        for row in self.by_logical.iter() {
            let (_, raw) = row?;
            let entry = MappingEntry::decode(&raw)?;
            if entry.logical == old_logical || !in_subtree(&entry.logical, old_logical) {
                continue;
            }
            let Some(logical_rest) = strip_root(&entry.logical, old_logical) else {
                continue;
            };
            let Some(physical_rest) = strip_root(&entry.physical, old_physical) else {
                // Logically under the subtree but physically elsewhere; the
                // row violates the tree invariant, leave it alone.
                tracing::warn!(
                    logical = %entry.logical,
                    physical = %entry.physical,
                    "row outside physical subtree, skipped"
                );
                continue;
            };

            let renamed = MappingEntry::new(
                format!("{new_logical}{logical_rest}"),
                format!("{new_physical}{physical_rest}"),
            );
            let value = renamed.encode()?;
            moves.push(PlannedMove {
                old_lkey: *hash_path(&entry.logical).as_bytes(),
                old_pkey: *hash_path(&entry.physical).as_bytes(),
                new_lkey: *hash_path(&renamed.logical).as_bytes(),
                new_pkey: *hash_path(&renamed.physical).as_bytes(),
                value,
                row: renamed,
            });
        }
        Ok(moves)
    }

    /// Every row, in unspecified order.
    pub fn entries(&self) -> Result<Vec<MappingEntry>> {
        let mut rows = Vec::new();
        for row in self.by_logical.iter() {
            let (_, raw) = row?;
            rows.push(MappingEntry::decode(&raw)?);
        }
        Ok(rows)
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.by_logical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn unwrap_tx<T>(outcome: TransactionResult<T, IndexError>) -> Result<T> {
    match outcome {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_index() -> (tempfile::TempDir, PathIndex) {
        let dir = tempfile::tempdir().unwrap();
        let index = PathIndex::open(dir.path()).unwrap();
        (dir, index)
    }

    #[test]
    fn test_insert_and_lookup_both_directions() {
        let (_dir, index) = open_index();
        index.insert("/files/Ü.txt", "/files/u.txt").unwrap();

        assert_eq!(
            index.lookup_by_logical("/files/Ü.txt").unwrap(),
            Some("/files/u.txt".to_string())
        );
        assert_eq!(
            index.lookup_by_physical("/files/u.txt").unwrap(),
            Some("/files/Ü.txt".to_string())
        );
        assert_eq!(index.lookup_by_logical("/files/other").unwrap(), None);
    }

    #[test]
    fn test_insert_conflicts_on_either_column() {
        let (_dir, index) = open_index();
        index.insert("/a", "/phys-a").unwrap();

        assert!(matches!(
            index.insert("/a", "/phys-b"),
            Err(IndexError::Conflict { .. })
        ));
        assert!(matches!(
            index.insert("/b", "/phys-a"),
            Err(IndexError::Conflict { .. })
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_exact_delete_leaves_children() {
        let (_dir, index) = open_index();
        index.insert("/a", "/a").unwrap();
        index.insert("/a/b", "/a/b").unwrap();

        let removed = index.delete_by_logical_prefix("/a", Scope::Exact).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(index.lookup_by_logical("/a").unwrap(), None);
        assert!(index.lookup_by_logical("/a/b").unwrap().is_some());
    }

    #[test]
    fn test_subtree_delete_respects_segment_boundaries() {
        let (_dir, index) = open_index();
        index.insert("/a", "/a").unwrap();
        index.insert("/a/b/c", "/a/b/c").unwrap();
        index.insert("/ab", "/ab").unwrap();

        let removed = index
            .delete_by_logical_prefix("/a", Scope::Subtree)
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.lookup_by_logical("/a").unwrap(), None);
        assert_eq!(index.lookup_by_logical("/a/b/c").unwrap(), None);
        assert!(index.lookup_by_logical("/ab").unwrap().is_some());
    }

    #[test]
    fn test_delete_by_physical_column() {
        let (_dir, index) = open_index();
        index.insert("/logic/x", "/phys/x").unwrap();
        index.insert("/logic/y", "/phys/x/y").unwrap();

        let removed = index
            .delete_by_physical_prefix("/phys/x", Scope::Subtree)
            .unwrap();
        assert_eq!(removed, 2);
        assert!(index.is_empty());
    }

    #[test]
    fn test_rewrite_prefix_moves_nested_rows_only() {
        let (_dir, index) = open_index();
        index.insert("/src", "/src").unwrap();
        index.insert("/src/a.txt", "/src/a.txt").unwrap();
        index.insert("/src/d/b.txt", "/src/d/b.txt").unwrap();

        let moved = index.rewrite_prefix("/src", "/dst", "/src", "/dst").unwrap();
        assert_eq!(moved, 2);

        // Root row untouched, children re-keyed on both columns.
        assert!(index.lookup_by_logical("/src").unwrap().is_some());
        assert_eq!(index.lookup_by_logical("/src/a.txt").unwrap(), None);
        assert_eq!(
            index.lookup_by_logical("/dst/a.txt").unwrap(),
            Some("/dst/a.txt".to_string())
        );
        assert_eq!(
            index.lookup_by_physical("/dst/d/b.txt").unwrap(),
            Some("/dst/d/b.txt".to_string())
        );
    }

    #[test]
    fn test_rewrite_prefix_rolls_back_on_occupied_target() {
        let (_dir, index) = open_index();
        index.insert("/src/a", "/psrc/a").unwrap();
        index.insert("/src/b", "/psrc/b").unwrap();
        // Occupy one of the rewrite targets.
        index.insert("/dst/b", "/elsewhere/b").unwrap();

        let result = index.rewrite_prefix("/src", "/dst", "/psrc", "/pdst");
        assert!(matches!(result, Err(IndexError::Conflict { .. })));

        // Nothing changed, including the row that would have moved cleanly.
        assert_eq!(
            index.lookup_by_logical("/src/a").unwrap(),
            Some("/psrc/a".to_string())
        );
        assert_eq!(index.lookup_by_logical("/dst/a").unwrap(), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_copy_prefix_retains_sources() {
        let (_dir, index) = open_index();
        index.insert("/src/a", "/psrc/a").unwrap();

        let copied = index.copy_prefix("/src", "/dst", "/psrc", "/pdst").unwrap();
        assert_eq!(copied, 1);
        assert_eq!(
            index.lookup_by_logical("/src/a").unwrap(),
            Some("/psrc/a".to_string())
        );
        assert_eq!(
            index.lookup_by_logical("/dst/a").unwrap(),
            Some("/pdst/a".to_string())
        );
    }

    #[test]
    fn test_entries_lists_every_row() {
        let (_dir, index) = open_index();
        index.insert("/a", "/pa").unwrap();
        index.insert("/b", "/pb").unwrap();

        let mut rows = index.entries().unwrap();
        rows.sort_by(|a, b| a.logical.cmp(&b.logical));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].logical, "/a");
        assert_eq!(rows[1].physical, "/pb");
    }
}
