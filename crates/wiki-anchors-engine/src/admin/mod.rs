//! Administrative operations over an [`AnchorStore`]: remapping a page's
//! anchors after an edit, renaming pages, and tracking which site revision
//! the anchors refer to.

pub mod locks;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::remap::{DiffSource, EditScript, Interval, RemapError, Remapper};
use crate::store::{AnchorStore, COMMIT_HASH_KEY, RemapSummary, StoreError};

pub use locks::DocumentLocks;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Remap(#[from] RemapError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Edit script has {len} ops, more than the limit of {max}")]
    EditScriptTooLarge { len: usize, max: usize },
}

/// Bounds on the work a single remap may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapLimits {
    pub max_edit_ops: usize,
}

impl Default for RemapLimits {
    fn default() -> Self {
        Self {
            max_edit_ops: 10_000,
        }
    }
}

/// Serialises remap-and-persist cycles per page over a shared store.
///
/// The store sits behind a read/write lock that is only held for the read and
/// the write of a cycle, never while remapping; the page's own lock is held
/// for the whole cycle.
#[derive(Debug)]
pub struct Administration<S> {
    store: RwLock<S>,
    locks: DocumentLocks,
    limits: RemapLimits,
    diff: DiffSource,
}

impl<S: AnchorStore> Administration<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: RwLock::new(store),
            locks: DocumentLocks::new(),
            limits: RemapLimits::default(),
            diff: DiffSource::default(),
        }
    }

    pub fn with_limits(mut self, limits: RemapLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_diff_source(mut self, diff: DiffSource) -> Self {
        self.diff = diff;
        self
    }

    pub fn limits(&self) -> RemapLimits {
        self.limits
    }

    pub fn into_store(self) -> S {
        self.store.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    // Recover from poisoned lock (another thread panicked while holding it)
    fn read(&self) -> RwLockReadGuard<'_, S> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the store with shared access.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.read())
    }

    /// Run `f` against the store with exclusive access.
    pub fn with_store_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.write())
    }

    /// Hold the locks of `paths` while `f` runs, then forget locks no other
    /// cycle is using.
    fn locked<R>(&self, paths: &[&str], f: impl FnOnce() -> R) -> R {
        let result = {
            let locks = self.locks.locks_for(paths);
            let _guards: Vec<_> = locks
                .iter()
                .map(|lock| lock.lock().unwrap_or_else(|e| e.into_inner()))
                .collect();
            f()
        };
        self.locks.prune();
        result
    }

    /// Move every anchor of `path` through `script` and persist the results.
    ///
    /// Unknown pages are reported before the script is looked at. Nothing is
    /// written unless the script and all stored intervals are valid.
    pub fn modify_comments(
        &self,
        path: &str,
        script: &EditScript,
    ) -> Result<RemapSummary, AdminError> {
        if !self.read().page_exists(path) {
            warn!(path, "remap requested for unknown page");
            return Err(StoreError::PageNotFound(path.to_string()).into());
        }
        if script.len() > self.limits.max_edit_ops {
            warn!(
                path,
                len = script.len(),
                max = self.limits.max_edit_ops,
                "rejecting oversized edit script"
            );
            return Err(AdminError::EditScriptTooLarge {
                len: script.len(),
                max: self.limits.max_edit_ops,
            });
        }
        let remapper = Remapper::new(script).inspect_err(|err| {
            warn!(path, %err, "rejecting edit script");
        })?;

        self.locked(&[path], || self.remap_page(path, &remapper))
    }

    fn remap_page(
        &self,
        path: &str,
        remapper: &Remapper<'_>,
    ) -> Result<RemapSummary, AdminError> {
        let anchors = self.read().anchors(path)?;
        let intervals: Vec<Interval> = anchors.iter().map(|anchor| anchor.interval).collect();
        debug!(
            path,
            anchors = intervals.len(),
            ops = remapper.len(),
            "remapping anchors"
        );
        let results = remapper.remap(&intervals)?;

        let updates: Vec<_> = anchors
            .iter()
            .map(|anchor| anchor.id)
            .zip(results)
            .collect();
        let summary = self.write().apply_remap(path, &updates)?;

        info!(
            path,
            moved = summary.moved,
            removed = summary.removed,
            merged = summary.merged,
            comments_deleted = summary.comments_deleted,
            "remapped comment anchors"
        );
        Ok(summary)
    }

    /// Diff two versions of a page and remap its anchors accordingly.
    pub fn modify_comments_between(
        &self,
        path: &str,
        old_text: &str,
        new_text: &str,
    ) -> Result<RemapSummary, AdminError> {
        let script = self.diff.diff(old_text, new_text);
        self.modify_comments(path, &script)
    }

    /// Remap several pages, each independently and in parallel.
    ///
    /// One result per entry, in order. Entries naming the same page are
    /// serialised by that page's lock.
    pub fn modify_many(
        &self,
        batch: &[(String, EditScript)],
    ) -> Vec<Result<RemapSummary, AdminError>>
    where
        S: Send + Sync,
    {
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|(path, script)| scope.spawn(move || self.modify_comments(path, script)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    /// Re-key `old_path` as `new_path`, leaving offsets as they are.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<(), AdminError> {
        self.locked(&[old_path, new_path], || {
            self.write().rename_page(old_path, new_path)
        })?;
        info!(old_path, new_path, "renamed page");
        Ok(())
    }

    pub fn set_commit_hash(&self, hash: &str) {
        self.write().set_meta(COMMIT_HASH_KEY, hash);
        debug!(hash, "recorded commit hash");
    }

    pub fn commit_hash(&self) -> Option<String> {
        self.read().meta(COMMIT_HASH_KEY)
    }

    /// Whether the stored anchors were last remapped against `hash`.
    pub fn commit_hash_matches(&self, hash: &str) -> bool {
        self.commit_hash().as_deref() == Some(hash)
    }
}
