use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per page path, created on first use.
///
/// Holding a page's lock for a whole read-remap-write cycle keeps two remaps
/// of the same page from interleaving. Different pages never contend.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `path`. Lock the returned mutex for the duration of
    /// the cycle.
    pub fn lock_for(&self, path: &str) -> Arc<Mutex<()>> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.entry(path.to_string()).or_default().clone()
    }

    /// Locks for several paths, ordered by path so callers taking more than
    /// one cannot deadlock against each other.
    pub fn locks_for(&self, paths: &[&str]) -> Vec<Arc<Mutex<()>>> {
        let mut sorted = paths.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.into_iter().map(|path| self.lock_for(path)).collect()
    }

    /// Forget every lock nobody outside the table holds.
    pub fn prune(&self) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
