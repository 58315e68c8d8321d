//! Persistence of pages, anchors and comments.
//!
//! The remapper only computes positions. Committing them, and cascading the
//! deletion of removed anchors to their comments, is the job of an
//! [`AnchorStore`].

pub mod memory;
pub mod models;

use serde::{Deserialize, Serialize};

use crate::remap::{Interval, RemapResult};

pub use memory::MemoryStore;
pub use models::*;

/// Meta key recording which site revision the stored anchors refer to.
pub const COMMIT_HASH_KEY: &str = "commit_hash";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Page not found: {0}")]
    PageNotFound(String),
    #[error("Cannot rename, source page not found: {0}")]
    SourceNotFound(String),
    #[error("Cannot rename, destination page already exists: {0}")]
    DestinationExists(String),
    #[error("Cannot rename a page to itself: {0}")]
    SamePath(String),
    #[error("Anchor {anchor} does not belong to page {path}")]
    AnchorNotFound { path: String, anchor: AnchorId },
    #[error("Invalid interval: {0}")]
    InvalidInterval(Interval),
}

/// What persisting one page's remap results changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapSummary {
    pub moved: usize,
    /// Includes moves that landed outside the valid range
    pub removed: usize,
    /// Anchors folded into another anchor that landed on the same interval
    pub merged: usize,
    pub comments_deleted: usize,
}

/// Storage seam used by the administration workflow.
///
/// Implementations must apply a batch of remap results all-or-nothing.
pub trait AnchorStore {
    fn page_exists(&self, path: &str) -> bool;

    /// Current anchors of a page, ordered by id.
    fn anchors(&self, path: &str) -> Result<Vec<Anchor>, StoreError>;

    /// Update moved anchors and delete removed ones along with their comments.
    ///
    /// A move to an interval that fails [`Interval::is_valid`] counts as a
    /// removal.
    fn apply_remap(
        &mut self,
        path: &str,
        results: &[(AnchorId, RemapResult)],
    ) -> Result<RemapSummary, StoreError>;

    /// Re-key a page and everything under it. Offsets are untouched.
    fn rename_page(&mut self, old_path: &str, new_path: &str) -> Result<(), StoreError>;

    fn meta(&self, key: &str) -> Option<String>;

    fn set_meta(&mut self, key: &str, value: &str);
}
