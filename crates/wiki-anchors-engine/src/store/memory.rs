use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::remap::{Interval, RemapResult};
use crate::store::{
    Anchor, AnchorId, AnchorStore, Comment, CommentId, CommentView, CommenterId, CommenterRecord,
    NewComment, Page, PageId, RemapSummary, StoreError,
};

/// In-memory anchor store, serializable as a whole to a JSON file.
///
/// Tables mirror the comment service's schema: pages, anchors (one row per
/// distinct interval of a page), commenters, comments and key/value metas.
/// All ids come from one counter so they grow with insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    anchors: Vec<Anchor>,
    #[serde(default)]
    commenters: Vec<CommenterRecord>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    metas: BTreeMap<String, String>,
    #[serde(default)]
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn page(&self, path: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.path == path)
    }

    fn page_or_insert(&mut self, path: &str) -> PageId {
        if let Some(page) = self.page(path) {
            return page.id;
        }
        let id = PageId(self.allocate_id());
        self.pages.push(Page {
            id,
            path: path.to_string(),
        });
        id
    }

    fn anchor_or_insert(&mut self, page_id: PageId, interval: Interval) -> AnchorId {
        if let Some(anchor) = self
            .anchors
            .iter()
            .find(|anchor| anchor.page_id == page_id && anchor.interval == interval)
        {
            return anchor.id;
        }
        let id = AnchorId(self.allocate_id());
        self.anchors.push(Anchor {
            id,
            page_id,
            interval,
        });
        id
    }

    /// Every known page path, in creation order.
    pub fn paths(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.path.clone()).collect()
    }

    /// Store a comment, creating its page and anchor on first use.
    pub fn post_comment(
        &mut self,
        new: NewComment,
        created_at: u64,
    ) -> Result<CommentId, StoreError> {
        if !new.interval.is_valid() {
            return Err(StoreError::InvalidInterval(new.interval));
        }

        let page_id = self.page_or_insert(&new.path);
        let anchor_id = self.anchor_or_insert(page_id, new.interval);

        let commenter_id = CommenterId(self.allocate_id());
        self.commenters.push(CommenterRecord {
            id: commenter_id,
            commenter: new.commenter,
        });

        let id = CommentId(self.allocate_id());
        self.comments.push(Comment {
            id,
            anchor_id,
            commenter_id,
            body: new.body,
            created_at,
        });
        Ok(id)
    }

    /// All comments on a page, oldest first. Unknown pages have none.
    pub fn comments(&self, path: &str) -> Vec<CommentView> {
        let Some(page) = self.page(path) else {
            return Vec::new();
        };
        let intervals: HashMap<AnchorId, Interval> = self
            .anchors
            .iter()
            .filter(|anchor| anchor.page_id == page.id)
            .map(|anchor| (anchor.id, anchor.interval))
            .collect();

        self.comments
            .iter()
            .filter_map(|comment| {
                let interval = *intervals.get(&comment.anchor_id)?;
                let commenter_name = self
                    .commenters
                    .iter()
                    .find(|record| record.id == comment.commenter_id)
                    .and_then(|record| record.commenter.name.clone());
                Some(CommentView {
                    id: comment.id,
                    interval,
                    commenter_name,
                    body: comment.body.clone(),
                    created_at: comment.created_at,
                })
            })
            .collect()
    }

    /// Comments on a page grouped into threads by interval.
    pub fn comments_by_interval(&self, path: &str) -> BTreeMap<Interval, Vec<CommentView>> {
        let mut threads: BTreeMap<Interval, Vec<CommentView>> = BTreeMap::new();
        for view in self.comments(path) {
            threads.entry(view.interval).or_default().push(view);
        }
        threads
    }
}

impl AnchorStore for MemoryStore {
    fn page_exists(&self, path: &str) -> bool {
        self.page(path).is_some()
    }

    fn anchors(&self, path: &str) -> Result<Vec<Anchor>, StoreError> {
        let page = self
            .page(path)
            .ok_or_else(|| StoreError::PageNotFound(path.to_string()))?;
        Ok(self
            .anchors
            .iter()
            .filter(|anchor| anchor.page_id == page.id)
            .cloned()
            .collect())
    }

    fn apply_remap(
        &mut self,
        path: &str,
        results: &[(AnchorId, RemapResult)],
    ) -> Result<RemapSummary, StoreError> {
        let page_id = self
            .page(path)
            .ok_or_else(|| StoreError::PageNotFound(path.to_string()))?
            .id;

        // check everything up front so a bad id leaves the store untouched
        for (id, _) in results {
            if !self
                .anchors
                .iter()
                .any(|anchor| anchor.id == *id && anchor.page_id == page_id)
            {
                return Err(StoreError::AnchorNotFound {
                    path: path.to_string(),
                    anchor: *id,
                });
            }
        }

        let mut summary = RemapSummary::default();
        let mut removed = HashSet::new();
        for (id, result) in results {
            // a move that leaves the valid range can never be remapped again,
            // so it is dropped like a removal
            match result.interval().filter(Interval::is_valid) {
                Some(interval) => {
                    if let Some(anchor) = self.anchors.iter_mut().find(|anchor| anchor.id == *id) {
                        anchor.interval = interval;
                    }
                    summary.moved += 1;
                }
                None => {
                    removed.insert(*id);
                    summary.removed += 1;
                }
            }
        }

        // anchors of the page that now share an interval fold into the oldest
        let mut survivors: HashMap<Interval, AnchorId> = HashMap::new();
        let mut merged_into: HashMap<AnchorId, AnchorId> = HashMap::new();
        for anchor in self
            .anchors
            .iter()
            .filter(|anchor| anchor.page_id == page_id && !removed.contains(&anchor.id))
        {
            match survivors.entry(anchor.interval) {
                Entry::Occupied(entry) => {
                    merged_into.insert(anchor.id, *entry.get());
                }
                Entry::Vacant(entry) => {
                    entry.insert(anchor.id);
                }
            }
        }
        summary.merged = merged_into.len();

        let before = self.comments.len();
        self.comments
            .retain(|comment| !removed.contains(&comment.anchor_id));
        summary.comments_deleted = before - self.comments.len();
        for comment in &mut self.comments {
            if let Some(&target) = merged_into.get(&comment.anchor_id) {
                comment.anchor_id = target;
            }
        }
        self.anchors.retain(|anchor| {
            !removed.contains(&anchor.id) && !merged_into.contains_key(&anchor.id)
        });

        Ok(summary)
    }

    fn rename_page(&mut self, old_path: &str, new_path: &str) -> Result<(), StoreError> {
        if old_path == new_path {
            return Err(StoreError::SamePath(old_path.to_string()));
        }
        if !self.page_exists(old_path) {
            return Err(StoreError::SourceNotFound(old_path.to_string()));
        }
        if self.page_exists(new_path) {
            return Err(StoreError::DestinationExists(new_path.to_string()));
        }
        if let Some(page) = self.pages.iter_mut().find(|page| page.path == old_path) {
            page.path = new_path.to_string();
        }
        Ok(())
    }

    fn meta(&self, key: &str) -> Option<String> {
        self.metas.get(key).cloned()
    }

    fn set_meta(&mut self, key: &str, value: &str) {
        self.metas.insert(key.to_string(), value.to_string());
    }
}
