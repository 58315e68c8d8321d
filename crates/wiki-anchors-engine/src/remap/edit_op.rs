use std::fmt;

use serde::{Deserialize, Serialize};

use crate::remap::{MAX_OFFSET, Offset, RemapError};

/// Kind of an edit script opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl fmt::Display for EditTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditTag::Equal => "equal",
            EditTag::Insert => "insert",
            EditTag::Delete => "delete",
            EditTag::Replace => "replace",
        };
        f.write_str(name)
    }
}

/// One opcode: old-text range `[i1, i2)` became new-text range `[j1, j2)`.
///
/// Serializes flat, e.g. `{"tag":"insert","i1":5,"i2":5,"j1":5,"j2":8}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditOp {
    pub tag: EditTag,
    pub i1: Offset,
    pub i2: Offset,
    pub j1: Offset,
    pub j2: Offset,
}

impl EditOp {
    pub const fn equal(i1: Offset, i2: Offset, j1: Offset, j2: Offset) -> Self {
        Self {
            tag: EditTag::Equal,
            i1,
            i2,
            j1,
            j2,
        }
    }

    /// Text `[j1, j2)` of the new document inserted at old position `at`.
    pub const fn insert(at: Offset, j1: Offset, j2: Offset) -> Self {
        Self {
            tag: EditTag::Insert,
            i1: at,
            i2: at,
            j1,
            j2,
        }
    }

    /// Old range `[i1, i2)` removed; `j` is where it would have been in the new text.
    pub const fn delete(i1: Offset, i2: Offset, j: Offset) -> Self {
        Self {
            tag: EditTag::Delete,
            i1,
            i2,
            j1: j,
            j2: j,
        }
    }

    pub const fn replace(i1: Offset, i2: Offset, j1: Offset, j2: Offset) -> Self {
        Self {
            tag: EditTag::Replace,
            i1,
            i2,
            j1,
            j2,
        }
    }

    pub fn source_len(&self) -> Offset {
        self.i2 - self.i1
    }

    pub fn dest_len(&self) -> Offset {
        self.j2 - self.j1
    }

    /// Net length change this op causes.
    pub fn net_change(&self) -> Offset {
        self.dest_len() - self.source_len()
    }

    /// Problems visible on the op alone, without looking at its neighbours.
    fn shape_error(&self) -> Option<MalformedReason> {
        if self.i1 < 0 || self.i2 < 0 || self.j1 < 0 || self.j2 < 0 {
            return Some(MalformedReason::NegativeOffset);
        }
        let largest = self.i2.max(self.j2).max(self.i1).max(self.j1);
        if largest > MAX_OFFSET {
            return Some(MalformedReason::OffsetTooLarge { found: largest });
        }
        if self.i1 > self.i2 || self.j1 > self.j2 {
            return Some(MalformedReason::ReversedRange);
        }
        let consistent = match self.tag {
            EditTag::Equal => self.source_len() == self.dest_len(),
            EditTag::Insert => self.i1 == self.i2,
            EditTag::Delete => self.j1 == self.j2,
            EditTag::Replace => true,
        };
        (!consistent).then_some(MalformedReason::ShapeMismatch { tag: self.tag })
    }
}

/// Why an edit script was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("negative offset")]
    NegativeOffset,
    #[error("offset {found} exceeds the maximum of {max}", max = MAX_OFFSET)]
    OffsetTooLarge { found: Offset },
    #[error("range end precedes its start")]
    ReversedRange,
    #[error("offsets do not fit a {tag} op")]
    ShapeMismatch { tag: EditTag },
    #[error("first op starts at {found}, expected 0")]
    DoesNotStartAtZero { found: Offset },
    #[error("gap before op: expected i1 = {expected}, found {found}")]
    Gap { expected: Offset, found: Offset },
    #[error("op overlaps its predecessor: expected i1 = {expected}, found {found}")]
    Overlap { expected: Offset, found: Offset },
    #[error("new-text ranges do not tile: expected j1 = {expected}, found {found}")]
    NewTextMisaligned { expected: Offset, found: Offset },
}

/// Ordered opcodes turning one version of a page into the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// Character-level script between two texts.
    pub fn diff_chars(old: &str, new: &str) -> Self {
        crate::remap::DiffSource::default().diff(old, new)
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    /// Check that every op is well formed and that the ops tile both the old
    /// and the new text from 0 without gaps or overlaps.
    ///
    /// Old-side problems are reported before new-side ones.
    pub fn validate(&self) -> Result<(), RemapError> {
        let (mut expected, mut expected_j) = (0, 0);
        for (index, op) in self.ops.iter().enumerate() {
            let reason = op.shape_error().or_else(|| {
                if op.i1 == expected {
                    None
                } else if index == 0 {
                    Some(MalformedReason::DoesNotStartAtZero { found: op.i1 })
                } else if op.i1 > expected {
                    Some(MalformedReason::Gap {
                        expected,
                        found: op.i1,
                    })
                } else {
                    Some(MalformedReason::Overlap {
                        expected,
                        found: op.i1,
                    })
                }
            });
            let reason = reason.or_else(|| {
                (op.j1 != expected_j).then_some(MalformedReason::NewTextMisaligned {
                    expected: expected_j,
                    found: op.j1,
                })
            });
            if let Some(reason) = reason {
                return Err(RemapError::MalformedEditScript { index, reason });
            }
            expected = op.i2;
            expected_j = op.j2;
        }
        Ok(())
    }
}

impl From<Vec<EditOp>> for EditScript {
    fn from(ops: Vec<EditOp>) -> Self {
        Self::new(ops)
    }
}

impl FromIterator<EditOp> for EditScript {
    fn from_iter<I: IntoIterator<Item = EditOp>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
