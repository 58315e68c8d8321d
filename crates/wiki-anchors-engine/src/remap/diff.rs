use std::ops::Range;
use std::time::Duration;

use similar::{DiffTag, TextDiff};

use crate::remap::{EditOp, EditScript, EditTag, Offset};

/// Builds edit scripts from two versions of a page's text.
///
/// Works on chars, so the resulting offsets count Unicode scalar values.
/// Callers whose anchors use another code unit must diff in that unit
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct DiffSource {
    timeout: Option<Duration>,
}

impl DiffSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop searching for a minimal diff after `timeout`; the script stays
    /// valid, just coarser.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Diff `old` against `new`.
    ///
    /// The script is rebuilt from the matching blocks the differ finds, taken
    /// in order of position, so it always tiles both texts from 0 to their
    /// char counts. A block that would cross an earlier one is dropped and its
    /// chars become part of the surrounding change.
    pub fn diff(&self, old: &str, new: &str) -> EditScript {
        let mut config = TextDiff::configure();
        if let Some(timeout) = self.timeout {
            config.timeout(timeout);
        }
        let diff = config.diff_chars(old, new);

        let mut blocks: Vec<(usize, usize, usize)> = diff
            .ops()
            .iter()
            .filter_map(|op| match op.as_tag_tuple() {
                (DiffTag::Equal, old_range, new_range) => {
                    Some((old_range.start, new_range.start, old_range.len()))
                }
                _ => None,
            })
            .collect();
        blocks.sort_unstable();

        let mut ops = Vec::with_capacity(blocks.len() * 2 + 1);
        let (mut i, mut j) = (0, 0);
        for (old_index, new_index, len) in blocks {
            if len == 0 || old_index < i || new_index < j {
                continue;
            }
            push_change(&mut ops, i..old_index, j..new_index);
            push_equal(&mut ops, old_index..old_index + len, new_index..new_index + len);
            i = old_index + len;
            j = new_index + len;
        }
        push_change(&mut ops, i..old.chars().count(), j..new.chars().count());

        EditScript::new(ops)
    }
}

fn push_change(ops: &mut Vec<EditOp>, old: Range<usize>, new: Range<usize>) {
    let tag = match (old.is_empty(), new.is_empty()) {
        (true, true) => return,
        (true, false) => EditTag::Insert,
        (false, true) => EditTag::Delete,
        (false, false) => EditTag::Replace,
    };
    ops.push(edit_op(tag, old, new));
}

fn push_equal(ops: &mut Vec<EditOp>, old: Range<usize>, new: Range<usize>) {
    if let Some(last) = ops.last_mut()
        && last.tag == EditTag::Equal
        && last.i2 == offset(old.start)
        && last.j2 == offset(new.start)
    {
        last.i2 = offset(old.end);
        last.j2 = offset(new.end);
        return;
    }
    ops.push(edit_op(EditTag::Equal, old, new));
}

fn edit_op(tag: EditTag, old: Range<usize>, new: Range<usize>) -> EditOp {
    EditOp {
        tag,
        i1: offset(old.start),
        i2: offset(old.end),
        j1: offset(new.start),
        j2: offset(new.end),
    }
}

fn offset(index: usize) -> Offset {
    Offset::try_from(index).unwrap_or(Offset::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::{Interval, RemapResult, remap};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_diff_of_identical_texts_is_identity() {
        let text = "The quick brown fox";
        let script = EditScript::diff_chars(text, text);

        assert!(script.validate().is_ok());
        assert!(script.iter().all(|op| op.tag == EditTag::Equal));
    }

    #[test]
    fn test_diff_of_empty_texts_is_empty() {
        assert!(EditScript::diff_chars("", "").is_empty());
    }

    #[rstest]
    #[case::paragraphs(
        "Alpha beta gamma.\n\nDelta epsilon.\n",
        "Alpha gamma.\n\nNew paragraph.\n\nDelta epsilon zeta.\n"
    )]
    #[case::shuffled_whitespace("a\n \na   \n ", "\n\n\n\na \n\n a")]
    #[case::all_replaced("abc", "xyz")]
    #[case::from_empty("", "new page")]
    #[case::to_empty("old page", "")]
    fn test_diff_produces_valid_tiling(#[case] old: &str, #[case] new: &str) {
        let script = EditScript::diff_chars(old, new);

        assert!(script.validate().is_ok());
        let last = script.ops().last().unwrap();
        assert_eq!(last.i2, old.chars().count() as Offset);
        assert_eq!(last.j2, new.chars().count() as Offset);
    }

    #[test]
    fn test_append_after_paragraph_keeps_anchor() {
        let old = "First paragraph.\n";
        let new = "First paragraph.\nSecond paragraph.\n";
        let anchor = Interval::new(0, 16);

        let script = EditScript::diff_chars(old, new);
        let results = remap(&[anchor], &script).unwrap();

        assert_eq!(results, vec![RemapResult::Moved { start: 0, end: 16 }]);
    }

    #[test]
    fn test_prepend_shifts_anchor() {
        let old = "comment on this";
        let new = ">> comment on this";
        let anchor = Interval::new(11, 15);

        let script = DiffSource::new()
            .with_timeout(Duration::from_secs(1))
            .diff(old, new);
        let results = remap(&[anchor], &script).unwrap();

        assert_eq!(results, vec![RemapResult::Moved { start: 14, end: 18 }]);
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let old = "héllo wörld";
        let new = "héllo, wörld";

        let script = EditScript::diff_chars(old, new);

        assert!(script.validate().is_ok());
        assert_eq!(
            script.ops().last().unwrap().i2,
            old.chars().count() as Offset
        );
    }
}
