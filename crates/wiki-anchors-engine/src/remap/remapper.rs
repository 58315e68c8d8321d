use serde::{Deserialize, Serialize};

use crate::remap::{
    Delta, EditOp, EditScript, EditTag, Interval, Offset, RemapError, classify, validate_intervals,
};

/// Where an interval ended up in the new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemapResult {
    Moved { start: Offset, end: Offset },
    /// The anchored text was consumed by a delete or replace.
    Removed,
}

impl RemapResult {
    pub fn moved(interval: Interval) -> Self {
        Self::Moved {
            start: interval.start,
            end: interval.end,
        }
    }

    pub fn interval(&self) -> Option<Interval> {
        match *self {
            Self::Moved { start, end } => Some(Interval::new(start, end)),
            Self::Removed => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// Sweep `ops` over one interval, accumulating against its original
/// coordinates and applying the sum once.
fn sweep<'a>(
    interval: Interval,
    mut delta: Delta,
    ops: impl IntoIterator<Item = &'a EditOp>,
) -> RemapResult {
    for op in ops {
        if !delta.accumulate(classify(interval, op)) {
            return RemapResult::Removed;
        }
    }
    RemapResult::moved(delta.apply(interval))
}

/// Remap every interval through `script`, one result per interval in input
/// order.
///
/// This is the reference interval-major sweep: each interval visits every op.
/// Fails without producing any result if the script breaks the tiling
/// invariant or any interval is malformed.
pub fn remap(intervals: &[Interval], script: &EditScript) -> Result<Vec<RemapResult>, RemapError> {
    script.validate()?;
    validate_intervals(intervals)?;

    Ok(intervals
        .iter()
        .map(|&interval| sweep(interval, Delta::default(), script))
        .collect())
}

/// Same results as [`remap`], computed op-major: ops in the outer loop, one
/// accumulator per interval in the inner loop.
pub fn remap_op_major(
    intervals: &[Interval],
    script: &EditScript,
) -> Result<Vec<RemapResult>, RemapError> {
    script.validate()?;
    validate_intervals(intervals)?;

    // None once the interval is removed
    let mut deltas: Vec<Option<Delta>> = vec![Some(Delta::default()); intervals.len()];
    for op in script {
        for (slot, &interval) in deltas.iter_mut().zip(intervals) {
            if let Some(delta) = slot
                && !delta.accumulate(classify(interval, op))
            {
                *slot = None;
            }
        }
    }

    Ok(deltas
        .into_iter()
        .zip(intervals)
        .map(|(slot, &interval)| match slot {
            Some(delta) => RemapResult::moved(delta.apply(interval)),
            None => RemapResult::Removed,
        })
        .collect())
}

/// A validated script prepared for remapping many intervals.
///
/// Ops that lie wholly before an interval only ever shift it by their net
/// length change, so their contribution is looked up from a prefix sum. The
/// remaining ops are swept until one starts past the interval's end. Results
/// are identical to [`remap`].
#[derive(Debug, Clone)]
pub struct Remapper<'a> {
    /// Non-`Equal` ops, ascending by `i1`.
    ops: Vec<&'a EditOp>,
    /// Position an op must precede for it to count as wholly before an
    /// interval: `i1` for inserts, `i2` otherwise. Non-decreasing.
    keys: Vec<Offset>,
    /// `prefix[k]` is the summed net change of `ops[..k]`.
    prefix: Vec<Offset>,
}

impl<'a> Remapper<'a> {
    pub fn new(script: &'a EditScript) -> Result<Self, RemapError> {
        script.validate()?;

        let ops: Vec<&EditOp> = script
            .iter()
            .filter(|op| op.tag != EditTag::Equal)
            .collect();
        let keys = ops
            .iter()
            .map(|op| match op.tag {
                EditTag::Insert => op.i1,
                _ => op.i2,
            })
            .collect();
        let mut prefix = Vec::with_capacity(ops.len() + 1);
        prefix.push(0);
        let mut total = 0;
        for op in &ops {
            total += op.net_change();
            prefix.push(total);
        }

        Ok(Self { ops, keys, prefix })
    }

    /// Number of ops that can move an interval.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn remap(&self, intervals: &[Interval]) -> Result<Vec<RemapResult>, RemapError> {
        validate_intervals(intervals)?;
        tracing::trace!(
            intervals = intervals.len(),
            ops = self.ops.len(),
            "remapping intervals"
        );
        Ok(intervals
            .iter()
            .map(|&interval| self.remap_one(interval))
            .collect())
    }

    /// Remap a single interval the caller has already checked.
    pub fn remap_one(&self, interval: Interval) -> RemapResult {
        let before = self.keys.partition_point(|&key| key < interval.start);
        let shift = self.prefix[before];
        let overlapping = self.ops[before..]
            .iter()
            .copied()
            .take_while(|op| op.i1 <= interval.end);
        sweep(interval, Delta::new(shift, shift), overlapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::{MAX_OFFSET, MalformedReason};
    use insta::assert_debug_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const INTERVAL: Interval = Interval::new(10, 20);

    /// Pads a single op with `Equal` ops so the script tiles `[0, 40)`.
    fn single(op: EditOp) -> EditScript {
        let mut ops = Vec::new();
        if op.i1 > 0 {
            ops.push(EditOp::equal(0, op.i1, 0, op.i1));
        }
        let j = op.j2;
        ops.push(op);
        if op.i2 < 40 {
            ops.push(EditOp::equal(op.i2, 40, j, j + 40 - op.i2));
        }
        EditScript::new(ops)
    }

    fn remap_all_ways(intervals: &[Interval], script: &EditScript) -> Vec<RemapResult> {
        let reference = remap(intervals, script).unwrap();
        assert_eq!(remap_op_major(intervals, script).unwrap(), reference);
        assert_eq!(
            Remapper::new(script).unwrap().remap(intervals).unwrap(),
            reference
        );
        reference
    }

    #[rstest]
    #[case::insert_before(EditOp::insert(5, 5, 8), RemapResult::Moved { start: 13, end: 23 })]
    #[case::insert_inside(EditOp::insert(15, 15, 18), RemapResult::Moved { start: 10, end: 23 })]
    #[case::insert_after(EditOp::insert(25, 25, 28), RemapResult::Moved { start: 10, end: 20 })]
    #[case::delete_before(EditOp::delete(0, 5, 0), RemapResult::Moved { start: 5, end: 15 })]
    #[case::full_containment(EditOp::replace(5, 25, 5, 8), RemapResult::Removed)]
    #[case::leading_edge(EditOp::replace(5, 15, 5, 12), RemapResult::Moved { start: 10, end: 22 })]
    #[case::trailing_edge(EditOp::replace(15, 25, 15, 18), RemapResult::Moved { start: 10, end: 18 })]
    #[case::inside_shrink(EditOp::delete(12, 16, 12), RemapResult::Moved { start: 10, end: 16 })]
    fn test_single_op(#[case] op: EditOp, #[case] expected: RemapResult) {
        assert_eq!(remap_all_ways(&[INTERVAL], &single(op)), vec![expected]);
    }

    #[test]
    fn test_identity_for_empty_and_equal_scripts() {
        let intervals = [
            Interval::new(0, 0),
            Interval::new(3, 9),
            Interval::new(10, 20),
        ];
        let expected: Vec<_> = intervals.iter().map(|&i| RemapResult::moved(i)).collect();

        assert_eq!(remap_all_ways(&intervals, &EditScript::default()), expected);
        let equal_only = EditScript::new(vec![
            EditOp::equal(0, 7, 0, 7),
            EditOp::equal(7, 40, 7, 40),
        ]);
        assert_eq!(remap_all_ways(&intervals, &equal_only), expected);
    }

    #[test]
    fn test_non_interacting_edits_accumulate() {
        // insert 3 before the interval, delete 5 after it
        let script = EditScript::new(vec![
            EditOp::equal(0, 5, 0, 5),
            EditOp::insert(5, 5, 8),
            EditOp::equal(5, 25, 8, 28),
            EditOp::delete(25, 30, 28),
            EditOp::equal(30, 40, 28, 38),
        ]);

        let combined = remap_all_ways(&[INTERVAL], &script);

        let after_insert = remap(&[INTERVAL], &single(EditOp::insert(5, 5, 8))).unwrap();
        let moved = after_insert[0].interval().unwrap();
        // the delete, expressed in the coordinates left by the insert
        let sequential = remap(&[moved], &single(EditOp::delete(28, 33, 28))).unwrap();

        assert_eq!(combined, sequential);
        assert_eq!(combined, vec![RemapResult::Moved { start: 13, end: 23 }]);
    }

    #[test]
    fn test_removal_takes_precedence_over_earlier_shifts() {
        let script = EditScript::new(vec![
            EditOp::insert(0, 0, 4),
            EditOp::equal(0, 5, 4, 9),
            EditOp::replace(5, 25, 9, 10),
            EditOp::insert(25, 10, 20),
            EditOp::equal(25, 40, 20, 35),
        ]);

        assert_eq!(
            remap_all_ways(&[INTERVAL, Interval::new(30, 32)], &script),
            vec![
                RemapResult::Removed,
                RemapResult::Moved { start: 25, end: 27 }
            ]
        );
    }

    #[test]
    fn test_mixed_batch_snapshot() {
        let script = EditScript::new(vec![
            EditOp::equal(0, 4, 0, 4),
            EditOp::insert(4, 4, 6),
            EditOp::equal(4, 12, 6, 14),
            EditOp::delete(12, 14, 14),
            EditOp::equal(14, 22, 14, 22),
            EditOp::replace(22, 30, 22, 25),
            EditOp::equal(30, 40, 25, 35),
        ]);
        let intervals = [
            Interval::new(0, 3),
            Interval::new(4, 8),
            Interval::new(10, 20),
            Interval::new(24, 26),
            Interval::new(20, 35),
            Interval::new(36, 36),
        ];

        let results = remap_all_ways(&intervals, &script);

        assert_debug_snapshot!(results, @r"
        [
            Moved {
                start: 0,
                end: 3,
            },
            Moved {
                start: 4,
                end: 10,
            },
            Moved {
                start: 12,
                end: 20,
            },
            Removed,
            Moved {
                start: 20,
                end: 30,
            },
            Moved {
                start: 31,
                end: 31,
            },
        ]
        ");
    }

    #[test]
    fn test_interval_order_does_not_matter() {
        let script = EditScript::new(vec![
            EditOp::equal(0, 6, 0, 6),
            EditOp::replace(6, 11, 6, 8),
            EditOp::equal(11, 18, 8, 15),
            EditOp::insert(18, 15, 19),
            EditOp::equal(18, 40, 19, 41),
        ]);
        let intervals = [
            Interval::new(2, 7),
            Interval::new(10, 20),
            Interval::new(18, 18),
            Interval::new(30, 35),
        ];
        let mut reversed = intervals;
        reversed.reverse();

        let forward = remap_all_ways(&intervals, &script);
        let mut backward = remap_all_ways(&reversed, &script);
        backward.reverse();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_malformed_script_produces_no_results() {
        let script = EditScript::new(vec![
            EditOp::equal(0, 5, 0, 5),
            EditOp::delete(6, 9, 5),
        ]);

        let err = remap(&[INTERVAL], &script).unwrap_err();
        assert!(matches!(
            err,
            RemapError::MalformedEditScript { index: 1, .. }
        ));
        assert_eq!(remap_op_major(&[INTERVAL], &script).unwrap_err(), err);
        assert_eq!(Remapper::new(&script).unwrap_err(), err);
    }

    #[test]
    fn test_invalid_interval_rejects_whole_batch() {
        let script = single(EditOp::insert(5, 5, 8));
        let intervals = [INTERVAL, Interval::new(7, 3)];

        let err = remap(&intervals, &script).unwrap_err();

        assert_eq!(
            err,
            RemapError::InvalidInterval {
                index: 1,
                interval: Interval::new(7, 3)
            }
        );
        let remapper = Remapper::new(&script).unwrap();
        assert_eq!(remapper.remap(&intervals).unwrap_err(), err);
    }

    #[test]
    fn test_offsets_past_the_bound_are_rejected_before_summing() {
        let script = EditScript::new(vec![
            EditOp::insert(0, 0, i64::MAX),
            EditOp::insert(0, i64::MAX, i64::MAX),
            EditOp::equal(0, 5, i64::MAX, i64::MAX),
        ]);

        let err = remap(&[Interval::new(1, 2)], &script).unwrap_err();

        assert_eq!(
            err,
            RemapError::MalformedEditScript {
                index: 0,
                reason: MalformedReason::OffsetTooLarge { found: i64::MAX },
            }
        );
        assert_eq!(remap_op_major(&[Interval::new(1, 2)], &script).unwrap_err(), err);
        assert_eq!(Remapper::new(&script).unwrap_err(), err);
    }

    #[test]
    fn test_largest_accepted_offsets_do_not_overflow() {
        let script = EditScript::new(vec![
            EditOp::delete(0, MAX_OFFSET, 0),
            EditOp::insert(MAX_OFFSET, 0, MAX_OFFSET),
        ]);
        let intervals = [
            Interval::new(0, MAX_OFFSET),
            Interval::new(MAX_OFFSET, MAX_OFFSET),
        ];

        assert_eq!(
            remap_all_ways(&intervals, &script),
            vec![
                RemapResult::Moved {
                    start: 0,
                    end: MAX_OFFSET
                },
                RemapResult::Moved {
                    start: MAX_OFFSET,
                    end: 2 * MAX_OFFSET
                },
            ]
        );
    }

    #[test]
    fn test_prepared_remapper_skips_equal_ops() {
        let script = single(EditOp::insert(5, 5, 8));
        let remapper = Remapper::new(&script).unwrap();
        assert_eq!(remapper.len(), 1);
        assert!(!remapper.is_empty());
    }

    #[test]
    fn test_result_serializes_with_kind_tag() {
        let moved = serde_json::to_string(&RemapResult::Moved { start: 1, end: 4 }).unwrap();
        let removed = serde_json::to_string(&RemapResult::Removed).unwrap();
        assert_eq!(moved, r#"{"kind":"moved","start":1,"end":4}"#);
        assert_eq!(removed, r#"{"kind":"removed"}"#);
    }
}
