use crate::remap::{EditOp, EditTag, Interval, Offset};

/// What a single op does to a single interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Unchanged,
    /// Add to the interval's start and end deltas.
    Shift { start: Offset, end: Offset },
    /// The op consumed the whole interval.
    Remove,
}

/// Classify `op` against the interval's old-document coordinates.
///
/// Boundary ties follow these rules exactly:
///
/// Insert at `i1` of length `L`:
/// - `i1 < start`: shift both ends by `L`
/// - `start <= i1 <= end`: grow the end by `L`
/// - `i1 > end`: unchanged
///
/// Delete/Replace of `[i1, i2)` with replacement length `L`:
/// - `i2 < start`: shift both ends by `L - (i2 - i1)`
/// - `start <= i2 <= end`, `i1 < start`: end `+= L - (end - i2)`, start `+= j1 - i1`
/// - `start <= i2 <= end`, `i1 >= start`: end `+= L - (i2 - i1)`
/// - `i2 > end`, `i1 < start`: removed
/// - `i2 > end`, `start <= i1 <= end`: end `+= L - (end - i1)`
/// - `i2 > end`, `i1 > end`: unchanged
///
/// `Equal` ops never contribute.
pub fn classify(interval: Interval, op: &EditOp) -> Effect {
    let Interval { start, end } = interval;
    let EditOp { i1, i2, j1, .. } = *op;
    let inserted = op.dest_len();

    match op.tag {
        EditTag::Equal => Effect::Unchanged,
        EditTag::Insert => {
            if i1 < start {
                Effect::Shift {
                    start: inserted,
                    end: inserted,
                }
            } else if i1 <= end {
                Effect::Shift {
                    start: 0,
                    end: inserted,
                }
            } else {
                Effect::Unchanged
            }
        }
        EditTag::Delete | EditTag::Replace => {
            if i2 < start {
                let shift = op.net_change();
                Effect::Shift {
                    start: shift,
                    end: shift,
                }
            } else if i2 <= end {
                if i1 < start {
                    // leading edge
                    Effect::Shift {
                        start: j1 - i1,
                        end: inserted - (end - i2),
                    }
                } else {
                    Effect::Shift {
                        start: 0,
                        end: inserted - (i2 - i1),
                    }
                }
            } else if i1 < start {
                Effect::Remove
            } else if i1 <= end {
                Effect::Shift {
                    start: 0,
                    end: inserted - (end - i1),
                }
            } else {
                Effect::Unchanged
            }
        }
    }
}

/// Per-interval accumulator, summed across a sweep and applied once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub start: Offset,
    pub end: Offset,
}

impl Delta {
    pub const fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    /// Fold an effect in. Returns `false` once the interval has been removed.
    pub fn accumulate(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::Unchanged => true,
            Effect::Shift { start, end } => {
                self.start += start;
                self.end += end;
                true
            }
            Effect::Remove => false,
        }
    }

    pub fn apply(self, interval: Interval) -> Interval {
        Interval::new(interval.start + self.start, interval.end + self.end)
    }
}
