use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::remap::RemapError;

/// Code-unit position in a page's text.
///
/// Signed so that out-of-range input can be represented and rejected, and so
/// that deltas can be negative.
pub type Offset = i64;

/// Largest offset an interval or edit op may carry.
///
/// With both sides of a script tiled and every coordinate at most this, no
/// delta sum or shifted coordinate can leave `i64`.
pub const MAX_OFFSET: Offset = 1 << 48;

/// Half-open range `[start, end)` of old-document offsets a comment thread is
/// anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: Offset,
    pub end: Offset,
}

impl Interval {
    pub const fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    /// `0 <= start <= end <= MAX_OFFSET`
    pub fn is_valid(&self) -> bool {
        0 <= self.start && self.start <= self.end && self.end <= MAX_OFFSET
    }

    pub fn len(&self) -> Offset {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Range<Offset>> for Interval {
    fn from(range: Range<Offset>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Reject the whole batch if any interval is malformed.
pub fn validate_intervals(intervals: &[Interval]) -> Result<(), RemapError> {
    match intervals.iter().position(|interval| !interval.is_valid()) {
        Some(index) => Err(RemapError::InvalidInterval {
            index,
            interval: intervals[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Interval::new(0, 0), true)]
    #[case(Interval::new(3, 3), true)]
    #[case(Interval::new(10, 20), true)]
    #[case(Interval::new(-1, 4), false)]
    #[case(Interval::new(5, 4), false)]
    #[case(Interval::new(-3, -1), false)]
    #[case(Interval::new(0, MAX_OFFSET), true)]
    #[case(Interval::new(1, MAX_OFFSET + 1), false)]
    fn test_interval_validity(#[case] interval: Interval, #[case] valid: bool) {
        assert_eq!(interval.is_valid(), valid);
    }

    #[test]
    fn test_validate_intervals_reports_first_bad_index() {
        let intervals = [
            Interval::new(0, 4),
            Interval::new(8, 6),
            Interval::new(-1, 2),
        ];

        let err = validate_intervals(&intervals).unwrap_err();

        assert_eq!(
            err,
            RemapError::InvalidInterval {
                index: 1,
                interval: Interval::new(8, 6),
            }
        );
    }

    #[test]
    fn test_interval_ordering_is_by_start_then_end() {
        let mut intervals = vec![
            Interval::new(5, 9),
            Interval::new(2, 8),
            Interval::new(5, 6),
        ];
        intervals.sort();
        assert_eq!(
            intervals,
            vec![
                Interval::new(2, 8),
                Interval::new(5, 6),
                Interval::new(5, 9)
            ]
        );
    }

    #[test]
    fn test_interval_from_range_and_display() {
        let interval = Interval::from(4..7);
        assert_eq!(interval.len(), 3);
        assert!(!interval.is_empty());
        assert_eq!(interval.to_string(), "[4, 7)");
    }
}
