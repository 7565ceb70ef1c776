//! Free-time computation over a day of busy intervals.
//!
//! The calculator walks busy intervals in start order with a cursor that only
//! ever moves forward, so overlapping or nested busy blocks never produce a
//! negative-length gap.

use crate::error::{validation_error, DeskResult};
use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open time span `[start, end)` with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeInterval {
    /// Create an interval, rejecting empty or inverted spans
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> DeskResult<Self> {
        if start >= end {
            return Err(validation_error(&format!(
                "Interval start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether the interval has room for `needed`
    pub fn can_fit(&self, needed: Duration) -> bool {
        self.duration() >= needed
    }

    /// Whether the two half-open intervals share any instant
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Compute the free intervals between `reference_start` and `day_end`
///
/// Busy intervals may arrive in any order and may overlap. Busy time before
/// `reference_start` is ignored, and nothing at or after `day_end` is
/// reported. The result is sorted, non-overlapping and contains no empty
/// intervals.
pub fn compute_free_intervals(
    busy: &[TimeInterval],
    day_end: DateTime<FixedOffset>,
    reference_start: DateTime<FixedOffset>,
) -> Vec<TimeInterval> {
    let mut sorted: Vec<TimeInterval> = busy.to_vec();
    sorted.sort_by_key(|interval| interval.start);

    let mut free = Vec::new();
    let mut cursor = reference_start;

    for interval in &sorted {
        if interval.start >= day_end {
            break;
        }

        if interval.start > cursor {
            free.push(TimeInterval {
                start: cursor,
                end: interval.start,
            });
        }

        // Never move the cursor backwards
        cursor = cursor.max(interval.end);
    }

    if day_end > cursor {
        free.push(TimeInterval {
            start: cursor,
            end: day_end,
        });
    }

    free
}
