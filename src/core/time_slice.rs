use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an instant relative to a time slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePosition {
    Before,
    In,
    After,
}

/// Result of comparing two time slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceComparison {
    Equal,
    Different,
}

/// Interval of time `[from, to]`.
///
/// A `None` bound means "no bound" on that side, which makes the slice
/// infinite. The default value has no bounds at all and is considered zero,
/// which the chart reads as "no selection".
///
/// The type never fails: ratios and projections computed from a zero or
/// infinite slice return sentinel values. Callers must check
/// [`TimeSlice::is_renderable`] before turning them into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeSlice {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            Some(from) => write!(f, "[{}", from.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, "[-inf")?,
        }
        match self.to {
            Some(to) => write!(f, " .. {}]", to.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, " .. +inf]"),
        }
    }
}

impl TimeSlice {
    /// Builds a finite slice, swapping the bounds when given in reverse order.
    #[must_use]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    #[must_use]
    pub fn starting_at(from: DateTime<Utc>, duration: TimeDelta) -> Self {
        Self::new(from, from + duration)
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        self.from.is_none() || self.to.is_none()
    }

    /// Length of the slice, `None` when infinite.
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.to? - self.from?)
    }

    /// `true` for a finite slice with a strictly positive duration.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.duration().is_some_and(|d| d > TimeDelta::zero())
    }

    #[must_use]
    pub fn middle(&self) -> Option<DateTime<Utc>> {
        let from = self.from?;
        Some(from + scale_delta(self.duration()?, 0.5))
    }

    #[must_use]
    pub fn where_is(&self, at: DateTime<Utc>) -> TimePosition {
        if self.from.is_some_and(|from| at < from) {
            TimePosition::Before
        } else if self.to.is_some_and(|to| at > to) {
            TimePosition::After
        } else {
            TimePosition::In
        }
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.where_is(at) == TimePosition::In
    }

    /// Strict overlap: slices sharing only a boundary instant do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let starts_before_other_ends = match (self.from, other.to) {
            (Some(from), Some(to)) => from < to,
            _ => true,
        };
        let ends_after_other_starts = match (self.to, other.from) {
            (Some(to), Some(from)) => to > from,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    #[must_use]
    pub fn compare(&self, other: &Self) -> SliceComparison {
        if self == other {
            SliceComparison::Equal
        } else {
            SliceComparison::Different
        }
    }

    /// Ratio of `at` within the slice, clamped to `[0, 1]`.
    ///
    /// Returns `0` when the slice is not renderable.
    #[must_use]
    pub fn progress(&self, at: DateTime<Utc>) -> f64 {
        let (Some(from), Some(duration)) = (self.from, self.duration()) else {
            return 0.0;
        };
        let total = delta_nanos(duration);
        if total <= 0.0 {
            return 0.0;
        }
        (delta_nanos(at - from) / total).clamp(0.0, 1.0)
    }

    /// Inverse of [`TimeSlice::progress`]: the instant at `ratio` of the slice.
    ///
    /// Returns `None` for an infinite slice.
    #[must_use]
    pub fn what_time(&self, ratio: f64) -> Option<DateTime<Utc>> {
        let from = self.from?;
        let duration = self.duration()?;
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(from + scale_delta(duration, ratio))
    }

    /// `at` clamped to the existing bounds of the slice.
    #[must_use]
    pub fn bound(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let mut bounded = at;
        if let Some(from) = self.from {
            bounded = bounded.max(from);
        }
        if let Some(to) = self.to {
            bounded = bounded.min(to);
        }
        bounded
    }

    /// Clamps both bounds of `other` inside this slice.
    pub fn bound_in(&self, other: &mut Self) {
        other.from = Some(match other.from {
            Some(from) => self.bound(from),
            None => match self.from {
                Some(from) => from,
                None => return,
            },
        });
        other.to = Some(match other.to {
            Some(to) => self.bound(to),
            None => match self.to {
                Some(to) => to,
                None => return,
            },
        });
    }

    /// Moves `from` earlier by `delta`; a negative delta shrinks the slice.
    pub fn extend_from(&mut self, delta: TimeDelta) {
        if let Some(from) = self.from {
            self.from = Some(from - delta);
        }
    }

    /// Moves `to` later by `delta`; a negative delta shrinks the slice.
    pub fn extend_to(&mut self, delta: TimeDelta) {
        if let Some(to) = self.to {
            self.to = Some(to + delta);
        }
    }

    /// Translates the slice by `delta` while keeping it inside `bounds`.
    ///
    /// A slice longer than `bounds` ends up equal to `bounds`. Infinite
    /// slices are left untouched.
    pub fn shift_within(&mut self, delta: TimeDelta, bounds: &Self) {
        let (Some(from), Some(to)) = (self.from, self.to) else {
            return;
        };
        let duration = to - from;
        let mut from = from + delta;
        let mut to = to + delta;

        if let Some(lower) = bounds.from
            && from < lower
        {
            from = lower;
            to = lower + duration;
        }
        if let Some(upper) = bounds.to
            && to > upper
        {
            to = upper;
            from = upper - duration;
        }
        if let Some(lower) = bounds.from
            && from < lower
        {
            from = lower;
        }

        self.from = Some(from);
        self.to = Some(to);
    }

    /// Relocates `from` at `at` unless it would leave less than `min_width`
    /// before `to`. Returns `true` when the slice changed.
    pub fn move_from_at(&mut self, at: DateTime<Utc>, min_width: TimeDelta) -> bool {
        let Some(to) = self.to else {
            self.from = Some(at);
            return true;
        };
        if at < to - min_width {
            let changed = self.from != Some(at);
            self.from = Some(at);
            return changed;
        }
        false
    }

    /// Relocates `to` at `at` unless it would leave less than `min_width`
    /// after `from`. Returns `true` when the slice changed.
    pub fn move_to_at(&mut self, at: DateTime<Utc>, min_width: TimeDelta) -> bool {
        let Some(from) = self.from else {
            self.to = Some(at);
            return true;
        };
        if at > from + min_width {
            let changed = self.to != Some(at);
            self.to = Some(at);
            return changed;
        }
        false
    }
}

/// Duration as floating nanoseconds, saturating to milliseconds precision for
/// spans that do not fit an `i64` of nanoseconds.
#[must_use]
pub fn delta_nanos(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64,
        None => delta.num_milliseconds() as f64 * 1_000_000.0,
    }
}

/// `delta * ratio`, rounded to the nanosecond.
#[must_use]
pub fn scale_delta(delta: TimeDelta, ratio: f64) -> TimeDelta {
    let nanos = (delta_nanos(delta) * ratio).round();
    if nanos.abs() < i64::MAX as f64 {
        TimeDelta::nanoseconds(nanos as i64)
    } else {
        TimeDelta::milliseconds((nanos / 1_000_000.0) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::{SliceComparison, TimePosition, TimeSlice, scale_delta};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    #[test]
    fn default_slice_is_zero_and_not_renderable() {
        let slice = TimeSlice::default();
        assert!(slice.is_zero());
        assert!(slice.is_infinite());
        assert_eq!(slice.duration(), None);
        assert_eq!(slice.progress(t(3)), 0.0);
        assert_eq!(slice.what_time(0.5), None);
    }

    #[test]
    fn zero_duration_slice_is_not_renderable() {
        let slice = TimeSlice::new(t(5), t(5));
        assert!(!slice.is_renderable());
        assert_eq!(slice.progress(t(5)), 0.0);
    }

    #[test]
    fn progress_and_what_time_are_inverse() {
        let slice = TimeSlice::new(t(0), t(100));
        assert_eq!(slice.progress(t(25)), 0.25);
        assert_eq!(slice.what_time(0.25), Some(t(25)));
        assert_eq!(slice.progress(t(-10)), 0.0);
        assert_eq!(slice.progress(t(500)), 1.0);
    }

    #[test]
    fn where_is_is_inclusive() {
        let slice = TimeSlice::new(t(0), t(10));
        assert_eq!(slice.where_is(t(0)), TimePosition::In);
        assert_eq!(slice.where_is(t(10)), TimePosition::In);
        assert_eq!(slice.where_is(t(-1)), TimePosition::Before);
        assert_eq!(slice.where_is(t(11)), TimePosition::After);
    }

    #[test]
    fn overlap_excludes_shared_boundary() {
        let a = TimeSlice::new(t(0), t(10));
        assert!(a.overlaps(&TimeSlice::new(t(5), t(15))));
        assert!(!a.overlaps(&TimeSlice::new(t(10), t(15))));
        assert!(a.overlaps(&TimeSlice::unbounded()));
        assert_eq!(a.compare(&a), SliceComparison::Equal);
        assert_eq!(
            a.compare(&TimeSlice::new(t(0), t(11))),
            SliceComparison::Different
        );
    }

    #[test]
    fn shift_within_clamps_to_bounds_keeping_duration() {
        let bounds = TimeSlice::new(t(0), t(100));
        let mut slice = TimeSlice::new(t(80), t(90));
        slice.shift_within(TimeDelta::minutes(30), &bounds);
        assert_eq!(slice, TimeSlice::new(t(90), t(100)));

        slice.shift_within(TimeDelta::minutes(-200), &bounds);
        assert_eq!(slice, TimeSlice::new(t(0), t(10)));
    }

    #[test]
    fn move_bounds_respect_min_width_guard() {
        let mut slice = TimeSlice::new(t(0), t(60));
        let guard = TimeDelta::minutes(5);
        assert!(!slice.move_from_at(t(56), guard));
        assert!(!slice.move_from_at(t(55), guard));
        assert!(slice.move_from_at(t(54), guard));
        assert_eq!(slice.from, Some(t(54)));

        assert!(!slice.move_to_at(t(59), guard));
        assert!(slice.move_to_at(t(70), guard));
        assert_eq!(slice.to, Some(t(70)));
    }

    #[test]
    fn bound_in_clamps_other_slice() {
        let master = TimeSlice::new(t(0), t(100));
        let mut sel = TimeSlice::new(t(-20), t(50));
        master.bound_in(&mut sel);
        assert_eq!(sel, TimeSlice::new(t(0), t(50)));
    }

    #[test]
    fn extend_grows_or_shrinks_one_bound() {
        let mut slice = TimeSlice::new(t(10), t(20));
        slice.extend_from(TimeDelta::minutes(5));
        slice.extend_to(TimeDelta::minutes(-2));
        assert_eq!(slice, TimeSlice::new(t(5), t(18)));
        assert_eq!(scale_delta(TimeDelta::minutes(10), 0.2), TimeDelta::minutes(2));
        assert_eq!(slice.middle(), Some(t(5) + TimeDelta::seconds(390)));
    }
}
