use chrono::{DateTime, Datelike, Local, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::time_slice::{TimeSlice, delta_nanos};

/// Calendar granularity used to place grid lines along a time axis.
///
/// Ordered from the finest to the coarsest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScanMask {
    Second,
    Minute,
    QuarterHour,
    Hour,
    Day,
    Month,
    Year,
}

impl ScanMask {
    pub const SHORTEST: Self = Self::Second;
    pub const LONGEST: Self = Self::Year;

    const ALL: [Self; 7] = [
        Self::Second,
        Self::Minute,
        Self::QuarterHour,
        Self::Hour,
        Self::Day,
        Self::Month,
        Self::Year,
    ];

    /// Average length of one step, used to estimate scan counts.
    #[must_use]
    pub fn nominal_step(self) -> TimeDelta {
        match self {
            Self::Second => TimeDelta::seconds(1),
            Self::Minute => TimeDelta::minutes(1),
            Self::QuarterHour => TimeDelta::minutes(15),
            Self::Hour => TimeDelta::hours(1),
            Self::Day => TimeDelta::days(1),
            Self::Month => TimeDelta::days(30),
            Self::Year => TimeDelta::days(365),
        }
    }

    /// Next finer level, `None` for [`ScanMask::SHORTEST`].
    #[must_use]
    pub fn finer(self) -> Option<Self> {
        let index = Self::ALL.iter().position(|mask| *mask == self)?;
        index.checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Finest mask producing at most `max_scans` steps over `window`.
    ///
    /// Falls back to [`ScanMask::LONGEST`] for a degenerate window or when
    /// even yearly steps are too dense.
    #[must_use]
    pub fn for_window(window: &TimeSlice, max_scans: u32) -> Self {
        let Some(duration) = window.duration().filter(|d| *d > TimeDelta::zero()) else {
            return Self::LONGEST;
        };
        let total = delta_nanos(duration);
        Self::ALL
            .into_iter()
            .find(|mask| total / delta_nanos(mask.nominal_step()) <= f64::from(max_scans))
            .unwrap_or(Self::LONGEST)
    }

    /// First boundary of this mask at or after `at`.
    #[must_use]
    pub fn ceil(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let floor = self.floor(at);
        if floor == at { floor } else { self.next(floor) }
    }

    /// Last boundary of this mask at or before `at`.
    #[must_use]
    pub fn floor(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let aligned = match self {
            Self::Second => date.and_hms_opt(at.hour(), at.minute(), at.second()),
            Self::Minute => date.and_hms_opt(at.hour(), at.minute(), 0),
            Self::QuarterHour => date.and_hms_opt(at.hour(), at.minute() / 15 * 15, 0),
            Self::Hour => date.and_hms_opt(at.hour(), 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Month => {
                NaiveDate::from_ymd_opt(at.year(), at.month(), 1).and_then(|d| d.and_hms_opt(0, 0, 0))
            }
            Self::Year => NaiveDate::from_ymd_opt(at.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        aligned.map_or(at, |naive| Utc.from_utc_datetime(&naive))
    }

    /// Boundary following `at`, which must already be aligned.
    #[must_use]
    pub fn next(self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Month => at
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(at + self.nominal_step()),
            Self::Year => at
                .checked_add_months(chrono::Months::new(12))
                .unwrap_or(at + self.nominal_step()),
            _ => at + self.nominal_step(),
        }
    }

    /// Iterates over every aligned boundary inside `window`, bounds included.
    ///
    /// Yields nothing for an infinite window.
    #[must_use]
    pub fn scan(self, window: &TimeSlice) -> ScanIter {
        match (window.from, window.to) {
            (Some(from), Some(to)) if from <= to => ScanIter {
                mask: self,
                next: Some(self.ceil(from)),
                end: to,
            },
            _ => ScanIter {
                mask: self,
                next: None,
                end: DateTime::<Utc>::MIN_UTC,
            },
        }
    }

    /// `strftime` pattern for a label at `at`, shortened relative to the
    /// previously drawn label.
    #[must_use]
    pub fn label_format(self, at: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> &'static str {
        let Some(previous) = previous else {
            return match self {
                Self::Second => "%Y-%m-%d %H:%M:%S",
                Self::Minute | Self::QuarterHour | Self::Hour => "%Y-%m-%d %H:%M",
                Self::Day => "%d %b %Y",
                Self::Month => "%b %Y",
                Self::Year => "%Y",
            };
        };
        let new_year = previous.year() != at.year();
        let new_day = new_year || previous.ordinal() != at.ordinal();
        match self {
            Self::Second if new_day => "%d %b %H:%M:%S",
            Self::Second => "%H:%M:%S",
            Self::Minute | Self::QuarterHour | Self::Hour if new_day => "%d %b %H:%M",
            Self::Minute | Self::QuarterHour | Self::Hour => "%H:%M",
            Self::Day if new_year => "%d %b %Y",
            Self::Day => "%d %b",
            Self::Month if new_year => "%b %Y",
            Self::Month => "%b",
            Self::Year => "%Y",
        }
    }
}

/// Iterator returned by [`ScanMask::scan`].
#[derive(Debug, Clone)]
pub struct ScanIter {
    mask: ScanMask,
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
}

impl Iterator for ScanIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|at| *at <= self.end)?;
        let following = self.mask.next(current);
        self.next = (following > current).then_some(following);
        Some(current)
    }
}

/// Formats `at` with `pattern`, in the host local zone when `local_zone` is set.
#[must_use]
pub fn format_time(at: DateTime<Utc>, pattern: &str, local_zone: bool) -> String {
    if local_zone {
        at.with_timezone(&Local).format(pattern).to_string()
    } else {
        at.format(pattern).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::ScanMask;
    use crate::core::time_slice::TimeSlice;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn for_window_picks_finest_mask_within_budget() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let hours = TimeSlice::new(from, from + TimeDelta::hours(6));
        assert_eq!(ScanMask::for_window(&hours, 8), ScanMask::Hour);
        assert_eq!(ScanMask::for_window(&hours, 30), ScanMask::QuarterHour);
        assert_eq!(ScanMask::for_window(&hours, 0), ScanMask::LONGEST);
        assert_eq!(
            ScanMask::for_window(&TimeSlice::default(), 10),
            ScanMask::LONGEST
        );
    }

    #[test]
    fn scan_yields_aligned_boundaries_inside_window() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 10, 7, 0).unwrap();
        let window = TimeSlice::new(from, from + TimeDelta::minutes(50));
        let ticks: Vec<_> = ScanMask::QuarterHour.scan(&window).collect();
        assert_eq!(
            ticks,
            vec![
                Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 10, 45, 0).unwrap(),
            ]
        );
        assert_eq!(ScanMask::Hour.scan(&TimeSlice::unbounded()).count(), 0);
    }

    #[test]
    fn month_steps_follow_calendar() {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = TimeSlice::new(from, from + TimeDelta::days(80));
        let ticks: Vec<_> = ScanMask::Month.scan(&window).collect();
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0], Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(ticks[2], Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn label_format_shortens_after_first_label() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(ScanMask::Hour.label_format(at, None), "%Y-%m-%d %H:%M");
        let prev = at - TimeDelta::hours(1);
        assert_eq!(ScanMask::Hour.label_format(at, Some(prev)), "%H:%M");
        let yesterday = at - TimeDelta::days(1);
        assert_eq!(ScanMask::Hour.label_format(at, Some(yesterday)), "%d %b %H:%M");
        assert_eq!(ScanMask::Minute.finer(), Some(ScanMask::Second));
        assert_eq!(ScanMask::SHORTEST.finer(), None);
    }
}
