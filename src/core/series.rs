use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::core::range_format::{NiceRangeFormatter, RangeFormatter};
use crate::core::time_slice::TimeSlice;
use crate::error::{ChartError, ChartResult};
use crate::telemetry::TARGET_SELECTION;

/// OHLCV sample covering one time interval.
///
/// The engine does not enforce `low <= open, close <= high`; feeding
/// consistent samples is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStock {
    pub time: TimeSlice,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DataStock {
    #[must_use]
    pub fn new(time: TimeSlice, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            label: None,
        }
    }

    /// Builds a sample from strongly-typed time and decimal inputs.
    pub fn from_decimal(
        from: DateTime<Utc>,
        duration: TimeDelta,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> ChartResult<Self> {
        Ok(Self::new(
            TimeSlice::starting_at(from, duration),
            decimal_value(open, "open")?,
            decimal_value(high, "high")?,
            decimal_value(low, "low")?,
            decimal_value(close, "close")?,
            decimal_value(volume, "volume")?,
        ))
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sign of `close - open`.
    #[must_use]
    pub fn trend(&self) -> Trend {
        if self.close > self.open {
            Trend::Up
        } else if self.close < self.open {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}

fn decimal_value(value: Decimal, field: &str) -> ChartResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ChartError::InvalidData(format!("{field} does not fit an f64")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Stable handle of a sample inside its [`Series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(usize);

impl PointId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Value boundaries of a series over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
    /// Label step, set when the range was quantized.
    pub step: Option<f64>,
}

impl ValueRange {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            step: None,
        }
    }

    #[must_use]
    pub fn delta(&self) -> f64 {
        self.high - self.low
    }

    /// Guarantees `high > low` so that a scale factor is never zero.
    #[must_use]
    pub fn widened(self) -> Self {
        if self.high > self.low {
            return self;
        }
        let pad = if self.high == 0.0 {
            1.0
        } else {
            self.high.abs() * 0.05
        };
        Self {
            low: self.low - pad,
            high: self.high + pad,
            step: self.step,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Progress of `value` within the range, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self, value: f64) -> f64 {
        let delta = self.delta();
        if delta <= 0.0 || !delta.is_finite() {
            return 0.0;
        }
        ((value - self.low) / delta).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Node {
    data: DataStock,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Chronologically linked list of samples stored in an arena.
///
/// `earliest` and `latest` track both ends. Samples are linked in the order
/// produced by [`Series::append`] and [`Series::insert`]; the list may hold
/// overlapping or out-of-order segments, so scans skip non-matching samples
/// instead of stopping at the first one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    precision: TimeDelta,
    nodes: Vec<Node>,
    earliest: Option<usize>,
    latest: Option<usize>,
}

impl Series {
    #[must_use]
    pub fn new(name: impl Into<String>, precision: TimeDelta) -> Self {
        Self {
            name: name.into(),
            precision,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Nominal duration of one sample.
    #[must_use]
    pub fn precision(&self) -> TimeDelta {
        self.precision
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
    }

    #[must_use]
    pub fn earliest(&self) -> Option<PointId> {
        self.earliest.map(PointId)
    }

    #[must_use]
    pub fn latest(&self) -> Option<PointId> {
        self.latest.map(PointId)
    }

    #[must_use]
    pub fn get(&self, id: PointId) -> Option<&DataStock> {
        self.nodes.get(id.0).map(|node| &node.data)
    }

    /// Chronological successor of `id`.
    #[must_use]
    pub fn next(&self, id: PointId) -> Option<PointId> {
        self.nodes.get(id.0)?.next.map(PointId)
    }

    /// Chronological predecessor of `id`.
    #[must_use]
    pub fn prev(&self, id: PointId) -> Option<PointId> {
        self.nodes.get(id.0)?.prev.map(PointId)
    }

    /// Attaches `data` at the latest end.
    pub fn append(&mut self, data: DataStock) -> PointId {
        let index = self.nodes.len();
        self.nodes.push(Node {
            data,
            prev: self.latest,
            next: None,
        });
        if let Some(latest) = self.latest {
            self.nodes[latest].next = Some(index);
        }
        if self.earliest.is_none() {
            self.earliest = Some(index);
        }
        self.latest = Some(index);
        PointId(index)
    }

    /// Splices `data` after the first sample, searching backward from the
    /// latest end, that ends strictly before it.
    ///
    /// A sample ending at the same instant as an existing one is rejected and
    /// `None` is returned; the list is left untouched.
    pub fn insert(&mut self, data: DataStock) -> Option<PointId> {
        let Some(latest) = self.latest else {
            return Some(self.append(data));
        };

        let mut scan = Some(latest);
        while let Some(current) = scan {
            let current_to = self.nodes[current].data.time.to;
            if current_to == data.time.to {
                warn!(
                    target: TARGET_SELECTION,
                    series = %self.name,
                    at = %data.time,
                    "insert rejected: a sample already ends at the same instant"
                );
                return None;
            }
            if current_to < data.time.to {
                let index = self.nodes.len();
                let following = self.nodes[current].next;
                self.nodes.push(Node {
                    data,
                    prev: Some(current),
                    next: following,
                });
                match following {
                    Some(following) => self.nodes[following].prev = Some(index),
                    None => self.latest = Some(index),
                }
                self.nodes[current].next = Some(index);
                return Some(PointId(index));
            }
            scan = self.nodes[current].prev;
        }

        let index = self.nodes.len();
        let earliest = self.earliest;
        self.nodes.push(Node {
            data,
            prev: None,
            next: earliest,
        });
        if let Some(earliest) = earliest {
            self.nodes[earliest].prev = Some(index);
        }
        self.earliest = Some(index);
        Some(PointId(index))
    }

    /// Samples from the earliest to the latest.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &DataStock)> + '_ {
        let mut scan = self.earliest;
        std::iter::from_fn(move || {
            let current = scan?;
            let node = &self.nodes[current];
            scan = node.next;
            Some((PointId(current), &node.data))
        })
    }

    /// Samples from the latest to the earliest.
    pub fn iter_rev(&self) -> impl Iterator<Item = (PointId, &DataStock)> + '_ {
        let mut scan = self.latest;
        std::iter::from_fn(move || {
            let current = scan?;
            let node = &self.nodes[current];
            scan = node.prev;
            Some((PointId(current), &node.data))
        })
    }

    /// Samples whose interval strictly overlaps `window`, in chronological order.
    pub fn iter_window<'a>(
        &'a self,
        window: &'a TimeSlice,
    ) -> impl Iterator<Item = (PointId, &'a DataStock)> + 'a {
        self.iter().filter(|(_, data)| data.time.overlaps(window))
    }

    /// First sample, from the earliest end, whose interval contains `at`.
    #[must_use]
    pub fn point_at(&self, at: DateTime<Utc>) -> Option<PointId> {
        self.iter()
            .find(|(_, data)| data.time.contains(at))
            .map(|(id, _)| id)
    }

    /// Span from the earliest sample start to the latest sample end.
    ///
    /// Zero when the series is empty.
    #[must_use]
    pub fn time_slice(&self) -> TimeSlice {
        match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => TimeSlice {
                from: self.nodes[earliest].data.time.from,
                to: self.nodes[latest].data.time.to,
            },
            _ => TimeSlice::default(),
        }
    }

    /// Price boundaries over `window`, or over all samples when `window` is `None`.
    ///
    /// With `steps > 0` the result is quantized with [`NiceRangeFormatter`].
    #[must_use]
    pub fn value_range(&self, window: Option<&TimeSlice>, steps: u32) -> Option<ValueRange> {
        self.value_range_with(window, steps, &NiceRangeFormatter)
    }

    #[must_use]
    pub fn value_range_with(
        &self,
        window: Option<&TimeSlice>,
        steps: u32,
        formatter: &dyn RangeFormatter,
    ) -> Option<ValueRange> {
        let range = self.fold_range(window, |data| (data.low, data.high))?;
        Some(quantize(range, steps, formatter))
    }

    /// Volume boundaries over `window`, or over all samples when `window` is `None`.
    #[must_use]
    pub fn volume_range(&self, window: Option<&TimeSlice>, steps: u32) -> Option<ValueRange> {
        let range = self.fold_range(window, |data| (data.volume, data.volume))?;
        Some(quantize(range, steps, &NiceRangeFormatter))
    }

    fn fold_range(
        &self,
        window: Option<&TimeSlice>,
        bounds: impl Fn(&DataStock) -> (f64, f64),
    ) -> Option<ValueRange> {
        let mut folded: Option<ValueRange> = None;
        for (id, data) in self.iter_rev() {
            if window.is_some_and(|window| !data.time.overlaps(window)) {
                continue;
            }
            let (low, high) = bounds(data);
            if !low.is_finite() || !high.is_finite() {
                trace!(target: TARGET_SELECTION, point = id.index(), "non-finite sample skipped");
                continue;
            }
            folded = Some(match folded {
                Some(range) => ValueRange::new(range.low.min(low), range.high.max(high)),
                None => ValueRange::new(low, high),
            });
        }
        folded
    }
}

/// Flat ranges are widened both before and after the formatter, which may be
/// supplied by the host.
fn quantize(range: ValueRange, steps: u32, formatter: &dyn RangeFormatter) -> ValueRange {
    let range = range.widened();
    if steps == 0 {
        range
    } else {
        formatter.quantize(range.low, range.high, steps).widened()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataStock, Series, Trend};
    use crate::core::time_slice::TimeSlice;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn sample(start: i64, close: f64) -> DataStock {
        DataStock::new(
            TimeSlice::new(t(start), t(start + 1)),
            100.0,
            close.max(100.0) + 1.0,
            close.min(100.0) - 1.0,
            close,
            10.0,
        )
    }

    #[test]
    fn insert_links_in_chronological_order() {
        let mut series = Series::new("test", TimeDelta::minutes(1));
        series.append(sample(0, 101.0));
        series.append(sample(4, 102.0));
        series.insert(sample(2, 103.0)).expect("middle insert");
        series.insert(sample(-3, 99.0)).expect("tail insert");
        series.insert(sample(8, 98.0)).expect("head insert");

        let starts: Vec<_> = series.iter().map(|(_, d)| d.time.from).collect();
        assert_eq!(starts, vec![Some(t(-3)), Some(t(0)), Some(t(2)), Some(t(4)), Some(t(8))]);

        let rev: Vec<_> = series.iter_rev().map(|(_, d)| d.time.from).collect();
        assert_eq!(rev.first(), Some(&Some(t(8))));
        assert_eq!(rev.last(), Some(&Some(t(-3))));
        assert_eq!(series.time_slice(), TimeSlice::new(t(-3), t(9)));
    }

    #[test]
    fn insert_rejects_duplicate_end() {
        let mut series = Series::new("dup", TimeDelta::minutes(1));
        series.append(sample(0, 101.0));
        series.append(sample(1, 101.0));
        assert!(series.insert(sample(0, 50.0)).is_none());
        assert_eq!(series.len(), 2);
        assert_eq!(series.iter().count(), 2);
    }

    #[test]
    fn point_at_is_inclusive_and_empty_safe() {
        let mut series = Series::default();
        assert_eq!(series.point_at(t(0)), None);
        let first = series.append(sample(0, 101.0));
        series.append(sample(3, 101.0));
        assert_eq!(series.point_at(t(0)), Some(first));
        assert_eq!(series.point_at(t(1)), Some(first));
        assert_eq!(series.point_at(t(2) + TimeDelta::seconds(30)), None);
        assert_eq!(series.point_at(t(10)), None);
    }

    #[test]
    fn range_scan_skips_out_of_order_samples_without_stopping() {
        let mut series = Series::default();
        series.append(sample(0, 110.0));
        series.append(sample(30, 90.0));
        series.append(sample(1, 120.0));
        let window = TimeSlice::new(t(0), t(2));
        let range = series.value_range(Some(&window), 0).expect("range");
        assert_eq!(range.low, 99.0);
        assert_eq!(range.high, 121.0);
    }

    #[test]
    fn volume_range_and_trend() {
        let mut series = Series::default();
        assert!(series.volume_range(None, 0).is_none());
        series.append(sample(0, 101.0));
        let range = series.volume_range(None, 0).expect("range");
        assert_eq!((range.low, range.high), (9.5, 10.5));
        assert_eq!(range.widened(), range);
        assert_eq!(sample(0, 101.0).trend(), Trend::Up);
        assert_eq!(sample(0, 99.0).trend(), Trend::Down);
        assert_eq!(sample(0, 100.0).trend(), Trend::Neutral);
    }
}
