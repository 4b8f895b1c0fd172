use chrono::{DateTime, Utc};

use crate::core::geometry::Rect;
use crate::core::series::ValueRange;
use crate::core::time_slice::{TimeSlice, delta_nanos};

/// Time to pixel-x mapping for one draw area and one visible window.
///
/// The factor is computed once so every point of a redraw shares the same
/// rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XTransform {
    rect: Rect,
    window: TimeSlice,
    from: DateTime<Utc>,
    factor: f64,
}

impl XTransform {
    /// Returns `None` when `window` is infinite or has no duration.
    #[must_use]
    pub fn new(rect: Rect, window: &TimeSlice) -> Option<Self> {
        if !window.is_renderable() {
            return None;
        }
        let from = window.from?;
        let duration = delta_nanos(window.duration()?);
        Some(Self {
            rect,
            window: *window,
            from,
            factor: f64::from(rect.width) / duration,
        })
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn window(&self) -> &TimeSlice {
        &self.window
    }

    /// Pixels per second.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor * 1e9
    }

    #[must_use]
    pub fn x(&self, at: DateTime<Utc>) -> i32 {
        self.rect.x + (self.factor * delta_nanos(at - self.from)).round() as i32
    }

    /// Instant under pixel `x`, clamped to the window.
    #[must_use]
    pub fn time_at(&self, x: i32) -> DateTime<Utc> {
        self.window
            .what_time(self.rect.x_rate(x))
            .unwrap_or(self.from)
    }
}

/// Value to pixel-y mapping; y grows downward while values grow upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YTransform {
    rect: Rect,
    range: ValueRange,
    factor: f64,
}

impl YTransform {
    /// Returns `None` for an empty or non-finite range.
    #[must_use]
    pub fn new(rect: Rect, range: &ValueRange) -> Option<Self> {
        let delta = range.delta();
        if !delta.is_finite() || delta <= 0.0 || !range.low.is_finite() {
            return None;
        }
        Some(Self {
            rect,
            range: *range,
            factor: f64::from(rect.height) / delta,
        })
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[must_use]
    pub fn range(&self) -> &ValueRange {
        &self.range
    }

    #[must_use]
    pub fn y(&self, value: f64) -> i32 {
        self.rect.y + self.rect.height - (self.factor * (value - self.range.low)).round() as i32
    }

    #[must_use]
    pub fn value_at(&self, y: i32) -> f64 {
        self.range.low + f64::from(self.rect.y + self.rect.height - y) / self.factor
    }
}

#[cfg(test)]
mod tests {
    use super::{XTransform, YTransform};
    use crate::core::geometry::Rect;
    use crate::core::series::ValueRange;
    use crate::core::time_slice::TimeSlice;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn x_maps_window_bounds_to_rect_edges() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = TimeSlice::new(from, from + TimeDelta::hours(1));
        let xt = XTransform::new(Rect::new(10, 0, 600, 100), &window).expect("renderable");
        assert_eq!(xt.x(from), 10);
        assert_eq!(xt.x(from + TimeDelta::minutes(30)), 310);
        assert_eq!(xt.x(from + TimeDelta::hours(1)), 610);
        assert_eq!(xt.time_at(310), from + TimeDelta::minutes(30));
    }

    #[test]
    fn degenerate_inputs_have_no_transform() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rect = Rect::new(0, 0, 100, 100);
        assert!(XTransform::new(rect, &TimeSlice::new(at, at)).is_none());
        assert!(XTransform::new(rect, &TimeSlice::default()).is_none());
        assert!(YTransform::new(rect, &ValueRange::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn y_is_inverted() {
        let yt = YTransform::new(Rect::new(0, 20, 100, 200), &ValueRange::new(0.0, 100.0))
            .expect("valid range");
        assert_eq!(yt.y(0.0), 220);
        assert_eq!(yt.y(100.0), 20);
        assert_eq!(yt.y(25.0), 170);
        assert_eq!(yt.value_at(170), 25.0);
    }
}
