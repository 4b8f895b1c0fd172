use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel position in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `true` when the point lies inside `rect`, edges included.
    #[must_use]
    pub fn is_in(self, rect: Rect) -> bool {
        rect.contains(self)
    }
}

/// Axis-aligned pixel rectangle.
///
/// `width`/`height` may be transiently negative while a rectangle is built from
/// two projected values; call [`Rect::flip_positive`] before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={} y={} width={} height={}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bottom-right corner.
    #[must_use]
    pub const fn end(self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    #[must_use]
    pub fn middle(self) -> Point {
        Point::new(
            self.x + (f64::from(self.width) / 2.0).round() as i32,
            self.y + (f64::from(self.height) / 2.0).round() as i32,
        )
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[must_use]
    pub fn contains(self, point: Point) -> bool {
        let end = self.end();
        point.x >= self.x && point.x <= end.x && point.y >= self.y && point.y <= end.y
    }

    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Makes width and height positive, with a minimum size of one pixel.
    pub fn flip_positive(&mut self) {
        if self.height == 0 {
            self.height = 1;
        } else if self.height < 0 {
            self.y += self.height;
            self.height = -self.height;
        }

        if self.width == 0 {
            self.width = 1;
        } else if self.width < 0 {
            self.x += self.width;
            self.width = -self.width;
        }
    }

    #[must_use]
    pub fn flipped_positive(mut self) -> Self {
        self.flip_positive();
        self
    }

    /// Relative position of `x` inside the rect, clamped to `[0, 1]`.
    ///
    /// Returns `0` for a zero-width rect.
    #[must_use]
    pub fn x_rate(self, x: i32) -> f64 {
        rate(x - self.x, self.width)
    }

    /// Relative position of `y` inside the rect, clamped to `[0, 1]`.
    #[must_use]
    pub fn y_rate(self, y: i32) -> f64 {
        rate(y - self.y, self.height)
    }

    #[must_use]
    pub fn bound_x(self, x: i32) -> i32 {
        x.clamp(self.x, self.x + self.width.max(0))
    }

    #[must_use]
    pub fn bound_y(self, y: i32) -> i32 {
        y.clamp(self.y, self.y + self.height.max(0))
    }

    /// Shrinks the rect by `dx` on the left and right and `dy` on the top and bottom.
    ///
    /// Negative values expand it. The origin never goes below zero and an
    /// over-shrunk rect collapses to zero size.
    #[must_use]
    pub fn shrink(self, dx: i32, dy: i32) -> Self {
        Self {
            x: (self.x + dx).max(0),
            y: (self.y + dy).max(0),
            width: (self.width - 2 * dx).max(0),
            height: (self.height - 2 * dy).max(0),
        }
    }

    /// Common area of two rects, `None` when they are disjoint on either axis.
    ///
    /// Rects sharing only an edge intersect with a zero-sized result.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let (self_end, other_end) = (self.end(), other.end());

        let x0 = self.x.max(other.x);
        let x1 = self_end.x.min(other_end.x);
        if x0 > x1 {
            return None;
        }

        let y0 = self.y.max(other.y);
        let y1 = self_end.y.min(other_end.y);
        if y0 > y1 {
            return None;
        }

        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Smallest rect covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let (self_end, other_end) = (self.end(), other.end());
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        Self::new(
            x0,
            y0,
            self_end.x.max(other_end.x) - x0,
            self_end.y.max(other_end.y) - y0,
        )
    }

    /// Moves the rect so that it lies inside `outer` whenever it fits.
    ///
    /// The size is preserved; a rect larger than `outer` is pinned to its origin.
    pub fn box_within(&mut self, outer: Self) {
        let outer_end = outer.end();
        if self.x + self.width > outer_end.x {
            self.x = outer_end.x - self.width;
        }
        if self.x < outer.x {
            self.x = outer.x;
        }
        if self.y + self.height > outer_end.y {
            self.y = outer_end.y - self.height;
        }
        if self.y < outer.y {
            self.y = outer.y;
        }
    }
}

fn rate(offset: i32, size: i32) -> f64 {
    if size == 0 {
        return 0.0;
    }
    (f64::from(offset) / f64::from(size)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect};

    #[test]
    fn flip_positive_normalizes_negative_and_zero_sizes() {
        let mut rect = Rect::new(10, 50, -4, -20);
        rect.flip_positive();
        assert_eq!(rect, Rect::new(6, 30, 4, 20));

        let mut degenerate = Rect::new(3, 3, 0, 0);
        degenerate.flip_positive();
        assert_eq!(degenerate, Rect::new(3, 3, 1, 1));
    }

    #[test]
    fn shrink_clamps_origin_and_size() {
        let rect = Rect::new(0, 0, 100, 60);
        assert_eq!(rect.shrink(0, 5), Rect::new(0, 5, 100, 50));
        assert_eq!(rect.shrink(-5, 0), Rect::new(0, 0, 110, 60));
        assert_eq!(rect.shrink(80, 40), Rect::new(80, 40, 0, 0));
    }

    #[test]
    fn rates_are_clamped_and_zero_for_empty_rect() {
        let rect = Rect::new(10, 10, 100, 50);
        assert_eq!(rect.x_rate(60), 0.5);
        assert_eq!(rect.x_rate(-100), 0.0);
        assert_eq!(rect.x_rate(500), 1.0);
        assert_eq!(rect.y_rate(35), 0.5);
        assert_eq!(Rect::new(0, 0, 0, 0).x_rate(5), 0.0);
    }

    #[test]
    fn intersection_of_edge_touching_rects_is_zero_width() {
        let left = Rect::new(0, 0, 10, 10);
        let right = Rect::new(10, 0, 10, 10);
        assert_eq!(left.intersect(right), Some(Rect::new(10, 0, 0, 10)));
        assert_eq!(left.intersect(Rect::new(11, 0, 5, 5)), None);
    }

    #[test]
    fn box_within_keeps_label_inside_clip() {
        let clip = Rect::new(0, 0, 200, 100);
        let mut label = Rect::new(180, -5, 40, 12);
        label.box_within(clip);
        assert_eq!(label, Rect::new(160, 0, 40, 12));
    }

    #[test]
    fn contains_is_inclusive_on_edges() {
        let rect = Rect::new(5, 5, 10, 10);
        assert!(Point::new(5, 5).is_in(rect));
        assert!(Point::new(15, 15).is_in(rect));
        assert!(!Point::new(16, 10).is_in(rect));
        assert_eq!(rect.middle(), Point::new(10, 10));
        assert_eq!(rect.bound_x(100), 15);
        assert_eq!(rect.bound_y(-3), 5);
    }
}
