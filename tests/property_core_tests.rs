use approx::assert_abs_diff_eq;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use stock_chart::core::{DataStock, Rect, Series, TimeSlice, ValueRange, XTransform};

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn contiguous_series(spans: &[(i64, f64, f64, f64)]) -> Series {
    let mut series = Series::new("prop", TimeDelta::minutes(1));
    let mut from = epoch();
    for &(minutes, low, spread, volume) in spans {
        let to = from + TimeDelta::minutes(minutes);
        series.append(DataStock::new(
            TimeSlice::new(from, to),
            low + spread / 2.0,
            low + spread,
            low,
            low + spread / 3.0,
            volume,
        ));
        from = to;
    }
    series
}

proptest! {
    #[test]
    fn window_bounds_land_on_rect_edges(
        start in -1_000_000i64..1_000_000,
        length in 1i64..10_000_000,
        x in -2_000i32..2_000,
        width in 1i32..4_000,
    ) {
        let from = epoch() + TimeDelta::seconds(start);
        let window = TimeSlice::new(from, from + TimeDelta::seconds(length));
        let rect = Rect::new(x, 0, width, 100);
        let xt = XTransform::new(rect, &window).expect("renderable window");

        prop_assert_eq!(xt.x(from), rect.x);
        prop_assert_eq!(xt.x(from + TimeDelta::seconds(length)), rect.x + rect.width);
    }

    #[test]
    fn what_time_inverts_progress(
        length in 1i64..100_000_000,
        ratio in 0.0f64..=1.0,
        width in 1i32..4_000,
    ) {
        let window = TimeSlice::new(epoch(), epoch() + TimeDelta::seconds(length));
        let at = window.what_time(ratio).expect("finite window");
        let back = window.progress(at);
        // Within one pixel of the widest surface.
        prop_assert!((back - ratio).abs() * f64::from(width) <= 1.0);
    }

    #[test]
    fn value_range_matches_brute_force(
        spans in prop::collection::vec((1i64..120, -500.0f64..500.0, 0.0f64..100.0, 0.0f64..1e6), 1..60),
    ) {
        let series = contiguous_series(&spans);
        let range = series.value_range(None, 0).expect("non empty series");

        let low = spans.iter().map(|s| s.1).fold(f64::INFINITY, f64::min);
        let high = spans.iter().map(|s| s.1 + s.2).fold(f64::NEG_INFINITY, f64::max);
        let expected = ValueRange::new(low, high).widened();
        assert_abs_diff_eq!(range.low, expected.low, epsilon = 1e-9);
        assert_abs_diff_eq!(range.high, expected.high, epsilon = 1e-9);
        prop_assert!(range.high > range.low);
    }

    #[test]
    fn point_at_middle_finds_the_point(
        spans in prop::collection::vec((1i64..120, 0.0f64..100.0, 0.0f64..10.0, 0.0f64..10.0), 1..40),
    ) {
        let series = contiguous_series(&spans);
        for (id, data) in series.iter() {
            let middle = data.time.middle().expect("finite sample");
            prop_assert_eq!(series.point_at(middle), Some(id));
        }
        let span = series.time_slice();
        let before = span.from.expect("from") - TimeDelta::seconds(1);
        let after = span.to.expect("to") + TimeDelta::seconds(1);
        prop_assert_eq!(series.point_at(before), None);
        prop_assert_eq!(series.point_at(after), None);
    }

    #[test]
    fn handle_drags_keep_min_zoom(
        length in 600i64..100_000,
        target in -200_000i64..200_000,
        min_zoom in 1i64..600,
        left in any::<bool>(),
    ) {
        let min_zoom = TimeDelta::seconds(min_zoom);
        let mut selection = TimeSlice::new(epoch(), epoch() + TimeDelta::seconds(length));
        let at = epoch() + TimeDelta::seconds(target);
        if left {
            selection.move_from_at(at, min_zoom);
        } else {
            selection.move_to_at(at, min_zoom);
        }
        prop_assert!(selection.duration().expect("finite") >= min_zoom);
    }

    #[test]
    fn intersection_is_commutative_and_detects_disjoint_rects(
        a in (-500i32..500, -500i32..500, 0i32..400, 0i32..400),
        b in (-500i32..500, -500i32..500, 0i32..400, 0i32..400),
    ) {
        let a = Rect::new(a.0, a.1, a.2, a.3);
        let b = Rect::new(b.0, b.1, b.2, b.3);
        prop_assert_eq!(a.intersect(b), b.intersect(a));

        let disjoint_x = a.x + a.width < b.x || b.x + b.width < a.x;
        let disjoint_y = a.y + a.height < b.y || b.y + b.height < a.y;
        prop_assert_eq!(a.intersect(b).is_none(), disjoint_x || disjoint_y);
    }
}
