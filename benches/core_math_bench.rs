use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stock_chart::chart::{ChartConfig, StockChart};
use stock_chart::core::{DataStock, Rect, Series, TimeSlice, XTransform};
use stock_chart::interaction::PointerEvent;
use stock_chart::surface::{NullSurfaceProvider, SurfaceKind};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

fn minute_series(len: i64) -> Series {
    let mut series = Series::new("bench", TimeDelta::minutes(1));
    for i in 0..len {
        let base = 100.0 + (i as f64 * 0.05).sin() * 10.0;
        let close = if i % 2 == 0 { base + 1.0 } else { base - 1.0 };
        series.append(DataStock::new(
            TimeSlice::starting_at(start() + TimeDelta::minutes(i), TimeDelta::minutes(1)),
            base,
            base.max(close) + 0.75,
            base.min(close) - 0.75,
            close,
            1_000.0 + i as f64,
        ));
    }
    series
}

fn bench_x_transform_round_trip(c: &mut Criterion) {
    let window = TimeSlice::new(start(), start() + TimeDelta::days(30));
    let xt = XTransform::new(Rect::new(0, 0, 1920, 1080), &window).expect("renderable window");
    let at = start() + TimeDelta::hours(123);

    c.bench_function("x_transform_round_trip", |b| {
        b.iter(|| {
            let x = xt.x(black_box(at));
            black_box(xt.time_at(x))
        })
    });
}

fn bench_value_range_10k(c: &mut Criterion) {
    let series = minute_series(10_000);
    let window = TimeSlice::new(
        start() + TimeDelta::minutes(2_000),
        start() + TimeDelta::minutes(6_000),
    );

    c.bench_function("value_range_10k", |b| {
        b.iter(|| black_box(series.value_range(Some(black_box(&window)), 10)))
    });
}

fn bench_point_at_10k(c: &mut Criterion) {
    let series = minute_series(10_000);
    let at = start() + TimeDelta::minutes(9_500) + TimeDelta::seconds(30);

    c.bench_function("point_at_10k", |b| {
        b.iter(|| black_box(series.point_at(black_box(at))))
    });
}

fn bench_chart_redraw_2k(c: &mut Criterion) {
    let mut chart = StockChart::new(
        "bench",
        &mut NullSurfaceProvider,
        minute_series(2_000),
        ChartConfig::default(),
    )
    .expect("chart init");
    chart.resize(1920, 1080).expect("resize");

    c.bench_function("chart_redraw_2k", |b| {
        b.iter(|| chart.redraw().expect("redraw"))
    });

    c.bench_function("chart_hover_move_2k", |b| {
        let mut x = 0;
        b.iter(|| {
            x = (x + 7) % 1_800;
            chart
                .pointer_move(SurfaceKind::Hover, PointerEvent::at(x, 200))
                .expect("pointer move");
        })
    });
}

criterion_group!(
    benches,
    bench_x_transform_round_trip,
    bench_value_range_10k,
    bench_point_at_10k,
    bench_chart_redraw_2k
);
criterion_main!(benches);
