use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use stock_chart::chart::{ChartConfig, SeriesId, StockChart};
use stock_chart::core::{DataStock, RangeFormatter, Rect, Series, TimeSlice, ValueRange};
use stock_chart::drawing::{CursorHint, DrawArea, VLinesDrawing};
use stock_chart::interaction::{Modifiers, PointerEvent, WheelEvent};
use stock_chart::render::{DrawCommand, RenderFrame, Renderer};
use stock_chart::surface::{RecordingSurfaceProvider, SurfaceKind, SurfaceProvider};
use stock_chart::{ChartError, ChartResult};

fn t(hours: f64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + TimeDelta::seconds((hours * 3600.0) as i64)
}

fn hourly_series(len: usize) -> Series {
    let mut series = Series::new("ACME", TimeDelta::hours(1));
    for i in 0..len {
        let base = 100.0 + i as f64;
        series.append(DataStock::new(
            TimeSlice::starting_at(t(i as f64), TimeDelta::hours(1)),
            base,
            base + 3.0,
            base - 2.0,
            base + 1.0,
            1_000.0 + i as f64,
        ));
    }
    series
}

/// Ten hourly samples, a master range of eleven hours, laid out in 800x400.
fn sized_chart(provider: &mut RecordingSurfaceProvider) -> StockChart {
    let mut chart = StockChart::new("Test", provider, hourly_series(10), ChartConfig::default())
        .expect("chart init");
    chart.resize(800, 400).expect("resize");
    chart
}

fn texts(commands: &[DrawCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn resize_redraws_each_surface_exactly_once() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = StockChart::new("c", &mut provider, hourly_series(10), ChartConfig::default())
        .expect("chart init");
    chart.resize(400, 200).expect("first resize");
    provider.clear();

    chart.resize(800, 400).expect("second resize");
    for kind in SurfaceKind::STACK {
        assert_eq!(provider.frame_count(kind), 1, "surface {}", kind.id());
    }

    let main = chart.surface(SurfaceKind::Main).expect("main surface");
    assert_eq!(main.area(), Rect::new(0, 0, 720, 327));
    let candles = main
        .drawings()
        .find(|drawing| drawing.base().name == "candles")
        .expect("candles drawing");
    assert_eq!(candles.base().draw_area(), DrawArea::Main.resolve(main.clip()));
    assert_eq!(
        chart.surface(SurfaceKind::NavBar).map(|surface| surface.area()),
        Some(Rect::new(0, 330, 720, 70))
    );

    provider.clear();
    chart.resize(800, 400).expect("same size");
    chart.resize(0, 300).expect("degenerate size");
    assert_eq!(provider.frame_count(SurfaceKind::Main), 0);
}

/// Backend that refuses surfaces without area, like an image-backed canvas.
struct StrictRenderer;

impl Renderer for StrictRenderer {
    fn render(&mut self, _frame: &RenderFrame) -> ChartResult<()> {
        Ok(())
    }

    fn resize(&mut self, width: i32, height: i32) -> ChartResult<()> {
        if width <= 0 || height <= 0 {
            return Err(ChartError::InvalidViewport { width, height });
        }
        Ok(())
    }
}

struct StrictCanvas;

impl SurfaceProvider for StrictCanvas {
    fn create_surface(&mut self, _chart_id: &str, _kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>> {
        Ok(Box::new(StrictRenderer))
    }
}

#[test]
fn short_chart_collapses_plot_surfaces_without_error() {
    let mut chart = StockChart::new("short", &mut StrictCanvas, hourly_series(10), ChartConfig::default())
        .expect("chart init");
    chart.resize(300, 50).expect("short chart");
    for surface in chart.surfaces() {
        let area = surface.area();
        assert!(area.width >= 0 && area.height >= 0, "surface {}: {area:?}", surface.kind().id());
        assert!(area.y >= 0 && area.y + area.height <= 50, "surface {}: {area:?}", surface.kind().id());
    }
    chart.resize(800, 400).expect("grown back");
    assert_eq!(
        chart.surface(SurfaceKind::Main).map(|surface| surface.area()),
        Some(Rect::new(0, 0, 720, 327))
    );

    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = StockChart::new("short", &mut provider, hourly_series(10), ChartConfig::default())
        .expect("chart init");
    chart.resize(300, 50).expect("short chart");
    assert_eq!(provider.frame_count(SurfaceKind::Background), 1);
    assert_eq!(provider.frame_count(SurfaceKind::NavBar), 1);
    assert_eq!(provider.frame_count(SurfaceKind::Main), 0);
    assert_eq!(provider.frame_count(SurfaceKind::Hover), 0);
}

/// Host quantizer that keeps the bounds it is given.
struct PassThroughFormatter;

impl RangeFormatter for PassThroughFormatter {
    fn quantize(&self, low: f64, high: f64, steps: u32) -> ValueRange {
        ValueRange {
            low,
            high,
            step: Some((high - low) / f64::from(steps.max(1))),
        }
    }

    fn format(&self, value: f64, _step: Option<f64>) -> String {
        format!("{value:.2}")
    }
}

#[test]
fn flat_series_still_paints_with_host_formatter() {
    let mut series = Series::new("FLAT", TimeDelta::hours(1));
    for i in 0..6 {
        series.append(DataStock::new(
            TimeSlice::starting_at(t(f64::from(i)), TimeDelta::hours(1)),
            100.0,
            100.0,
            100.0,
            100.0,
            500.0,
        ));
    }
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = StockChart::new("flat", &mut provider, series, ChartConfig::default())
        .expect("chart init");
    chart.set_range_formatter(Box::new(PassThroughFormatter));
    chart.resize(800, 400).expect("resize");

    let nav_paths = provider
        .last_commands(SurfaceKind::NavBar)
        .iter()
        .filter(|command| matches!(command, DrawCommand::Path(_)))
        .count();
    assert!(nav_paths > 0);
    let main_rects = provider
        .last_commands(SurfaceKind::Main)
        .iter()
        .filter(|command| matches!(command, DrawCommand::Rect(_)))
        .count();
    assert!(main_rects >= 6);
}

#[test]
fn construction_fails_on_invalid_input() {
    let mut provider = RecordingSurfaceProvider::new();
    let blank = StockChart::new("", &mut provider, hourly_series(2), ChartConfig::default());
    assert!(matches!(blank, Err(ChartError::InvalidChartId(_))));

    let config = ChartConfig::default().with_wheel_step_ratio(1.5);
    let invalid = StockChart::new("c", &mut provider, hourly_series(2), config);
    assert!(matches!(invalid, Err(ChartError::InvalidConfig(_))));

    struct NoHoverCanvas;
    impl SurfaceProvider for NoHoverCanvas {
        fn create_surface(&mut self, chart_id: &str, kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>> {
            if kind == SurfaceKind::Hover {
                return Err(ChartError::SurfaceUnavailable {
                    surface: format!("{chart_id}-{}", kind.id()),
                    reason: "no 2d context".to_owned(),
                });
            }
            Ok(Box::new(stock_chart::render::NullRenderer::default()))
        }
    }
    let missing = StockChart::new("c", &mut NoHoverCanvas, hourly_series(2), ChartConfig::default());
    assert!(matches!(missing, Err(ChartError::SurfaceUnavailable { .. })));
}

#[test]
fn empty_series_paints_placeholder() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = StockChart::new(
        "empty",
        &mut provider,
        Series::new("none", TimeDelta::minutes(1)),
        ChartConfig::default(),
    )
    .expect("chart init");
    assert!(chart.view().master.is_zero());
    chart.resize(800, 400).expect("resize");

    let main = texts(&provider.last_commands(SurfaceKind::Main));
    assert!(main.iter().any(|text| text == "no data"));
    chart.wheel(SurfaceKind::TimeSelector, WheelEvent::new(-1.0)).expect("wheel");
    assert!(chart.view().selection.is_zero());
}

#[test]
fn handle_drag_commits_on_release() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    chart.set_on_time_selection_changed(move |name, slice| {
        sink.borrow_mut().push((name.to_owned(), *slice));
    });
    let master = chart.view().master;
    assert_eq!(master, TimeSlice::new(t(0.0), t(11.0)));

    let kind = SurfaceKind::TimeSelector;
    chart.pointer_move(kind, PointerEvent::at(1, 35)).expect("hover handle");
    assert_eq!(chart.cursor_hint(kind), CursorHint::ColumnResize);

    // Past `to - min_zoom`: the guard keeps the selection.
    chart.pointer_down(kind, PointerEvent::at(1, 35)).expect("down");
    chart.pointer_move(kind, PointerEvent::at(719, 35)).expect("move");
    chart.pointer_up(kind, PointerEvent::at(719, 35)).expect("up");
    assert_eq!(chart.view().selection, master);
    assert!(changes.borrow().is_empty());

    chart.pointer_down(kind, PointerEvent::at(1, 35)).expect("down");
    chart.pointer_move(kind, PointerEvent::at(360, 35)).expect("move");
    assert_eq!(chart.view().selection, master, "drag is local until release");
    chart.pointer_up(kind, PointerEvent::at(360, 35)).expect("up");

    let expected = TimeSlice::new(t(5.5), t(11.0));
    assert_eq!(chart.view().selection, expected);
    assert_eq!(changes.borrow().as_slice(), &[("ACME".to_owned(), expected)]);
    assert_eq!(chart.cursor_hint(kind), CursorHint::Default);
}

#[test]
fn pan_drag_stays_inside_master() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    let selection = chart
        .select_time_slice(TimeSlice::new(t(2.0), t(4.0)), false)
        .expect("select");
    assert_eq!(selection, TimeSlice::new(t(2.0), t(4.0)));

    // Selection spans pixels ~131..262 of the 720 px nav bar.
    let kind = SurfaceKind::TimeSelector;
    chart.pointer_down(kind, PointerEvent::at(200, 35)).expect("down");
    chart.pointer_move(kind, PointerEvent::at(5_000, 35)).expect("move far right");
    chart.pointer_leave(kind, PointerEvent::at(5_000, 35)).expect("leave commits");

    let selection = chart.view().selection;
    assert_eq!(selection.to, chart.view().master.to);
    assert_eq!(selection.duration(), Some(TimeDelta::hours(2)));
}

#[test]
fn wheel_zooms_and_shifts_within_master() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    let master = chart.view().master;
    let kind = SurfaceKind::TimeSelector;

    chart.wheel(kind, WheelEvent::new(-1.0)).expect("zoom in");
    let zoomed = chart.view().selection;
    assert_eq!(zoomed, TimeSlice::new(t(2.2), t(11.0)));

    chart.wheel(kind, WheelEvent::new(3.0)).expect("zoom out");
    let widened = chart.view().selection;
    assert!(widened.duration() > zoomed.duration());
    assert_eq!(widened.to, master.to);

    chart
        .wheel(kind, WheelEvent::new(2.0).with_modifiers(Modifiers::SHIFT))
        .expect("shift back");
    let shifted = chart.view().selection;
    assert_eq!(shifted.duration(), widened.duration());
    assert!(shifted.from >= master.from);
    assert!(shifted.from < widened.from);

    chart.wheel(kind, WheelEvent::new(0.0)).expect("no-op");
    assert_eq!(chart.view().selection, shifted);
}

#[test]
fn hover_then_click_selects_the_point() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    let picked = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&picked);
    chart.set_on_point_selection_changed(move |name, data| {
        sink.borrow_mut().push((name.to_owned(), data.map(|data| data.open)));
    });
    provider.clear();

    // 164 px of 720 over eleven hours lands in the third sample.
    chart.pointer_move(SurfaceKind::Hover, PointerEvent::at(164, 100)).expect("move");
    assert_eq!(provider.frame_count(SurfaceKind::Hover), 1);
    assert!(texts(&provider.last_commands(SurfaceKind::Hover))
        .iter()
        .any(|label| label.starts_with("2024-03-04 02:30")));

    chart.click(SurfaceKind::Hover, PointerEvent::at(164, 100)).expect("click");
    assert_eq!(chart.selected_data().map(|data| data.open), Some(102.0));
    assert_eq!(picked.borrow().as_slice(), &[("ACME".to_owned(), Some(102.0))]);
    assert_eq!(provider.frame_count(SurfaceKind::NavBar), 1);

    chart
        .click(SurfaceKind::Hover, PointerEvent::at(164, 100).with_modifiers(Modifiers::CTRL))
        .expect("ctrl click");
    assert!(chart.view().selected_point.is_none());
    assert_eq!(picked.borrow().len(), 2);

    chart.pointer_leave(SurfaceKind::Hover, PointerEvent::at(-1, -1)).expect("leave");
    assert_eq!(provider.frame_count(SurfaceKind::Hover), 2);
}

#[test]
fn hover_marker_lines_up_with_selected_candle_marker() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);

    // The third sample's middle falls at 163.6 px, between two pixels.
    chart.pointer_move(SurfaceKind::Hover, PointerEvent::at(164, 100)).expect("move");
    let hover_x = provider
        .last_commands(SurfaceKind::Hover)
        .iter()
        .find_map(|command| match command {
            DrawCommand::Rect(rect) if rect.width == 1.0 => Some(rect.x),
            _ => None,
        })
        .expect("hover marker");

    chart.click(SurfaceKind::Hover, PointerEvent::at(164, 100)).expect("click");
    let candle_x = provider
        .last_commands(SurfaceKind::Main)
        .iter()
        .find_map(|command| match command {
            DrawCommand::Line(line) if line.x1 == line.x2 => Some(line.x1),
            _ => None,
        })
        .expect("selected point marker");

    assert_eq!(hover_x, 164.0);
    assert_eq!(candle_x, hover_x + 0.5);
}

#[test]
fn point_outside_master_is_rejected() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    let last = chart.main_series().and_then(Series::latest).expect("latest");

    assert_eq!(chart.select_point(Some(last), false).expect("select"), Some(last));
    chart
        .set_time_range(TimeSlice::new(t(0.0), t(3.0)), 0.0)
        .expect("narrow range");
    assert_eq!(chart.select_point(Some(last), false).expect("select"), None);
    assert_eq!(chart.view().selection, TimeSlice::new(t(0.0), t(3.0)));
}

#[test]
fn reentrant_redraw_is_dropped() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);
    provider.clear();

    assert!(chart.scheduler_mut().begin("host paint"));
    chart.redraw().expect("dropped redraw");
    assert_eq!(provider.frame_count(SurfaceKind::Main), 0);
    assert_eq!(chart.scheduler().dropped_requests(), 1);
    chart.scheduler_mut().end();

    chart.redraw().expect("redraw");
    for kind in SurfaceKind::STACK {
        assert_eq!(provider.frame_count(kind), 1);
    }
}

#[test]
fn sub_chart_draws_then_detaches_on_reset() {
    let mut provider = RecordingSurfaceProvider::new();
    let mut chart = sized_chart(&mut provider);

    let mut marks = Series::new("events", TimeDelta::hours(1));
    marks.append(
        DataStock::new(TimeSlice::new(t(3.0), t(5.0)), 0.0, 0.0, 0.0, 0.0, 0.0).with_label("split"),
    );
    let id = chart.add_sub_chart(
        SurfaceKind::Main,
        marks,
        Box::new(VLinesDrawing::new(None, true)),
    );
    assert_ne!(id, SeriesId::MAIN);
    chart.redraw().expect("redraw");
    assert!(texts(&provider.last_commands(SurfaceKind::Main)).contains(&"split".to_owned()));

    provider.clear();
    chart.set_local_zone(true).expect("local zone");
    assert!(chart.view().local_zone);
    assert_eq!(provider.frame_count(SurfaceKind::Main), 1);

    chart.reset_main_series(hourly_series(4), true).expect("reset");
    assert_eq!(chart.store().len(), 1);
    let vlines = chart
        .surface(SurfaceKind::Main)
        .and_then(|surface| surface.drawings().find(|drawing| drawing.base().name == "vlines"))
        .expect("vlines kept");
    assert_eq!(vlines.base().series, None);
    assert!(!texts(&provider.last_commands(SurfaceKind::Main)).contains(&"split".to_owned()));
    assert_eq!(chart.view().master, TimeSlice::new(t(0.0), t(4.4)));
}
