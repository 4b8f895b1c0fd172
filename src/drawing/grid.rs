use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::chart::SeriesId;
use crate::core::{ScanMask, Series, ValueRange, XTransform, format_time};
use crate::drawing::{DrawArea, DrawContext, Drawing, DrawingBase, SurfaceView};
use crate::render::{Color, RectPrimitive, TextHAlign, TextPrimitive, TextVAlign};
use crate::telemetry::TARGET_REDRAW;

/// Minimum horizontal room per main grid label.
const MIN_X_STEP_WIDTH_PX: i32 = 100;
const Y_GRID_STEPS: u32 = 10;
const Y_SCALE_TICK_PX: f64 = 10.0;

/// Vertical time grid with date labels.
#[derive(Debug, Clone)]
pub struct XGridDrawing {
    base: DrawingBase,
    /// Full-height lines; otherwise short ticks at the bottom.
    full_grid: bool,
    /// Repaint whenever the chart selection is applied.
    follows_selection: bool,
}

impl XGridDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, full_grid: bool, follows_selection: bool) -> Self {
        Self {
            base: DrawingBase::new("xgrid", series, Color::GRAY).with_area(DrawArea::Main),
            full_grid,
            follows_selection,
        }
    }

    #[must_use]
    pub fn with_area(mut self, area: DrawArea) -> Self {
        self.base.area = area;
        self
    }
}

impl Drawing for XGridDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        let area = self.base.draw_area();
        let window = *ctx.view.window;
        let (Some(_), Some(xt)) = (ctx.view.drawable_series(), XTransform::new(area, &window))
        else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, %window, "redraw skipped: nothing to scan");
            return;
        };

        let max_scans = u32::try_from(area.width / MIN_X_STEP_WIDTH_PX).unwrap_or(0);
        let mask = ScanMask::for_window(&window, max_scans);
        trace!(target: TARGET_REDRAW, drawing = %self.base.name, ?mask, "x grid scan");

        let second_color = self.base.main_color.lighten(0.5).with_alpha(0.4);
        let main_color = if self.full_grid {
            self.base.main_color.with_alpha(0.4)
        } else {
            second_color
        };
        let label_color = self.base.main_color.darken(0.5);
        let bottom = f64::from(area.y + area.height);

        // the secondary grid goes first so the main grid covers it
        if let Some(finer) = mask.finer() {
            let height = if self.full_grid {
                f64::from(area.height)
            } else {
                10.0
            };
            for at in finer.scan(&window) {
                ctx.frame.push_rect(RectPrimitive::filled(
                    f64::from(xt.x(at)),
                    bottom - height,
                    1.0,
                    height,
                    second_color,
                ));
            }
        }

        let mut last_label_end = i32::MIN;
        let mut previous: Option<DateTime<Utc>> = None;
        for at in mask.scan(&window) {
            let x = xt.x(at);
            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(x),
                f64::from(area.y),
                1.0,
                f64::from(area.height),
                main_color,
            ));

            if x + 2 > last_label_end {
                let label = format_time(at, mask.label_format(at, previous), ctx.view.model.local_zone);
                let width = ctx.metrics.measure_text(&label, 10.0).ceil() as i32;
                ctx.frame.push_text(TextPrimitive::new(
                    label,
                    f64::from(x + 2),
                    bottom - 1.0,
                    10.0,
                    label_color,
                    TextHAlign::Left,
                ));
                last_label_end = x + 2 + width;
            }
            previous = Some(at);
        }
    }

    fn needs_redraw(&self, _view: &SurfaceView<'_>) -> bool {
        self.follows_selection
    }
}

/// Horizontal value grid, optionally with the price scale labels.
#[derive(Debug, Clone)]
pub struct YGridDrawing {
    base: DrawingBase,
    scale: bool,
    last_range: Option<ValueRange>,
}

impl YGridDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, scale: bool) -> Self {
        Self {
            base: DrawingBase::new("ygrid", series, Color::GRAY.lighten(0.85))
                .with_area(DrawArea::Main),
            scale,
            last_range: None,
        }
    }

    fn current_range(view: &SurfaceView<'_>, series: &Series) -> Option<ValueRange> {
        series.value_range_with(Some(&view.model.selection), Y_GRID_STEPS, view.formatter)
    }
}

impl Drawing for YGridDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        let area = self.base.draw_area();
        let range = ctx
            .view
            .drawable_series()
            .filter(|_| ctx.view.window.is_renderable())
            .and_then(|series| Self::current_range(&ctx.view, series));
        self.last_range = range;
        let Some(range) = range else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, "redraw skipped: no value range");
            return;
        };
        let Some(step) = range.step.filter(|step| *step > 0.0 && step.is_finite()) else {
            return;
        };

        let width = if self.scale {
            Y_SCALE_TICK_PX
        } else {
            f64::from(area.width)
        };
        let label_color = Color::GRAY.darken(0.5);
        let count = (range.delta() / step).round() as i64;
        for index in 0..=count.max(0) {
            let value = range.high - index as f64 * step;
            let y = f64::from(area.y + area.height) - range.progress(value) * f64::from(area.height);
            let y = f64::from(area.bound_y(y as i32));

            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(area.x),
                y,
                width,
                1.0,
                self.base.main_color,
            ));
            if self.scale {
                ctx.frame.push_text(
                    TextPrimitive::new(
                        ctx.view.formatter.format(value, range.step),
                        f64::from(area.x) + Y_SCALE_TICK_PX + 2.0,
                        y + 1.0,
                        12.0,
                        label_color,
                        TextHAlign::Left,
                    )
                    .with_v_align(TextVAlign::Middle),
                );
            }
        }
    }

    fn needs_redraw(&self, view: &SurfaceView<'_>) -> bool {
        let current = view
            .drawable_series()
            .filter(|_| view.window.is_renderable())
            .and_then(|series| Self::current_range(view, series));
        current != self.last_range
    }
}
