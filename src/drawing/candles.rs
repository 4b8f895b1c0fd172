use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::chart::SeriesId;
use crate::core::{
    DataStock, Point, Rect, ScanMask, Trend, XTransform, YTransform, format_time,
};
use crate::drawing::{Align, DrawArea, DrawContext, Drawing, DrawingBase, SurfaceView, TextBox, draw_text_box};
use crate::render::{Color, LinePrimitive, LineStrokeStyle, RectPrimitive};
use crate::telemetry::TARGET_REDRAW;

/// Layout used for each OHLC sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawStyle {
    /// Open/close body with a high/low wick.
    #[default]
    Candle,
    /// Thin high/low bar with open and close ticks.
    Bar,
    /// Filled band from low to high.
    Area,
    /// Dashed body outline with a wick.
    Frame,
}

/// OHLC candles of a series over the displayed window.
#[derive(Debug, Clone)]
pub struct CandlesDrawing {
    base: DrawingBase,
    style: DrawStyle,
}

impl CandlesDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, style: DrawStyle) -> Self {
        Self {
            base: DrawingBase::new("candles", series, Color::BLACK.lighten(0.5))
                .with_area(DrawArea::Main),
            style,
        }
    }

    #[must_use]
    pub fn style(&self) -> DrawStyle {
        self.style
    }

    pub fn set_style(&mut self, style: DrawStyle) {
        self.style = style;
    }
}

fn trend_color(data: &DataStock) -> Color {
    match data.trend() {
        Trend::Up => Color::GREEN,
        Trend::Down => Color::RED,
        Trend::Neutral => Color::GRAY,
    }
}

fn push_clipped(ctx: &mut DrawContext<'_, '_>, area: Rect, rect: Rect, color: Color) -> bool {
    match area.intersect(rect.flipped_positive()) {
        Some(visible) if !visible.is_empty() => {
            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(visible.x),
                f64::from(visible.y),
                f64::from(visible.width),
                f64::from(visible.height),
                color,
            ));
            true
        }
        _ => false,
    }
}

/// Rectangle spanning two values, unnormalized.
fn value_span(yt: &YTransform, x: i32, width: i32, top: f64, bottom: f64) -> Rect {
    let y = yt.y(bottom);
    Rect::new(x, y, width, yt.y(top) - y)
}

impl Drawing for CandlesDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        let area = self.base.draw_area();
        let clip = ctx.view.clip;
        let window = *ctx.view.window;
        let Some(series) = ctx.view.drawable_series() else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, "redraw skipped: empty series");
            return;
        };
        let range = series.value_range_with(Some(&window), 10, ctx.view.formatter);
        let (Some(xt), Some(yt)) = (
            XTransform::new(area, &window),
            range.and_then(|range| YTransform::new(area, &range)),
        ) else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, %window, "redraw skipped: degenerate window or range");
            return;
        };

        if let Some(middle) = ctx.view.selected.and_then(|data| data.time.middle()) {
            ctx.vline(&xt, middle, area, self.base.main_color, true);
        }

        let min_body = ctx.view.config.min_body_width_px;
        let mut last: Option<(&DataStock, i32)> = None;
        for (id, data) in series.iter() {
            let (Some(from), Some(to)) = (data.time.from, data.time.to) else {
                continue;
            };
            if to <= from || !data.time.overlaps(&window) {
                continue;
            }

            let color = trend_color(data);
            let slot_x = xt.x(from);
            let slot_width = (xt.x(to) - slot_x).max(1);
            let padding = (f64::from(slot_width) * 0.1) as i32;
            let body_x = slot_x + padding;
            let body_width = slot_width - 2 * padding;
            let wick_width = padding.max(1);
            let middle_x = data.time.middle().map_or(body_x, |middle| xt.x(middle));
            let wick_x = middle_x - wick_width / 2;

            let style = if body_width <= min_body {
                DrawStyle::Bar
            } else {
                self.style
            };
            trace!(target: TARGET_REDRAW, point = id.index(), ?style, body_width, "candle");

            match style {
                DrawStyle::Candle => {
                    if body_width > 2 {
                        let body = value_span(&yt, body_x, body_width, data.open.max(data.close), data.open.min(data.close));
                        if !push_clipped(ctx, area, body, color) {
                            continue;
                        }
                    }
                    let wick = value_span(&yt, wick_x, wick_width, data.high, data.low);
                    push_clipped(ctx, area, wick, color);
                }
                DrawStyle::Bar => {
                    let wick = value_span(&yt, wick_x, wick_width, data.high, data.low);
                    if !push_clipped(ctx, area, wick, color) {
                        continue;
                    }
                    let left = f64::from(area.bound_x(body_x));
                    let right = f64::from(area.bound_x(body_x + body_width));
                    let open_y = f64::from(area.bound_y(yt.y(data.open))) + 0.5;
                    let close_y = f64::from(area.bound_y(yt.y(data.close))) + 0.5;
                    let middle = f64::from(area.bound_x(middle_x));
                    if middle > left {
                        ctx.frame.push_line(LinePrimitive::new(left, open_y, middle, open_y, 1.0, color));
                    }
                    if right > middle {
                        ctx.frame.push_line(LinePrimitive::new(middle, close_y, right, close_y, 1.0, color));
                    }
                }
                DrawStyle::Area => {
                    let band = value_span(&yt, slot_x, slot_width, data.high, data.low);
                    if !push_clipped(ctx, area, band, color.lighten(0.5)) {
                        continue;
                    }
                }
                DrawStyle::Frame => {
                    let body = value_span(&yt, body_x, body_width, data.open.max(data.close), data.open.min(data.close));
                    let Some(visible) = area.intersect(body.flipped_positive()) else {
                        continue;
                    };
                    ctx.frame.push_rect(
                        RectPrimitive::outlined(
                            f64::from(visible.x) + 0.5,
                            f64::from(visible.y) + 0.5,
                            f64::from(visible.width),
                            f64::from(visible.height),
                            color,
                            1.0,
                        )
                        .with_border_style(LineStrokeStyle::Dashed),
                    );
                    let wick = value_span(&yt, wick_x, 1, data.high, data.low);
                    push_clipped(ctx, area, wick, color);
                }
            }
            last = Some((data, body_x + body_width));
        }

        if let Some((data, end_x)) = last {
            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(end_x),
                f64::from(clip.y),
                1.0,
                f64::from(clip.height),
                self.base.main_color.lighten(0.2).with_alpha(0.5),
            ));
            if let Some(to) = data.time.to {
                let label = format_time(
                    to,
                    ScanMask::SHORTEST.label_format(to, None),
                    ctx.view.model.local_zone,
                );
                let style = TextBox::new(Align::START | Align::BOTTOM, 10.0, self.base.main_color);
                draw_text_box(
                    ctx.frame,
                    ctx.metrics,
                    clip,
                    &label,
                    Point::new(end_x + 1, clip.y + clip.height),
                    &style,
                );
            }
        }

        if !series.name().is_empty() {
            let style = TextBox::new(Align::START | Align::TOP, 14.0, self.base.main_color)
                .with_spacing(3, 0, 2);
            draw_text_box(
                ctx.frame,
                ctx.metrics,
                clip,
                series.name(),
                clip.origin(),
                &style,
            );
        }
    }

    fn needs_redraw(&self, _view: &SurfaceView<'_>) -> bool {
        true
    }
}
