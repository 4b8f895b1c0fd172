use tracing::debug;

use crate::chart::SeriesId;
use crate::core::{TimeSlice, XTransform, YTransform};
use crate::drawing::{DrawArea, DrawContext, Drawing, DrawingBase, SurfaceView};
use crate::render::{Color, PathPrimitive};
use crate::telemetry::TARGET_REDRAW;

/// Close-price polyline, optionally filled down to the bottom of the surface.
///
/// Used for the nav bar overview and for line sub-charts.
#[derive(Debug, Clone)]
pub struct SeriesDrawing {
    base: DrawingBase,
    fill: bool,
    /// Interval of the selected sample at the last redraw.
    last_selected: Option<TimeSlice>,
}

impl SeriesDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, fill: bool) -> Self {
        Self {
            base: DrawingBase::new("series", series, Color::BLUE.lighten(0.5))
                .with_area(DrawArea::NavBar),
            fill,
            last_selected: None,
        }
    }

    #[must_use]
    pub fn with_area(mut self, area: DrawArea) -> Self {
        self.base.area = area;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.base.main_color = color;
        self
    }
}

impl Drawing for SeriesDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        self.last_selected = ctx.view.selected.map(|data| data.time);
        let area = self.base.draw_area();
        let clip = ctx.view.clip;
        let window = *ctx.view.window;
        let Some(series) = ctx.view.drawable_series() else {
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

        let mut points: Vec<(f64, f64)> = Vec::new();
        for (_, data) in series.iter_window(&window) {
            let (Some(from), Some(to)) = (data.time.from, data.time.to) else {
                continue;
            };
            if points.is_empty() {
                points.push((f64::from(xt.x(from)), f64::from(yt.y(data.open))));
            }
            points.push((f64::from(xt.x(to)), f64::from(yt.y(data.close))));
        }
        if points.len() < 2 {
            return;
        }

        let stroke_width = if self.fill { 3.0 } else { 2.0 };
        if self.fill {
            let bottom = f64::from(clip.y + clip.height);
            let mut area_points = points.clone();
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                area_points.push((last.0, bottom));
                area_points.push((first.0, bottom));
            }
            ctx.frame.push_path(
                PathPrimitive::stroked(area_points, 0.5, self.base.main_color.lighten(0.8))
                    .with_fill(self.base.main_color.lighten(0.8)),
            );
        }
        ctx.frame
            .push_path(PathPrimitive::stroked(points, stroke_width, self.base.main_color));
    }

    fn needs_redraw(&self, view: &SurfaceView<'_>) -> bool {
        self.last_selected != view.selected.map(|data| data.time)
    }
}
