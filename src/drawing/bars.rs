use tracing::debug;

use crate::chart::SeriesId;
use crate::core::{Rect, TimeSlice, XTransform, YTransform};
use crate::drawing::{DrawArea, DrawContext, Drawing, DrawingBase, SurfaceView};
use crate::render::{Color, RectPrimitive};
use crate::telemetry::TARGET_REDRAW;

/// Volume bars drawn in a band at the bottom of the main plot.
#[derive(Debug, Clone)]
pub struct BarsDrawing {
    base: DrawingBase,
    last_selection: Option<TimeSlice>,
}

impl BarsDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>) -> Self {
        Self {
            base: DrawingBase::new("bars", series, Color::GRAY).with_area(DrawArea::VolumeBand),
            last_selection: None,
        }
    }
}

impl Drawing for BarsDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        self.last_selection = Some(ctx.view.model.selection);
        let area = self.base.draw_area();
        let window = *ctx.view.window;
        let Some(series) = ctx.view.drawable_series() else {
            return;
        };
        let Some(range) = series.volume_range(Some(&window), 0) else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, "redraw skipped: no volume in window");
            return;
        };
        let (Some(xt), Some(yt)) = (XTransform::new(area, &window), YTransform::new(area, &range))
        else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, %window, "redraw skipped: degenerate window or range");
            return;
        };

        let color = self.base.main_color.lighten(0.7);
        let baseline = yt.y(range.low);
        for (_, data) in series.iter() {
            let (Some(from), Some(to)) = (data.time.from, data.time.to) else {
                continue;
            };
            if to <= from || !data.time.overlaps(&window) {
                continue;
            }
            let slot_x = xt.x(from);
            let slot_width = (xt.x(to) - slot_x).max(1);
            let padding = (f64::from(slot_width) * 0.1) as i32;
            let bar = Rect::new(
                slot_x + padding,
                baseline,
                slot_width - 2 * padding,
                yt.y(data.volume) - baseline,
            )
            .flipped_positive();
            let Some(visible) = area.intersect(bar).filter(|rect| !rect.is_empty()) else {
                continue;
            };
            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(visible.x),
                f64::from(visible.y),
                f64::from(visible.width),
                f64::from(visible.height),
                color,
            ));
        }
    }

    fn needs_redraw(&self, view: &SurfaceView<'_>) -> bool {
        self.last_selection != Some(view.model.selection)
    }
}
