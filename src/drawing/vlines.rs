use smallvec::SmallVec;
use tracing::debug;

use crate::chart::SeriesId;
use crate::core::{Point, TimeSlice, XTransform};
use crate::drawing::{
    Align, DrawArea, DrawContext, Drawing, DrawingBase, SurfaceView, TextBox, draw_text_box,
};
use crate::render::{Color, LinePrimitive};
use crate::telemetry::TARGET_REDRAW;

/// Time-span markers: one tick under the plot per sample, with its label.
///
/// Ticks of overlapping samples are stacked upward so every span stays visible.
#[derive(Debug, Clone)]
pub struct VLinesDrawing {
    base: DrawingBase,
    follows_zone: bool,
    last_local_zone: bool,
}

impl VLinesDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, follows_zone: bool) -> Self {
        Self {
            base: DrawingBase::new("vlines", series, Color::ORANGE).with_area(DrawArea::Main),
            follows_zone,
            last_local_zone: false,
        }
    }
}

impl Drawing for VLinesDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        self.last_local_zone = ctx.view.model.local_zone;
        let area = self.base.draw_area();
        let window = *ctx.view.window;
        let (Some(series), Some(xt)) = (ctx.view.drawable_series(), XTransform::new(area, &window))
        else {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, %window, "redraw skipped: nothing to mark");
            return;
        };

        let bottom = area.y + area.height;
        let label_style = TextBox::new(Align::START | Align::BOTTOM, 8.0, self.base.main_color)
            .with_background(Color::WHITE.with_alpha(0.5))
            .with_spacing(0, 0, 0);
        let mut drawn: SmallVec<[TimeSlice; 16]> = SmallVec::new();
        for (_, data) in series.iter() {
            let (Some(from), Some(to)) = (data.time.from, data.time.to) else {
                continue;
            };
            if to <= from || to < window.from.unwrap_or(to) || from > window.to.unwrap_or(from) {
                continue;
            }

            let overlaps = drawn.iter().filter(|span| data.time.overlaps(span)).count();
            let x = xt.x(from);
            let width = (xt.x(to) - x).max(1);
            let y = bottom + 5 - 10 * i32::try_from(overlaps).unwrap_or(i32::MAX / 20);
            let yf = f64::from(y) + 0.5;
            ctx.frame.push_line(LinePrimitive::new(
                f64::from(x),
                yf,
                f64::from(x + width),
                yf,
                1.0,
                self.base.main_color,
            ));

            if let Some(label) = data.label.as_deref().filter(|label| !label.is_empty()) {
                draw_text_box(
                    ctx.frame,
                    ctx.metrics,
                    ctx.view.clip,
                    label,
                    Point::new(x, y - 1),
                    &label_style,
                );
            }
            drawn.push(data.time);
        }
    }

    fn needs_redraw(&self, view: &SurfaceView<'_>) -> bool {
        self.follows_zone && view.model.local_zone != self.last_local_zone
    }
}
