use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::chart::SeriesId;
use crate::core::{Point, PointId, ScanMask, format_time};
use crate::drawing::{
    Align, DrawContext, Drawing, DrawingBase, EventOutcome, SurfaceView, TextBox, draw_text_box,
};
use crate::interaction::{EventCapabilities, EventKind, PointerEvent};
use crate::render::{Color, RectPrimitive};
use crate::telemetry::TARGET_EVENT;

/// Pointer-follow marker over the main plot; clicking picks the hovered point.
#[derive(Debug, Clone)]
pub struct HoverDrawing {
    base: DrawingBase,
    hovered: Option<PointId>,
    /// Instant under the pointer when `hovered` was resolved.
    hovered_at: Option<DateTime<Utc>>,
}

impl HoverDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>) -> Self {
        Self {
            base: DrawingBase::new("hover", series, Color::BLACK.lighten(0.5)),
            hovered: None,
            hovered_at: None,
        }
    }

    #[must_use]
    pub fn hovered(&self) -> Option<PointId> {
        self.hovered
    }
}

impl Drawing for HoverDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        if !ctx.local {
            self.hovered = None;
            self.hovered_at = None;
            return;
        }
        let (Some(series), Some(id), Some(at)) =
            (ctx.view.drawable_series(), self.hovered, self.hovered_at)
        else {
            return;
        };
        let Some(middle) = series.get(id).and_then(|data| data.time.middle()) else {
            return;
        };

        let Some(xt) = ctx.view.x_transform() else {
            return;
        };
        let clip = ctx.view.clip;
        let x = xt.x(middle);
        ctx.frame.push_rect(RectPrimitive::filled(
            f64::from(x),
            f64::from(clip.y),
            1.0,
            f64::from(clip.height),
            self.base.main_color,
        ));

        let label = format_time(
            at,
            ScanMask::SHORTEST.label_format(at, None),
            ctx.view.model.local_zone,
        );
        let style = TextBox::new(Align::BOTTOM, 12.0, self.base.main_color)
            .with_background(Color::WHITE)
            .with_spacing(0, 1, 2);
        draw_text_box(
            ctx.frame,
            ctx.metrics,
            clip,
            &label,
            Point::new(x, clip.y + clip.height - 5),
            &style,
        );
    }

    fn capabilities(&self) -> EventCapabilities {
        EventCapabilities::from_event(EventKind::PointerMove)
            .with(EventKind::PointerLeave)
            .with(EventKind::Click)
    }

    fn on_pointer_move(&mut self, view: &SurfaceView<'_>, event: &PointerEvent) -> EventOutcome {
        let (Some(series), true) = (view.drawable_series(), view.window.is_renderable()) else {
            debug!(target: TARGET_EVENT, drawing = %self.base.name, "hover ignored: nothing to pick");
            return EventOutcome::none();
        };
        let Some(at) = view.time_at(event.position.x) else {
            return EventOutcome::none();
        };
        let Some(id) = series.point_at(at) else {
            trace!(target: TARGET_EVENT, drawing = %self.base.name, %at, "no data at this position");
            return EventOutcome::none();
        };
        if self.hovered == Some(id) {
            return EventOutcome::none();
        }
        self.hovered = Some(id);
        self.hovered_at = Some(at);
        EventOutcome::redraw_local()
    }

    fn on_pointer_leave(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        if self.hovered.take().is_none() {
            return EventOutcome::none();
        }
        self.hovered_at = None;
        EventOutcome::redraw_local()
    }

    fn on_click(&mut self, view: &SurfaceView<'_>, event: &PointerEvent) -> EventOutcome {
        let Some(id) = self.hovered else {
            return EventOutcome::none();
        };
        let selected = view.model.selected_point;
        let point = if event.modifiers.ctrl && selected == Some(id) {
            None
        } else {
            Some(id)
        };
        if point == selected {
            return EventOutcome::none();
        }
        debug!(target: TARGET_EVENT, drawing = %self.base.name, point = ?point, "point selection");
        EventOutcome {
            point_selection: Some(point),
            ..EventOutcome::none()
        }
    }
}
