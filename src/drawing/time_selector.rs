use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::chart::SeriesId;
use crate::core::{Point, Rect, TimeSlice, XTransform};
use crate::core::time_slice::scale_delta;
use crate::drawing::{CursorHint, DrawContext, Drawing, DrawingBase, EventOutcome, SurfaceView};
use crate::interaction::{EventCapabilities, EventKind, PointerEvent, SelectorDrag, WheelEvent};
use crate::render::{Color, RectPrimitive};
use crate::telemetry::TARGET_EVENT;

/// Draggable overlay over the nav bar that edits the chart time selection.
///
/// Handle drags and pans only update a local copy of the selection, committed
/// to the chart when the pointer is released or leaves the surface. Wheel
/// zooms and pans commit immediately.
#[derive(Debug, Clone)]
pub struct TimeSelectorDrawing {
    base: DrawingBase,
    drag_selection: TimeSlice,
    handle_from: Rect,
    handle_to: Rect,
    drag: SelectorDrag,
    hovering_handle: bool,
}

impl TimeSelectorDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>, handle_width: i32, handle_height: i32) -> Self {
        let handle = Rect::new(0, 0, handle_width, handle_height);
        Self {
            base: DrawingBase::new("timeselector", series, Color::BLUE.lighten(0.5)),
            drag_selection: TimeSlice::default(),
            handle_from: handle,
            handle_to: handle,
            drag: SelectorDrag::Idle,
            hovering_handle: false,
        }
    }

    /// Selection as currently edited, possibly not yet committed.
    #[must_use]
    pub fn drag_selection(&self) -> &TimeSlice {
        &self.drag_selection
    }

    #[must_use]
    pub fn drag_state(&self) -> SelectorDrag {
        self.drag
    }

    /// Whether the pointer was over a handle at the last move.
    #[must_use]
    pub fn hovering_handle(&self) -> bool {
        self.hovering_handle
    }

    #[must_use]
    pub fn handles(&self) -> (Rect, Rect) {
        (self.handle_from, self.handle_to)
    }

    /// Handle position of `at`, or `fallback` for an open bound.
    fn handle_x(xt: &XTransform, at: Option<DateTime<Utc>>, fallback: i32) -> f64 {
        f64::from(at.map_or(fallback, |at| xt.x(xt.window().bound(at))))
    }

    fn paint(&mut self, ctx: &mut DrawContext<'_, '_>) {
        let Some(xt) = ctx.view.x_transform() else {
            return;
        };
        let clip = ctx.view.clip;
        let left = Self::handle_x(&xt, self.drag_selection.from, clip.x);
        let right = Self::handle_x(&xt, self.drag_selection.to, clip.x + clip.width);
        let shade = self.base.main_color.with_alpha(0.4);
        let y = f64::from(clip.y);
        let height = f64::from(clip.height);
        let clip_end = f64::from(clip.x + clip.width);

        if left > f64::from(clip.x) {
            ctx.frame.push_rect(RectPrimitive::filled(
                f64::from(clip.x),
                y,
                left - f64::from(clip.x),
                height,
                shade,
            ));
        }
        if right < clip_end {
            ctx.frame
                .push_rect(RectPrimitive::filled(right, y, clip_end - right, height, shade));
        }

        let y_center = y + height / 2.0;
        self.handle_from = place_handle(ctx, self.handle_from, left, y_center);
        self.handle_to = place_handle(ctx, self.handle_to, right, y_center);
    }

    fn commit(&mut self, view: &SurfaceView<'_>) -> EventOutcome {
        let was_dragging = self.drag.is_dragging();
        self.drag = SelectorDrag::Idle;
        if !was_dragging || self.drag_selection == view.model.selection {
            return EventOutcome::none();
        }
        debug!(target: TARGET_EVENT, drawing = %self.base.name, selection = %self.drag_selection, "drag committed");
        EventOutcome {
            time_selection: Some(self.drag_selection),
            ..EventOutcome::none()
        }
    }

    fn over_handle(&self, position: Point) -> bool {
        position.is_in(self.handle_from) || position.is_in(self.handle_to)
    }
}

fn place_handle(ctx: &mut DrawContext<'_, '_>, handle: Rect, x_center: f64, y_center: f64) -> Rect {
    let x0 = x_center - f64::from(handle.width) / 2.0;
    let y0 = y_center - f64::from(handle.height) / 2.0;
    ctx.frame.push_rect(
        RectPrimitive::filled(
            x0,
            y0,
            f64::from(handle.width),
            f64::from(handle.height),
            Color::GRAY,
        )
        .with_border(Color::GRAY, 1.0),
    );
    Rect::new(x0 as i32, y0 as i32, handle.width, handle.height)
}

impl Drawing for TimeSelectorDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        if ctx.view.drawable_series().is_none() || !ctx.view.window.is_renderable() {
            debug!(target: TARGET_EVENT, drawing = %self.base.name, "redraw skipped: nothing to select");
            return;
        }
        if !ctx.local {
            self.drag_selection = ctx.view.model.selection;
        }
        self.paint(ctx);
    }

    fn needs_redraw(&self, view: &SurfaceView<'_>) -> bool {
        self.drag_selection != view.model.selection
    }

    fn capabilities(&self) -> EventCapabilities {
        EventCapabilities::from_event(EventKind::PointerDown)
            .with(EventKind::PointerUp)
            .with(EventKind::PointerMove)
            .with(EventKind::PointerLeave)
            .with(EventKind::Wheel)
    }

    fn cursor_hint(&self) -> CursorHint {
        match self.drag {
            SelectorDrag::DraggingLeftHandle | SelectorDrag::DraggingRightHandle => {
                CursorHint::ColumnResize
            }
            _ if self.hovering_handle => CursorHint::ColumnResize,
            _ => CursorHint::Default,
        }
    }

    fn on_pointer_down(&mut self, view: &SurfaceView<'_>, event: &PointerEvent) -> EventOutcome {
        if self.drag.is_dragging() {
            return EventOutcome::none();
        }
        let position = event.position;
        self.drag = if position.is_in(self.handle_from) {
            SelectorDrag::DraggingLeftHandle
        } else if position.is_in(self.handle_to) {
            SelectorDrag::DraggingRightHandle
        } else if position.x > self.handle_from.end().x && position.x < self.handle_to.x {
            match view.time_at(position.x) {
                Some(reference) => SelectorDrag::DraggingPan { reference },
                None => SelectorDrag::Idle,
            }
        } else {
            SelectorDrag::Idle
        };
        debug!(target: TARGET_EVENT, drawing = %self.base.name, ?position, drag = ?self.drag, "pointer down");
        EventOutcome::none()
    }

    fn on_pointer_up(&mut self, view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        self.commit(view)
    }

    fn on_pointer_leave(&mut self, view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        self.hovering_handle = false;
        self.commit(view)
    }

    fn on_pointer_move(&mut self, view: &SurfaceView<'_>, event: &PointerEvent) -> EventOutcome {
        self.hovering_handle = self.over_handle(event.position);
        if !self.drag.is_dragging() {
            return EventOutcome::none();
        }
        let Some(at) = view.time_at(event.position.x) else {
            debug!(target: TARGET_EVENT, drawing = %self.base.name, "drag ignored: infinite window");
            return EventOutcome::none();
        };
        let at = view.window.bound(at);
        let min_zoom = view.config.min_zoom();

        let changed = match self.drag {
            SelectorDrag::DraggingLeftHandle => self.drag_selection.move_from_at(at, min_zoom),
            SelectorDrag::DraggingRightHandle => self.drag_selection.move_to_at(at, min_zoom),
            SelectorDrag::DraggingPan { reference } => {
                let before = self.drag_selection;
                self.drag_selection.shift_within(at - reference, view.window);
                self.drag = SelectorDrag::DraggingPan { reference: at };
                before != self.drag_selection
            }
            SelectorDrag::Idle => false,
        };
        if changed {
            EventOutcome::redraw_local()
        } else {
            EventOutcome::none()
        }
    }

    fn on_wheel(&mut self, view: &SurfaceView<'_>, event: &WheelEvent) -> EventOutcome {
        let master = *view.window;
        let Some(duration) = self.drag_selection.duration() else {
            debug!(target: TARGET_EVENT, drawing = %self.base.name, "wheel ignored: infinite selection");
            return EventOutcome::none();
        };
        if !master.is_renderable() || view.drawable_series().is_none() {
            debug!(target: TARGET_EVENT, drawing = %self.base.name, %master, "wheel ignored: degenerate window");
            return EventOutcome::none();
        }
        let forward = if event.delta_y < 0.0 {
            true
        } else if event.delta_y > 0.0 {
            false
        } else {
            return EventOutcome::none();
        };

        let step = scale_delta(duration, view.config.wheel_step_ratio);
        let min_zoom = view.config.min_zoom();
        if event.modifiers.shift {
            let delta = if forward { step } else { -step };
            self.drag_selection.shift_within(delta, &master);
        } else if forward {
            zoom_in(&mut self.drag_selection, step, min_zoom, &master);
        } else {
            zoom_out(&mut self.drag_selection, step, &master);
        }
        debug!(
            target: TARGET_EVENT,
            drawing = %self.base.name,
            shift = event.modifiers.shift,
            delta_y = event.delta_y,
            selection = %self.drag_selection,
            "wheel"
        );

        EventOutcome {
            time_selection: (self.drag_selection != view.model.selection)
                .then_some(self.drag_selection),
            point_selection: None,
            local_redraw: true,
        }
    }
}

/// Moves `from` later by `step` without leaving less than `min_zoom`.
fn zoom_in(selection: &mut TimeSlice, step: TimeDelta, min_zoom: TimeDelta, master: &TimeSlice) {
    let (Some(from), Some(to)) = (selection.from, selection.to) else {
        return;
    };
    let target = (from + step).min(to - min_zoom).max(from);
    selection.from = Some(master.bound(target));
}

/// Moves `from` earlier by `step`, or `to` later when `from` is pinned.
fn zoom_out(selection: &mut TimeSlice, step: TimeDelta, master: &TimeSlice) {
    let Some(from) = selection.from else {
        return;
    };
    selection.extend_from(step);
    selection.from = selection.from.map(|from| master.bound(from));
    if selection.from == Some(from) {
        selection.extend_to(step);
        selection.to = selection.to.map(|to| master.bound(to));
    }
}
