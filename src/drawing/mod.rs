//! Renderable, optionally interactive units stacked on a surface.
//!
//! A drawing paints into the frame of its surface and may answer pointer and
//! wheel events. It never mutates the chart selection directly: handlers
//! return an [`EventOutcome`] that the chart applies.

mod background;
mod bars;
mod candles;
mod grid;
mod hover;
mod series_line;
mod text_box;
mod time_selector;
mod vlines;

pub use background::BackgroundDrawing;
pub use bars::BarsDrawing;
pub use candles::{CandlesDrawing, DrawStyle};
pub use grid::{XGridDrawing, YGridDrawing};
pub use hover::HoverDrawing;
pub use series_line::SeriesDrawing;
pub use text_box::{Align, TextBox, draw_text_box};
pub use time_selector::TimeSelectorDrawing;
pub use vlines::VLinesDrawing;

use chrono::{DateTime, Utc};

use crate::chart::{ChartConfig, SeriesId, ViewModel};
use crate::core::{DataStock, PointId, RangeFormatter, Rect, Series, TimeSlice, XTransform};
use crate::interaction::{EventCapabilities, PointerEvent, WheelEvent};
use crate::render::{Color, LinePrimitive, RenderFrame, Renderer};

/// How a drawing derives its draw area from the surface clip rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawArea {
    /// The whole clip rectangle.
    #[default]
    Clip,
    /// Clip shrunk by 5 px vertically with a 15 px footer for date labels.
    Main,
    /// Clip minus a 5 px top band, for the nav bar series.
    NavBar,
    /// A band of 15% of the main area sitting above the footer.
    VolumeBand,
}

impl DrawArea {
    #[must_use]
    pub fn resolve(self, clip: Rect) -> Rect {
        match self {
            Self::Clip => clip,
            Self::Main => {
                let mut area = clip.shrink(0, 5);
                area.height = (area.height - 15).max(0);
                area
            }
            Self::NavBar => Rect::new(clip.x, clip.y + 5, clip.width, (clip.height - 5).max(0)),
            Self::VolumeBand => {
                let area = clip.shrink(0, 5);
                let height = (f64::from(area.height) * 0.15) as i32;
                Rect::new(area.x, area.y + area.height - height - 15, area.width, height)
            }
        }
    }
}

/// State every drawing carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingBase {
    pub name: String,
    pub main_color: Color,
    /// Series drawn; `None` once a sub-chart has been detached.
    pub series: Option<SeriesId>,
    pub area: DrawArea,
    draw_area: Rect,
}

impl DrawingBase {
    #[must_use]
    pub fn new(name: impl Into<String>, series: Option<SeriesId>, main_color: Color) -> Self {
        Self {
            name: name.into(),
            main_color,
            series,
            area: DrawArea::Clip,
            draw_area: Rect::default(),
        }
    }

    #[must_use]
    pub fn with_area(mut self, area: DrawArea) -> Self {
        self.area = area;
        self
    }

    /// Area computed at the last layout pass.
    #[must_use]
    pub fn draw_area(&self) -> Rect {
        self.draw_area
    }

    /// Recomputes the draw area for a new clip rectangle.
    pub fn layout(&mut self, clip: Rect) {
        self.draw_area = self.area.resolve(clip);
    }
}

/// Read-only view of the chart as seen from one surface.
#[derive(Clone, Copy)]
pub struct SurfaceView<'a> {
    pub clip: Rect,
    /// Window displayed by the surface: the master range or the selection.
    pub window: &'a TimeSlice,
    pub model: &'a ViewModel,
    /// Series bound to the drawing being served.
    pub series: Option<&'a Series>,
    /// Sample behind `model.selected_point`.
    pub selected: Option<&'a DataStock>,
    pub config: &'a ChartConfig,
    pub formatter: &'a dyn RangeFormatter,
}

impl<'a> SurfaceView<'a> {
    /// Series to draw, `None` when missing or empty.
    #[must_use]
    pub fn drawable_series(&self) -> Option<&'a Series> {
        self.series.filter(|series| !series.is_empty())
    }

    /// Instant under pixel `x` of the clip rectangle.
    #[must_use]
    pub fn time_at(&self, x: i32) -> Option<DateTime<Utc>> {
        self.x_transform().map(|xt| xt.time_at(x))
    }

    /// Time mapping over the whole clip rectangle.
    #[must_use]
    pub fn x_transform(&self) -> Option<XTransform> {
        XTransform::new(self.clip, self.window)
    }
}

/// Paint target handed to [`Drawing::redraw`].
pub struct DrawContext<'a, 'f> {
    pub view: SurfaceView<'a>,
    pub frame: &'f mut RenderFrame,
    /// Text metrics of the surface backend.
    pub metrics: &'f dyn Renderer,
    /// `true` when only this surface repaints after a local interaction.
    pub local: bool,
}

impl DrawContext<'_, '_> {
    /// Vertical 1 px line at `at`, across the clip rectangle when `full`,
    /// else across `area`. Returns the x position, `None` when `at` is out of
    /// the window.
    pub fn vline(
        &mut self,
        xt: &XTransform,
        at: DateTime<Utc>,
        area: Rect,
        color: Color,
        full: bool,
    ) -> Option<i32> {
        if !self.view.window.contains(at) {
            return None;
        }
        let x = xt.x(at);
        let span = if full { self.view.clip } else { area };
        let xf = f64::from(x) + 0.5;
        self.frame.push_line(LinePrimitive::new(
            xf,
            f64::from(span.y),
            xf,
            f64::from(span.y + span.height),
            1.0,
            color,
        ));
        Some(x)
    }
}

/// Selection changes requested by an event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    /// New chart time selection.
    pub time_selection: Option<TimeSlice>,
    /// New chart point selection; `Some(None)` clears it.
    pub point_selection: Option<Option<PointId>>,
    /// Repaint the dispatching surface right away.
    pub local_redraw: bool,
}

impl EventOutcome {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            time_selection: None,
            point_selection: None,
            local_redraw: false,
        }
    }

    #[must_use]
    pub const fn redraw_local() -> Self {
        Self {
            local_redraw: true,
            ..Self::none()
        }
    }

    /// Folds `later` over `self`; later requests win.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            time_selection: later.time_selection.or(self.time_selection),
            point_selection: later.point_selection.or(self.point_selection),
            local_redraw: self.local_redraw || later.local_redraw,
        }
    }
}

/// Pointer shape suggested to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    ColumnResize,
}

/// Common contract of every concrete drawing.
///
/// Only `redraw` is mandatory. Event handlers are opt-in: a drawing lists the
/// ones it implements in [`Drawing::capabilities`] so the surface subscribes
/// to exactly those events.
pub trait Drawing {
    fn base(&self) -> &DrawingBase;

    fn base_mut(&mut self) -> &mut DrawingBase;

    /// Paints into a frame already cleared by the surface.
    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>);

    /// Whether the current chart state differs from the state last painted.
    fn needs_redraw(&self, _view: &SurfaceView<'_>) -> bool {
        false
    }

    fn capabilities(&self) -> EventCapabilities {
        EventCapabilities::none()
    }

    fn cursor_hint(&self) -> CursorHint {
        CursorHint::Default
    }

    fn on_pointer_down(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_pointer_up(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_pointer_move(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_pointer_enter(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_pointer_leave(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_click(&mut self, _view: &SurfaceView<'_>, _event: &PointerEvent) -> EventOutcome {
        EventOutcome::none()
    }

    fn on_wheel(&mut self, _view: &SurfaceView<'_>, _event: &WheelEvent) -> EventOutcome {
        EventOutcome::none()
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawArea, EventOutcome};
    use crate::core::{DataStock, Rect, Series, TimeSlice};
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn draw_areas_follow_chart_layout() {
        let clip = Rect::new(0, 0, 720, 327);
        assert_eq!(DrawArea::Clip.resolve(clip), clip);
        assert_eq!(DrawArea::Main.resolve(clip), Rect::new(0, 5, 720, 302));
        assert_eq!(DrawArea::NavBar.resolve(clip), Rect::new(0, 5, 720, 322));
        assert_eq!(DrawArea::VolumeBand.resolve(clip), Rect::new(0, 245, 720, 47));
    }

    #[test]
    fn later_outcome_wins_but_local_redraw_accumulates() {
        let from = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut series = Series::new("s", TimeDelta::hours(1));
        let id = series.append(DataStock::new(
            TimeSlice::starting_at(from, TimeDelta::hours(1)),
            1.0,
            2.0,
            0.5,
            1.5,
            10.0,
        ));
        let first = EventOutcome {
            point_selection: Some(None),
            local_redraw: true,
            ..EventOutcome::none()
        };
        let second = EventOutcome {
            point_selection: Some(Some(id)),
            ..EventOutcome::none()
        };
        let merged = first.merge(second);
        assert!(merged.local_redraw);
        assert_eq!(merged.point_selection, Some(Some(id)));
    }
}
