//! The stock chart: its surface stack, selection state and host entry points.

mod config;
mod model;

pub use config::ChartConfig;
pub use model::{SeriesId, SeriesStore, ViewModel};

use tracing::{debug, info, trace};

use crate::core::{DataStock, NiceRangeFormatter, PointId, RangeFormatter, Rect, Series, TimeSlice};
use crate::core::time_slice::scale_delta;
use crate::drawing::{
    BackgroundDrawing, BarsDrawing, CandlesDrawing, CursorHint, DrawArea, Drawing, EventOutcome,
    HoverDrawing, SeriesDrawing, TimeSelectorDrawing, XGridDrawing, YGridDrawing,
};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{EventKind, InputEvent, PointerEvent, RenderScheduler, WheelEvent};
use crate::render::Color;
use crate::surface::{Surface, SurfaceEnv, SurfaceKind, SurfaceProvider};
use crate::telemetry::{TARGET_EVENT, TARGET_REDRAW, TARGET_RESIZE, TARGET_SELECTION};

type TimeSelectionCallback = Box<dyn FnMut(&str, &TimeSlice)>;
type PointSelectionCallback = Box<dyn FnMut(&str, Option<&DataStock>)>;

/// Data and selection read by the surfaces.
struct ChartState {
    model: ViewModel,
    store: SeriesStore,
    config: ChartConfig,
    formatter: Box<dyn RangeFormatter>,
}

impl ChartState {
    fn env(&self) -> SurfaceEnv<'_> {
        SurfaceEnv {
            model: &self.model,
            store: &self.store,
            config: &self.config,
            formatter: self.formatter.as_ref(),
        }
    }

    fn main_name(&self) -> &str {
        self.store.main().map_or("", Series::name)
    }

    /// A zero slice selects the whole master range; anything else is
    /// clamped inside it.
    fn bounded_selection(&self, mut slice: TimeSlice) -> TimeSlice {
        if slice.is_zero() {
            return self.model.master;
        }
        self.model.master.bound_in(&mut slice);
        slice
    }

    /// `point` when it names a main-series sample centred inside the master range.
    fn checked_point(&self, point: Option<PointId>) -> Option<PointId> {
        let id = point?;
        let middle = self.store.main_point(Some(id))?.time.middle()?;
        if self.model.master.contains(middle) {
            Some(id)
        } else {
            debug!(target: TARGET_SELECTION, ?id, %middle, "point rejected: outside the master range");
            None
        }
    }
}

/// Interactive stock chart made of six stacked surfaces.
///
/// The chart is the only writer of the selection state. Surfaces repaint
/// through the renderers handed out by the [`SurfaceProvider`] at creation.
pub struct StockChart {
    id: String,
    state: ChartState,
    surfaces: Vec<Surface>,
    scheduler: RenderScheduler,
    size: Option<Rect>,
    on_time_selection_changed: Option<TimeSelectionCallback>,
    on_point_selection_changed: Option<PointSelectionCallback>,
}

impl std::fmt::Debug for StockChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockChart")
            .field("id", &self.id)
            .field("model", &self.state.model)
            .field("surfaces", &self.surfaces)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl StockChart {
    /// Builds the surface stack for `main` and selects its whole range.
    ///
    /// Fails on an empty id, an invalid config, or when the provider cannot
    /// create one of the surfaces.
    pub fn new(
        id: &str,
        provider: &mut dyn SurfaceProvider,
        main: Series,
        config: ChartConfig,
    ) -> ChartResult<Self> {
        let id = id.trim().to_lowercase();
        if id.is_empty() {
            return Err(ChartError::InvalidChartId(id));
        }
        config.validate()?;

        let main_series = Some(SeriesId::MAIN);
        let mut surfaces = Vec::with_capacity(SurfaceKind::STACK.len());
        for kind in SurfaceKind::STACK {
            let renderer = provider.create_surface(&id, kind)?;
            let mut surface = Surface::new(kind, renderer);
            let drawings: Vec<Box<dyn Drawing>> = match kind {
                SurfaceKind::Background => {
                    surface = surface.with_background(Color::WHITE);
                    Vec::new()
                }
                SurfaceKind::NavBar => vec![
                    Box::new(SeriesDrawing::new(main_series, true)),
                    Box::new(XGridDrawing::new(main_series, true, false).with_area(DrawArea::Clip)),
                ],
                SurfaceKind::TimeSelector => vec![Box::new(TimeSelectorDrawing::new(
                    main_series,
                    config.selector_handle_width_px,
                    config.selector_handle_height_px,
                ))],
                SurfaceKind::YScale => vec![Box::new(YGridDrawing::new(main_series, true))],
                SurfaceKind::Main => vec![
                    Box::new(BackgroundDrawing::new(main_series)),
                    Box::new(YGridDrawing::new(main_series, false)),
                    Box::new(XGridDrawing::new(main_series, false, true)),
                    Box::new(BarsDrawing::new(main_series)),
                    Box::new(CandlesDrawing::new(main_series, config.candle_style)),
                ],
                SurfaceKind::Hover => vec![Box::new(HoverDrawing::new(main_series))],
            };
            for drawing in drawings {
                surface.add_drawing(drawing);
            }
            surfaces.push(surface);
        }

        let master = main.time_slice();
        let mut chart = Self {
            id,
            state: ChartState {
                model: ViewModel {
                    local_zone: config.local_zone,
                    ..ViewModel::default()
                },
                store: SeriesStore::new(main),
                config,
                formatter: Box::new(NiceRangeFormatter),
            },
            surfaces,
            scheduler: RenderScheduler::default(),
            size: None,
            on_time_selection_changed: None,
            on_point_selection_changed: None,
        };
        chart.set_time_range(master, config.extend_future_ratio)?;
        info!(target: TARGET_SELECTION, chart = %chart.id, master = %chart.state.model.master, "chart created");
        Ok(chart)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn view(&self) -> &ViewModel {
        &self.state.model
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.state.config
    }

    #[must_use]
    pub fn store(&self) -> &SeriesStore {
        &self.state.store
    }

    #[must_use]
    pub fn main_series(&self) -> Option<&Series> {
        self.state.store.main()
    }

    /// Mutable access for live updates; call [`Self::set_time_range`] and a
    /// redraw once the new samples are in.
    pub fn series_mut(&mut self, id: SeriesId) -> Option<&mut Series> {
        self.state.store.get_mut(id)
    }

    /// Sample behind the point selection.
    #[must_use]
    pub fn selected_data(&self) -> Option<&DataStock> {
        self.state.store.main_point(self.state.model.selected_point)
    }

    #[must_use]
    pub fn surface(&self, kind: SurfaceKind) -> Option<&Surface> {
        self.surfaces.iter().find(|surface| surface.kind() == kind)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> + '_ {
        self.surfaces.iter()
    }

    #[must_use]
    pub fn scheduler(&self) -> RenderScheduler {
        self.scheduler
    }

    /// Lets a host mark its own paint pass, so chart redraws requested from
    /// inside it are dropped.
    pub fn scheduler_mut(&mut self) -> &mut RenderScheduler {
        &mut self.scheduler
    }

    /// Pointer shape to show over `kind`.
    #[must_use]
    pub fn cursor_hint(&self, kind: SurfaceKind) -> CursorHint {
        self.surface(kind).map(Surface::cursor_hint).unwrap_or_default()
    }

    pub fn set_range_formatter(&mut self, formatter: Box<dyn RangeFormatter>) {
        self.state.formatter = formatter;
    }

    pub fn set_on_time_selection_changed(&mut self, callback: impl FnMut(&str, &TimeSlice) + 'static) {
        self.on_time_selection_changed = Some(Box::new(callback));
    }

    pub fn set_on_point_selection_changed(
        &mut self,
        callback: impl FnMut(&str, Option<&DataStock>) + 'static,
    ) {
        self.on_point_selection_changed = Some(Box::new(callback));
    }

    /// Replaces the main series. Sub-chart series are dropped and their
    /// drawings left unbound.
    pub fn reset_main_series(&mut self, main: Series, redraw_now: bool) -> ChartResult<()> {
        for surface in &mut self.surfaces {
            surface.detach_series(SeriesId::MAIN);
        }
        let master = main.time_slice();
        self.state.store.reset_main(main);
        self.state.model.selected_point = None;
        debug!(target: TARGET_SELECTION, chart = %self.id, series = self.state.main_name(), "main series reset");
        self.set_time_range(master, self.state.config.extend_future_ratio)?;
        if redraw_now {
            self.redraw()?;
        }
        Ok(())
    }

    /// Adds `series` to the chart and `drawing` on top of the `kind` surface,
    /// bound to it and laid out over the main plot area.
    pub fn add_sub_chart(
        &mut self,
        kind: SurfaceKind,
        series: Series,
        mut drawing: Box<dyn Drawing>,
    ) -> SeriesId {
        let id = self.state.store.add(series);
        let base = drawing.base_mut();
        base.series = Some(id);
        base.area = DrawArea::Main;
        debug!(target: TARGET_REDRAW, chart = %self.id, surface = kind.id(), drawing = %base.name, "sub-chart added");
        if let Some(surface) = self.surfaces.iter_mut().find(|surface| surface.kind() == kind) {
            surface.add_drawing(drawing);
        }
        id
    }

    /// Sets the master range, extended into the future by `extend_ratio` of
    /// its duration. The selection is reset to the whole range when it was
    /// empty or no longer fits.
    pub fn set_time_range(&mut self, range: TimeSlice, extend_ratio: f64) -> ChartResult<TimeSlice> {
        let mut master = range;
        if let Some(duration) = master.duration().filter(|_| extend_ratio > 0.0) {
            master.extend_to(scale_delta(duration, extend_ratio));
        }
        self.state.model.master = master;
        debug!(target: TARGET_SELECTION, chart = %self.id, %master, "master range set");

        let selection = self.state.model.selection;
        let outside = match (selection.from, selection.to, master.from, master.to) {
            (Some(from), Some(to), Some(master_from), Some(master_to)) => {
                from < master_from || to > master_to
            }
            _ => true,
        };
        if selection.is_zero() || outside {
            self.select_time_slice(master, false)?;
        }
        Ok(master)
    }

    /// Changes the time selection, clamped into the master range. A zero
    /// slice selects the whole master range.
    pub fn select_time_slice(&mut self, slice: TimeSlice, notify: bool) -> ChartResult<TimeSlice> {
        let selection = self.state.bounded_selection(slice);
        self.state.model.selection = selection;
        debug!(target: TARGET_SELECTION, chart = %self.id, %selection, notify, "time selection");
        self.redraw_only_needs()?;
        if notify {
            self.notify_time_selection();
        }
        Ok(selection)
    }

    /// Changes the point selection. A point outside the master range clears it.
    pub fn select_point(&mut self, point: Option<PointId>, notify: bool) -> ChartResult<Option<PointId>> {
        let point = self.state.checked_point(point);
        self.state.model.selected_point = point;
        debug!(target: TARGET_SELECTION, chart = %self.id, ?point, notify, "point selection");
        self.redraw_only_needs()?;
        if notify {
            self.notify_point_selection();
        }
        Ok(point)
    }

    /// Switches time labels between UTC and the host zone.
    pub fn set_local_zone(&mut self, local_zone: bool) -> ChartResult<()> {
        self.state.model.local_zone = local_zone;
        self.redraw_only_needs()
    }

    /// Lays the surfaces out inside a `width` x `height` chart. A non
    /// positive size is ignored.
    pub fn resize(&mut self, width: i32, height: i32) -> ChartResult<()> {
        if width <= 0 || height <= 0 {
            debug!(target: TARGET_RESIZE, chart = %self.id, width, height, "resize ignored: chart not sizable");
            return Ok(());
        }
        let chart = Rect::new(0, 0, width, height);
        if self.size == Some(chart) {
            trace!(target: TARGET_RESIZE, chart = %self.id, width, height, "size unchanged");
            return Ok(());
        }
        if !self.scheduler.begin("resize") {
            return Ok(());
        }
        self.size = Some(chart);
        let env = self.state.env();
        let mut result = Ok(());
        for surface in &mut self.surfaces {
            let area = surface.kind().layout().resolve(chart, env.config);
            if let Err(err) = surface.resize(area, &env) {
                result = Err(err);
                break;
            }
        }
        self.scheduler.end();
        debug!(target: TARGET_RESIZE, chart = %self.id, width, height, "chart resized");
        result
    }

    /// Repaints every surface.
    pub fn redraw(&mut self) -> ChartResult<()> {
        if !self.scheduler.begin("redraw") {
            return Ok(());
        }
        let env = self.state.env();
        let result = self.surfaces.iter_mut().try_for_each(|surface| surface.redraw(&env));
        self.scheduler.end();
        result
    }

    /// Repaints the surfaces holding a stale drawing.
    pub fn redraw_only_needs(&mut self) -> ChartResult<()> {
        if !self.scheduler.begin("redraw_only_needs") {
            return Ok(());
        }
        let env = self.state.env();
        let mut result = Ok(());
        let mut repainted = 0_usize;
        for surface in &mut self.surfaces {
            match surface.redraw_only_needs(&env) {
                Ok(true) => repainted += 1,
                Ok(false) => {}
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.scheduler.end();
        trace!(target: TARGET_REDRAW, chart = %self.id, repainted, "redraw only needs");
        result
    }

    /// Pointer press; ignored outside the surface.
    pub fn pointer_down(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        let inside = self
            .surface(kind)
            .is_some_and(|surface| event.position.is_in(surface.clip()));
        if !inside {
            trace!(target: TARGET_EVENT, surface = kind.id(), position = ?event.position, "pointer down outside the surface");
            return Ok(());
        }
        self.handle(kind, EventKind::PointerDown, InputEvent::Pointer(event))
    }

    pub fn pointer_up(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::PointerUp, InputEvent::Pointer(event))
    }

    pub fn pointer_move(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::PointerMove, InputEvent::Pointer(event))
    }

    pub fn pointer_enter(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::PointerEnter, InputEvent::Pointer(event))
    }

    pub fn pointer_leave(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::PointerLeave, InputEvent::Pointer(event))
    }

    pub fn click(&mut self, kind: SurfaceKind, event: PointerEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::Click, InputEvent::Pointer(event))
    }

    pub fn wheel(&mut self, kind: SurfaceKind, event: WheelEvent) -> ChartResult<()> {
        self.handle(kind, EventKind::Wheel, InputEvent::Wheel(event))
    }

    /// Dispatches one event, applies the outcome, then propagates any
    /// selection change to the other surfaces and to the host.
    fn handle(&mut self, kind: SurfaceKind, event: EventKind, input: InputEvent) -> ChartResult<()> {
        let before = self.state.model;
        let Some(surface) = self.surfaces.iter_mut().find(|surface| surface.kind() == kind) else {
            return Ok(());
        };
        if !surface.capabilities().handles(event) {
            return Ok(());
        }

        let outcome: EventOutcome = surface.dispatch(event, input, &self.state.env());
        if let Some(slice) = outcome.time_selection {
            self.state.model.selection = self.state.bounded_selection(slice);
        }
        if let Some(point) = outcome.point_selection {
            self.state.model.selected_point = self.state.checked_point(point);
        }
        if outcome.local_redraw {
            surface.redraw_local(&self.state.env())?;
        }

        let selection_changed = before.selection != self.state.model.selection;
        let point_changed = before.selected_point != self.state.model.selected_point;
        if selection_changed || point_changed {
            debug!(
                target: TARGET_EVENT,
                chart = %self.id,
                surface = kind.id(),
                ?event,
                selection_changed,
                point_changed,
                "selection changed by interaction"
            );
            self.redraw_only_needs()?;
        }
        if selection_changed {
            self.notify_time_selection();
        }
        if point_changed {
            self.notify_point_selection();
        }
        Ok(())
    }

    fn notify_time_selection(&mut self) {
        if let Some(callback) = self.on_time_selection_changed.as_mut() {
            callback(self.state.main_name(), &self.state.model.selection);
        }
    }

    fn notify_point_selection(&mut self) {
        if let Some(callback) = self.on_point_selection_changed.as_mut() {
            let data = self.state.store.main_point(self.state.model.selected_point);
            callback(self.state.main_name(), data);
        }
    }
}
