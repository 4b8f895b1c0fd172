//! Stacked drawing surfaces of a chart.
//!
//! Each surface owns one renderer and an ordered list of drawings. A full
//! redraw clears the surface and replays every drawing, so the same chart
//! state always yields the same frame.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::chart::{ChartConfig, SeriesId, SeriesStore, ViewModel};
use crate::core::{RangeFormatter, Rect};
use crate::drawing::{CursorHint, DrawContext, Drawing, EventOutcome, SurfaceView};
use crate::error::ChartResult;
use crate::interaction::{EventCapabilities, EventKind, InputEvent};
use crate::render::{
    Color, DrawCommand, NullRenderer, RecordingRenderer, RectPrimitive, RenderFrame, Renderer,
};
use crate::telemetry::{TARGET_EVENT, TARGET_REDRAW, TARGET_RESIZE};

/// Role of a surface in the chart stack, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceKind {
    Background,
    NavBar,
    TimeSelector,
    YScale,
    Main,
    Hover,
}

impl SurfaceKind {
    /// Paint order of the chart surfaces.
    pub const STACK: [Self; 6] = [
        Self::Background,
        Self::NavBar,
        Self::TimeSelector,
        Self::YScale,
        Self::Main,
        Self::Hover,
    ];

    /// Stable identifier, also used by hosts to name the backing canvas.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Background => "0-bg",
            Self::NavBar => "1-navbar",
            Self::TimeSelector => "2-timeselector",
            Self::YScale => "3-yscale",
            Self::Main => "4-chart",
            Self::Hover => "5-hover",
        }
    }

    #[must_use]
    pub const fn layout(self) -> SurfaceLayout {
        match self {
            Self::Background => SurfaceLayout::Full,
            Self::NavBar | Self::TimeSelector => SurfaceLayout::NavBar,
            Self::YScale => SurfaceLayout::YScale,
            Self::Main | Self::Hover => SurfaceLayout::Graph,
        }
    }

    /// Time window displayed by the surface.
    #[must_use]
    pub const fn window_source(self) -> WindowSource {
        match self {
            Self::Background | Self::NavBar | Self::TimeSelector => WindowSource::Master,
            Self::YScale | Self::Main | Self::Hover => WindowSource::Selection,
        }
    }
}

/// Which chart time slice a surface displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    Master,
    Selection,
}

/// Placement of a surface inside the chart rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLayout {
    Full,
    /// Bottom band left of the y-scale.
    NavBar,
    /// Right column above the nav bar.
    YScale,
    /// Main plot area.
    Graph,
}

impl SurfaceLayout {
    #[must_use]
    pub fn resolve(self, chart: Rect, config: &ChartConfig) -> Rect {
        // Bands never exceed the chart, so small charts collapse to empty rects.
        let nav = config.nav_height_px.clamp(0, chart.height.max(0));
        let scale = config.yscale_width_px.clamp(0, chart.width.max(0));
        let plot_width = chart.width - scale;
        let plot_height = (chart.height - nav - config.layout_margin_px).max(0);
        match self {
            Self::Full => chart,
            Self::NavBar => Rect::new(chart.x, chart.y + chart.height - nav, plot_width, nav),
            Self::YScale => Rect::new(chart.x + plot_width, chart.y, scale, plot_height),
            Self::Graph => Rect::new(chart.x, chart.y, plot_width, plot_height),
        }
    }
}

/// Chart state a surface reads while painting or dispatching.
#[derive(Clone, Copy)]
pub struct SurfaceEnv<'a> {
    pub model: &'a ViewModel,
    pub store: &'a SeriesStore,
    pub config: &'a ChartConfig,
    pub formatter: &'a dyn RangeFormatter,
}

impl<'a> SurfaceEnv<'a> {
    fn view(&self, clip: Rect, source: WindowSource, series: Option<SeriesId>) -> SurfaceView<'a> {
        SurfaceView {
            clip,
            window: self.model.window(source),
            model: self.model,
            series: series.and_then(|id| self.store.get(id)),
            selected: self.store.main_point(self.model.selected_point),
            config: self.config,
            formatter: self.formatter,
        }
    }
}

/// One layer of the chart: a renderer plus the drawings painted on it.
pub struct Surface {
    kind: SurfaceKind,
    /// Position inside the chart rectangle.
    area: Rect,
    /// Local paint rectangle, always anchored at the origin.
    clip: Rect,
    background: Option<Color>,
    drawings: Vec<Box<dyn Drawing>>,
    capabilities: EventCapabilities,
    renderer: Box<dyn Renderer>,
    redraw_count: u64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("kind", &self.kind)
            .field("area", &self.area)
            .field("drawings", &self.drawings.len())
            .field("capabilities", &self.capabilities)
            .field("redraw_count", &self.redraw_count)
            .finish_non_exhaustive()
    }
}

impl Surface {
    #[must_use]
    pub fn new(kind: SurfaceKind, renderer: Box<dyn Renderer>) -> Self {
        Self {
            kind,
            area: Rect::default(),
            clip: Rect::default(),
            background: None,
            drawings: Vec::new(),
            capabilities: EventCapabilities::none(),
            renderer,
            redraw_count: 0,
        }
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    #[must_use]
    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Events at least one drawing of the surface handles.
    #[must_use]
    pub fn capabilities(&self) -> EventCapabilities {
        self.capabilities
    }

    /// Number of full or local paint passes sent to the renderer.
    #[must_use]
    pub fn redraw_count(&self) -> u64 {
        self.redraw_count
    }

    pub fn drawings(&self) -> impl Iterator<Item = &dyn Drawing> + '_ {
        self.drawings.iter().map(AsRef::as_ref)
    }

    /// Appends a drawing on top of the existing ones.
    pub fn add_drawing(&mut self, mut drawing: Box<dyn Drawing>) {
        drawing.base_mut().layout(self.clip);
        self.capabilities = self.capabilities.union(drawing.capabilities());
        trace!(
            target: TARGET_EVENT,
            surface = self.kind.id(),
            drawing = %drawing.base().name,
            capabilities = self.capabilities.bits(),
            "drawing added"
        );
        self.drawings.push(drawing);
    }

    /// Unbinds every drawing from series other than `keep`.
    pub fn detach_series(&mut self, keep: SeriesId) {
        for drawing in &mut self.drawings {
            let base = drawing.base_mut();
            if base.series.is_some_and(|id| id != keep) {
                base.series = None;
            }
        }
    }

    /// First non-default pointer shape asked by a drawing.
    #[must_use]
    pub fn cursor_hint(&self) -> CursorHint {
        self.drawings
            .iter()
            .map(|drawing| drawing.cursor_hint())
            .find(|hint| *hint != CursorHint::Default)
            .unwrap_or_default()
    }

    /// Moves the surface to `area`; returns `false` when nothing changed.
    ///
    /// A real change relayouts every drawing and repaints the surface once.
    pub fn resize(&mut self, area: Rect, env: &SurfaceEnv<'_>) -> ChartResult<bool> {
        if area == self.area {
            trace!(target: TARGET_RESIZE, surface = self.kind.id(), ?area, "size unchanged");
            return Ok(false);
        }
        self.area = area;
        self.clip = Rect::new(0, 0, area.width.max(0), area.height.max(0));
        for drawing in &mut self.drawings {
            drawing.base_mut().layout(self.clip);
        }
        if self.clip.is_empty() {
            debug!(target: TARGET_RESIZE, surface = self.kind.id(), ?area, "surface collapsed, backend left as is");
            return Ok(true);
        }
        self.renderer.resize(area.width, area.height)?;
        debug!(target: TARGET_RESIZE, surface = self.kind.id(), ?area, "surface resized");
        self.redraw(env)?;
        Ok(true)
    }

    /// Clears the surface and repaints every drawing.
    pub fn redraw(&mut self, env: &SurfaceEnv<'_>) -> ChartResult<()> {
        self.paint(env, false)
    }

    /// Repaints the surface after an interaction handled by one of its
    /// drawings, keeping their in-progress state.
    pub fn redraw_local(&mut self, env: &SurfaceEnv<'_>) -> ChartResult<()> {
        self.paint(env, true)
    }

    #[must_use]
    pub fn needs_redraw(&self, env: &SurfaceEnv<'_>) -> bool {
        let source = self.kind.window_source();
        self.drawings.iter().any(|drawing| {
            let view = env.view(self.clip, source, drawing.base().series);
            drawing.needs_redraw(&view)
        })
    }

    /// Repaints the surface only when one of its drawings is stale.
    pub fn redraw_only_needs(&mut self, env: &SurfaceEnv<'_>) -> ChartResult<bool> {
        if !self.needs_redraw(env) {
            return Ok(false);
        }
        self.redraw(env)?;
        Ok(true)
    }

    fn paint(&mut self, env: &SurfaceEnv<'_>, local: bool) -> ChartResult<()> {
        if self.clip.is_empty() {
            debug!(target: TARGET_REDRAW, surface = self.kind.id(), "redraw skipped: surface not sized");
            return Ok(());
        }
        let mut frame = RenderFrame::new(self.clip);
        frame.clear();
        if let Some(color) = self.background {
            frame.push_rect(RectPrimitive::filled(
                0.0,
                0.0,
                f64::from(self.clip.width),
                f64::from(self.clip.height),
                color,
            ));
        }

        let source = self.kind.window_source();
        for drawing in &mut self.drawings {
            let view = env.view(self.clip, source, drawing.base().series);
            let mut ctx = DrawContext {
                view,
                frame: &mut frame,
                metrics: &*self.renderer,
                local,
            };
            drawing.redraw(&mut ctx);
        }

        self.renderer.render(&frame)?;
        self.redraw_count += 1;
        trace!(
            target: TARGET_REDRAW,
            surface = self.kind.id(),
            local,
            commands = frame.commands.len(),
            "surface painted"
        );
        Ok(())
    }

    /// Routes `input` to every drawing handling `kind` and folds their outcomes.
    pub fn dispatch(&mut self, kind: EventKind, input: InputEvent, env: &SurfaceEnv<'_>) -> EventOutcome {
        if !self.capabilities.handles(kind) {
            return EventOutcome::none();
        }
        let source = self.kind.window_source();
        let mut outcome = EventOutcome::none();
        for drawing in &mut self.drawings {
            if !drawing.capabilities().handles(kind) {
                continue;
            }
            let view = env.view(self.clip, source, drawing.base().series);
            let result = match (kind, &input) {
                (EventKind::PointerDown, InputEvent::Pointer(event)) => drawing.on_pointer_down(&view, event),
                (EventKind::PointerUp, InputEvent::Pointer(event)) => drawing.on_pointer_up(&view, event),
                (EventKind::PointerMove, InputEvent::Pointer(event)) => drawing.on_pointer_move(&view, event),
                (EventKind::PointerEnter, InputEvent::Pointer(event)) => drawing.on_pointer_enter(&view, event),
                (EventKind::PointerLeave, InputEvent::Pointer(event)) => drawing.on_pointer_leave(&view, event),
                (EventKind::Click, InputEvent::Pointer(event)) => drawing.on_click(&view, event),
                (EventKind::Wheel, InputEvent::Wheel(event)) => drawing.on_wheel(&view, event),
                _ => {
                    debug!(target: TARGET_EVENT, ?kind, ?input, "event payload does not match its kind");
                    EventOutcome::none()
                }
            };
            outcome = outcome.merge(result);
        }
        outcome
    }
}

/// Host hook creating the renderer behind each surface of a chart.
pub trait SurfaceProvider {
    /// Returns [`crate::ChartError::SurfaceUnavailable`] when the host cannot
    /// provide a drawable surface.
    fn create_surface(&mut self, chart_id: &str, kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>>;
}

/// Headless provider backing every surface with a [`NullRenderer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurfaceProvider;

impl SurfaceProvider for NullSurfaceProvider {
    fn create_surface(&mut self, _chart_id: &str, _kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>> {
        Ok(Box::new(NullRenderer::default()))
    }
}

/// Provider keeping a shared handle on the recorder of each surface.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurfaceProvider {
    renderers: IndexMap<SurfaceKind, RecordingRenderer>,
}

impl RecordingSurfaceProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn renderer(&self, kind: SurfaceKind) -> Option<&RecordingRenderer> {
        self.renderers.get(&kind)
    }

    /// Frames rendered by `kind` since creation or the last [`Self::clear`].
    #[must_use]
    pub fn frame_count(&self, kind: SurfaceKind) -> usize {
        self.renderers.get(&kind).map_or(0, RecordingRenderer::frame_count)
    }

    /// Commands of the last frame rendered by `kind`.
    #[must_use]
    pub fn last_commands(&self, kind: SurfaceKind) -> Vec<DrawCommand> {
        self.renderers
            .get(&kind)
            .and_then(RecordingRenderer::last_frame)
            .map(|frame| frame.commands)
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        for renderer in self.renderers.values() {
            renderer.clear();
        }
    }
}

impl SurfaceProvider for RecordingSurfaceProvider {
    fn create_surface(&mut self, _chart_id: &str, kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>> {
        let renderer = RecordingRenderer::new();
        self.renderers.insert(kind, renderer.clone());
        Ok(Box::new(renderer))
    }
}
