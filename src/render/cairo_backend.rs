use cairo::{Context, Format, ImageSurface, Operator};
use pango::FontDescription;

use crate::error::{ChartError, ChartResult};
use crate::render::{
    Color, DrawCommand, LinePrimitive, PathPrimitive, RectPrimitive, RenderFrame, Renderer,
    TextHAlign, TextPrimitive, TextVAlign,
};
use crate::surface::{SurfaceKind, SurfaceProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub paths_drawn: usize,
    pub texts_drawn: usize,
}

/// Renderers able to replay a frame on an external Cairo context, for
/// example inside a GTK `DrawingArea` callback.
pub trait CairoContextRenderer {
    fn render_on_cairo_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()>;
}

/// Cairo + Pango renderer painting one surface into an offscreen ARGB image.
///
/// Surfaces are transparent where nothing is drawn, so a host can composite
/// the images of a chart stack in order.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> ChartResult<Self> {
        Ok(Self {
            surface: create_surface(width, height)?,
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        let mut stats = CairoRenderStats::default();
        for command in &frame.commands {
            match command {
                DrawCommand::Clear => clear(context)?,
                DrawCommand::Line(line) => {
                    stroke_line(context, line)?;
                    stats.lines_drawn += 1;
                }
                DrawCommand::Rect(rect) => {
                    paint_rect(context, rect)?;
                    stats.rects_drawn += 1;
                }
                DrawCommand::Path(path) => {
                    paint_path(context, path)?;
                    stats.paths_drawn += 1;
                }
                DrawCommand::Text(text) => {
                    show_text(context, text);
                    stats.texts_drawn += 1;
                }
            }
        }
        self.last_stats = stats;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }

    fn measure_text(&self, text: &str, font_size_px: f64) -> f64 {
        match Context::new(&self.surface) {
            Ok(context) => f64::from(text_layout(&context, text, font_size_px).pixel_size().0),
            Err(_) => crate::render::estimate_text_width(text, font_size_px),
        }
    }

    fn resize(&mut self, width: i32, height: i32) -> ChartResult<()> {
        self.surface = create_surface(width, height)?;
        Ok(())
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        self.render_with_context(context, frame)
    }
}

/// Backs every chart surface with a [`CairoRenderer`], sized on the first
/// chart resize.
#[derive(Debug, Clone, Copy, Default)]
pub struct CairoSurfaceProvider;

impl SurfaceProvider for CairoSurfaceProvider {
    fn create_surface(&mut self, chart_id: &str, kind: SurfaceKind) -> ChartResult<Box<dyn Renderer>> {
        let renderer = CairoRenderer::new(1, 1).map_err(|err| ChartError::SurfaceUnavailable {
            surface: format!("{chart_id}-{}", kind.id()),
            reason: err.to_string(),
        })?;
        Ok(Box::new(renderer))
    }
}

fn create_surface(width: i32, height: i32) -> ChartResult<ImageSurface> {
    if width <= 0 || height <= 0 {
        return Err(ChartError::InvalidViewport { width, height });
    }
    ImageSurface::create(Format::ARgb32, width, height)
        .map_err(|err| map_backend_error("failed to create cairo surface", err))
}

fn clear(context: &Context) -> ChartResult<()> {
    context.save().map_err(|err| map_backend_error("failed to save state", err))?;
    context.set_operator(Operator::Clear);
    let painted = context.paint();
    context
        .restore()
        .map_err(|err| map_backend_error("failed to restore state", err))?;
    painted.map_err(|err| map_backend_error("failed to clear surface", err))
}

fn stroke_line(context: &Context, line: &LinePrimitive) -> ChartResult<()> {
    apply_color(context, line.color);
    context.set_line_width(line.stroke_width);
    context.set_dash(line.style.dash_pattern(), 0.0);
    context.move_to(line.x1, line.y1);
    context.line_to(line.x2, line.y2);
    context
        .stroke()
        .map_err(|err| map_backend_error("failed to stroke line", err))
}

fn paint_rect(context: &Context, rect: &RectPrimitive) -> ChartResult<()> {
    context.rectangle(rect.x, rect.y, rect.width, rect.height);
    if let Some(fill) = rect.fill_color {
        apply_color(context, fill);
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
    }
    if rect.border_width > 0.0 {
        apply_color(context, rect.border_color);
        context.set_line_width(rect.border_width);
        context.set_dash(rect.border_style.dash_pattern(), 0.0);
        context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke rectangle border", err))
    } else {
        context.new_path();
        Ok(())
    }
}

fn paint_path(context: &Context, path: &PathPrimitive) -> ChartResult<()> {
    let mut points = path.points.iter();
    let Some(&(x, y)) = points.next() else {
        return Ok(());
    };
    context.move_to(x, y);
    for &(x, y) in points {
        context.line_to(x, y);
    }
    if let Some(fill) = path.fill_color {
        context.close_path();
        apply_color(context, fill);
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill path", err))?;
    }
    apply_color(context, path.stroke_color);
    context.set_line_width(path.stroke_width);
    context.set_dash(&[], 0.0);
    context
        .stroke()
        .map_err(|err| map_backend_error("failed to stroke path", err))
}

fn show_text(context: &Context, text: &TextPrimitive) {
    let layout = text_layout(context, &text.text, text.font_size_px);
    let (width, height) = layout.pixel_size();
    let x = match text.h_align {
        TextHAlign::Left => text.x,
        TextHAlign::Center => text.x - f64::from(width) / 2.0,
        TextHAlign::Right => text.x - f64::from(width),
    };
    let y = match text.v_align {
        TextVAlign::Top => text.y,
        TextVAlign::Middle => text.y - f64::from(height) / 2.0,
        TextVAlign::Bottom => text.y - f64::from(height),
    };
    apply_color(context, text.color);
    context.move_to(x, y);
    pangocairo::functions::show_layout(context, &layout);
}

fn text_layout(context: &Context, text: &str, font_size_px: f64) -> pango::Layout {
    let layout = pangocairo::functions::create_layout(context);
    let mut font = FontDescription::from_string("Sans");
    font.set_absolute_size(font_size_px * f64::from(pango::SCALE));
    layout.set_font_description(Some(&font));
    layout.set_text(text);
    layout
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ChartError {
    ChartError::InvalidData(format!("{prefix}: {err}"))
}
