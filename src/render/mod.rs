mod frame;
mod null_renderer;
mod primitives;
mod recording_renderer;

pub use frame::{DrawCommand, RenderFrame};
pub use null_renderer::NullRenderer;
pub use primitives::{
    Color, LinePrimitive, LineStrokeStyle, PathPrimitive, RectPrimitive, TextHAlign,
    TextPrimitive, TextVAlign,
};
pub use recording_renderer::RecordingRenderer;

use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// One renderer backs one surface. It receives a fully materialized
/// `RenderFrame` per paint pass, so drawing code stays isolated from the
/// backend and from event plumbing.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;

    /// Pixel width of `text` at `font_size_px`.
    ///
    /// Headless backends use a fixed advance per character.
    fn measure_text(&self, text: &str, font_size_px: f64) -> f64 {
        estimate_text_width(text, font_size_px)
    }

    /// Called when the host gives the surface a new pixel size.
    fn resize(&mut self, _width: i32, _height: i32) -> ChartResult<()> {
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        (**self).render(frame)
    }

    fn measure_text(&self, text: &str, font_size_px: f64) -> f64 {
        (**self).measure_text(text, font_size_px)
    }

    fn resize(&mut self, width: i32, height: i32) -> ChartResult<()> {
        (**self).resize(width, height)
    }
}

#[must_use]
pub fn estimate_text_width(text: &str, font_size_px: f64) -> f64 {
    text.chars().count() as f64 * font_size_px * 0.6
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoContextRenderer, CairoRenderStats, CairoRenderer, CairoSurfaceProvider};
