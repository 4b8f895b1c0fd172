use tracing::debug;

use crate::chart::SeriesId;
use crate::drawing::{DrawContext, Drawing, DrawingBase};
use crate::render::{Color, TextHAlign, TextPrimitive, TextVAlign};
use crate::telemetry::TARGET_REDRAW;

const DEFAULT_BRANDING: &str = "stock-chart";

/// Static backdrop: branding text plus a placeholder when there is nothing to show.
#[derive(Debug, Clone)]
pub struct BackgroundDrawing {
    base: DrawingBase,
    branding: String,
}

impl BackgroundDrawing {
    #[must_use]
    pub fn new(series: Option<SeriesId>) -> Self {
        Self {
            base: DrawingBase::new("background", series, Color::GRAY.darken(0.5)),
            branding: DEFAULT_BRANDING.to_owned(),
        }
    }

    #[must_use]
    pub fn with_branding(mut self, branding: impl Into<String>) -> Self {
        self.branding = branding.into();
        self
    }
}

impl Drawing for BackgroundDrawing {
    fn base(&self) -> &DrawingBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawingBase {
        &mut self.base
    }

    fn redraw(&mut self, ctx: &mut DrawContext<'_, '_>) {
        let clip = ctx.view.clip;
        let end = clip.end();
        if !self.branding.is_empty() {
            ctx.frame.push_text(TextPrimitive::new(
                self.branding.as_str(),
                f64::from(end.x - 50),
                f64::from(end.y - 50),
                20.0,
                Color::GRAY.lighten(0.5),
                TextHAlign::Right,
            ));
        }

        let has_data = ctx
            .view
            .series
            .is_some_and(|series| series.time_slice().is_renderable());
        if !has_data {
            debug!(target: TARGET_REDRAW, drawing = %self.base.name, "no data to display");
            let middle = clip.middle();
            ctx.frame.push_text(
                TextPrimitive::new(
                    "no data",
                    f64::from(middle.x),
                    f64::from(middle.y),
                    30.0,
                    self.base.main_color,
                    TextHAlign::Center,
                )
                .with_v_align(TextVAlign::Middle),
            );
        }
    }
}
