use crate::error::ChartResult;
use crate::render::{DrawCommand, RenderFrame, Renderer};

/// No-op renderer used by tests and headless engine usage.
///
/// It still validates frame content so tests can catch invalid geometry before
/// a real backend is introduced.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub render_count: usize,
    pub last_line_count: usize,
    pub last_rect_count: usize,
    pub last_text_count: usize,
    pub size: (i32, i32),
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.render_count += 1;
        self.last_line_count = 0;
        self.last_rect_count = 0;
        self.last_text_count = 0;
        for command in &frame.commands {
            match command {
                DrawCommand::Line(_) => self.last_line_count += 1,
                DrawCommand::Rect(_) => self.last_rect_count += 1,
                DrawCommand::Text(_) => self.last_text_count += 1,
                DrawCommand::Clear | DrawCommand::Path(_) => {}
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: i32, height: i32) -> ChartResult<()> {
        self.size = (width, height);
        Ok(())
    }
}
