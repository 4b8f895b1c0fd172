use crate::core::Rect;
use crate::error::{ChartError, ChartResult};
use crate::render::{LinePrimitive, PathPrimitive, RectPrimitive, TextPrimitive};

/// One paint operation, applied in list order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Makes the whole surface transparent.
    Clear,
    Line(LinePrimitive),
    Rect(RectPrimitive),
    Path(PathPrimitive),
    Text(TextPrimitive),
}

/// Backend-agnostic scene for one surface paint pass.
///
/// Commands paint in order: later commands cover earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub clip: Rect,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(clip: Rect) -> Self {
        Self {
            clip,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: LinePrimitive) -> Self {
        self.push_line(line);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextPrimitive) -> Self {
        self.push_text(text);
        self
    }

    #[must_use]
    pub fn with_rect(mut self, rect: RectPrimitive) -> Self {
        self.push_rect(rect);
        self
    }

    pub fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    pub fn push_line(&mut self, line: LinePrimitive) {
        self.commands.push(DrawCommand::Line(line));
    }

    pub fn push_rect(&mut self, rect: RectPrimitive) {
        self.commands.push(DrawCommand::Rect(rect));
    }

    pub fn push_path(&mut self, path: PathPrimitive) {
        self.commands.push(DrawCommand::Path(path));
    }

    pub fn push_text(&mut self, text: TextPrimitive) {
        self.commands.push(DrawCommand::Text(text));
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.clip.is_empty() {
            return Err(ChartError::InvalidViewport {
                width: self.clip.width,
                height: self.clip.height,
            });
        }

        for command in &self.commands {
            match command {
                DrawCommand::Clear => {}
                DrawCommand::Line(line) => line.validate()?,
                DrawCommand::Rect(rect) => rect.validate()?,
                DrawCommand::Path(path) => path.validate()?,
                DrawCommand::Text(text) => text.validate()?,
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &LinePrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Line(line) => Some(line),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &RectPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Rect(rect) => Some(rect),
            _ => None,
        })
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Path(path) => Some(path),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextPrimitive> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }
}
