use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ChartResult;
use crate::render::{RenderFrame, Renderer};

/// Renderer keeping every validated frame, shared with the caller.
///
/// Clones share the same log, so a test can keep one handle while the chart
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: Rc<RefCell<Vec<RenderFrame>>>,
}

impl RecordingRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<RenderFrame> {
        self.frames.borrow().last().cloned()
    }

    #[must_use]
    pub fn frames(&self) -> Vec<RenderFrame> {
        self.frames.borrow().clone()
    }

    pub fn clear(&self) {
        self.frames.borrow_mut().clear();
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.frames.borrow_mut().push(frame.clone());
        Ok(())
    }
}
