use crate::core::{Point, Rect};
use crate::render::{
    Color, RectPrimitive, RenderFrame, Renderer, TextHAlign, TextPrimitive, TextVAlign,
};

/// Anchor of a text box relative to its reference point.
///
/// Flags combine one horizontal and one vertical choice; an axis without a
/// flag is centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Align(u8);

impl Align {
    pub const CENTER: Self = Self(0);
    pub const START: Self = Self(0b0001);
    pub const END: Self = Self(0b0010);
    pub const TOP: Self = Self(0b0100);
    pub const BOTTOM: Self = Self(0b1000);

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }
}

impl std::ops::BitOr for Align {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Styling of a boxed label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub align: Align,
    pub font_size_px: f64,
    pub background: Option<Color>,
    pub text_color: Color,
    pub margin: i32,
    pub border: i32,
    pub padding: i32,
}

impl TextBox {
    #[must_use]
    pub const fn new(align: Align, font_size_px: f64, text_color: Color) -> Self {
        Self {
            align,
            font_size_px,
            background: None,
            text_color,
            margin: 0,
            border: 0,
            padding: 2,
        }
    }

    #[must_use]
    pub const fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    #[must_use]
    pub const fn with_spacing(mut self, margin: i32, border: i32, padding: i32) -> Self {
        self.margin = margin;
        self.border = border;
        self.padding = padding;
        self
    }
}

/// Draws `text` inside a box anchored at `at` and kept inside `clip`.
///
/// Returns the outer rectangle of the box, margin included.
pub fn draw_text_box(
    frame: &mut RenderFrame,
    metrics: &dyn Renderer,
    clip: Rect,
    text: &str,
    at: Point,
    style: &TextBox,
) -> Rect {
    let inset = style.margin + style.border + style.padding;
    let text_width = metrics.measure_text(text, style.font_size_px).ceil() as i32;
    let text_height = style.font_size_px.ceil() as i32;
    let mut outer = Rect::new(0, 0, text_width + 2 * inset, text_height + 2 * inset);

    outer.x = if style.align.has(Align::START) {
        at.x
    } else if style.align.has(Align::END) {
        at.x - outer.width - 1
    } else {
        at.x - outer.width / 2
    };
    outer.y = if style.align.has(Align::TOP) {
        at.y
    } else if style.align.has(Align::BOTTOM) {
        at.y - outer.height
    } else {
        at.y - outer.height / 2
    };
    outer.box_within(clip);

    let inner = outer.shrink(style.margin + style.border / 2, style.margin + style.border / 2);
    if !inner.is_empty() {
        let mut rect = match style.background {
            Some(fill) => RectPrimitive::filled(
                f64::from(inner.x),
                f64::from(inner.y),
                f64::from(inner.width),
                f64::from(inner.height),
                fill,
            ),
            None => RectPrimitive::outlined(
                f64::from(inner.x),
                f64::from(inner.y),
                f64::from(inner.width),
                f64::from(inner.height),
                style.text_color,
                0.0,
            ),
        };
        if style.border > 0 {
            rect = rect.with_border(style.text_color, f64::from(style.border));
        }
        if rect.fill_color.is_some() || rect.border_width > 0.0 {
            frame.push_rect(rect);
        }
    }

    let (h_align, x) = if style.align.has(Align::START) {
        (TextHAlign::Left, outer.x + inset)
    } else if style.align.has(Align::END) {
        (TextHAlign::Right, outer.x + outer.width - inset)
    } else {
        (TextHAlign::Center, outer.x + outer.width / 2)
    };
    let (v_align, y) = if style.align.has(Align::TOP) {
        (TextVAlign::Top, outer.y + inset)
    } else if style.align.has(Align::BOTTOM) {
        (TextVAlign::Bottom, outer.y + outer.height - inset)
    } else {
        (TextVAlign::Middle, outer.y + outer.height / 2)
    };
    if !text.is_empty() {
        frame.push_text(
            TextPrimitive::new(
                text,
                f64::from(x),
                f64::from(y),
                style.font_size_px,
                style.text_color,
                h_align,
            )
            .with_v_align(v_align),
        );
    }
    outer
}

#[cfg(test)]
mod tests {
    use super::{Align, TextBox, draw_text_box};
    use crate::core::{Point, Rect};
    use crate::render::{Color, NullRenderer, RenderFrame, TextHAlign};

    #[test]
    fn box_is_kept_inside_clip() {
        let clip = Rect::new(0, 0, 200, 100);
        let mut frame = RenderFrame::new(clip);
        let style = TextBox::new(Align::START | Align::BOTTOM, 10.0, Color::BLACK)
            .with_background(Color::WHITE);
        let outer = draw_text_box(
            &mut frame,
            &NullRenderer::default(),
            clip,
            "2024-01-02",
            Point::new(190, 100),
            &style,
        );
        assert!(outer.x + outer.width <= 200);
        assert_eq!(outer.y + outer.height, 100);
        assert_eq!(frame.rects().count(), 1);
        let text = frame.texts().next().expect("label");
        assert_eq!(text.h_align, TextHAlign::Left);
        assert_eq!(text.x, f64::from(outer.x + 2));
    }

    #[test]
    fn transparent_box_emits_only_text() {
        let clip = Rect::new(0, 0, 200, 100);
        let mut frame = RenderFrame::new(clip);
        let style = TextBox::new(Align::CENTER, 12.0, Color::GRAY);
        draw_text_box(
            &mut frame,
            &NullRenderer::default(),
            clip,
            "x",
            Point::new(100, 50),
            &style,
        );
        assert_eq!(frame.rects().count(), 0);
        assert_eq!(frame.texts().count(), 1);
    }
}
