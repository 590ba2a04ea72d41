//! Leaf drawables emitted by renderers and consumed by the painter.
//!
//! The painter walks `Renderer::objects()` once per repaint, in list order
//! (later objects on top), reading positions and sizes only. The primitive
//! set is a closed enum; rasterization itself belongs to the driver.

use crate::theme::Theme;
use kindling_core::{Color, Pos, Size};

#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub position: Pos<f32>,
    pub size: Size<f32>,
    pub fill: Color,
    pub corner_radius: f32,
    pub hidden: bool,
}

impl Rectangle {
    pub fn new(fill: Color) -> Self {
        Self {
            position: Pos::ZERO,
            size: Size::ZERO,
            fill,
            corner_radius: 0.0,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub position: Pos<f32>,
    pub size: Size<f32>,
    pub content: String,
    pub color: Color,
    pub text_size: f32,
    pub hidden: bool,
}

impl Text {
    pub fn new(content: impl Into<String>, color: Color, text_size: f32) -> Self {
        Self {
            position: Pos::ZERO,
            size: Size::ZERO,
            content: content.into(),
            color,
            text_size,
            hidden: false,
        }
    }
}

/// Built-in icon glyphs used by the core widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    /// Collapsed branch marker.
    ChevronRight,
    /// Expanded branch marker.
    ChevronDown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub kind: IconKind,
    pub position: Pos<f32>,
    pub size: Size<f32>,
    pub hidden: bool,
}

impl Icon {
    pub fn new(kind: IconKind) -> Self {
        Self {
            kind,
            position: Pos::ZERO,
            size: Size::ZERO,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasObject {
    Rectangle(Rectangle),
    Text(Text),
    Icon(Icon),
}

impl CanvasObject {
    pub fn position(&self) -> Pos<f32> {
        match self {
            CanvasObject::Rectangle(o) => o.position,
            CanvasObject::Text(o) => o.position,
            CanvasObject::Icon(o) => o.position,
        }
    }

    pub fn set_position(&mut self, position: Pos<f32>) {
        match self {
            CanvasObject::Rectangle(o) => o.position = position,
            CanvasObject::Text(o) => o.position = position,
            CanvasObject::Icon(o) => o.position = position,
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.set_position(self.position().translated(dx, dy));
    }

    pub fn size(&self) -> Size<f32> {
        match self {
            CanvasObject::Rectangle(o) => o.size,
            CanvasObject::Text(o) => o.size,
            CanvasObject::Icon(o) => o.size,
        }
    }

    pub fn resize(&mut self, size: Size<f32>) {
        match self {
            CanvasObject::Rectangle(o) => o.size = size,
            CanvasObject::Text(o) => o.size = size,
            CanvasObject::Icon(o) => o.size = size,
        }
    }

    pub fn hidden(&self) -> bool {
        match self {
            CanvasObject::Rectangle(o) => o.hidden,
            CanvasObject::Text(o) => o.hidden,
            CanvasObject::Icon(o) => o.hidden,
        }
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        match self {
            CanvasObject::Rectangle(o) => o.hidden = hidden,
            CanvasObject::Text(o) => o.hidden = hidden,
            CanvasObject::Icon(o) => o.hidden = hidden,
        }
    }

    /// Smallest size at which the object presents its content unclipped.
    pub fn min_size(&self, theme: &Theme) -> Size<f32> {
        match self {
            CanvasObject::Rectangle(_) => Size::ZERO,
            CanvasObject::Text(text) => text_min_size(&text.content, text.text_size, theme),
            CanvasObject::Icon(_) => {
                Size::new(theme.icon_inline_size, theme.icon_inline_size)
            }
        }
    }
}

/// Fixed-advance measurement of (possibly multi-line) text.
pub fn text_min_size(content: &str, text_size: f32, theme: &Theme) -> Size<f32> {
    let mut rows = 0usize;
    let mut widest = 0usize;
    for line in content.split('\n') {
        rows += 1;
        widest = widest.max(line.chars().count());
    }
    Size::new(
        widest as f32 * theme.char_advance(text_size),
        rows as f32 * theme.line_height(text_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_min_size_uses_widest_line() {
        let theme = Theme::default();
        let size = text_min_size("ab\nabcd\na", 14.0, &theme);
        assert_eq!(size.width, 4.0 * theme.char_advance(14.0));
        assert_eq!(size.height, 3.0 * theme.line_height(14.0));
    }

    #[test]
    fn test_object_accessors() {
        let mut object = CanvasObject::Rectangle(Rectangle::new(Color::BLACK));
        object.set_position(Pos::new(3.0, 4.0));
        object.resize(Size::new(10.0, 10.0));
        object.translate(1.0, -1.0);
        assert_eq!(object.position(), Pos::new(4.0, 3.0));
        assert_eq!(object.size(), Size::new(10.0, 10.0));
        assert!(!object.hidden());
    }

    #[test]
    fn test_icon_min_size_is_inline_icon() {
        let theme = Theme::default();
        let icon = CanvasObject::Icon(Icon::new(IconKind::ChevronRight));
        assert_eq!(
            icon.min_size(&theme),
            Size::new(theme.icon_inline_size, theme.icon_inline_size)
        );
    }
}
