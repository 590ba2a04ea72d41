//! Spacing and palette metrics consumed by renderers.
//!
//! Theme *loading* is out of scope for this crate; widgets only need a small
//! set of stable metrics to lay out and paint. Text measurement uses a fixed
//! advance per codepoint, which keeps layout deterministic without a shaper.

use kindling_core::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Gap between sibling elements, also the separator gap in lists.
    pub padding: f32,
    /// Inset between a widget's border and its content.
    pub inner_padding: f32,
    pub separator_thickness: f32,
    /// Square size of inline icons (branch chevrons).
    pub icon_inline_size: f32,
    pub text_size: f32,
    pub corner_radius: f32,

    pub foreground: Color,
    pub placeholder: Color,
    pub input_background: Color,
    pub selection: Color,
    pub hover: Color,
    pub separator: Color,
    pub cursor: Color,
}

impl Theme {
    /// Height of one text line at the given size.
    pub fn line_height(&self, text_size: f32) -> f32 {
        text_size + 6.0
    }

    /// Horizontal advance of one codepoint at the given size.
    pub fn char_advance(&self, text_size: f32) -> f32 {
        text_size / 2.0 + 1.0
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            padding: 4.0,
            inner_padding: 8.0,
            separator_thickness: 1.0,
            icon_inline_size: 20.0,
            text_size: 14.0,
            corner_radius: 3.0,

            foreground: Color::rgb(0.9, 0.9, 0.9),
            placeholder: Color::rgb(0.5, 0.5, 0.5),
            input_background: Color::rgb(0.13, 0.13, 0.15),
            selection: Color::rgba(0.25, 0.45, 0.8, 0.45),
            hover: Color::rgba(1.0, 1.0, 1.0, 0.08),
            separator: Color::rgba(1.0, 1.0, 1.0, 0.12),
            cursor: Color::rgb(0.35, 0.6, 0.95),
        }
    }
}
