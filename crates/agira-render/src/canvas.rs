//! Drawing surface for a single page.
//!
//! `PageCanvas` accumulates PDF content-stream operators. Coordinates are in
//! points with the origin at the bottom-left corner of the page.

use std::fmt::Write as _;

use crate::font::{escape_pdf_text, Font};

/// Format a coordinate with at most two decimals and no trailing zeros, so
/// identical layouts always produce identical bytes.
pub(crate) fn fmt_num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let mut s = format!("{:.2}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Content stream under construction for one page.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    ops: String,
    font: Font,
    font_size: f32,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            ops: String::new(),
            font: Font::Helvetica,
            font_size: 10.0,
        }
    }

    /// Select the font used by subsequent `draw_*_string` calls.
    pub fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    pub fn font(&self) -> (Font, f32) {
        (self.font, self.font_size)
    }

    /// Width of `text` in the current font.
    pub fn string_width(&self, text: &str) -> f32 {
        self.font.string_width(text, self.font_size)
    }

    /// Draw `text` with its left edge at `x` and baseline at `y`.
    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        // Writing into a String cannot fail.
        let _ = writeln!(
            self.ops,
            "BT /{} {} Tf {} {} Td ({}) Tj ET",
            self.font.resource_name(),
            fmt_num(self.font_size),
            fmt_num(x),
            fmt_num(y),
            escape_pdf_text(text)
        );
    }

    /// Draw `text` so that it ends at `x`.
    pub fn draw_right_string(&mut self, x: f32, y: f32, text: &str) {
        let width = self.string_width(text);
        self.draw_string(x - width, y, text);
    }

    /// Draw `text` centred on `x`.
    pub fn draw_centred_string(&mut self, x: f32, y: f32, text: &str) {
        let width = self.string_width(text);
        self.draw_string(x - width / 2.0, y, text);
    }

    pub fn set_line_width(&mut self, width: f32) {
        let _ = writeln!(self.ops, "{} w", fmt_num(width));
    }

    /// Stroke colour as a grey level, 0 = black, 1 = white.
    pub fn set_stroke_gray(&mut self, level: f32) {
        let _ = writeln!(self.ops, "{} G", fmt_num(level));
    }

    /// Fill colour as a grey level, 0 = black, 1 = white.
    pub fn set_fill_gray(&mut self, level: f32) {
        let _ = writeln!(self.ops, "{} g", fmt_num(level));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let _ = writeln!(
            self.ops,
            "{} {} m {} {} l S",
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x2),
            fmt_num(y2)
        );
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let _ = writeln!(
            self.ops,
            "{} {} {} {} re f",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        );
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let _ = writeln!(
            self.ops,
            "{} {} {} {} re S",
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        );
    }

    /// Push the graphics state. Pair with `restore_state`.
    pub fn save_state(&mut self) {
        self.ops.push_str("q\n");
    }

    pub fn restore_state(&mut self) {
        self.ops.push_str("Q\n");
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn content(&self) -> &str {
        &self.ops
    }

    pub fn into_content(self) -> String {
        self.ops
    }
}
