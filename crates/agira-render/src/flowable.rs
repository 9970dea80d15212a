//! Content blocks that the layout engine flows into page frames.

use crate::font::Font;

/// Typography for a paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub font: Font,
    pub size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    /// Vertical gap before the block; dropped at the top of a frame.
    pub space_before: f32,
    pub space_after: f32,
}

impl ParagraphStyle {
    pub const TITLE: ParagraphStyle = ParagraphStyle {
        font: Font::HelveticaBold,
        size: 18.0,
        leading: 22.0,
        space_before: 0.0,
        space_after: 12.0,
    };

    pub const HEADING: ParagraphStyle = ParagraphStyle {
        font: Font::HelveticaBold,
        size: 13.0,
        leading: 16.0,
        space_before: 10.0,
        space_after: 6.0,
    };

    pub const BODY: ParagraphStyle = ParagraphStyle {
        font: Font::Helvetica,
        size: 10.0,
        leading: 13.0,
        space_before: 0.0,
        space_after: 4.0,
    };

    pub const SMALL: ParagraphStyle = ParagraphStyle {
        font: Font::Helvetica,
        size: 8.0,
        leading: 10.0,
        space_before: 0.0,
        space_after: 2.0,
    };
}

/// A block of wrapped text.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: ParagraphStyle,
}

/// A grid with a bold header row that repeats on every page the table spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Column widths in points. `None` splits the frame width evenly.
    pub col_widths: Option<Vec<f32>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

/// One element of a report story.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph(Paragraph),
    Table(Table),
    /// Fixed vertical gap in points.
    Spacer(f32),
    PageBreak,
}

impl Flowable {
    pub fn paragraph(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Flowable::Paragraph(Paragraph {
            text: text.into(),
            style,
        })
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::paragraph(text, ParagraphStyle::TITLE)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::paragraph(text, ParagraphStyle::HEADING)
    }

    pub fn body(text: impl Into<String>) -> Self {
        Self::paragraph(text, ParagraphStyle::BODY)
    }

    pub fn table(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Flowable::Table(Table {
            header,
            rows,
            col_widths: None,
        })
    }

    /// True for a paragraph set in the heading style with exactly `text`.
    pub fn is_heading(&self, text: &str) -> bool {
        matches!(self, Flowable::Paragraph(p) if p.style == ParagraphStyle::HEADING && p.text == text)
    }
}
