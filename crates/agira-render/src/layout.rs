//! Flow a story of `Flowable`s into fixed-geometry pages.
//!
//! Paragraphs split between lines and tables split between rows. A table's
//! header row is repeated at the top of each continuation page. Page
//! decorators run at the start of every page, before any story content is
//! drawn on it, inside their own saved graphics state.

use tracing::debug;

use agira_contracts::error::AgiraResult;

use crate::{
    canvas::PageCanvas,
    flowable::{Flowable, Paragraph, ParagraphStyle, Table},
    font::Font,
    geometry::{PageGeometry, PageInfo},
    pdf,
};

/// Per-page callback invoked with the page's canvas and metadata.
pub type PageDecorator<'a> = dyn FnMut(&mut PageCanvas, &PageInfo) + 'a;

const CELL_PADDING: f32 = 4.0;
const CELL_FONT_SIZE: f32 = 9.0;
const CELL_LEADING: f32 = 11.0;
const TABLE_SPACE_AFTER: f32 = 8.0;
const HEADER_FILL_GRAY: f32 = 0.85;
const GRID_GRAY: f32 = 0.5;

/// Greedy word wrap of `text` to `max_width` points.
///
/// Words wider than the line are broken between characters. Returns no lines
/// for text that is empty or whitespace only.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if font.string_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if font.string_width(word, size) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                current.push(c);
                if font.string_width(&current, size) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A paginated document with fixed geometry.
#[derive(Debug, Clone)]
pub struct DocTemplate {
    geometry: PageGeometry,
    title: Option<String>,
}

impl DocTemplate {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            title: None,
        }
    }

    /// Set the title written into the document information dictionary.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Lay out `story` and serialize the result as PDF bytes.
    ///
    /// `on_first_page` runs for page 1 and `on_later_pages` for every page
    /// after it. A document always has at least one page.
    pub fn build<'a>(
        &self,
        story: &[Flowable],
        on_first_page: &mut PageDecorator<'a>,
        on_later_pages: &mut PageDecorator<'a>,
    ) -> AgiraResult<Vec<u8>> {
        let pages = self.layout(story, on_first_page, on_later_pages);
        debug!(pages = pages.len(), blocks = story.len(), "document laid out");
        pdf::write_document(&self.geometry, self.title.as_deref(), &pages)
    }

    /// Lay out `story` into per-page content streams.
    pub fn layout<'a>(
        &self,
        story: &[Flowable],
        on_first_page: &mut PageDecorator<'a>,
        on_later_pages: &mut PageDecorator<'a>,
    ) -> Vec<String> {
        let mut frame = Frame::new(self.geometry, on_first_page, on_later_pages);
        for flowable in story {
            match flowable {
                Flowable::Paragraph(p) => frame.paragraph(p),
                Flowable::Table(t) => frame.table(t),
                Flowable::Spacer(h) => frame.spacer(*h),
                Flowable::PageBreak => frame.page_break(),
            }
        }
        frame.finish()
    }
}

/// Mutable layout cursor over the sequence of pages.
struct Frame<'d, 'a> {
    geometry: PageGeometry,
    on_first_page: &'d mut PageDecorator<'a>,
    on_later_pages: &'d mut PageDecorator<'a>,
    finished: Vec<String>,
    canvas: PageCanvas,
    page_number: usize,
    /// Top of the free space on the current page.
    y: f32,
    /// True until story content is placed on the current page.
    at_top: bool,
}

impl<'d, 'a> Frame<'d, 'a> {
    fn new(
        geometry: PageGeometry,
        on_first_page: &'d mut PageDecorator<'a>,
        on_later_pages: &'d mut PageDecorator<'a>,
    ) -> Self {
        let mut frame = Self {
            geometry,
            on_first_page,
            on_later_pages,
            finished: Vec::new(),
            canvas: PageCanvas::new(),
            page_number: 0,
            y: geometry.frame_top(),
            at_top: true,
        };
        frame.start_page();
        frame
    }

    fn start_page(&mut self) {
        self.page_number += 1;
        self.canvas = PageCanvas::new();
        self.y = self.geometry.frame_top();
        self.at_top = true;

        let info = PageInfo {
            page_number: self.page_number,
            geometry: self.geometry,
        };
        self.canvas.save_state();
        if self.page_number == 1 {
            (self.on_first_page)(&mut self.canvas, &info);
        } else {
            (self.on_later_pages)(&mut self.canvas, &info);
        }
        self.canvas.restore_state();
    }

    fn new_page(&mut self) {
        let canvas = std::mem::take(&mut self.canvas);
        self.finished.push(canvas.into_content());
        self.start_page();
    }

    fn remaining(&self) -> f32 {
        self.y - self.geometry.frame_bottom()
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let style = paragraph.style;
        let lines = wrap_text(
            &paragraph.text,
            style.font,
            style.size,
            self.geometry.frame_width(),
        );
        if lines.is_empty() {
            return;
        }

        if !self.at_top {
            self.y -= style.space_before;
        }

        for line in &lines {
            if self.remaining() < style.leading {
                self.new_page();
            }
            self.draw_line(line, style);
        }

        self.y -= style.space_after;
    }

    fn draw_line(&mut self, line: &str, style: ParagraphStyle) {
        self.canvas.set_font(style.font, style.size);
        let baseline = self.y - style.size;
        self.canvas
            .draw_string(self.geometry.frame_left(), baseline, line);
        self.y -= style.leading;
        self.at_top = false;
    }

    fn spacer(&mut self, height: f32) {
        if self.at_top {
            return;
        }
        if self.remaining() <= height {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    fn page_break(&mut self) {
        if !self.at_top {
            self.new_page();
        }
    }

    fn column_widths(&self, table: &Table) -> Vec<f32> {
        let columns = table.column_count().max(1);
        match &table.col_widths {
            Some(widths) if widths.len() == columns => widths.clone(),
            _ => vec![self.geometry.frame_width() / columns as f32; columns],
        }
    }

    /// Wrap every cell of a row; returns the lines per cell and row height.
    fn measure_row(&self, cells: &[String], widths: &[f32], font: Font) -> (Vec<Vec<String>>, f32) {
        let max_lines = ((self.geometry.frame_height() / 2.0 - 2.0 * CELL_PADDING)
            / CELL_LEADING)
            .floor()
            .max(1.0) as usize;

        let wrapped: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                let mut lines =
                    wrap_text(text, font, CELL_FONT_SIZE, width - 2.0 * CELL_PADDING);
                lines.truncate(max_lines);
                lines
            })
            .collect();

        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let height = line_count as f32 * CELL_LEADING + 2.0 * CELL_PADDING;
        (wrapped, height)
    }

    fn draw_row(&mut self, cells: &[Vec<String>], widths: &[f32], height: f32, header: bool) {
        let top = self.y;
        let bottom = top - height;
        let font = if header {
            Font::HelveticaBold
        } else {
            Font::Helvetica
        };

        let mut x = self.geometry.frame_left();
        for (i, width) in widths.iter().enumerate() {
            self.canvas.save_state();
            if header {
                self.canvas.set_fill_gray(HEADER_FILL_GRAY);
                self.canvas.fill_rect(x, bottom, *width, height);
            }
            self.canvas.set_line_width(0.5);
            self.canvas.set_stroke_gray(GRID_GRAY);
            self.canvas.stroke_rect(x, bottom, *width, height);
            self.canvas.restore_state();

            self.canvas.set_font(font, CELL_FONT_SIZE);
            if let Some(lines) = cells.get(i) {
                for (n, line) in lines.iter().enumerate() {
                    let baseline = top - CELL_PADDING - CELL_FONT_SIZE - n as f32 * CELL_LEADING;
                    self.canvas.draw_string(x + CELL_PADDING, baseline, line);
                }
            }
            x += width;
        }

        self.y = bottom;
        self.at_top = false;
    }

    fn table(&mut self, table: &Table) {
        let widths = self.column_widths(table);
        let (header_cells, header_height) =
            self.measure_row(&table.header, &widths, Font::HelveticaBold);
        let has_header = !table.header.is_empty();

        if !self.at_top {
            self.y -= CELL_PADDING;
        }

        let first_row_height = table
            .rows
            .first()
            .map(|row| self.measure_row(row, &widths, Font::Helvetica).1)
            .unwrap_or(0.0);
        let needed = if has_header { header_height } else { 0.0 } + first_row_height;
        if self.remaining() < needed && !self.at_top {
            self.new_page();
        }
        if has_header {
            self.draw_row(&header_cells, &widths, header_height, true);
        }

        for row in &table.rows {
            let (cells, height) = self.measure_row(row, &widths, Font::Helvetica);
            if self.remaining() < height {
                self.new_page();
                if has_header {
                    self.draw_row(&header_cells, &widths, header_height, true);
                }
            }
            self.draw_row(&cells, &widths, height, false);
        }

        self.y -= TABLE_SPACE_AFTER;
    }

    fn finish(mut self) -> Vec<String> {
        let canvas = std::mem::take(&mut self.canvas);
        self.finished.push(canvas.into_content());
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_decoration() -> impl FnMut(&mut PageCanvas, &PageInfo) {
        |_canvas: &mut PageCanvas, _info: &PageInfo| {}
    }

    #[test]
    fn wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);
        let lines = wrap_text(&text, Font::Helvetica, 10.0, 150.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Helvetica.string_width(line, 10.0) <= 150.0, "too wide: {line}");
        }
        assert_eq!(lines.join(" "), text.trim());
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, Font::Helvetica, 10.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn wrap_blank_text_is_empty() {
        assert!(wrap_text("   \t ", Font::Helvetica, 10.0, 100.0).is_empty());
    }

    #[test]
    fn empty_story_still_has_one_page() {
        let doc = DocTemplate::new(PageGeometry::a4_report());
        let pages = doc.layout(&[], &mut no_decoration(), &mut no_decoration());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn long_story_paginates_and_decorates_every_page() {
        let story: Vec<Flowable> = (0..200)
            .map(|i| Flowable::body(format!("Paragraph number {i}")))
            .collect();

        let mut first_calls = Vec::new();
        let mut later_calls = Vec::new();
        let doc = DocTemplate::new(PageGeometry::a4_report());
        let pages = doc.layout(
            &story,
            &mut |_c: &mut PageCanvas, info: &PageInfo| first_calls.push(info.page_number),
            &mut |_c: &mut PageCanvas, info: &PageInfo| later_calls.push(info.page_number),
        );

        assert!(pages.len() > 1);
        assert_eq!(first_calls, vec![1]);
        assert_eq!(later_calls, (2..=pages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn table_header_repeats_on_continuation_pages() {
        let rows: Vec<Vec<String>> = (0..150)
            .map(|i| vec![format!("Item {i}"), "Open".to_string()])
            .collect();
        let story = vec![Flowable::table(
            vec!["Title".to_string(), "Status".to_string()],
            rows,
        )];

        let doc = DocTemplate::new(PageGeometry::a4_report());
        let pages = doc.layout(&story, &mut no_decoration(), &mut no_decoration());

        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.contains("(Title) Tj"), "header missing on a page");
        }
    }

    #[test]
    fn decorations_are_isolated_in_graphics_state() {
        let doc = DocTemplate::new(PageGeometry::a4_report());
        let pages = doc.layout(
            &[Flowable::body("hello")],
            &mut |c: &mut PageCanvas, _i: &PageInfo| c.set_fill_gray(0.3),
            &mut no_decoration(),
        );
        assert!(pages[0].starts_with("q\n0.3 g\nQ\n"));
    }
}
