//! # agira-render
//!
//! Paginated document rendering for Agira reports.
//!
//! A report is a story of [`Flowable`] blocks (paragraphs, tables, spacers)
//! flowed into fixed A4 page frames by [`DocTemplate`]. Each page can be
//! decorated through a callback that receives a [`PageCanvas`] and
//! [`PageInfo`]; this is how templates draw running headers and footers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agira_render::{DocTemplate, Flowable, PageGeometry};
//!
//! let story = vec![Flowable::title("Change Report"), Flowable::body("All good.")];
//! let mut none = |_: &mut PageCanvas, _: &PageInfo| {};
//! let bytes = DocTemplate::new(PageGeometry::a4_report()).build(&story, &mut none, &mut |_, _| {})?;
//! ```
//!
//! Output is deterministic: the same story and decorations always produce the
//! same bytes.

pub mod canvas;
pub mod flowable;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod pdf;

pub use canvas::PageCanvas;
pub use flowable::{Flowable, Paragraph, ParagraphStyle, Table};
pub use font::Font;
pub use geometry::{PageGeometry, PageInfo, PageSize, CM};
pub use layout::{wrap_text, DocTemplate, PageDecorator};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn render(story: &[Flowable]) -> Vec<u8> {
        let mut first = |c: &mut PageCanvas, info: &PageInfo| {
            c.set_font(Font::Helvetica, 8.0);
            c.draw_string(40.0, 20.0, &format!("Page {}", info.page_number));
        };
        let mut later = |c: &mut PageCanvas, info: &PageInfo| {
            c.set_font(Font::Helvetica, 8.0);
            c.draw_string(40.0, 20.0, &format!("Page {}", info.page_number));
        };
        DocTemplate::new(PageGeometry::a4_report())
            .with_title("test")
            .build(story, &mut first, &mut later)
            .unwrap()
    }

    #[test]
    fn a4_geometry_has_taller_header_and_footer_bands() {
        let g = PageGeometry::a4_report();
        assert!((g.size.width - 595.28).abs() < 0.01);
        assert!((g.size.height - 841.89).abs() < 0.01);
        assert!(g.margins.top > g.margins.left);
        assert!(g.margins.bottom > g.margins.right);
    }

    #[test]
    fn same_story_renders_identical_bytes() {
        let story = vec![
            Flowable::title("Report"),
            Flowable::heading("Section"),
            Flowable::body("Line one"),
            Flowable::Spacer(12.0),
            Flowable::table(
                vec!["A".to_string(), "B".to_string()],
                vec![vec!["1".to_string(), "2".to_string()]],
            ),
        ];
        assert_eq!(render(&story), render(&story));
    }

    #[test]
    fn rendered_text_appears_in_content_stream() {
        let bytes = render(&[Flowable::body("Hello (world)")]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(Hello \\(world\\)) Tj"));
        assert!(text.contains("(Page 1) Tj"));
    }

    #[test]
    fn page_break_starts_a_new_page() {
        let bytes = render(&[
            Flowable::body("first"),
            Flowable::PageBreak,
            Flowable::body("second"),
        ]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(Page 2) Tj"));
    }
}
