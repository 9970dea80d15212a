//! Minimal PDF 1.4 serializer.
//!
//! Object layout:
//!   1      catalog
//!   2      page tree
//!   3..    one font dictionary per `Font`
//!   then   page object + content stream per page
//!   last   document information dictionary
//!
//! No creation date or random file identifier is written, so identical page
//! content always serializes to identical bytes.

use std::fmt::Write as _;

use agira_contracts::error::{AgiraError, AgiraResult};

use crate::{canvas::fmt_num, font::escape_pdf_text, font::Font, geometry::PageGeometry};

const PRODUCER: &str = "Agira";

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Append object `id` with the given body. Ids must be written in order.
    fn object(&mut self, id: usize, body: &str) -> AgiraResult<()> {
        if id != self.offsets.len() + 1 {
            return Err(AgiraError::RenderFailed {
                reason: format!(
                    "PDF object {} written out of order (expected {})",
                    id,
                    self.offsets.len() + 1
                ),
            });
        }
        self.offsets.push(self.buf.len());
        self.buf
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
        Ok(())
    }

    fn stream_object(&mut self, id: usize, content: &str) -> AgiraResult<()> {
        let body = format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        );
        self.object(id, &body)
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;

        let mut tail = String::new();
        let _ = write!(tail, "xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets {
            let _ = write!(tail, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            tail,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, root, info, xref_offset
        );
        self.buf.extend_from_slice(tail.as_bytes());
        self.buf
    }
}

/// Serialize page content streams into a complete PDF file.
///
/// Returns `RenderFailed` if `pages` is empty.
pub fn write_document(
    geometry: &PageGeometry,
    title: Option<&str>,
    pages: &[String],
) -> AgiraResult<Vec<u8>> {
    if pages.is_empty() {
        return Err(AgiraError::RenderFailed {
            reason: "a PDF document needs at least one page".to_string(),
        });
    }

    let fonts = Font::all();
    let first_page_id = 3 + fonts.len();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_id + 2 * i).collect();
    let info_id = first_page_id + 2 * pages.len();

    let mut w = PdfWriter::new();
    w.object(1, "<< /Type /Catalog /Pages 2 0 R >>")?;

    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    w.object(
        2,
        &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
    )?;

    let mut font_resources = String::new();
    for (i, font) in fonts.iter().enumerate() {
        let id = 3 + i;
        w.object(
            id,
            &format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_name()
            ),
        )?;
        let _ = write!(font_resources, "/{} {} 0 R ", font.resource_name(), id);
    }

    let media_box = format!(
        "[0 0 {} {}]",
        fmt_num(geometry.size.width),
        fmt_num(geometry.size.height)
    );
    for (page_id, content) in page_ids.iter().zip(pages) {
        w.object(
            *page_id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox {} /Resources << /Font << {}>> >> /Contents {} 0 R >>",
                media_box,
                font_resources,
                page_id + 1
            ),
        )?;
        w.stream_object(page_id + 1, content)?;
    }

    let info = match title {
        Some(t) => format!(
            "<< /Producer ({}) /Title ({}) >>",
            PRODUCER,
            escape_pdf_text(t)
        ),
        None => format!("<< /Producer ({}) >>", PRODUCER),
    };
    w.object(info_id, &info)?;

    Ok(w.finish(1, info_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn writes_header_and_trailer() {
        let bytes = write_document(
            &PageGeometry::a4_report(),
            Some("change.v1"),
            &["BT /F1 10 Tf 0 0 Td (x) Tj ET\n".to_string()],
        )
        .unwrap();
        let text = as_text(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/Title (change.v1)"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pages = vec!["".to_string(), "".to_string()];
        let bytes = write_document(&PageGeometry::a4_report(), None, &pages).unwrap();
        let text = as_text(&bytes);

        let xref_start = text.find("xref\n").unwrap();
        let entries: Vec<&str> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .collect();
        assert_eq!(entries.len(), 2 + Font::all().len() + 2 * pages.len() + 1);

        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(
                bytes[offset..].starts_with(expected.as_bytes()),
                "xref entry {} does not point at '{}'",
                i + 1,
                expected
            );
        }
    }

    #[test]
    fn empty_page_list_is_rejected() {
        let result = write_document(&PageGeometry::a4_report(), None, &[]);
        assert!(matches!(result, Err(AgiraError::RenderFailed { .. })));
    }

    #[test]
    fn identical_input_is_byte_identical() {
        let pages = vec!["BT /F1 10 Tf 0 0 Td (same) Tj ET\n".to_string()];
        let a = write_document(&PageGeometry::a4_report(), Some("t"), &pages).unwrap();
        let b = write_document(&PageGeometry::a4_report(), Some("t"), &pages).unwrap();
        assert_eq!(a, b);
    }
}
