//! Page geometry in PDF points (1/72 inch).

/// Points per centimetre.
pub const CM: f32 = 72.0 / 2.54;

/// Width and height of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width: 595.2756,
        height: 841.8898,
    };
}

/// Distance from each page edge to the content frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Page size plus margins. The area between the margins is the content
/// frame; the top and bottom bands are left to header/footer drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub size: PageSize,
    pub margins: Margins,
}

impl PageGeometry {
    /// A4 with 2 cm side margins and taller top (3 cm) and bottom (2.5 cm)
    /// bands for a running header and footer.
    pub fn a4_report() -> Self {
        Self {
            size: PageSize::A4,
            margins: Margins {
                top: 3.0 * CM,
                right: 2.0 * CM,
                bottom: 2.5 * CM,
                left: 2.0 * CM,
            },
        }
    }

    pub fn frame_left(&self) -> f32 {
        self.margins.left
    }

    pub fn frame_right(&self) -> f32 {
        self.size.width - self.margins.right
    }

    pub fn frame_top(&self) -> f32 {
        self.size.height - self.margins.top
    }

    pub fn frame_bottom(&self) -> f32 {
        self.margins.bottom
    }

    pub fn frame_width(&self) -> f32 {
        self.frame_right() - self.frame_left()
    }

    pub fn frame_height(&self) -> f32 {
        self.frame_top() - self.frame_bottom()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_report()
    }
}

/// Metadata handed to per-page draw callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// 1-based page number.
    pub page_number: usize,
    pub geometry: PageGeometry,
}
