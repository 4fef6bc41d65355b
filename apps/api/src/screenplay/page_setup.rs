//! Page geometry and Courier metrics for screenplay pages.
//!
//! All positions are millimetres measured from the page's top-left corner.
//! Conversion to PDF points (bottom-left origin) happens only at serialization.
//!
//! Courier is monospace: every glyph advances 600/1000 em, so measuring a string
//! is a character count times the advance at the current size.

use serde::{Deserialize, Serialize};

/// PDF points per millimetre (72 pt per inch, 25.4 mm per inch).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Courier glyph advance in em units.
const COURIER_ADVANCE_EM: f32 = 0.6;

// ────────────────────────────────────────────────────────────────────────────
// Fonts
// ────────────────────────────────────────────────────────────────────────────

/// Weight of the typewriter face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    /// Base-14 PostScript name used in the PDF font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            FontStyle::Regular => "Courier",
            FontStyle::Bold => "Courier-Bold",
        }
    }

    /// Resource name the content streams refer to.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
        }
    }
}

/// A font selection: style plus size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub style: FontStyle,
    pub size_pt: f32,
}

impl Font {
    pub const fn new(style: FontStyle, size_pt: f32) -> Self {
        Self { style, size_pt }
    }

    /// Font size expressed in millimetres.
    pub fn size_mm(&self) -> f32 {
        self.size_pt / PT_PER_MM
    }

    /// Width of one glyph in millimetres.
    pub fn char_width_mm(&self) -> f32 {
        COURIER_ADVANCE_EM * self.size_mm()
    }

    /// Rendered width of a string in millimetres.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().count() as f32 * self.char_width_mm()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page setup
// ────────────────────────────────────────────────────────────────────────────

/// Fixed geometry for an industry-format screenplay page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSetup {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    /// Content that would cross `page_height_mm - break_margin_mm` starts a new page.
    pub break_margin_mm: f32,
    /// Horizontal padding inside each cell.
    pub cell_padding_mm: f32,
    pub line_height_mm: f32,

    /// Page number stamp: top edge and height of the header cell.
    pub header_y_mm: f32,
    pub header_height_mm: f32,

    pub character_x_mm: f32,
    pub parenthetical_x_mm: f32,
    pub dialogue_x_mm: f32,
    pub dialogue_width_mm: f32,
    pub transition_x_mm: f32,
    pub image_width_mm: f32,

    pub body_font_pt: f32,
    pub appendix_font_pt: f32,
}

/// US Letter, 1.5" binding margin, Courier 12pt.
pub fn default_page_setup() -> PageSetup {
    PageSetup {
        page_width_mm: 215.9,
        page_height_mm: 279.4,
        margin_left_mm: 38.0,
        margin_right_mm: 25.0,
        margin_top_mm: 25.0,
        break_margin_mm: 25.0,
        cell_padding_mm: 1.0,
        line_height_mm: 5.0,
        header_y_mm: 10.0,
        header_height_mm: 10.0,
        character_x_mm: 94.0,
        parenthetical_x_mm: 79.0,
        dialogue_x_mm: 63.0,
        dialogue_width_mm: 90.0,
        transition_x_mm: 152.0,
        image_width_mm: 140.0,
        body_font_pt: 12.0,
        appendix_font_pt: 10.0,
    }
}

impl PageSetup {
    /// Y coordinate past which a cell may not extend.
    pub fn break_trigger_mm(&self) -> f32 {
        self.page_height_mm - self.break_margin_mm
    }

    /// X coordinate of the right margin.
    pub fn right_edge_mm(&self) -> f32 {
        self.page_width_mm - self.margin_right_mm
    }

    /// Full text width between the margins.
    pub fn text_width_mm(&self) -> f32 {
        self.right_edge_mm() - self.margin_left_mm
    }

    pub fn body_font(&self, style: FontStyle) -> Font {
        Font::new(style, self.body_font_pt)
    }

    pub fn appendix_font(&self) -> Font {
        Font::new(FontStyle::Regular, self.appendix_font_pt)
    }

    /// How many glyphs fit on one line of a `width_mm` cell, after padding on both sides.
    ///
    /// Always at least 1, so wrapping makes progress in absurdly narrow columns.
    pub fn chars_per_line(&self, width_mm: f32, font: &Font) -> usize {
        let usable = width_mm - 2.0 * self.cell_padding_mm;
        ((usable / font.char_width_mm()).floor() as usize).max(1)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
