//! Page cursor engine. Positions text cells and images on paginated pages.
//!
//! The engine owns a cursor (x, y, font) and a growing list of pages. Every write
//! goes through `cell`, which breaks to a new page *before* drawing whenever the
//! cell would cross the break trigger, so a single cell never straddles two pages.
//! Each new page, including auto-inserted ones, gets its page number stamped in
//! the header before any body content.

use crate::screenplay::page_setup::{Font, FontStyle, PageSetup};

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A positioned drawing instruction on a page, in millimetres from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single run of text whose baseline starts at (`x_mm`, `baseline_mm`).
    Text {
        x_mm: f32,
        baseline_mm: f32,
        font: Font,
        text: String,
    },
    /// The embedded storyboard image; (`x_mm`, `y_mm`) is its top-left corner.
    Image {
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    /// 1-based page number.
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

impl LaidOutPage {
    /// Text runs on this page, in drawing order.
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }
}

/// Horizontal alignment of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Cursor-driven page builder. One engine per document; never shared.
pub struct LayoutEngine<'a> {
    setup: &'a PageSetup,
    pages: Vec<LaidOutPage>,
    x: f32,
    y: f32,
    font: Font,
}

impl<'a> LayoutEngine<'a> {
    /// Creates an engine with no pages. Call `add_page` before writing.
    pub fn new(setup: &'a PageSetup) -> Self {
        Self {
            setup,
            pages: Vec::new(),
            x: setup.margin_left_mm,
            y: setup.margin_top_mm,
            font: setup.body_font(FontStyle::Regular),
        }
    }

    #[cfg(test)]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[cfg(test)]
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    pub fn set_x(&mut self, x_mm: f32) {
        self.x = x_mm;
    }

    /// Moves to the left margin and down by `h_mm`. Never triggers a page break.
    pub fn ln(&mut self, h_mm: f32) {
        self.x = self.setup.margin_left_mm;
        self.y += h_mm;
    }

    /// Opens a new page, stamps its number in the header and resets the cursor.
    pub fn add_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(LaidOutPage {
            number,
            ops: Vec::new(),
        });
        self.stamp_header(number);
        self.x = self.setup.margin_left_mm;
        self.y = self.setup.margin_top_mm;
    }

    /// Right-aligned `"N."` at the top of the page, in the regular body face.
    fn stamp_header(&mut self, number: usize) {
        let font = self.setup.body_font(FontStyle::Regular);
        let x = self.setup.margin_left_mm;
        let width = self.setup.text_width_mm();
        let text = format!("{number}.");
        self.push_text(
            x,
            self.setup.header_y_mm,
            width,
            self.setup.header_height_mm,
            font,
            Align::Right,
            text,
        );
    }

    /// Writes one single-line cell at the cursor and moves to the next line.
    ///
    /// The cell spans from the cursor to the right margin. Text that is too long is
    /// not wrapped; use `multi_cell` for wrapped content.
    pub fn cell(&mut self, h_mm: f32, text: &str) {
        self.break_if_needed(h_mm);
        let width = self.setup.right_edge_mm() - self.x;
        self.push_text(
            self.x,
            self.y,
            width,
            h_mm,
            self.font,
            Align::Left,
            text.to_string(),
        );
        self.ln(h_mm);
    }

    /// Writes wrapped text in a column of `w_mm` starting at the cursor's x.
    ///
    /// `w_mm == 0.0` extends the column to the right margin. Every wrapped line is a
    /// separate cell at the same x; the cursor returns to the left margin afterwards.
    pub fn multi_cell(&mut self, w_mm: f32, h_mm: f32, text: &str) {
        let width = if w_mm <= 0.0 {
            self.setup.right_edge_mm() - self.x
        } else {
            w_mm
        };
        let max_chars = self.setup.chars_per_line(width, &self.font);
        let column_x = self.x;

        for line in wrap_text(text, max_chars) {
            self.break_if_needed(h_mm);
            self.push_text(
                column_x,
                self.y,
                width,
                h_mm,
                self.font,
                Align::Left,
                line,
            );
            self.y += h_mm;
        }
        self.x = self.setup.margin_left_mm;
    }

    /// Places an image at `x_mm` with the given width and proportional height.
    ///
    /// `aspect` is height / width of the source raster. Breaks to a new page first if
    /// the image would cross the trigger, then moves the cursor below the image.
    pub fn image(&mut self, x_mm: f32, width_mm: f32, aspect: f32) {
        let height_mm = width_mm * aspect;
        self.break_if_needed(height_mm);
        let y_mm = self.y;
        self.current_page().ops.push(DrawOp::Image {
            x_mm,
            y_mm,
            width_mm,
            height_mm,
        });
        self.ln(height_mm);
    }

    /// Consumes the engine and returns the laid-out pages.
    pub fn finish(self) -> Vec<LaidOutPage> {
        self.pages
    }

    // ── internals ───────────────────────────────────────────────────────────

    /// Starts a new page if a block of `h_mm` would cross the trigger. Keeps x.
    fn break_if_needed(&mut self, h_mm: f32) {
        if self.pages.is_empty() || self.y + h_mm > self.setup.break_trigger_mm() {
            let x = self.x;
            let font = self.font;
            self.add_page();
            self.x = x;
            self.font = font;
        }
    }

    fn current_page(&mut self) -> &mut LaidOutPage {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Records a text run inside a cell box of (`w_mm` × `h_mm`) at (`x_mm`, `y_mm`).
    ///
    /// The baseline sits at the vertical middle of the cell, lowered by 0.3 of the
    /// font size. Padding applies on the aligned side.
    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        x_mm: f32,
        y_mm: f32,
        w_mm: f32,
        h_mm: f32,
        font: Font,
        align: Align,
        text: String,
    ) {
        if text.is_empty() {
            return;
        }
        let padding = self.setup.cell_padding_mm;
        let text_x = match align {
            Align::Left => x_mm + padding,
            Align::Right => x_mm + w_mm - padding - font.measure_str(&text),
        };
        let baseline_mm = y_mm + 0.5 * h_mm + 0.3 * font.size_mm();
        self.current_page().ops.push(DrawOp::Text {
            x_mm: text_x,
            baseline_mm,
            font,
            text,
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Greedy monospace wrap that keeps the text's own spacing.
///
/// - `\r` is dropped and a single trailing `\n` is ignored.
/// - Explicit `\n` always ends a line.
/// - An overlong line breaks at its last space. The run of spaces at the break
///   is consumed; a word longer than the column is broken mid-word.
/// - Empty input still yields one (empty) line, so the cursor advances.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let cleaned: Vec<char> = text.chars().filter(|&c| c != '\r').collect();
    let chars = match cleaned.last() {
        Some('\n') => &cleaned[..cleaned.len() - 1],
        _ => &cleaned[..],
    };

    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut last_space: Option<usize> = None;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            lines.push(chars[start..i].iter().collect());
            i += 1;
            start = i;
            last_space = None;
            continue;
        }
        if c == ' ' {
            last_space = Some(i);
        }
        if i - start + 1 > max_chars {
            match last_space {
                Some(sep) => {
                    lines.push(chars[start..sep].iter().collect());
                    start = sep + 1;
                    while chars.get(start) == Some(&' ') {
                        start += 1;
                    }
                    // The break already ended the line.
                    if chars.get(start) == Some(&'\n') {
                        start += 1;
                    }
                }
                None => {
                    let end = if i == start { i + 1 } else { i };
                    lines.push(chars[start..end].iter().collect());
                    start = end;
                }
            }
            last_space = None;
            i = i.max(start);
            continue;
        }
        i += 1;
    }
    if start < chars.len() || lines.is_empty() || chars.last() == Some(&'\n') {
        lines.push(chars[start..].iter().collect());
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
