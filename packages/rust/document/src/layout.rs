//! Pagination engine.
//!
//! Layout is a pure function of the content and [`LayoutMetrics`]: the engine
//! walks a vertical cursor down the page, breaks pages when the next block would
//! cross into the footer margin, and emits [`DrawOp`]s per page. Nothing here
//! touches PDF; [`crate::pdf`] replays the ops.
//!
//! All coordinates are millimetres measured from the top-left page corner.

use crate::format::{FieldValue, wrap_text};

/// Geometry and type sizes. The defaults describe an A4 portrait page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMetrics {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_x: f32,
    /// Height of the coloured header band.
    pub header_height: f32,
    /// Cursor position right below the header on a fresh page.
    pub content_top: f32,
    /// Content may not extend past `page_height - footer_margin`.
    pub footer_margin: f32,
    /// Height of a single-line field row.
    pub field_height: f32,
    pub line_height: f32,
    /// Extra height added to wrapped (multi-line) field rows.
    pub multiline_padding: f32,
    pub section_header_height: f32,
    /// A section header is only drawn if this much room remains.
    pub section_min_space: f32,
    pub record_header_height: f32,
    /// A repeating sub-record is only started if this much room remains.
    pub record_min_space: f32,
    pub record_gap: f32,
    /// Width of the label column.
    pub label_width: f32,
    pub font_size: f32,
    /// Average glyph advance at `font_size`, used for wrapping and alignment.
    pub char_width: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin_x: 15.0,
            header_height: 32.0,
            content_top: 40.0,
            footer_margin: 20.0,
            field_height: 7.0,
            line_height: 4.5,
            multiline_padding: 3.0,
            section_header_height: 10.0,
            section_min_space: 40.0,
            record_header_height: 7.0,
            record_min_space: 50.0,
            record_gap: 3.0,
            label_width: 65.0,
            font_size: 9.0,
            char_width: 1.65,
        }
    }
}

impl LayoutMetrics {
    /// Lowest y any body content may reach.
    pub fn printable_bottom(&self) -> f32 {
        self.page_height - self.footer_margin
    }

    fn value_x(&self) -> f32 {
        self.margin_x + self.label_width
    }

    fn value_width(&self) -> f32 {
        self.page_width - self.margin_x - self.value_x()
    }

    /// Characters of body text that fit in `width` millimetres.
    pub fn chars_for(&self, width: f32) -> usize {
        ((width / self.char_width).floor() as usize).max(1)
    }

    /// Estimated rendered width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * self.char_width * (size / self.font_size)
    }
}

// ---------------------------------------------------------------------------
// Draw operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    pub const NAVY: Tint = Tint { r: 30, g: 58, b: 95 };
    pub const WHITE: Tint = Tint { r: 255, g: 255, b: 255 };
    pub const INK: Tint = Tint { r: 33, g: 37, b: 41 };
    pub const MUTED: Tint = Tint { r: 108, g: 117, b: 125 };
    pub const SECTION_BAND: Tint = Tint { r: 226, g: 232, b: 240 };
    pub const RECORD_SHADE: Tint = Tint { r: 245, g: 247, b: 250 };
    pub const RULE: Tint = Tint { r: 200, g: 205, b: 212 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: Weight,
        color: Tint,
    },
    /// Filled rectangle with its top-left corner at `(x, y)`.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Tint,
    },
    /// Horizontal rule.
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: Tint,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text drawn on the page, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A laid-out document, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub metrics: LayoutMetrics,
    pub pages: Vec<Page>,
}

/// What is repeated on every page.
#[derive(Debug, Clone, Default)]
pub struct PageChrome {
    /// Large text in the header band.
    pub heading: String,
    pub subheading: String,
    /// Right-aligned lines in the header band.
    pub header_lines: Vec<String>,
    /// Centered in the footer.
    pub footer_contact: String,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateful layout cursor. Create, feed sections and fields, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct LayoutEngine {
    metrics: LayoutMetrics,
    chrome: PageChrome,
    title: String,
    pages: Vec<Page>,
    y: f32,
}

impl LayoutEngine {
    pub fn new(title: impl Into<String>, metrics: LayoutMetrics, chrome: PageChrome) -> Self {
        let mut engine = Self {
            y: metrics.content_top,
            metrics,
            chrome,
            title: title.into(),
            pages: Vec::new(),
        };
        engine.start_page();
        engine
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Current cursor position.
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn start_page(&mut self) {
        self.pages.push(Page::default());
        self.draw_header();
        self.y = self.metrics.content_top;
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, op: DrawOp) {
        self.page().ops.push(op);
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, size: f32, weight: Weight, color: Tint) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            size,
            weight,
            color,
        });
    }

    fn draw_header(&mut self) {
        let m = self.metrics.clone();
        self.push(DrawOp::Rect {
            x: 0.0,
            y: 0.0,
            width: m.page_width,
            height: m.header_height,
            fill: Tint::NAVY,
        });

        let heading = self.chrome.heading.clone();
        let subheading = self.chrome.subheading.clone();
        self.text(m.margin_x, 13.0, heading, 16.0, Weight::Bold, Tint::WHITE);
        self.text(m.margin_x, 21.0, subheading, 11.0, Weight::Regular, Tint::WHITE);

        let lines = self.chrome.header_lines.clone();
        for (i, line) in lines.into_iter().enumerate() {
            let x = m.page_width - m.margin_x - m.text_width(&line, 8.0);
            self.text(x, 12.0 + i as f32 * 5.0, line, 8.0, Weight::Regular, Tint::WHITE);
        }
    }

    /// Break to a new page unless `needed` more millimetres fit above the footer.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed > self.metrics.printable_bottom() {
            self.start_page();
            true
        } else {
            false
        }
    }

    /// Section header band; breaks first unless a minimum block still fits.
    pub fn section(&mut self, title: &str) {
        let m = self.metrics.clone();
        self.ensure_space(m.section_min_space);

        self.push(DrawOp::Rect {
            x: m.margin_x,
            y: self.y,
            width: m.page_width - 2.0 * m.margin_x,
            height: m.section_header_height - 2.0,
            fill: Tint::SECTION_BAND,
        });
        let baseline = self.y + m.section_header_height / 2.0 + 0.5;
        self.text(m.margin_x + 2.0, baseline, title, 11.0, Weight::Bold, Tint::NAVY);
        self.y += m.section_header_height;
    }

    /// Height a field row will take, from its wrapped line count.
    pub fn field_height(&self, value: &FieldValue) -> f32 {
        let lines = self.wrap_value(&value.display()).len();
        self.height_for_lines(lines)
    }

    fn height_for_lines(&self, lines: usize) -> f32 {
        if lines <= 1 {
            self.metrics.field_height
        } else {
            lines as f32 * self.metrics.line_height + self.metrics.multiline_padding
        }
    }

    fn wrap_value(&self, display: &str) -> Vec<String> {
        let width = self.metrics.value_width();
        wrap_text(display, self.metrics.chars_for(width))
    }

    /// One labelled value. Single-line values are right-aligned; wrapped
    /// values are left-aligned in the value column.
    pub fn field(&mut self, label: &str, value: &FieldValue) {
        self.field_row(label, value, None);
    }

    fn field_row(&mut self, label: &str, value: &FieldValue, shade: Option<Tint>) {
        let m = self.metrics.clone();
        let display = value.display();
        let lines = self.wrap_value(&display);
        let needed = self.height_for_lines(lines.len());

        if lines.len() == 1 {
            self.ensure_space(needed);
            self.row_background(needed, shade);
            let baseline = self.y + m.line_height;
            self.text(m.margin_x + 2.0, baseline, label, m.font_size, Weight::Bold, Tint::INK);
            let x = m.page_width - m.margin_x - 2.0 - m.text_width(&display, m.font_size);
            self.text(x.max(m.value_x()), baseline, display, m.font_size, Weight::Regular, Tint::INK);
            self.y += needed;
            return;
        }

        // A value that fits on a fresh page is kept together; a longer one
        // fills the current page and continues on the next.
        if needed <= m.printable_bottom() - m.content_top {
            self.ensure_space(needed);
        }

        let mut remaining = lines.as_slice();
        let mut first = true;
        while !remaining.is_empty() {
            let fit = self.lines_that_fit();
            if fit == 0 && self.y > m.content_top {
                self.start_page();
                continue;
            }
            let fit = fit.max(1);
            let (chunk, rest) = remaining.split_at(fit.min(remaining.len()));
            let height = chunk.len() as f32 * m.line_height + m.multiline_padding;
            self.row_background(height, shade);

            let baseline = self.y + m.line_height;
            if first {
                self.text(m.margin_x + 2.0, baseline, label, m.font_size, Weight::Bold, Tint::INK);
                first = false;
            }
            for (i, line) in chunk.iter().enumerate() {
                let y = baseline + i as f32 * m.line_height;
                self.text(m.value_x(), y, line.clone(), m.font_size, Weight::Regular, Tint::INK);
            }

            self.y += height;
            remaining = rest;
        }
    }

    /// Wrapped lines that still fit above the footer on the current page.
    fn lines_that_fit(&self) -> usize {
        let m = &self.metrics;
        let room = m.printable_bottom() - self.y - m.multiline_padding;
        if room < m.line_height {
            0
        } else {
            (room / m.line_height).floor() as usize
        }
    }

    fn row_background(&mut self, height: f32, shade: Option<Tint>) {
        if let Some(fill) = shade {
            let m = &self.metrics;
            let rect = DrawOp::Rect {
                x: m.margin_x,
                y: self.y,
                width: m.page_width - 2.0 * m.margin_x,
                height,
                fill,
            };
            self.push(rect);
        }
    }

    /// A repeating sub-record (one beneficiary, one policy) drawn as a shaded
    /// block with its own title.
    pub fn record(&mut self, title: &str, fields: &[(&str, FieldValue)]) {
        let m = self.metrics.clone();
        self.ensure_space(m.record_min_space);

        self.push(DrawOp::Rect {
            x: m.margin_x,
            y: self.y,
            width: m.page_width - 2.0 * m.margin_x,
            height: m.record_header_height,
            fill: Tint::RECORD_SHADE,
        });
        self.text(
            m.margin_x + 2.0,
            self.y + m.line_height + 0.5,
            title,
            m.font_size + 1.0,
            Weight::Bold,
            Tint::NAVY,
        );
        self.y += m.record_header_height;

        for (label, value) in fields {
            self.field_row(label, value, Some(Tint::RECORD_SHADE));
        }
        self.y += m.record_gap;
    }

    /// Vertical whitespace, never forcing a page break.
    pub fn gap(&mut self, height: f32) {
        self.y = (self.y + height).min(self.metrics.printable_bottom());
    }

    /// Stamp footers on every page, now that the total is known.
    pub fn finish(mut self) -> Document {
        let m = self.metrics.clone();
        let total = self.pages.len();
        let footer_y = m.page_height - 8.0;
        let contact = self.chrome.footer_contact.clone();

        for (index, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Rule {
                x1: m.margin_x,
                x2: m.page_width - m.margin_x,
                y: m.page_height - m.footer_margin + 6.0,
                color: Tint::RULE,
            });

            if !contact.is_empty() {
                let x = (m.page_width - m.text_width(&contact, 8.0)) / 2.0;
                page.ops.push(DrawOp::Text {
                    x: x.max(m.margin_x),
                    y: footer_y,
                    text: contact.clone(),
                    size: 8.0,
                    weight: Weight::Regular,
                    color: Tint::MUTED,
                });
            }

            let label = page_label(index + 1, total);
            page.ops.push(DrawOp::Text {
                x: m.page_width - m.margin_x - m.text_width(&label, 8.0),
                y: footer_y,
                text: label,
                size: 8.0,
                weight: Weight::Regular,
                color: Tint::MUTED,
            });
        }

        Document {
            title: self.title,
            metrics: self.metrics,
            pages: self.pages,
        }
    }
}

pub fn page_label(page: usize, total: usize) -> String {
    format!("Page {page} of {total}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome() -> PageChrome {
        PageChrome {
            heading: "Firm".into(),
            subheading: "Application".into(),
            header_lines: vec!["ID: ABC".into()],
            footer_contact: "Call us".into(),
        }
    }

    /// Usable height of 140 is exactly 20 rows of 7.
    fn grid_metrics() -> LayoutMetrics {
        LayoutMetrics {
            page_height: 200.0,
            content_top: 30.0,
            footer_margin: 30.0,
            field_height: 7.0,
            ..LayoutMetrics::default()
        }
    }

    fn short_fields(engine: &mut LayoutEngine, n: usize) {
        for i in 0..n {
            engine.field(&format!("Field {i}"), &FieldValue::Text("x".into()));
        }
    }

    #[test]
    fn page_count_matches_content_height() {
        let m = grid_metrics();
        let usable = m.page_height - m.content_top - m.footer_margin;
        for n in [1usize, 19, 20, 21, 45, 60, 61] {
            let mut engine = LayoutEngine::new("t", m.clone(), chrome());
            short_fields(&mut engine, n);
            let doc = engine.finish();
            let expected = ((n as f32 * m.field_height) / usable).ceil() as usize;
            assert_eq!(doc.pages.len(), expected.max(1), "n = {n}");
        }
    }

    #[test]
    fn every_footer_shows_the_final_total() {
        let mut engine = LayoutEngine::new("t", grid_metrics(), chrome());
        short_fields(&mut engine, 45);
        let doc = engine.finish();
        assert_eq!(doc.pages.len(), 3);

        for (i, page) in doc.pages.iter().enumerate() {
            let labels: Vec<&str> = page.texts().filter(|t| t.starts_with("Page ")).collect();
            assert_eq!(labels, vec![page_label(i + 1, 3).as_str()]);
            assert!(page.texts().any(|t| t == "Call us"));
        }
    }

    #[test]
    fn header_is_redrawn_on_each_page() {
        let mut engine = LayoutEngine::new("t", grid_metrics(), chrome());
        short_fields(&mut engine, 45);
        let doc = engine.finish();
        for page in &doc.pages {
            assert!(page.texts().any(|t| t == "Firm"));
            assert!(page.texts().any(|t| t == "ID: ABC"));
        }
    }

    #[test]
    fn content_never_crosses_footer_margin() {
        let m = grid_metrics();
        let mut engine = LayoutEngine::new("t", m.clone(), chrome());
        for i in 0..30 {
            engine.section(&format!("Section {i}"));
            short_fields(&mut engine, 3);
            engine.field("Notes", &FieldValue::Text("word ".repeat(120)));
            assert!(engine.y() <= m.printable_bottom() + 1e-3);
        }
    }

    #[test]
    fn value_longer_than_a_page_continues_on_the_next() {
        let m = LayoutMetrics::default();
        let mut engine = LayoutEngine::new("t", m.clone(), chrome());
        short_fields(&mut engine, 3);
        engine.field("Notes", &FieldValue::Text("word ".repeat(2000)));
        engine.field("After", &FieldValue::Text("x".into()));
        let doc = engine.finish();
        assert!(doc.pages.len() >= 3);

        for page in &doc.pages {
            let body_text = page.ops.iter().filter_map(|op| match op {
                DrawOp::Text { y, text, .. } if !text.starts_with("Page ") && text != "Call us" => {
                    Some(*y)
                }
                _ => None,
            });
            for y in body_text {
                assert!(y <= m.printable_bottom() + 1e-3, "text at {y}");
            }
        }

        // The first page is filled rather than left short.
        let last_on_first = doc.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, text, .. } if text.starts_with("word") => Some(*y),
                _ => None,
            })
            .fold(0.0_f32, f32::max);
        assert!(last_on_first > m.printable_bottom() - 2.0 * m.line_height - m.multiline_padding);

        let labels = doc.pages.iter().flat_map(Page::texts).filter(|t| *t == "Notes").count();
        assert_eq!(labels, 1);
    }

    #[test]
    fn wrapped_value_takes_lines_times_line_height() {
        let m = LayoutMetrics::default();
        let engine = LayoutEngine::new("t", m.clone(), chrome());
        let long = FieldValue::Text("lorem ipsum ".repeat(20));
        let lines = wrap_text(&long.display(), m.chars_for(m.page_width - 2.0 * m.margin_x - m.label_width)).len();
        assert!(lines > 1);
        let expected = lines as f32 * m.line_height + m.multiline_padding;
        assert!((engine.field_height(&long) - expected).abs() < 1e-4);
        assert_eq!(engine.field_height(&FieldValue::Missing), m.field_height);
    }

    #[test]
    fn section_breaks_when_minimum_block_does_not_fit() {
        let m = grid_metrics();
        let mut engine = LayoutEngine::new("t", m.clone(), chrome());
        // 16 rows leave 28mm, less than the 40mm section minimum.
        short_fields(&mut engine, 16);
        assert_eq!(engine.page_count(), 1);
        engine.section("Next");
        assert_eq!(engine.page_count(), 2);
        assert!((engine.y() - (m.content_top + m.section_header_height)).abs() < 1e-4);
    }

    #[test]
    fn record_breaks_with_larger_minimum() {
        let m = grid_metrics();
        let mut engine = LayoutEngine::new("t", m.clone(), chrome());
        // 14 rows leave 42mm: enough for a section, not for a record.
        short_fields(&mut engine, 14);
        engine.record("Beneficiary 1", &[("Name", FieldValue::Text("Mary".into()))]);
        assert_eq!(engine.page_count(), 2);
    }

    #[test]
    fn single_line_values_are_right_aligned() {
        let m = LayoutMetrics::default();
        let mut engine = LayoutEngine::new("t", m.clone(), PageChrome::default());
        engine.field("Name", &FieldValue::Text("Jane".into()));
        let doc = engine.finish();
        let x = doc.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { x, text, .. } if text == "Jane" => Some(*x),
                _ => None,
            })
            .expect("value drawn");
        let right_edge = x + m.text_width("Jane", m.font_size);
        assert!((right_edge - (m.page_width - m.margin_x - 2.0)).abs() < 1e-3);
    }
}
