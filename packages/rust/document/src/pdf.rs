//! Replays a laid-out [`Document`] onto `printpdf` pages.

use std::io::BufWriter;

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect, Rgb,
};
use tracing::instrument;

use leadline_shared::{LeadlineError, Result};

use crate::layout::{DrawOp, Document, Tint, Weight};

fn color(t: Tint) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(t.r) / 255.0,
        f32::from(t.g) / 255.0,
        f32::from(t.b) / 255.0,
        None,
    ))
}

fn render_err(what: &str, e: impl std::fmt::Display) -> LeadlineError {
    LeadlineError::Render(format!("PDF {what} error: {e}"))
}

/// Encode the document as PDF bytes.
#[instrument(skip_all, fields(pages = doc.pages.len()))]
pub fn write_pdf(doc: &Document) -> Result<Vec<u8>> {
    let m = &doc.metrics;
    let (pdf, first_page, first_layer) =
        PdfDocument::new(&doc.title, Mm(m.page_width), Mm(m.page_height), "Layer 1");

    let regular = pdf
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| render_err("font", e))?;
    let bold = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| render_err("font", e))?;

    for (index, page) in doc.pages.iter().enumerate() {
        let layer = if index == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = pdf.add_page(
                Mm(m.page_width),
                Mm(m.page_height),
                format!("Page {}", index + 1),
            );
            pdf.get_page(p).get_layer(l)
        };

        for op in &page.ops {
            replay(&layer, op, m.page_height, &regular, &bold);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    pdf.save(&mut buf).map_err(|e| render_err("save", e))?;
    buf.into_inner().map_err(|e| render_err("buffer", e))
}

/// PDF space has its origin bottom-left, layout space top-left.
fn replay(
    layer: &PdfLayerReference,
    op: &DrawOp,
    page_height: f32,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            size,
            weight,
            color: tint,
        } => {
            let font = match weight {
                Weight::Regular => regular,
                Weight::Bold => bold,
            };
            layer.set_fill_color(color(*tint));
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(page_height - y), font);
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            layer.set_fill_color(color(*fill));
            let rect = Rect::new(
                Mm(*x),
                Mm(page_height - y - height),
                Mm(x + width),
                Mm(page_height - y),
            )
            .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
        DrawOp::Rule {
            x1,
            x2,
            y,
            color: tint,
        } => {
            layer.set_outline_color(color(*tint));
            layer.set_outline_thickness(0.5);
            let baseline = Mm(page_height - y);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), baseline), false),
                    (Point::new(Mm(*x2), baseline), false),
                ],
                is_closed: false,
            });
        }
    }
}
