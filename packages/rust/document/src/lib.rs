//! Paginated application documents.
//!
//! Rendering is split in two: [`layout`] turns a record into pages of draw
//! operations, [`pdf`] encodes those pages. [`render_application_pdf`] runs both.

pub mod application;
pub mod format;
pub mod layout;
pub mod pdf;

use leadline_shared::{DocumentConfig, LifeInsuranceApplication, Result};

pub use application::{document_filename, render_application, short_id};
pub use format::{FieldValue, NOT_AVAILABLE, wrap_text};
pub use layout::{Document, DrawOp, LayoutEngine, LayoutMetrics, Page, PageChrome};
pub use pdf::write_pdf;

/// A finished file: name plus bytes.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub pages: usize,
    pub bytes: Vec<u8>,
}

/// Lay out and encode a stored application with default metrics.
pub fn render_application_pdf(
    app: &LifeInsuranceApplication,
    config: &DocumentConfig,
) -> Result<RenderedDocument> {
    let doc = render_application(app, config, LayoutMetrics::default());
    let bytes = write_pdf(&doc)?;
    Ok(RenderedDocument {
        filename: document_filename(&config.file_prefix, &config.entity_type, &app.id),
        pages: doc.pages.len(),
        bytes,
    })
}
