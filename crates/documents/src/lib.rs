//! Invoice document rendering.
//!
//! Rendering is split in two passes:
//!
//! 1. [`layout`] turns an [`Invoice`] into a page model: title block, table
//!    rows placed on pages, header row repeated on every page, total row last.
//!    Pure and deterministic.
//! 2. [`pdf`] encodes that page model as a PDF byte stream (grid lines,
//!    shaded header, Helvetica text). No timestamps or document ids are
//!    embedded, so the same invoice always yields the same bytes.
//!
//! Every call builds its own layout and PDF document; a renderer holds only
//! immutable page geometry and is safe to share across threads.

pub mod filename;
pub mod layout;
pub mod metrics;
pub mod pdf;

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use invoicer_invoicing::Invoice;

pub use filename::{document_filename, sanitize_file_stem};
pub use layout::{DocumentLayout, PageLayout, PageSpec, PlacedRow, RowKind, TextLine, COLUMN_LABELS};

/// Rendering failure. Nothing partial is ever returned alongside it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// The page geometry cannot hold the title block, a header row and one body row.
    #[error("page too small: {0}")]
    PageTooSmall(String),

    /// The PDF serializer failed.
    #[error("document encoding failed: {0}")]
    Encode(String),
}

/// A rendered invoice ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Suggested, filesystem- and header-safe filename.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Turns an assembled invoice into a document byte stream.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError>;
}

impl<R> DocumentRenderer for Arc<R>
where
    R: DocumentRenderer + ?Sized,
{
    fn render(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        (**self).render(invoice)
    }
}

/// PDF renderer with fixed page geometry (A4, 20 mm margins by default).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdfRenderer {
    page: PageSpec,
}

impl PdfRenderer {
    pub fn new(page: PageSpec) -> Self {
        Self { page }
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }
}

impl DocumentRenderer for PdfRenderer {
    #[instrument(
        skip(self, invoice),
        fields(invoice_number = %invoice.invoice_number(), lines = invoice.line_items().len()),
        err
    )]
    fn render(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        let layout = layout::layout(invoice, self.page)?;
        let bytes = pdf::encode(&layout)?;

        tracing::debug!(pages = layout.pages.len(), bytes = bytes.len(), "invoice rendered");

        Ok(RenderedDocument {
            filename: document_filename(invoice.invoice_number()),
            bytes,
        })
    }
}
