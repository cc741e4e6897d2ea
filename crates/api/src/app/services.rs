use std::sync::Arc;

use invoicer_documents::PdfRenderer;
use invoicer_infra::{InvoiceRepository, InvoiceService};

/// Submission pipeline over whichever repository the process was configured with.
pub type InvoicePipeline = InvoiceService<Arc<dyn InvoiceRepository>, PdfRenderer>;

/// Shared, immutable handler state.
pub struct AppServices {
    pub invoices: InvoicePipeline,
}

pub fn build_services(repository: Arc<dyn InvoiceRepository>) -> AppServices {
    AppServices {
        invoices: InvoiceService::new(repository, PdfRenderer::default()),
    }
}
