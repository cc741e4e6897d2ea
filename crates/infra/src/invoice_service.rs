//! Invoice submission pipeline (application-level orchestration).
//!
//! ```text
//! SubmitInvoice
//!   ↓
//! 1. Validate line items (fail-soft numeric coercion)
//!   ↓
//! 2. Aggregate (drop quantity <= 0, sum the grand total)
//!   ↓
//! 3. Persist header + items in one transaction (assigns the invoice id)
//!   ↓
//! 4. Render the document
//!   ↓
//! DeliveredInvoice
//! ```
//!
//! Nothing is persisted or rendered for a submission without valid items. A
//! render failure leaves the invoice persisted; there are no retries and no
//! state kept between calls.

use core::fmt;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn, Span};

use invoicer_core::{format_amount, DomainError, InvoiceId};
use invoicer_documents::{DocumentRenderer, RenderError};
use invoicer_invoicing::{assemble, InvoiceHeader, RawLineItem};

use crate::repository::{InvoiceRepository, RepositoryError};

/// One invoice submission as handed over by the intake boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitInvoice {
    pub header: InvoiceHeader,
    /// Raw items in input order.
    pub line_items: Vec<RawLineItem>,
}

/// A persisted and rendered invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredInvoice {
    pub invoice_id: InvoiceId,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lifecycle of a single submission.
///
/// `ReceivedInput → Validated → Aggregated → Persisted → Rendered → Delivered`,
/// with the exits `RejectedEmpty` (nothing left after aggregation) and
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    ReceivedInput,
    Validated,
    Aggregated,
    Persisted,
    Rendered,
    Delivered,
    RejectedEmpty,
    Failed,
}

impl SubmissionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStage::ReceivedInput => "received_input",
            SubmissionStage::Validated => "validated",
            SubmissionStage::Aggregated => "aggregated",
            SubmissionStage::Persisted => "persisted",
            SubmissionStage::Rendered => "rendered",
            SubmissionStage::Delivered => "delivered",
            SubmissionStage::RejectedEmpty => "rejected_empty",
            SubmissionStage::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission failure, one variant per user-visible outcome.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every line item was dropped (or none was supplied).
    #[error("No valid items added")]
    NoValidItems,

    /// A line amount or the grand total does not fit the decimal range.
    #[error("invoice total out of range: {0}")]
    TotalOutOfRange(String),

    /// Any other domain rejection of the assembled invoice.
    #[error("invoice rejected: {0}")]
    InvalidInvoice(String),

    /// The repository could not store the invoice; nothing was written.
    #[error("invoice storage unavailable: {0}")]
    StorageUnavailable(#[source] RepositoryError),

    /// The invoice was stored but its document could not be produced.
    #[error("invoice {invoice_id} was saved but its document could not be rendered: {source}")]
    RenderFailure {
        invoice_id: InvoiceId,
        #[source]
        source: RenderError,
    },
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NoValidItems => "no_valid_items",
            ServiceError::TotalOutOfRange(_) => "total_out_of_range",
            ServiceError::InvalidInvoice(_) => "invalid_invoice",
            ServiceError::StorageUnavailable(_) => "storage_unavailable",
            ServiceError::RenderFailure { .. } => "render_failure",
        }
    }

    /// Terminal stage the submission ended in.
    pub fn stage(&self) -> SubmissionStage {
        match self {
            ServiceError::NoValidItems => SubmissionStage::RejectedEmpty,
            _ => SubmissionStage::Failed,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NoValidItems => ServiceError::NoValidItems,
            DomainError::AmountOutOfRange(msg) => ServiceError::TotalOutOfRange(msg),
            other => ServiceError::InvalidInvoice(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        ServiceError::StorageUnavailable(value)
    }
}

/// Runs submissions through validation, aggregation, storage and rendering.
///
/// Generic over the repository and renderer so tests can use the in-memory
/// store and counting doubles.
#[derive(Debug)]
pub struct InvoiceService<R, D> {
    repository: R,
    renderer: D,
}

impl<R, D> InvoiceService<R, D> {
    pub fn new(repository: R, renderer: D) -> Self {
        Self {
            repository,
            renderer,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_parts(self) -> (R, D) {
        (self.repository, self.renderer)
    }
}

impl<R, D> InvoiceService<R, D>
where
    R: InvoiceRepository,
    D: DocumentRenderer,
{
    /// Submit one invoice.
    ///
    /// On success the invoice is persisted under a fresh identifier and its
    /// document is returned. On `NoValidItems`/`TotalOutOfRange` nothing was
    /// stored; on `StorageUnavailable` the transaction was rolled back; on
    /// `RenderFailure` the invoice remains stored.
    #[instrument(
        skip(self, request),
        fields(
            invoice_no = %request.header.invoice_number,
            raw_items = request.line_items.len(),
            stage = tracing::field::Empty,
            invoice_id = tracing::field::Empty
        )
    )]
    pub async fn submit(&self, request: SubmitInvoice) -> Result<DeliveredInvoice, ServiceError> {
        let span = Span::current();
        transition(&span, SubmissionStage::ReceivedInput);

        let assembled = match assemble(request.header, &request.line_items) {
            Ok(assembled) => assembled,
            Err(err) => {
                let err = ServiceError::from(err);
                transition(&span, err.stage());
                warn!(code = err.code(), "submission rejected: {err}");
                return Err(err);
            }
        };

        for (position, note) in &assembled.coerced {
            debug!(
                position,
                field = %note.field,
                raw = ?note.raw,
                "numeric field coerced to zero"
            );
        }
        transition(&span, SubmissionStage::Validated);

        let invoice = assembled.invoice;
        debug!(
            retained = invoice.line_items().len(),
            dropped = assembled.dropped.len(),
            grand_total = %format_amount(invoice.grand_total()),
            "line items aggregated"
        );
        transition(&span, SubmissionStage::Aggregated);

        let invoice_id = match self.repository.persist(&invoice).await {
            Ok(id) => id,
            Err(err) => {
                transition(&span, SubmissionStage::Failed);
                error!(error = %err, "persisting invoice failed");
                return Err(err.into());
            }
        };
        span.record("invoice_id", invoice_id.get());
        transition(&span, SubmissionStage::Persisted);

        let document = match self.renderer.render(&invoice) {
            Ok(document) => document,
            Err(source) => {
                transition(&span, SubmissionStage::Failed);
                error!(error = %source, "rendering persisted invoice failed");
                return Err(ServiceError::RenderFailure { invoice_id, source });
            }
        };
        transition(&span, SubmissionStage::Rendered);

        let delivered = DeliveredInvoice {
            invoice_id,
            filename: document.filename,
            bytes: document.bytes,
        };
        transition(&span, SubmissionStage::Delivered);
        info!(
            filename = %delivered.filename,
            bytes = delivered.bytes.len(),
            "invoice delivered"
        );
        Ok(delivered)
    }
}

fn transition(span: &Span, stage: SubmissionStage) {
    span.record("stage", stage.as_str());
    debug!(stage = stage.as_str(), "submission stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use invoicer_documents::{PdfRenderer, RenderedDocument};
    use invoicer_invoicing::{Invoice, PersistedInvoice};

    use crate::repository::InMemoryInvoiceRepository;

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl DocumentRenderer for CountingRenderer {
        fn render(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RenderError::Encode("disk full".to_string()));
            }
            PdfRenderer::default().render(invoice)
        }
    }

    #[derive(Default)]
    struct UnavailableRepository {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InvoiceRepository for UnavailableRepository {
        async fn persist(&self, _invoice: &Invoice) -> Result<InvoiceId, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Unavailable("database is locked".to_string()))
        }

        async fn load(&self, _id: InvoiceId) -> Result<Option<PersistedInvoice>, RepositoryError> {
            Ok(None)
        }
    }

    fn request(items: &[(&str, &str, &str, &str)]) -> SubmitInvoice {
        SubmitInvoice {
            header: InvoiceHeader::new("Acme", "INV-7", "2024-01-31"),
            line_items: items
                .iter()
                .map(|(d, h, q, r)| RawLineItem::new(*d, *h, *q, *r))
                .collect(),
        }
    }

    fn service() -> InvoiceService<Arc<InMemoryInvoiceRepository>, Arc<CountingRenderer>> {
        InvoiceService::new(
            Arc::new(InMemoryInvoiceRepository::new()),
            Arc::new(CountingRenderer::default()),
        )
    }

    #[tokio::test]
    async fn submit_persists_and_renders() {
        let service = service();
        let delivered = service
            .submit(request(&[
                ("Widget", "1234", "2", "50.00"),
                ("Bolt", "", "-1", "10"),
            ]))
            .await
            .unwrap();

        assert_eq!(delivered.filename, "invoice_INV-7.pdf");
        assert!(delivered.bytes.starts_with(b"%PDF-"));

        let stored = service
            .repository()
            .load(delivered.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.invoice.line_items().len(), 1);
        assert_eq!(format_amount(stored.invoice.grand_total()), "100.00");
    }

    #[tokio::test]
    async fn coerced_rate_is_still_delivered() {
        let service = service();
        let delivered = service
            .submit(request(&[("A", "", "3", "bad")]))
            .await
            .unwrap();

        let stored = service
            .repository()
            .load(delivered.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(format_amount(stored.invoice.grand_total()), "0.00");
    }

    #[tokio::test]
    async fn empty_submission_touches_neither_storage_nor_renderer() {
        let service = service();
        let err = service.submit(request(&[])).await.unwrap_err();

        assert!(matches!(err, ServiceError::NoValidItems));
        assert_eq!(err.stage(), SubmissionStage::RejectedEmpty);
        assert_eq!(err.to_string(), "No valid items added");

        let (repo, renderer) = service.into_parts();
        assert_eq!(repo.invoice_count(), 0);
        assert_eq!(repo.item_count(), 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_items_dropped_is_rejected() {
        let service = service();
        let err = service
            .submit(request(&[("x", "", "0", "5"), ("y", "", "abc", "1")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "no_valid_items");
    }

    #[tokio::test]
    async fn storage_failure_skips_rendering() {
        let repo = Arc::new(UnavailableRepository::default());
        let renderer = Arc::new(CountingRenderer::default());
        let service = InvoiceService::new(repo.clone(), renderer.clone());

        let err = service
            .submit(request(&[("Widget", "", "1", "1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::StorageUnavailable(_)));
        assert_eq!(err.stage(), SubmissionStage::Failed);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn render_failure_keeps_the_invoice_persisted() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let renderer = Arc::new(CountingRenderer {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let service = InvoiceService::new(repo.clone(), renderer);

        let err = service
            .submit(request(&[("Widget", "", "1", "1")]))
            .await
            .unwrap_err();

        let ServiceError::RenderFailure { invoice_id, .. } = err else {
            panic!("expected render failure, got {err:?}");
        };
        assert!(repo.load(invoice_id).await.unwrap().is_some());
        assert_eq!(repo.invoice_count(), 1);
    }

    #[tokio::test]
    async fn identical_submissions_get_distinct_increasing_ids() {
        let service = service();
        let first = service
            .submit(request(&[("Widget", "", "1", "1")]))
            .await
            .unwrap();
        let second = service
            .submit(request(&[("Widget", "", "1", "1")]))
            .await
            .unwrap();

        assert!(second.invoice_id > first.invoice_id);
        assert_eq!(first.bytes, second.bytes);
    }

    #[tokio::test]
    async fn overflowing_total_is_out_of_range() {
        let big = "39614081257132168796771975168";
        let service = service();
        let err = service
            .submit(request(&[("a", "", "1", big), ("b", "", "1", big), ("c", "", "1", big)]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::TotalOutOfRange(_)));
        assert_eq!(service.repository().invoice_count(), 0);
    }
}
