//! Invoice persistence boundary.
//!
//! An invoice is stored as one header row plus one row per line item. The
//! boundary makes no storage assumptions beyond atomic, identifier-issuing
//! writes; adapters exist for SQLite (production) and memory (tests/dev).

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use invoicer_core::InvoiceId;
use invoicer_invoicing::{Invoice, PersistedInvoice};

pub use in_memory::InMemoryInvoiceRepository;
pub use sqlite::SqliteInvoiceRepository;

/// Repository operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Whatever the
/// variant, a failed `persist` has left nothing behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Connection, pool or transaction-control failure.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A statement inside the transaction failed; the transaction was rolled back.
    #[error("write failed: {0}")]
    Write(String),

    /// A stored row could not be turned back into a domain value.
    #[error("stored data unreadable: {0}")]
    Decode(String),
}

/// Append-only invoice store.
///
/// ## Persist Semantics
///
/// `persist()`:
/// - Inserts the header, then every line item in order, in **one transaction**
/// - Assigns the invoice identifier (monotonically increasing, never reused)
/// - On any failure rolls back completely: no orphaned header, no partial items
///
/// There is no update or delete path.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Store an invoice and its line items atomically, returning the new identifier.
    async fn persist(&self, invoice: &Invoice) -> Result<InvoiceId, RepositoryError>;

    /// Read a stored invoice back, line items in insertion order.
    async fn load(&self, id: InvoiceId) -> Result<Option<PersistedInvoice>, RepositoryError>;
}

#[async_trait]
impl<R> InvoiceRepository for Arc<R>
where
    R: InvoiceRepository + ?Sized,
{
    async fn persist(&self, invoice: &Invoice) -> Result<InvoiceId, RepositoryError> {
        (**self).persist(invoice).await
    }

    async fn load(&self, id: InvoiceId) -> Result<Option<PersistedInvoice>, RepositoryError> {
        (**self).load(id).await
    }
}
