use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use invoicer_core::{InvoiceId, LineItemId};
use invoicer_invoicing::{Invoice, InvoiceHeader, LineItem, PersistedInvoice};

use super::{InvoiceRepository, RepositoryError};

#[derive(Debug, Clone)]
struct InvoiceRow {
    company_name: String,
    invoice_no: String,
    invoice_date: String,
}

#[derive(Debug, Clone)]
struct ItemRow {
    id: LineItemId,
    invoice_id: InvoiceId,
    description: String,
    hsn: String,
    qty: Decimal,
    rate: Decimal,
}

#[derive(Debug, Default)]
struct Tables {
    last_invoice_id: i64,
    last_item_id: i64,
    invoices: BTreeMap<InvoiceId, InvoiceRow>,
    items: Vec<ItemRow>,
}

/// In-memory invoice store.
///
/// Intended for tests/dev. A single write lock covers identifier allocation and
/// row insertion, so a persist is all-or-nothing and identifiers are issued in
/// commit order.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    tables: RwLock<Tables>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in the `invoices` relation.
    pub fn invoice_count(&self) -> usize {
        self.tables.read().map(|t| t.invoices.len()).unwrap_or(0)
    }

    /// Number of rows in the `items` relation.
    pub fn item_count(&self) -> usize {
        self.tables.read().map(|t| t.items.len()).unwrap_or(0)
    }
}

fn next_id(last: i64) -> Result<i64, RepositoryError> {
    last.checked_add(1)
        .ok_or_else(|| RepositoryError::Unavailable("identifier sequence exhausted".to_string()))
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn persist(&self, invoice: &Invoice) -> Result<InvoiceId, RepositoryError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))?;

        // Stage everything first; tables are only touched once nothing can fail.
        let raw_invoice_id = next_id(tables.last_invoice_id)?;
        let invoice_id = InvoiceId::from_raw(raw_invoice_id)
            .map_err(|e| RepositoryError::Write(e.to_string()))?;

        let mut last_item_id = tables.last_item_id;
        let mut staged = Vec::with_capacity(invoice.line_items().len());
        for item in invoice.line_items() {
            last_item_id = next_id(last_item_id)?;
            staged.push(ItemRow {
                id: LineItemId::from_raw(last_item_id)
                    .map_err(|e| RepositoryError::Write(e.to_string()))?,
                invoice_id,
                description: item.description().to_string(),
                hsn: item.hsn_code().to_string(),
                qty: item.quantity(),
                rate: item.unit_rate(),
            });
        }

        // Commit.
        tables.last_invoice_id = raw_invoice_id;
        tables.last_item_id = last_item_id;
        tables.invoices.insert(
            invoice_id,
            InvoiceRow {
                company_name: invoice.company_name().to_string(),
                invoice_no: invoice.invoice_number().to_string(),
                invoice_date: invoice.invoice_date().to_string(),
            },
        );
        tables.items.extend(staged);

        Ok(invoice_id)
    }

    async fn load(&self, id: InvoiceId) -> Result<Option<PersistedInvoice>, RepositoryError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))?;

        let Some(row) = tables.invoices.get(&id) else {
            return Ok(None);
        };

        let mut rows: Vec<&ItemRow> = tables.items.iter().filter(|i| i.invoice_id == id).collect();
        rows.sort_by_key(|r| r.id);

        let mut line_items = Vec::with_capacity(rows.len());
        for item in rows {
            let line = LineItem::new(&item.description, &item.hsn, item.qty, item.rate)
                .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            line_items.push(line);
        }

        let header = InvoiceHeader::new(&row.company_name, &row.invoice_no, &row.invoice_date);
        let invoice = Invoice::from_line_items(header, line_items)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(Some(PersistedInvoice { id, invoice }))
    }
}
