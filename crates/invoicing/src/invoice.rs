use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use invoicer_core::{Amount, DomainError, DomainResult, Entity, InvoiceId};

use crate::line_item::{validate_line_item, InvalidNumericField, LineItem, RawLineItem};

/// Header fields of an invoice, taken verbatim from the intake boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    pub company_name: String,
    /// Printed as-is; also the basis of the delivered filename.
    pub invoice_number: String,
    /// Free-form; empty when not supplied.
    pub invoice_date: String,
}

impl InvoiceHeader {
    pub fn new(
        company_name: impl Into<String>,
        invoice_number: impl Into<String>,
        invoice_date: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            invoice_number: invoice_number.into(),
            invoice_date: invoice_date.into(),
        }
    }
}

/// An assembled invoice that has not (yet) been given an identifier.
///
/// Invariants: at least one line item, every line item has `quantity > 0`,
/// `grand_total` is the exact sum of the line amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    header: InvoiceHeader,
    line_items: Vec<LineItem>,
    grand_total: Amount,
}

impl Invoice {
    /// Build an invoice from already-validated line items, enforcing the invariants.
    pub fn from_line_items(header: InvoiceHeader, line_items: Vec<LineItem>) -> DomainResult<Self> {
        if line_items.is_empty() {
            return Err(DomainError::NoValidItems);
        }
        if let Some(pos) = line_items.iter().position(|item| !item.is_retained()) {
            return Err(DomainError::invariant(format!(
                "line {} has a non-positive quantity",
                pos + 1
            )));
        }

        let mut grand_total = Decimal::ZERO;
        for item in &line_items {
            grand_total = grand_total
                .checked_add(item.amount())
                .ok_or_else(|| DomainError::out_of_range("invoice total overflows"))?;
        }

        Ok(Self {
            header,
            line_items,
            grand_total,
        })
    }

    pub fn header(&self) -> &InvoiceHeader {
        &self.header
    }

    pub fn company_name(&self) -> &str {
        &self.header.company_name
    }

    pub fn invoice_number(&self) -> &str {
        &self.header.invoice_number
    }

    pub fn invoice_date(&self) -> &str {
        &self.header.invoice_date
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn grand_total(&self) -> Amount {
        self.grand_total
    }
}

/// An invoice after storage has issued its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedInvoice {
    pub id: InvoiceId,
    pub invoice: Invoice,
}

impl Entity for PersistedInvoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Result of a successful [`assemble`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub invoice: Invoice,
    /// Numeric coercions, keyed by 1-based input position.
    pub coerced: Vec<(usize, InvalidNumericField)>,
    /// 1-based input positions dropped because their quantity was not positive.
    pub dropped: Vec<usize>,
}

/// Assemble an invoice from header fields and raw line items.
///
/// Items are validated in input order; those with `quantity <= 0` are dropped.
/// Fails with [`DomainError::NoValidItems`] when nothing is left.
pub fn assemble(header: InvoiceHeader, raw_items: &[RawLineItem]) -> DomainResult<Assembled> {
    let mut retained = Vec::with_capacity(raw_items.len());
    let mut coerced = Vec::new();
    let mut dropped = Vec::new();

    for (idx, raw) in raw_items.iter().enumerate() {
        let position = idx + 1;
        let validated = validate_line_item(raw);
        coerced.extend(validated.coerced.into_iter().map(|c| (position, c)));

        if validated.item.is_retained() {
            retained.push(validated.item);
        } else {
            dropped.push(position);
        }
    }

    let invoice = Invoice::from_line_items(header, retained)?;
    Ok(Assembled {
        invoice,
        coerced,
        dropped,
    })
}
