//! Invoicing domain module.
//!
//! This crate contains the business rules for turning raw form input into an
//! invoice: per-line validation with fail-soft numeric coercion, and aggregation
//! into an ordered invoice with an exact grand total. Pure domain logic (no IO,
//! no HTTP, no storage).

pub mod invoice;
pub mod line_item;

pub use invoice::{assemble, Assembled, Invoice, InvoiceHeader, PersistedInvoice};
pub use line_item::{
    validate_line_item, InvalidNumericField, LineItem, NumericField, RawLineItem,
    ValidatedLineItem,
};
