//! `invoicer-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod amount;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use amount::{format_amount, format_quantity, Amount, AMOUNT_SCALE};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, LineItemId};
pub use value_object::ValueObject;
