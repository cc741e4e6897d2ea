use std::collections::HashMap;

use thiserror::Error;

use invoicer_infra::SubmitInvoice;
use invoicer_invoicing::{InvoiceHeader, RawLineItem};

// -------------------------
// Request DTOs
// -------------------------

/// Header fields that must be present and non-blank.
pub const REQUIRED_FIELDS: [&str; 2] = ["company_name", "invoice_no"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A decoded `application/x-www-form-urlencoded` invoice form.
///
/// When a field name repeats, the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct InvoiceForm {
    fields: HashMap<String, String>,
}

impl InvoiceForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields = HashMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            fields.entry(name).or_insert(value);
        }
        Self { fields }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn required(&self, name: &'static str) -> Result<String, FormError> {
        match self.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => Err(FormError::MissingField(name)),
        }
    }

    /// Line items in index order: `desc_1, desc_2, ...` up to the first
    /// missing `desc_N`. Missing `hsn_N` is empty; missing `qty_N`/`rate_N`
    /// stay absent for the validator to coerce.
    pub fn line_items(&self) -> Vec<RawLineItem> {
        let mut items = Vec::new();
        for index in 1usize.. {
            let Some(description) = self.get(&format!("desc_{index}")) else {
                break;
            };
            items.push(RawLineItem {
                description: description.to_string(),
                hsn_code: self.get(&format!("hsn_{index}")).unwrap_or_default().to_string(),
                quantity: self.get(&format!("qty_{index}")).map(str::to_string),
                rate: self.get(&format!("rate_{index}")).map(str::to_string),
            });
        }
        items
    }

    pub fn into_submission(self) -> Result<SubmitInvoice, FormError> {
        let [company_field, number_field] = REQUIRED_FIELDS;
        let header = InvoiceHeader::new(
            self.required(company_field)?,
            self.required(number_field)?,
            self.get("invoice_date").unwrap_or_default(),
        );
        Ok(SubmitInvoice {
            header,
            line_items: self.line_items(),
        })
    }
}
