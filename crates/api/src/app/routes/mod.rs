use axum::{routing::get, Router};

pub mod invoices;
pub mod system;

/// Router for the invoice entry form and its submission.
pub fn router() -> Router {
    Router::new().route("/", get(invoices::form_page).post(invoices::submit_invoice))
}
