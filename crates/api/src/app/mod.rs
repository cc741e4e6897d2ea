//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the submission pipeline the handlers share
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: form decoding into a submission
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use invoicer_infra::InvoiceRepository;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(repository: Arc<dyn InvoiceRepository>) -> Router {
    let services = Arc::new(services::build_services(repository));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
}
