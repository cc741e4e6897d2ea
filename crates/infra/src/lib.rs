//! Infrastructure layer: storage adapters, the submission pipeline, config.

pub mod config;
pub mod invoice_service;
pub mod repository;

pub use config::{AppConfig, ConfigError, StorageBackend};
pub use invoice_service::{
    DeliveredInvoice, InvoiceService, ServiceError, SubmissionStage, SubmitInvoice,
};
pub use repository::{
    InMemoryInvoiceRepository, InvoiceRepository, RepositoryError, SqliteInvoiceRepository,
};
