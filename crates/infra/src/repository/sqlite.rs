//! SQLite-backed invoice repository.
//!
//! ## Error Mapping
//!
//! | Failure | RepositoryError |
//! |---------|-----------------|
//! | connect, pool closed/timed out, I/O | `Unavailable` |
//! | `BEGIN` / `COMMIT` | `Unavailable` |
//! | `INSERT` inside the transaction (constraint, trigger abort, ...) | `Write` |
//! | row column missing or decimal text unparsable | `Decode` |
//!
//! Quantities and rates are stored as decimal text; SQLite's REAL would lose
//! exactness.

use core::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{instrument, Span};

use invoicer_core::InvoiceId;
use invoicer_invoicing::{Invoice, InvoiceHeader, LineItem, PersistedInvoice};

use super::{InvoiceRepository, RepositoryError};

const CREATE_INVOICES: &str = r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        company_name TEXT NOT NULL,
        invoice_no   TEXT NOT NULL,
        invoice_date TEXT NOT NULL
    )
"#;

const CREATE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id  INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        hsn         TEXT NOT NULL,
        qty         TEXT NOT NULL,
        rate        TEXT NOT NULL
    )
"#;

const CREATE_ITEMS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_items_invoice_id ON items (invoice_id)";

/// Invoice store on a SQLite database.
///
/// Every `persist` runs inside one explicit transaction. SQLite serializes
/// writers, and `AUTOINCREMENT` guarantees identifiers are never reused even
/// after the highest row is gone.
#[derive(Debug, Clone)]
pub struct SqliteInvoiceRepository {
    pool: SqlitePool,
}

impl SqliteInvoiceRepository {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    #[instrument(err)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        // No idle reaping: a `sqlite::memory:` database lives only as long as
        // its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let repo = Self::from_pool(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Wrap an existing pool. The schema is not touched; call [`Self::migrate`].
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `invoices` and `items` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in [CREATE_INVOICES, CREATE_ITEMS, CREATE_ITEMS_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl InvoiceRepository for SqliteInvoiceRepository {
    #[instrument(
        skip(self, invoice),
        fields(
            invoice_no = %invoice.invoice_number(),
            line_count = invoice.line_items().len(),
            invoice_id = tracing::field::Empty
        ),
        err
    )]
    async fn persist(&self, invoice: &Invoice) -> Result<InvoiceId, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let invoice_id = match insert_rows(&mut tx, invoice).await {
            Ok(id) => id,
            Err(err) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("invoice_id", invoice_id.get());
        Ok(invoice_id)
    }

    #[instrument(skip(self), fields(invoice_id = id.get()), err)]
    async fn load(&self, id: InvoiceId) -> Result<Option<PersistedInvoice>, RepositoryError> {
        let header_row = sqlx::query(
            r#"
            SELECT company_name, invoice_no, invoice_date
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_invoice", e))?;

        let Some(header_row) = header_row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            r#"
            SELECT description, hsn, qty, rate
            FROM items
            WHERE invoice_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_items", e))?;

        let header = InvoiceHeader::new(
            text_column(&header_row, "company_name")?,
            text_column(&header_row, "invoice_no")?,
            text_column(&header_row, "invoice_date")?,
        );

        let mut line_items = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            let item = LineItem::new(
                text_column(row, "description")?,
                text_column(row, "hsn")?,
                decimal_column(row, "qty")?,
                decimal_column(row, "rate")?,
            )
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            line_items.push(item);
        }

        let invoice = Invoice::from_line_items(header, line_items)
            .map_err(|e| RepositoryError::Decode(format!("invoice {id}: {e}")))?;

        Ok(Some(PersistedInvoice { id, invoice }))
    }
}

async fn insert_rows(
    tx: &mut Transaction<'_, Sqlite>,
    invoice: &Invoice,
) -> Result<InvoiceId, RepositoryError> {
    let result = sqlx::query(
        r#"
        INSERT INTO invoices (company_name, invoice_no, invoice_date)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(invoice.company_name())
    .bind(invoice.invoice_number())
    .bind(invoice.invoice_date())
    .execute(&mut **tx)
    .await
    .map_err(|e| RepositoryError::Write(format!("insert_invoice: {e}")))?;

    let invoice_id = InvoiceId::from_raw(result.last_insert_rowid())
        .map_err(|e| RepositoryError::Write(e.to_string()))?;

    for (idx, item) in invoice.line_items().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO items (invoice_id, description, hsn, qty, rate)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(invoice_id.get())
        .bind(item.description())
        .bind(item.hsn_code())
        .bind(item.quantity().to_string())
        .bind(item.unit_rate().to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| RepositoryError::Write(format!("insert_item {}: {e}", idx + 1)))?;
    }

    Ok(invoice_id)
}

fn text_column(row: &SqliteRow, column: &str) -> Result<String, RepositoryError> {
    row.try_get::<String, _>(column)
        .map_err(|e| RepositoryError::Decode(format!("column {column}: {e}")))
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let text = text_column(row, column)?;
    Decimal::from_str(&text)
        .map_err(|e| RepositoryError::Decode(format!("column {column} value {text:?}: {e}")))
}

/// Map SQLx errors outside the write path to repository errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => RepositoryError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            RepositoryError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::ColumnNotFound(column) => {
            RepositoryError::Decode(format!("column {} missing in {}", column, operation))
        }
        _ => RepositoryError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
