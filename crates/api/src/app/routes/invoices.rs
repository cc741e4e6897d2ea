use std::sync::Arc;

use axum::{
    extract::{Extension, Form},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse},
};

use crate::app::dto::InvoiceForm;
use crate::app::errors;
use crate::app::services::AppServices;

const INVOICE_ID_HEADER: HeaderName = HeaderName::from_static("x-invoice-id");

const FORM_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>GST Invoice Generator</title>
<style>
body { font-family: Arial, sans-serif; background: #f4f4f4; }
main { background: #fff; padding: 20px; width: 800px; margin: auto; }
input { width: 180px; margin: 4px; }
button { padding: 8px 15px; margin-top: 10px; }
</style>
</head>
<body>
<main>
<h2>GST Invoice Generator</h2>
<form method="post">
<label>Company Name<br><input name="company_name" required></label><br>
<label>Invoice No<br><input name="invoice_no" required></label><br>
<label>Invoice Date<br><input name="invoice_date"></label><br>
<h3>Items</h3>
<div id="items">
<div>
Desc <input name="desc_1">
HSN <input name="hsn_1">
Qty <input name="qty_1">
Rate <input name="rate_1">
</div>
</div>
<button type="button" onclick="addItem()">Add Item</button><br>
<button type="submit">Generate PDF</button>
</form>
</main>
<script>
let rows = 1;
function addItem() {
  rows += 1;
  const row = document.createElement("div");
  row.innerHTML =
    `Desc <input name="desc_${rows}"> HSN <input name="hsn_${rows}"> ` +
    `Qty <input name="qty_${rows}"> Rate <input name="rate_${rows}">`;
  document.getElementById("items").appendChild(row);
}
</script>
</body>
</html>
"#;

pub async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

pub async fn submit_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> axum::response::Response {
    let submission = match InvoiceForm::from_pairs(pairs).into_submission() {
        Ok(submission) => submission,
        Err(err) => return errors::form_error_to_response(err),
    };

    match services.invoices.submit(submission).await {
        Ok(delivered) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", delivered.filename),
                ),
                (INVOICE_ID_HEADER, delivered.invoice_id.to_string()),
            ],
            delivered.bytes,
        )
            .into_response(),
        Err(err) => errors::service_error_to_response(err),
    }
}
