use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use invoicer_infra::ServiceError;

use crate::app::dto::FormError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let status = match &err {
        ServiceError::NoValidItems
        | ServiceError::TotalOutOfRange(_)
        | ServiceError::InvalidInvoice(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::RenderFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn form_error_to_response(err: FormError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
