use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::DomainError;
use stockroom_infra::{EngineError, StoreError};
use stockroom_transactions::TransactionKind;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Domain(e) => domain_error_to_response(e),
        EngineError::Store(StoreError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        EngineError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::ItemNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "item_not_found", message)
        }
        DomainError::InvalidState { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_state", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
        DomainError::NoApprovableItems => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "no_approvable_items", message)
        }
        DomainError::InvariantViolation(_) => {
            tracing::error!(error = %message, "invariant violated");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "invariant_violation",
                message,
            )
        }
    }
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

/// Unknown kinds are unknown routes.
pub fn parse_kind(s: &str) -> Result<TransactionKind, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("unknown transaction kind '{s}'"),
        )
    })
}

pub fn parse_id<T: core::str::FromStr>(s: &str) -> Result<T, axum::response::Response> {
    s.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid id '{s}'")))
}
