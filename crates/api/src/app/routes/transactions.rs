//! Transaction lifecycle endpoints, one set per kind under `/transactions/:kind`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use stockroom_core::{ItemId, TransactionId};
use stockroom_infra::WarehouseStore;
use stockroom_transactions::TransactionKind;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router<S: WarehouseStore>() -> Router {
    Router::new()
        .route("/:kind", post(create_transaction::<S>))
        .route(
            "/:kind/:id",
            get(get_transaction::<S>)
                .put(update_transaction::<S>)
                .delete(delete_transaction::<S>),
        )
        .route("/:kind/:id/submit", post(submit_transaction::<S>))
        .route("/:kind/:id/approve", post(approve_transaction::<S>))
        .route("/:kind/:id/reject", post(reject_transaction::<S>))
}

fn parse_target(kind: &str, id: &str) -> Result<(TransactionKind, TransactionId), axum::response::Response> {
    let kind = errors::parse_kind(kind)?;
    let id = errors::parse_id(id)?;
    Ok((kind, id))
}

pub async fn create_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(kind): Path<String>,
    Json(body): Json<dto::TransactionPayload>,
) -> axum::response::Response {
    let kind = match errors::parse_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let (header, lines) = match body.into_parts(kind) {
        Ok(parts) => parts,
        Err(resp) => return resp,
    };

    match services
        .engine
        .create_transaction(kind, header, lines, principal.principal())
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services.engine.get_transaction(kind, id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn update_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<dto::TransactionPayload>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let (header, lines) = match body.into_parts(kind) {
        Ok(parts) => parts,
        Err(resp) => return resp,
    };

    match services
        .engine
        .update_transaction(kind, id, header, lines)
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn submit_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services.engine.submit_transaction(kind, id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn approve_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((kind, id)): Path<(String, String)>,
    body: Result<Json<dto::ApproveRequest>, JsonRejection>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    // An unreadable body must never fall back to approving every line.
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                rejection.body_text(),
            );
        }
    };

    let mut rejected = Vec::with_capacity(body.rejected_item_ids.len());
    for raw in &body.rejected_item_ids {
        match errors::parse_id::<ItemId>(raw) {
            Ok(item_id) => rejected.push(item_id),
            Err(resp) => return resp,
        }
    }

    match services
        .engine
        .approve_transaction(kind, id, rejected, body.signature, principal.principal())
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn reject_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<dto::RejectRequest>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services
        .engine
        .reject_transaction(kind, id, body.reason, principal.principal())
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn delete_transaction<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> axum::response::Response {
    let (kind, id) = match parse_target(&kind, &id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services.engine.delete_transaction(kind, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
