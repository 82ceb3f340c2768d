//! Minimal catalog registration and item reads.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use stockroom_core::ItemId;
use stockroom_infra::WarehouseStore;
use stockroom_inventory::{NewItem, NewSupplier};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router<S: WarehouseStore>() -> Router {
    Router::new()
        .route("/categories", post(create_category::<S>))
        .route("/suppliers", post(create_supplier::<S>))
        .route("/items", post(create_item::<S>))
        .route("/items/low-stock", get(low_stock_items::<S>))
        .route("/items/:id", get(get_item::<S>))
}

pub async fn create_category<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    match services
        .engine
        .register_category(body.name, body.description)
        .await
    {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn create_supplier<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Json(body): Json<NewSupplier>,
) -> axum::response::Response {
    match services.engine.register_supplier(body).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn create_item<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Json(body): Json<NewItem>,
) -> axum::response::Response {
    match services.engine.register_item(body).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn low_stock_items<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response {
    match services.engine.low_stock_items().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_item<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.engine.get_item(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
