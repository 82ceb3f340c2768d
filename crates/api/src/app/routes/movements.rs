use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
};

use stockroom_core::ItemId;
use stockroom_infra::WarehouseStore;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router<S: WarehouseStore>() -> Router {
    Router::new().route("/stock-movements", get(list_movements::<S>))
}

/// Newest first; `?itemId=` narrows to one item.
pub async fn list_movements<S: WarehouseStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Query(query): Query<dto::MovementQuery>,
) -> axum::response::Response {
    let item_id = match query.item_id.as_deref().map(errors::parse_id::<ItemId>) {
        Some(Ok(id)) => Some(id),
        Some(Err(resp)) => return resp,
        None => None,
    };

    match services.engine.list_stock_movements(item_id).await {
        Ok(mut movements) => {
            movements.reverse();
            Json(movements).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}
