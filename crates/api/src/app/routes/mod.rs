use axum::{Router, routing::get};

use stockroom_infra::WarehouseStore;

pub mod catalog;
pub mod movements;
pub mod system;
pub mod transactions;

/// Router for all endpoints that need a principal.
pub fn router<S: WarehouseStore>() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/transactions", transactions::router::<S>())
        .merge(movements::router::<S>())
        .merge(catalog::router::<S>())
}
