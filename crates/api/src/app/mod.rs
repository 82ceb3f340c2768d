//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared engine
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockroom_infra::{InMemoryWarehouseStore, PostgresWarehouseStore, WarehouseStore};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router over an already wired engine.
pub fn build_app<S: WarehouseStore>(services: Arc<AppServices<S>>) -> Router {
    // Protected routes: require a principal.
    let protected = routes::router::<S>()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::principal_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

/// Pick the store from configuration and build the router (entrypoint used by `main.rs`).
pub async fn build_from_config(config: &AppConfig) -> anyhow::Result<Router> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresWarehouseStore::connect(url).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres warehouse store");
            Ok(build_app(Arc::new(AppServices::new(store, config.engine))))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory warehouse store");
            Ok(build_app(Arc::new(AppServices::new(
                InMemoryWarehouseStore::new(),
                config.engine,
            ))))
        }
    }
}
