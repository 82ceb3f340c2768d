use stockroom_infra::{EngineConfig, TransactionEngine, WarehouseStore};

/// Shared state behind every protected route.
pub struct AppServices<S> {
    pub engine: TransactionEngine<S>,
}

impl<S: WarehouseStore> AppServices<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            engine: TransactionEngine::new(store, config),
        }
    }
}
