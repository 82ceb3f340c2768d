//! Infrastructure layer: persistence boundary, stock ledger adapters,
//! numbering, and the transaction engine that orchestrates them.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod numbering;
pub mod store;


pub use engine::{ApprovalOutcome, EngineConfig, TransactionEngine};
pub use error::{EngineError, EngineResult};
pub use ledger::{ItemLedger, MovementLog};
pub use numbering::NumberingService;
pub use store::{
    InMemoryWarehouseStore, MovementFilter, PostgresWarehouseStore, StoreError, UnitOfWork,
    WarehouseStore,
};
