//! Store adapters for the settlement core
//!
//! Two implementations of the `SettlementStore` and `BankImportStore` ports:
//!
//! - [`MemoryStore`]: embedded, per-entity async mutex locking; used by the
//!   test suite and single-process deployments
//! - [`PgStore`]: PostgreSQL over sqlx, expressing the same contract as
//!   row locks inside explicit transactions
//!
//! Both enforce the settle contract: exclusive lock on the obligation (and,
//! when collected funds change, the ledger) for the whole unit of work, with
//! all-or-nothing visibility of the result.

mod locks;
pub mod memory;
pub mod pg;
pub mod pool;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use pool::{create_pool, StoreConfig};
