//! Bank Domain - Payment Descriptors and Transaction Matching
//!
//! This crate covers the two bank-facing concerns of the system:
//!
//! - encoding the deterministic, bank-readable payment descriptor string an
//!   external QR renderer consumes for each obligation
//! - best-effort matching of externally-imported bank transaction records to
//!   obligations by settlement reference (advisory only; matching never
//!   settles anything)

pub mod descriptor;
pub mod matcher;
pub mod ports;
pub mod record;
pub mod service;

pub use descriptor::{encode, Recipient};
pub use matcher::BankMatcher;
pub use ports::BankImportStore;
pub use record::BankTransactionRecord;
pub use service::DescriptorService;
