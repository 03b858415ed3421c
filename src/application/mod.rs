// Application layer: the ledger store and its input validation.
// Aggregation lives in the domain as pure functions over `LedgerState`.

pub mod error;
pub mod input;
pub mod ledger_store;

pub use error::*;
pub use input::*;
pub use ledger_store::*;
