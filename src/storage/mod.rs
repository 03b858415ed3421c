mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use thiserror::Error;

/// SQL migration for the blob table
pub const MIGRATION_001_BLOBS: &str = include_str!("migrations/001_blobs.sql");

/// Blob store keys under which the ledger is persisted.
pub const TRANSACTIONS_KEY: &str = "transactions";
pub const MONTHLY_INCOME_KEY: &str = "monthlyIncome";
pub const DUES_KEY: &str = "dues";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Blob store is unavailable")]
    Unavailable,

    #[error("Write of {needed} bytes exceeds the storage quota of {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Key-value text storage the ledger is persisted into.
///
/// Every operation may fail; callers are expected to treat persistence as
/// best-effort and keep working from memory.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Read the value stored under `key`, `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key succeeds.
    async fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
