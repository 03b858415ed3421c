// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tally::application::{LedgerStore, LoadReport, NewTransaction};
use tally::domain::{EntryKind, Transaction};
use tally::storage::{MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create an empty ledger backed by an in-memory store
pub async fn memory_ledger() -> LedgerStore<MemoryStore> {
    let (ledger, _) = LedgerStore::load(MemoryStore::new()).await;
    ledger
}

/// Helper to load a ledger from a pre-seeded in-memory store
pub async fn ledger_from(store: MemoryStore) -> (LedgerStore<MemoryStore>, LoadReport) {
    LedgerStore::load(store).await
}

/// Drop the in-memory state and read everything back from the store
pub async fn reload(ledger: LedgerStore<MemoryStore>) -> (LedgerStore<MemoryStore>, LoadReport) {
    LedgerStore::load(ledger.into_store()).await
}

/// Helper to open a SQLite-backed store in a temporary directory
pub async fn sqlite_store(dir: &TempDir) -> Result<SqliteStore> {
    let db_path = dir.path().join("test.db");
    SqliteStore::open(db_path.to_str().unwrap()).await
}

pub async fn add_income<S: tally::storage::BlobStore>(
    ledger: &mut LedgerStore<S>,
    description: &str,
    amount: f64,
) -> Transaction {
    ledger
        .add_transaction(NewTransaction::new(description, amount, EntryKind::Income))
        .await
        .unwrap()
}

pub async fn add_expense<S: tally::storage::BlobStore>(
    ledger: &mut LedgerStore<S>,
    description: &str,
    amount: f64,
    category: &str,
) -> Transaction {
    ledger
        .add_transaction(
            NewTransaction::new(description, amount, EntryKind::Expense).with_category(category),
        )
        .await
        .unwrap()
}
