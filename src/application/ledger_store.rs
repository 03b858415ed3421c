use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::domain::{
    Cents, Due, EntryId, IdAllocator, LedgerState, Summary, Transaction, cents_from_f64,
    format_cents, parse_cents,
};
use crate::storage::{BlobStore, DUES_KEY, MONTHLY_INCOME_KEY, TRANSACTIONS_KEY};

use super::{NewTransaction, ValidationError};

/// What happened to one persisted key during [`LedgerStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Loaded,
    /// Never written; defaults were used
    Missing,
    /// Present but unreadable; defaults were used
    Malformed,
    /// The store refused the read; defaults were used
    Unavailable,
}

impl KeyStatus {
    pub fn fell_back(&self) -> bool {
        matches!(self, KeyStatus::Malformed | KeyStatus::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub transactions: KeyStatus,
    pub monthly_income: KeyStatus,
    pub dues: KeyStatus,
    /// Stored records discarded for breaking the model invariants
    pub dropped_records: usize,
}

impl LoadReport {
    /// True when everything stored was read back as-is.
    pub fn is_clean(&self) -> bool {
        !self.transactions.fell_back()
            && !self.monthly_income.fell_back()
            && !self.dues.fell_back()
            && self.dropped_records == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub key: &'static str,
    pub reason: String,
}

/// Result of a best-effort write of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub failures: Vec<SaveFailure>,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the ledger state and keeps it synchronized with a blob store.
///
/// Every successful mutation is persisted before the call returns. Storage
/// failures never reach the caller: the in-memory state stays authoritative
/// and the failure is logged and recorded in [`LedgerStore::last_save`].
pub struct LedgerStore<S: BlobStore> {
    store: S,
    state: LedgerState,
    ids: IdAllocator,
    last_save: SaveOutcome,
}

impl<S: BlobStore> LedgerStore<S> {
    /// Read the ledger from `store`.
    ///
    /// Never fails: missing, unreadable or malformed keys fall back to an empty
    /// ledger piece by piece, as reported in the returned [`LoadReport`].
    pub async fn load(store: S) -> (Self, LoadReport) {
        let (transactions, transactions_status) =
            read_key(&store, TRANSACTIONS_KEY, decode_json::<Vec<Transaction>>).await;
        let (dues, dues_status) = read_key(&store, DUES_KEY, decode_json::<Vec<Due>>).await;
        let (monthly_income, income_status) =
            read_key(&store, MONTHLY_INCOME_KEY, decode_income).await;

        let transactions = transactions.unwrap_or_default();
        let dues = dues.unwrap_or_default();
        let stored_count = transactions.len() + dues.len();

        let mut seen = HashSet::new();
        let transactions: Vec<Transaction> = transactions
            .into_iter()
            .filter(|t| t.is_well_formed() && seen.insert(t.id))
            .collect();
        let mut seen = HashSet::new();
        let dues: Vec<Due> = dues
            .into_iter()
            .filter(|d| d.is_well_formed() && seen.insert(d.id))
            .collect();

        let dropped_records = stored_count - transactions.len() - dues.len();
        if dropped_records > 0 {
            warn!(dropped_records, "Discarded invalid records from storage");
        }

        let mut ids = IdAllocator::new();
        for id in transactions.iter().map(|t| t.id).chain(dues.iter().map(|d| d.id)) {
            ids.observe(id);
        }

        let state = LedgerState {
            transactions,
            dues,
            monthly_income: monthly_income.unwrap_or(0),
        };
        debug!(
            transactions = state.transactions.len(),
            dues = state.dues.len(),
            monthly_income = %format_cents(state.monthly_income),
            "Ledger loaded"
        );

        let report = LoadReport {
            transactions: transactions_status,
            monthly_income: income_status,
            dues: dues_status,
            dropped_records,
        };

        let ledger = Self {
            store,
            state,
            ids,
            last_save: SaveOutcome::default(),
        };
        (ledger, report)
    }

    // ========================
    // Queries
    // ========================

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn dues(&self) -> &[Due] {
        &self.state.dues
    }

    pub fn monthly_income(&self) -> Cents {
        self.state.monthly_income
    }

    pub fn find_transaction(&self, id: EntryId) -> Option<&Transaction> {
        self.state.transactions.iter().find(|t| t.id == id)
    }

    pub fn find_due(&self, id: EntryId) -> Option<&Due> {
        self.state.dues.iter().find(|d| d.id == id)
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.state)
    }

    /// Outcome of the most recent write attempt.
    pub fn last_save(&self) -> &SaveOutcome {
        &self.last_save
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ========================
    // Transactions
    // ========================

    /// Validate, record and persist a new transaction.
    pub async fn add_transaction(
        &mut self,
        input: NewTransaction,
    ) -> Result<Transaction, ValidationError> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let amount_cents = positive_cents(input.amount)?;
        let kind = input.kind.ok_or(ValidationError::MissingKind)?;

        let mut transaction =
            Transaction::new(self.ids.next(), description.to_string(), kind, amount_cents);
        if let Some(category) = input.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                transaction = transaction.with_category(category);
            }
        }
        if let Some(date) = input.date {
            transaction = transaction.with_date(date);
        }

        self.state.transactions.push(transaction.clone());
        info!(
            id = transaction.id,
            kind = %transaction.kind,
            amount = %format_cents(transaction.amount_cents),
            "Recorded transaction"
        );

        self.save().await;
        Ok(transaction)
    }

    /// Remove a transaction by id. Absent ids are a no-op and return `None`.
    pub async fn remove_transaction(&mut self, id: EntryId) -> Option<Transaction> {
        let position = self.state.transactions.iter().position(|t| t.id == id);
        let Some(index) = position else {
            debug!(id, "No transaction to remove");
            return None;
        };

        let removed = self.state.transactions.remove(index);
        info!(id, "Removed transaction");
        self.save().await;
        Some(removed)
    }

    // ========================
    // Dues and income
    // ========================

    pub async fn add_due(&mut self, name: &str, amount: f64) -> Result<Due, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyDueName);
        }
        let amount_cents = positive_cents(amount)?;

        let due = Due::new(self.ids.next(), name.to_string(), amount_cents);
        self.state.dues.push(due.clone());
        info!(id = due.id, amount = %format_cents(due.amount_cents), "Added due");

        self.save().await;
        Ok(due)
    }

    /// Remove a due by id. Absent ids are a no-op and return `None`.
    pub async fn remove_due(&mut self, id: EntryId) -> Option<Due> {
        let position = self.state.dues.iter().position(|d| d.id == id);
        let Some(index) = position else {
            debug!(id, "No due to remove");
            return None;
        };

        let removed = self.state.dues.remove(index);
        info!(id, "Removed due");
        self.save().await;
        Some(removed)
    }

    /// Replace the monthly income. Zero is allowed, negative amounts are not.
    pub async fn set_monthly_income(&mut self, amount: f64) -> Result<Cents, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::InvalidIncome(
                "amount is not a finite number".into(),
            ));
        }
        if amount < 0.0 {
            return Err(ValidationError::InvalidIncome(
                "amount must not be negative".into(),
            ));
        }
        let cents =
            cents_from_f64(amount).map_err(|e| ValidationError::InvalidIncome(e.to_string()))?;

        self.state.monthly_income = cents;
        info!(monthly_income = %format_cents(cents), "Set monthly income");

        self.save().await;
        Ok(cents)
    }

    // ========================
    // Persistence
    // ========================

    /// Write the whole ledger to the blob store.
    ///
    /// Failures are logged and returned, never raised; the ledger keeps working
    /// from memory.
    pub async fn save(&mut self) -> SaveOutcome {
        let writes = [
            (TRANSACTIONS_KEY, encode_json(&self.state.transactions)),
            (MONTHLY_INCOME_KEY, Ok(format_cents(self.state.monthly_income))),
            (DUES_KEY, encode_json(&self.state.dues)),
        ];

        let mut failures = Vec::new();
        for (key, encoded) in writes {
            let result = match encoded {
                Ok(value) => self.store.set(key, &value).await.map_err(|e| e.to_string()),
                Err(reason) => Err(reason),
            };
            if let Err(reason) = result {
                warn!(key, %reason, "Failed to persist ledger, keeping in-memory state");
                failures.push(SaveFailure { key, reason });
            }
        }

        if failures.is_empty() {
            debug!(
                transactions = self.state.transactions.len(),
                dues = self.state.dues.len(),
                "Ledger saved"
            );
        }

        self.last_save = SaveOutcome { failures };
        self.last_save.clone()
    }

    /// Empty the ledger and remove its keys from the blob store.
    pub async fn clear(&mut self) -> SaveOutcome {
        self.state = LedgerState::default();
        info!("Cleared ledger");

        let mut failures = Vec::new();
        for key in [TRANSACTIONS_KEY, MONTHLY_INCOME_KEY, DUES_KEY] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key, error = %e, "Failed to remove stored key");
                failures.push(SaveFailure {
                    key,
                    reason: e.to_string(),
                });
            }
        }

        self.last_save = SaveOutcome { failures };
        self.last_save.clone()
    }
}

fn positive_cents(amount: f64) -> Result<Cents, ValidationError> {
    let cents =
        cents_from_f64(amount).map_err(|e| ValidationError::InvalidAmount(e.to_string()))?;
    if cents <= 0 {
        return Err(ValidationError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }
    Ok(cents)
}

async fn read_key<S, T, F>(store: &S, key: &'static str, decode: F) -> (Option<T>, KeyStatus)
where
    S: BlobStore,
    F: FnOnce(&str) -> Result<T, String>,
{
    match store.get(key).await {
        Ok(None) => (None, KeyStatus::Missing),
        Ok(Some(raw)) => match decode(&raw) {
            Ok(value) => (Some(value), KeyStatus::Loaded),
            Err(reason) => {
                warn!(key, %reason, "Ignoring malformed stored value");
                (None, KeyStatus::Malformed)
            }
        },
        Err(e) => {
            warn!(key, error = %e, "Could not read from blob store");
            (None, KeyStatus::Unavailable)
        }
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Income is stored as decimal text; a JSON string or number holding the same text is accepted too.
fn decode_income(raw: &str) -> Result<Cents, String> {
    let raw = raw.trim();
    let text = if raw.starts_with('"') {
        serde_json::from_str::<String>(raw).map_err(|e| e.to_string())?
    } else {
        // Validated as a JSON number, then read from its own digits to stay exact
        serde_json::from_str::<serde_json::Number>(raw).map_err(|e| e.to_string())?;
        raw.to_string()
    };
    let cents = parse_cents(&text).map_err(|e| e.to_string())?;
    if cents < 0 {
        return Err(format!("negative monthly income {}", text));
    }
    Ok(cents)
}
