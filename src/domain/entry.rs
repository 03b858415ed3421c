use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, MAX_ABS_CENTS};

/// Identifier shared by transactions and dues.
/// Derived from the creation time in milliseconds, bumped to stay strictly increasing.
pub type EntryId = i64;

/// Largest id accepted from storage (2^53 - 1, exact as a JSON number).
pub const MAX_ENTRY_ID: EntryId = (1 << 53) - 1;

fn is_valid_id(id: EntryId) -> bool {
    (0..=MAX_ENTRY_ID).contains(&id)
}

fn is_valid_amount(cents: Cents) -> bool {
    cents > 0 && cents <= MAX_ABS_CENTS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(EntryKind::Income),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded income or expense event.
/// The amount is an unsigned magnitude; the kind decides which side of the ledger it counts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: EntryId,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Always positive
    pub amount_cents: Cents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Transaction {
    pub fn new(id: EntryId, description: String, kind: EntryKind, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id,
            description,
            kind,
            category: None,
            amount_cents,
            date: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryKind::Expense
    }

    /// Amount with expenses negated.
    pub fn signed_cents(&self) -> Cents {
        match self.kind {
            EntryKind::Income => self.amount_cents,
            EntryKind::Expense => self.amount_cents.saturating_neg(),
        }
    }

    /// Whether a record read back from storage still satisfies the model invariants.
    pub fn is_well_formed(&self) -> bool {
        is_valid_id(self.id)
            && is_valid_amount(self.amount_cents)
            && !self.description.trim().is_empty()
    }
}

/// A fixed monthly obligation (rent, subscriptions, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Due {
    pub id: EntryId,
    pub name: String,
    pub amount_cents: Cents,
}

impl Due {
    pub fn new(id: EntryId, name: String, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Due amount must be positive");
        Self {
            id,
            name,
            amount_cents,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        is_valid_id(self.id) && is_valid_amount(self.amount_cents) && !self.name.trim().is_empty()
    }
}

/// Hands out time-derived ids that never repeat within one ledger,
/// even when several entries are created in the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: EntryId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids are greater than `id`.
    pub fn observe(&mut self, id: EntryId) {
        self.last = self.last.max(id);
    }

    pub fn next(&mut self) -> EntryId {
        self.next_at(Utc::now())
    }

    pub fn next_at(&mut self, now: DateTime<Utc>) -> EntryId {
        let id = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}
