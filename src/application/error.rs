use thiserror::Error;

/// Rejection of user-supplied input. The ledger is left untouched whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Due name must not be empty")]
    EmptyDueName,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction type is required (income or expense)")]
    MissingKind,

    #[error("Unknown transaction type: {0}")]
    UnknownKind(String),

    #[error("Invalid monthly income: {0}")]
    InvalidIncome(String),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}
