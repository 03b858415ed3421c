use chrono::NaiveDate;

use crate::domain::{EntryKind, cents_to_f64, parse_cents};

use super::ValidationError;

/// Field values for a new transaction, as extracted by an input layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    pub fn new(description: impl Into<String>, amount: f64, kind: EntryKind) -> Self {
        Self {
            description: description.into(),
            amount,
            kind: Some(kind),
            category: None,
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

    /// Build from raw text fields as they come out of a form.
    ///
    /// Only syntax is checked here: unparseable amounts, unknown types and
    /// malformed dates are rejected. Blank type, category and date become `None`;
    /// emptiness and sign rules are enforced when the transaction is added.
    pub fn parse(
        description: &str,
        amount: &str,
        kind: &str,
        category: &str,
        date: &str,
    ) -> Result<Self, ValidationError> {
        let amount = parse_amount(amount)?;

        let kind = match kind.trim() {
            "" => None,
            raw => Some(
                EntryKind::parse(raw).ok_or_else(|| ValidationError::UnknownKind(raw.into()))?,
            ),
        };

        let category = Some(category.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let date = match date.trim() {
            "" => None,
            raw => Some(parse_date(raw)?),
        };

        Ok(Self {
            description: description.to_string(),
            amount,
            kind,
            category,
            date,
        })
    }
}

/// Parse decimal text ("12.50", "$1200") into a plain number.
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    parse_cents(raw)
        .map(cents_to_f64)
        .map_err(|e| ValidationError::InvalidAmount(e.to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}
