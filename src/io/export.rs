use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::domain::{Due, LedgerState, Summary, Transaction, format_cents};

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub monthly_income: String,
    pub transactions: Vec<Transaction>,
    pub dues: Vec<Due>,
    pub summary: Summary,
}

/// Writes ledger contents out as CSV or JSON
pub struct Exporter<'a> {
    state: &'a LedgerState,
}

impl<'a> Exporter<'a> {
    pub fn new(state: &'a LedgerState) -> Self {
        Self { state }
    }

    /// Export transactions to CSV, in insertion order
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "description",
            "type",
            "category",
            "amount",
        ])?;

        for tx in &self.state.transactions {
            csv_writer.write_record([
                tx.id.to_string(),
                tx.date.map(|d| d.to_string()).unwrap_or_default(),
                tx.description.clone(),
                tx.kind.as_str().to_string(),
                tx.category.clone().unwrap_or_default(),
                format_cents(tx.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.state.transactions.len())
    }

    /// Export dues to CSV
    pub fn export_dues_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "amount"])?;

        for due in &self.state.dues {
            csv_writer.write_record([
                due.id.to_string(),
                due.name.clone(),
                format_cents(due.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.state.dues.len())
    }

    pub fn export_transactions_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        serde_json::to_writer_pretty(&mut writer, &self.state.transactions)?;
        writer.flush()?;
        Ok(self.state.transactions.len())
    }

    pub fn export_dues_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        serde_json::to_writer_pretty(&mut writer, &self.state.dues)?;
        writer.flush()?;
        Ok(self.state.dues.len())
    }

    /// Export the whole ledger, with its derived figures, as a JSON snapshot
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            monthly_income: format_cents(self.state.monthly_income),
            transactions: self.state.transactions.clone(),
            dues: self.state.dues.clone(),
            summary: Summary::of(self.state),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
