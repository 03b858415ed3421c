use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Cents, Due, EntryKind, Transaction};

/// Label used in breakdowns for transactions without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Complete in-memory snapshot of one ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    /// Insertion order is display order
    pub transactions: Vec<Transaction>,
    pub dues: Vec<Due>,
    pub monthly_income: Cents,
}

impl LedgerState {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.dues.is_empty() && self.monthly_income == 0
    }
}

// Aggregates are recomputed from scratch on every call; nothing is cached.
// Sums saturate so that no state, however it was built, can overflow them.

fn saturating_sum(amounts: impl Iterator<Item = Cents>) -> Cents {
    amounts.fold(0, Cents::saturating_add)
}

/// Sum of all income transactions.
pub fn total_income(state: &LedgerState) -> Cents {
    sum_of_kind(state, EntryKind::Income)
}

/// Sum of all expense transactions, reported as a non-negative figure.
pub fn total_expenses(state: &LedgerState) -> Cents {
    sum_of_kind(state, EntryKind::Expense)
}

fn sum_of_kind(state: &LedgerState, kind: EntryKind) -> Cents {
    saturating_sum(
        state
            .transactions
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.amount_cents),
    )
}

/// Signed sum over all transactions. Always equals income minus expenses.
pub fn net_transactions(state: &LedgerState) -> Cents {
    saturating_sum(state.transactions.iter().map(Transaction::signed_cents))
}

pub fn total_dues(state: &LedgerState) -> Cents {
    saturating_sum(state.dues.iter().map(|d| d.amount_cents))
}

/// Monthly income left once every due is paid. May be negative.
pub fn remaining_after_dues(state: &LedgerState) -> Cents {
    state.monthly_income.saturating_sub(total_dues(state))
}

/// Monthly income and transaction income are separate additive pools:
/// balance = monthly income + income - expenses - dues
pub fn balance(state: &LedgerState) -> Cents {
    state
        .monthly_income
        .saturating_add(total_income(state))
        .saturating_sub(total_expenses(state))
        .saturating_sub(total_dues(state))
}

/// Every derived figure for a ledger, as shown on a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub monthly_income: Cents,
    pub total_income: Cents,
    pub total_expenses: Cents,
    pub total_dues: Cents,
    pub remaining_after_dues: Cents,
    pub balance: Cents,
}

impl Summary {
    pub fn of(state: &LedgerState) -> Self {
        Self {
            monthly_income: state.monthly_income,
            total_income: total_income(state),
            total_expenses: total_expenses(state),
            total_dues: total_dues(state),
            remaining_after_dues: remaining_after_dues(state),
            balance: balance(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub average: Cents,
    pub percentage: f64,
}

/// Per-category totals for one kind of transaction, largest first.
pub fn category_breakdown(state: &LedgerState, kind: EntryKind) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, (Cents, usize)> = BTreeMap::new();
    for tx in state.transactions.iter().filter(|t| t.kind == kind) {
        let label = tx.category.as_deref().unwrap_or(UNCATEGORIZED);
        let entry = groups.entry(label).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(tx.amount_cents);
        entry.1 += 1;
    }

    let grand_total = saturating_sum(groups.values().map(|(total, _)| *total));

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (total, count))| CategorySummary {
            category: category.to_string(),
            total,
            count,
            average: total / count as Cents,
            percentage: if grand_total > 0 {
                total as f64 * 100.0 / grand_total as f64
            } else {
                0.0
            },
        })
        .collect();

    // BTreeMap order breaks ties alphabetically; the sort is stable
    summaries.sort_by(|a, b| b.total.cmp(&a.total));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income(id: i64, amount: Cents) -> Transaction {
        Transaction::new(id, format!("income {}", id), EntryKind::Income, amount)
    }

    fn expense(id: i64, amount: Cents, category: &str) -> Transaction {
        Transaction::new(id, format!("expense {}", id), EntryKind::Expense, amount)
            .with_category(category)
    }

    #[test]
    fn test_empty_state_aggregates_to_zero() {
        let state = LedgerState::default();
        assert!(state.is_empty());
        assert_eq!(
            Summary::of(&state),
            Summary {
                monthly_income: 0,
                total_income: 0,
                total_expenses: 0,
                total_dues: 0,
                remaining_after_dues: 0,
                balance: 0,
            }
        );
    }

    #[test]
    fn test_aggregates_saturate_on_extreme_amounts() {
        let state = LedgerState {
            transactions: vec![
                income(1, Cents::MAX),
                income(2, Cents::MAX),
                expense(3, Cents::MAX, "rent"),
                expense(4, Cents::MAX, "rent"),
            ],
            dues: vec![Due::new(5, "Rent".into(), Cents::MAX)],
            monthly_income: Cents::MAX,
        };

        let summary = Summary::of(&state);
        assert_eq!(summary.total_income, Cents::MAX);
        assert_eq!(summary.total_expenses, Cents::MAX);
        assert_eq!(summary.total_dues, Cents::MAX);
        assert_eq!(summary.remaining_after_dues, 0);
        assert_eq!(summary.balance, -Cents::MAX);

        let breakdown = category_breakdown(&state, EntryKind::Expense);
        assert_eq!(breakdown[0].total, Cents::MAX);
        assert_eq!(breakdown[0].count, 2);
    }

    #[test]
    fn test_income_and_expense_totals() {
        let state = LedgerState {
            transactions: vec![income(1, 150000), expense(2, 20000, "groceries")],
            ..Default::default()
        };

        assert_eq!(total_income(&state), 150000);
        assert_eq!(total_expenses(&state), 20000);
        assert_eq!(net_transactions(&state), 130000);
    }

    #[test]
    fn test_dues_and_remaining() {
        let state = LedgerState {
            dues: vec![
                Due::new(1, "Rent".into(), 120000),
                Due::new(2, "Internet".into(), 6000),
            ],
            monthly_income: 200000,
            ..Default::default()
        };

        assert_eq!(total_dues(&state), 126000);
        assert_eq!(remaining_after_dues(&state), 74000);
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let state = LedgerState {
            dues: vec![Due::new(1, "Rent".into(), 120000)],
            monthly_income: 100000,
            ..Default::default()
        };
        assert_eq!(remaining_after_dues(&state), -20000);
    }

    #[test]
    fn test_balance_combines_all_pools() {
        let state = LedgerState {
            transactions: vec![income(1, 150000), expense(2, 20000, "groceries")],
            dues: vec![Due::new(3, "Rent".into(), 120000)],
            monthly_income: 200000,
        };

        // 2000 + 1500 - 200 - 1200
        assert_eq!(balance(&state), 210000);
        assert_eq!(
            balance(&state),
            state.monthly_income + net_transactions(&state) - total_dues(&state)
        );
    }

    #[test]
    fn test_category_breakdown() {
        let state = LedgerState {
            transactions: vec![
                expense(1, 3000, "food"),
                expense(2, 1000, "food"),
                expense(3, 6000, "rent"),
                Transaction::new(4, "misc".into(), EntryKind::Expense, 2000),
                income(5, 999999),
            ],
            ..Default::default()
        };

        let breakdown = category_breakdown(&state, EntryKind::Expense);
        let labels: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(labels, vec!["rent", "food", UNCATEGORIZED]);

        let food = &breakdown[1];
        assert_eq!(food.total, 4000);
        assert_eq!(food.count, 2);
        assert_eq!(food.average, 2000);
        assert!((food.percentage - 33.333).abs() < 0.01);

        let total_pct: f64 = breakdown.iter().map(|c| c.percentage).sum();
        assert!((total_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_breakdown_ties_are_alphabetical() {
        let state = LedgerState {
            transactions: vec![expense(1, 500, "zoo"), expense(2, 500, "art")],
            ..Default::default()
        };
        let breakdown = category_breakdown(&state, EntryKind::Expense);
        assert_eq!(breakdown[0].category, "art");
        assert_eq!(breakdown[1].category, "zoo");
        assert!(category_breakdown(&state, EntryKind::Income).is_empty());
    }
}
