mod common;

use chrono::NaiveDate;
use common::{add_expense, add_income, memory_ledger};
use tally::application::{NewTransaction, ValidationError};
use tally::domain::{
    EntryKind, balance, net_transactions, remaining_after_dues, total_dues, total_expenses,
    total_income,
};

#[tokio::test]
async fn test_monthly_income_and_dues_scenario() {
    let mut ledger = memory_ledger().await;

    ledger.set_monthly_income(2000.0).await.unwrap();
    ledger.add_due("Rent", 1200.0).await.unwrap();
    ledger.add_due("Internet", 60.0).await.unwrap();

    let state = ledger.state();
    assert_eq!(total_dues(state), 126000);
    assert_eq!(remaining_after_dues(state), 74000);
}

#[tokio::test]
async fn test_income_and_expense_scenario() {
    let mut ledger = memory_ledger().await;
    ledger.set_monthly_income(2000.0).await.unwrap();
    ledger.add_due("Rent", 1200.0).await.unwrap();

    add_income(&mut ledger, "Paycheck", 1500.0).await;
    add_expense(&mut ledger, "Groceries", 200.0, "food").await;

    let summary = ledger.summary();
    assert_eq!(summary.total_income, 150000);
    assert_eq!(summary.total_expenses, 20000);
    assert_eq!(
        summary.balance,
        ledger.monthly_income() + 130000 - summary.total_dues
    );
    assert_eq!(summary.balance, 210000);
}

#[tokio::test]
async fn test_transactions_keep_insertion_order() {
    let mut ledger = memory_ledger().await;

    add_expense(&mut ledger, "Rent", 900.0, "housing").await;
    add_income(&mut ledger, "Salary", 3000.0).await;
    add_expense(&mut ledger, "Coffee", 3.2, "food").await;

    let descriptions: Vec<&str> = ledger
        .transactions()
        .iter()
        .map(|t| t.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Rent", "Salary", "Coffee"]);
}

#[tokio::test]
async fn test_expense_amount_is_stored_as_magnitude() {
    let mut ledger = memory_ledger().await;

    let tx = add_expense(&mut ledger, "Groceries", 42.5, "food").await;

    assert_eq!(tx.kind, EntryKind::Expense);
    assert_eq!(tx.amount_cents, 4250);
    assert_eq!(tx.signed_cents(), -4250);
    assert_eq!(total_expenses(ledger.state()), 4250);
}

#[tokio::test]
async fn test_optional_fields_are_kept() {
    let mut ledger = memory_ledger().await;
    let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

    let tx = ledger
        .add_transaction(
            NewTransaction::new("Bonus", 250.0, EntryKind::Income)
                .with_category("salary")
                .with_date(date),
        )
        .await
        .unwrap();

    assert_eq!(tx.category.as_deref(), Some("salary"));
    assert_eq!(tx.date, Some(date));
    assert_eq!(ledger.find_transaction(tx.id), Some(&tx));
}

#[tokio::test]
async fn test_rejected_transaction_leaves_state_unchanged() {
    let mut ledger = memory_ledger().await;
    add_income(&mut ledger, "Paycheck", 100.0).await;
    let before = ledger.state().clone();

    let input = NewTransaction::parse("", "-5", "", "", "").unwrap();
    let result = ledger.add_transaction(input).await;

    assert_eq!(result, Err(ValidationError::EmptyDescription));
    assert_eq!(ledger.transactions().len(), 1);
    assert_eq!(ledger.state(), &before);
}

#[tokio::test]
async fn test_transaction_validation_rules() {
    let mut ledger = memory_ledger().await;

    let cases = [
        (
            NewTransaction::new("   ", 10.0, EntryKind::Income),
            ValidationError::EmptyDescription,
        ),
        (
            NewTransaction {
                kind: None,
                ..NewTransaction::new("Lunch", 10.0, EntryKind::Expense)
            },
            ValidationError::MissingKind,
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(ledger.add_transaction(input).await, Err(expected));
    }

    for amount in [0.0, -5.0, 0.001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = ledger
            .add_transaction(NewTransaction::new("Lunch", amount, EntryKind::Expense))
            .await;
        assert!(
            matches!(result, Err(ValidationError::InvalidAmount(_))),
            "amount {} should be rejected",
            amount
        );
    }

    assert!(ledger.transactions().is_empty());
}

#[tokio::test]
async fn test_remove_transaction_is_idempotent() {
    let mut ledger = memory_ledger().await;
    let keep = add_income(&mut ledger, "Salary", 3000.0).await;
    let snack = add_expense(&mut ledger, "Snacks", 5.0, "food").await;

    let removed = ledger.remove_transaction(snack.id).await;
    assert_eq!(removed, Some(snack.clone()));
    let after_once = ledger.transactions().to_vec();

    let removed_again = ledger.remove_transaction(snack.id).await;
    assert_eq!(removed_again, None);
    assert_eq!(ledger.transactions(), after_once.as_slice());
    assert_eq!(ledger.transactions(), &[keep]);
}

#[tokio::test]
async fn test_remove_unknown_id_is_noop() {
    let mut ledger = memory_ledger().await;
    add_income(&mut ledger, "Salary", 3000.0).await;

    assert_eq!(ledger.remove_transaction(-1).await, None);
    assert_eq!(ledger.remove_due(12345).await, None);
    assert_eq!(ledger.transactions().len(), 1);
}

#[tokio::test]
async fn test_net_matches_income_minus_expenses_over_mixed_operations() {
    let mut ledger = memory_ledger().await;

    // Deterministic pseudo-random walk of adds and removes
    let mut seed: u64 = 42;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        seed >> 33
    };

    for step in 0..200 {
        let roll = next();
        let amount = (next() % 100_000 + 1) as f64 / 100.0;
        if roll % 4 == 0 && !ledger.transactions().is_empty() {
            let index = next() as usize % ledger.transactions().len();
            let id = ledger.transactions()[index].id;
            ledger.remove_transaction(id).await.unwrap();
        } else if roll % 2 == 0 {
            add_income(&mut ledger, &format!("income {}", step), amount).await;
        } else {
            add_expense(&mut ledger, &format!("expense {}", step), amount, "misc").await;
        }

        let state = ledger.state();
        assert_eq!(
            total_income(state) - total_expenses(state),
            net_transactions(state)
        );
        assert!(total_expenses(state) >= 0);
    }
}

#[tokio::test]
async fn test_due_add_then_remove_restores_total() {
    let mut ledger = memory_ledger().await;
    ledger.add_due("Rent", 1200.0).await.unwrap();
    let before = total_dues(ledger.state());

    let gym = ledger.add_due("Gym", 45.99).await.unwrap();
    assert_eq!(total_dues(ledger.state()), before + 4599);
    assert_eq!(ledger.find_due(gym.id), Some(&gym));

    assert_eq!(ledger.remove_due(gym.id).await, Some(gym));
    assert_eq!(total_dues(ledger.state()), before);
}

#[tokio::test]
async fn test_total_dues_is_literal_sum() {
    let mut ledger = memory_ledger().await;
    for (name, amount) in [("Rent", 1200.0), ("Phone", 35.5), ("Streaming", 12.99)] {
        ledger.add_due(name, amount).await.unwrap();
    }

    let expected: i64 = ledger.dues().iter().map(|d| d.amount_cents).sum();
    assert_eq!(total_dues(ledger.state()), expected);
    assert_eq!(expected, 124849);
}

#[tokio::test]
async fn test_due_validation() {
    let mut ledger = memory_ledger().await;

    assert_eq!(
        ledger.add_due("  ", 10.0).await,
        Err(ValidationError::EmptyDueName)
    );
    for amount in [0.0, -10.0, f64::NAN] {
        assert!(matches!(
            ledger.add_due("Rent", amount).await,
            Err(ValidationError::InvalidAmount(_))
        ));
    }
    assert!(ledger.dues().is_empty());
}

#[tokio::test]
async fn test_monthly_income_is_overwritten() {
    let mut ledger = memory_ledger().await;

    assert_eq!(ledger.set_monthly_income(2000.0).await, Ok(200000));
    assert_eq!(ledger.set_monthly_income(2500.5).await, Ok(250050));
    assert_eq!(ledger.set_monthly_income(0.0).await, Ok(0));
    assert_eq!(ledger.monthly_income(), 0);
}

#[tokio::test]
async fn test_monthly_income_validation() {
    let mut ledger = memory_ledger().await;
    ledger.set_monthly_income(1000.0).await.unwrap();

    for amount in [-0.01, -500.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            ledger.set_monthly_income(amount).await,
            Err(ValidationError::InvalidIncome(_))
        ));
    }
    assert_eq!(ledger.monthly_income(), 100000);
}

#[tokio::test]
async fn test_balance_without_monthly_income() {
    let mut ledger = memory_ledger().await;
    add_income(&mut ledger, "Freelance", 800.0).await;
    add_expense(&mut ledger, "Laptop", 1100.0, "equipment").await;
    ledger.add_due("Rent", 500.0).await.unwrap();

    assert_eq!(balance(ledger.state()), -80000);
    assert_eq!(remaining_after_dues(ledger.state()), -50000);
}
