use serde::Serialize;

use super::{Cents, Expense, ExpenseId, ShareMapping};

/// Balances closer to zero than this are shown as settled.
pub const SETTLED_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    /// The group owes this member money
    GetsBack,
    /// This member owes the group money
    Owes,
    Settled,
}

impl BalanceStatus {
    pub fn of(balance: f64) -> Self {
        if balance > SETTLED_TOLERANCE {
            BalanceStatus::GetsBack
        } else if balance < -SETTLED_TOLERANCE {
            BalanceStatus::Owes
        } else {
            BalanceStatus::Settled
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::GetsBack => "Gets back",
            BalanceStatus::Owes => "Owes",
            BalanceStatus::Settled => "Settled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberBalance {
    pub name: String,
    pub share: f64,
    /// Signed, in currency units. Positive means the member is owed money.
    pub balance: f64,
}

impl MemberBalance {
    pub fn status(&self) -> BalanceStatus {
        BalanceStatus::of(self.balance)
    }
}

/// Net position of every member for a set of expenses under one share mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    /// One entry per member, in share mapping order
    pub balances: Vec<MemberBalance>,
    /// Expenses whose payer is not in the share mapping; their credit was dropped
    pub orphaned: Vec<ExpenseId>,
    pub total_cents: Cents,
}

impl Settlement {
    pub fn balance_of(&self, name: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.balance)
    }

    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty()
    }
}

/// Compute each member's balance.
///
/// Every expense credits its payer with the full amount and debits every member
/// `amount * share`. The result does not depend on the order of `expenses`.
///
/// An expense paid by someone outside `shares` still debits every member, but the
/// credit has nowhere to go and is dropped; the expense id is reported in
/// [`Settlement::orphaned`].
pub fn compute_settlement(expenses: &[Expense], shares: &ShareMapping) -> Settlement {
    let members = shares.members();
    // Sums are kept in i128 so no number of stored records can overflow them.
    let mut credits: Vec<i128> = vec![0; members.len()];
    let mut orphaned = Vec::new();
    let mut total: i128 = 0;

    for expense in expenses {
        let amount = i128::from(expense.amount_cents);
        total += amount;
        match members.iter().position(|m| m.name == expense.paid_by) {
            Some(idx) => credits[idx] += amount,
            None => orphaned.push(expense.id),
        }
    }

    // Debits are linear in the amount, so they can be taken from the total once
    // instead of per expense. This keeps the float error independent of order.
    let total_units = wide_cents_to_units(total);

    let balances = members
        .iter()
        .zip(credits)
        .map(|(member, credit)| MemberBalance {
            name: member.name.clone(),
            share: member.share,
            balance: wide_cents_to_units(credit) - total_units * member.share,
        })
        .collect();

    Settlement {
        balances,
        orphaned,
        total_cents: Cents::try_from(total).unwrap_or(Cents::MAX),
    }
}

fn wide_cents_to_units(cents: i128) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MAX_AMOUNT_CENTS, Member, NewExpense, cents_to_units};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    const EPS: f64 = 1e-9;

    fn expense(amount_cents: Cents, paid_by: &str) -> Expense {
        NewExpense::new(
            "test",
            amount_cents,
            paid_by,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .into_expense(Uuid::new_v4(), Utc::now())
    }

    fn sum_of(settlement: &Settlement) -> f64 {
        settlement.balances.iter().map(|b| b.balance).sum()
    }

    #[test]
    fn test_single_expense_example() {
        let shares = ShareMapping::default_group();
        let settlement = compute_settlement(&[expense(10000, "Alice")], &shares);

        assert!((settlement.balance_of("Alice").unwrap() - 70.0).abs() < EPS);
        assert!((settlement.balance_of("Bob").unwrap() + 30.0).abs() < EPS);
        assert!((settlement.balance_of("Carol").unwrap() + 40.0).abs() < EPS);
        assert_eq!(settlement.total_cents, 10000);
        assert!(settlement.is_consistent());
    }

    #[test]
    fn test_no_expenses_everyone_settled() {
        let settlement = compute_settlement(&[], &ShareMapping::default_group());
        assert_eq!(settlement.balances.len(), 3);
        for b in &settlement.balances {
            assert_eq!(b.balance, 0.0);
            assert_eq!(b.status(), BalanceStatus::Settled);
        }
    }

    #[test]
    fn test_balances_sum_to_zero() {
        let shares = ShareMapping::new(vec![
            Member::new("Ann", 0.25),
            Member::new("Ben", 0.15),
            Member::new("Cat", 0.35),
            Member::new("Dan", 0.25),
        ])
        .unwrap();
        let expenses = vec![
            expense(1999, "Ann"),
            expense(333, "Ben"),
            expense(123457, "Dan"),
            expense(1, "Cat"),
            expense(4200, "Ann"),
        ];

        let settlement = compute_settlement(&expenses, &shares);
        assert!(sum_of(&settlement).abs() < 1e-6);
    }

    #[test]
    fn test_order_independent() {
        let shares = ShareMapping::default_group();
        let mut expenses = vec![
            expense(1001, "Alice"),
            expense(2333, "Bob"),
            expense(71, "Carol"),
            expense(9999, "Bob"),
        ];

        let forward = compute_settlement(&expenses, &shares);
        expenses.reverse();
        let backward = compute_settlement(&expenses, &shares);
        expenses.swap(0, 2);
        let shuffled = compute_settlement(&expenses, &shares);

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_single_expense_formula_for_any_payer() {
        let shares = ShareMapping::default_group();
        for payer in ["Alice", "Bob", "Carol"] {
            let settlement = compute_settlement(&[expense(4550, payer)], &shares);
            for member in shares.members() {
                let expected = if member.name == payer {
                    45.5 - 45.5 * member.share
                } else {
                    -45.5 * member.share
                };
                let actual = settlement.balance_of(&member.name).unwrap();
                assert!((actual - expected).abs() < EPS, "{}: {}", member.name, actual);
            }
        }
    }

    #[test]
    fn test_orphaned_payer_credit_dropped() {
        let shares = ShareMapping::default_group();
        let stray = expense(10000, "Mallory");
        let settlement = compute_settlement(std::slice::from_ref(&stray), &shares);

        assert_eq!(settlement.orphaned, vec![stray.id]);
        assert!(!settlement.is_consistent());
        assert!((settlement.balance_of("Alice").unwrap() + 30.0).abs() < EPS);
        assert!((sum_of(&settlement) + 100.0).abs() < EPS);
    }

    #[test]
    fn test_largest_amounts_do_not_overflow() {
        let shares = ShareMapping::default_group();
        let expenses = vec![
            expense(MAX_AMOUNT_CENTS, "Alice"),
            expense(MAX_AMOUNT_CENTS, "Bob"),
            expense(MAX_AMOUNT_CENTS, "Carol"),
        ];

        let settlement = compute_settlement(&expenses, &shares);
        assert_eq!(settlement.total_cents, 3 * MAX_AMOUNT_CENTS);
        let total_units = cents_to_units(3 * MAX_AMOUNT_CENTS);
        let alice = settlement.balance_of("Alice").unwrap();
        assert!((alice - (cents_to_units(MAX_AMOUNT_CENTS) - total_units * 0.3)).abs() < 1.0);
        assert!(sum_of(&settlement).abs() < 1.0);
    }

    #[test]
    fn test_sums_past_cents_max_do_not_panic() {
        let shares = ShareMapping::default_group();
        let expenses = vec![expense(Cents::MAX, "Alice"), expense(Cents::MAX, "Bob")];

        let settlement = compute_settlement(&expenses, &shares);
        assert_eq!(settlement.total_cents, Cents::MAX);
        assert!(settlement.balance_of("Alice").unwrap() > 0.0);
        assert!(settlement.balance_of("Carol").unwrap() < 0.0);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(BalanceStatus::of(12.0), BalanceStatus::GetsBack);
        assert_eq!(BalanceStatus::of(-0.01), BalanceStatus::Owes);
        assert_eq!(BalanceStatus::of(0.004), BalanceStatus::Settled);
        assert_eq!(BalanceStatus::of(-0.004), BalanceStatus::Settled);
    }
}
