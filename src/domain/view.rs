use std::fmt;

use super::Expense;

/// Display order for an expense list. Every key sorts largest/newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Expense date, newest first
    #[default]
    Date,
    /// Amount, largest first
    Amount,
    /// Creation time, most recently added first
    Recent,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Amount => "amount",
            SortKey::Recent => "recent",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "amount" => Some(SortKey::Amount),
            "recent" | "recently-added" | "created" => Some(SortKey::Recent),
            _ => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which expenses to show. `paid_by: None` means all members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub paid_by: Option<String>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn paid_by(member: impl Into<String>) -> Self {
        Self {
            paid_by: Some(member.into()),
        }
    }

    /// Parse a member selector as typed by a user. "all" (any case) selects every member.
    pub fn from_selector(selector: &str) -> Self {
        let selector = selector.trim();
        if selector.is_empty() || selector.eq_ignore_ascii_case("all") {
            Self::all()
        } else {
            Self::paid_by(selector)
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match &self.paid_by {
            Some(member) => expense.paid_by == *member,
            None => true,
        }
    }
}

/// Filter then sort, leaving `expenses` untouched.
///
/// The sort is stable, so expenses with equal keys keep the order they have in `expenses`.
pub fn arrange<'a>(
    expenses: &'a [Expense],
    filter: &ExpenseFilter,
    sort: SortKey,
) -> Vec<&'a Expense> {
    let mut view: Vec<&Expense> = expenses.iter().filter(|e| filter.matches(e)).collect();
    match sort {
        SortKey::Date => view.sort_by(|a, b| b.expense_date.cmp(&a.expense_date)),
        SortKey::Amount => view.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents)),
        SortKey::Recent => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewExpense, total_cents};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn expense(
        description: &str,
        amount: i64,
        paid_by: &str,
        date: &str,
        created_min: i64,
    ) -> Expense {
        let created =
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(created_min);
        NewExpense::new(
            description,
            amount,
            paid_by,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        )
        .into_expense(Uuid::new_v4(), created)
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("rent", 50000, "Carol", "2024-05-01", 0),
            expense("taxi", 1500, "Alice", "2024-05-20", 3),
            expense("lunch", 1500, "Bob", "2024-05-10", 1),
            expense("snacks", 700, "Alice", "2024-05-20", 2),
            expense("printer", 1500, "Alice", "2024-04-28", 4),
        ]
    }

    fn descriptions(view: &[&Expense]) -> Vec<String> {
        view.iter().map(|e| e.description.clone()).collect()
    }

    #[test]
    fn test_sort_by_date_newest_first_stable() {
        let expenses = sample();
        let view = arrange(&expenses, &ExpenseFilter::all(), SortKey::Date);
        assert_eq!(
            descriptions(&view),
            ["taxi", "snacks", "lunch", "rent", "printer"]
        );
    }

    #[test]
    fn test_sort_by_amount_keeps_tie_order() {
        let expenses = sample();
        let view = arrange(&expenses, &ExpenseFilter::all(), SortKey::Amount);
        assert_eq!(
            descriptions(&view),
            ["rent", "taxi", "lunch", "printer", "snacks"]
        );
    }

    #[test]
    fn test_sort_by_recently_added() {
        let expenses = sample();
        let view = arrange(&expenses, &ExpenseFilter::all(), SortKey::Recent);
        assert_eq!(
            descriptions(&view),
            ["printer", "taxi", "snacks", "lunch", "rent"]
        );
    }

    #[test]
    fn test_filter_by_member_matches_total() {
        let expenses = sample();
        let view = arrange(&expenses, &ExpenseFilter::paid_by("Alice"), SortKey::Date);

        assert_eq!(view.len(), 3);
        assert!(view.iter().all(|e| e.paid_by == "Alice"));
        let expected: i64 = expenses
            .iter()
            .filter(|e| e.paid_by == "Alice")
            .map(|e| e.amount_cents)
            .sum();
        assert_eq!(total_cents(view.iter().copied()), expected);
    }

    #[test]
    fn test_filter_unknown_member_is_empty() {
        let expenses = sample();
        assert!(arrange(&expenses, &ExpenseFilter::paid_by("Zed"), SortKey::Amount).is_empty());
    }

    #[test]
    fn test_filter_from_selector() {
        assert_eq!(ExpenseFilter::from_selector("all"), ExpenseFilter::all());
        assert_eq!(ExpenseFilter::from_selector(" ALL "), ExpenseFilter::all());
        assert_eq!(ExpenseFilter::from_selector(""), ExpenseFilter::all());
        assert_eq!(
            ExpenseFilter::from_selector(" Alice"),
            ExpenseFilter::paid_by("Alice")
        );

        let expenses = sample();
        let view = arrange(&expenses, &ExpenseFilter::from_selector("all"), SortKey::Date);
        assert_eq!(view.len(), expenses.len());
    }

    #[test]
    fn test_arrange_does_not_mutate_source() {
        let expenses = sample();
        let before = expenses.clone();
        let _ = arrange(&expenses, &ExpenseFilter::all(), SortKey::Amount);
        assert_eq!(expenses, before);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!(SortKey::from_str("Amount"), Some(SortKey::Amount));
        assert_eq!(SortKey::from_str("recent"), Some(SortKey::Recent));
        assert_eq!(SortKey::from_str("date"), Some(SortKey::Date));
        assert_eq!(SortKey::from_str("size"), None);
        assert_eq!(SortKey::default(), SortKey::Date);
    }
}
