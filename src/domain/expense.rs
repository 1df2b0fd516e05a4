use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, MAX_AMOUNT_CENTS, ValidationError};

pub type ExpenseId = Uuid;

/// A shared expense paid by one member on behalf of the group.
/// Expenses are never edited; a wrong entry is deleted and entered again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Assigned by the store on insert
    pub id: ExpenseId,
    pub description: String,
    /// Always positive
    pub amount_cents: Cents,
    /// Member name, expected to be a key of the active share mapping
    pub paid_by: String,
    /// The day the money was spent, chosen by the user
    pub expense_date: NaiveDate,
    /// Assigned by the store on insert, only used for "recently added" ordering
    pub created_at: DateTime<Utc>,
}

/// User-submitted fields of an expense, before the store assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount_cents: Cents,
    pub paid_by: String,
    pub expense_date: NaiveDate,
}

impl NewExpense {
    pub fn new(
        description: impl Into<String>,
        amount_cents: Cents,
        paid_by: impl Into<String>,
        expense_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount_cents,
            paid_by: paid_by.into(),
            expense_date,
        }
    }

    /// Check required fields. Surrounding whitespace is trimmed from text fields.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.description = self.description.trim().to_string();
        self.paid_by = self.paid_by.trim().to_string();

        if self.description.is_empty() {
            return Err(ValidationError::MissingField("description"));
        }
        if self.paid_by.is_empty() {
            return Err(ValidationError::MissingField("paid by"));
        }
        if self.amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.amount_cents > MAX_AMOUNT_CENTS {
            return Err(ValidationError::AmountTooLarge {
                max: MAX_AMOUNT_CENTS,
            });
        }
        Ok(self)
    }

    /// Attach store-assigned fields.
    pub fn into_expense(self, id: ExpenseId, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id,
            description: self.description,
            amount_cents: self.amount_cents,
            paid_by: self.paid_by,
            expense_date: self.expense_date,
            created_at,
        }
    }
}

/// Sum of amounts over any selection of expenses. Saturates instead of overflowing.
pub fn total_cents<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Cents {
    expenses
        .into_iter()
        .fold(0, |acc: Cents, e| acc.saturating_add(e.amount_cents))
}
