use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::domain::{Expense, ExpenseId, NewExpense, ShareMapping, ValidationError};
use crate::storage::Repository;

use super::AppError;

/// Use cases over the expense store. Every input is validated before the store is touched.
pub struct ExpenseService {
    repo: Repository,
    fallback_shares: ShareMapping,
}

/// A payer name found on stored expenses that is missing from the share mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedPayer {
    pub name: String,
    pub expense_count: i64,
}

impl ExpenseService {
    /// `fallback_shares` is used when the store has no share mapping saved.
    pub fn new(repo: Repository, fallback_shares: ShareMapping) -> Self {
        Self {
            repo,
            fallback_shares,
        }
    }

    /// Create (if needed) and migrate the database, seeding `default_shares`
    /// unless a share mapping is already stored.
    pub async fn init(database_path: &str, default_shares: ShareMapping) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        if repo.seed_shares(&default_shares).await? {
            info!(members = default_shares.len(), "Seeded default share mapping");
        }
        Ok(Self::new(repo, default_shares))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, fallback_shares: ShareMapping) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, fallback_shares))
    }

    // ========================
    // Expenses
    // ========================

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        let expenses = self.repo.list_expenses().await?;
        debug!(count = expenses.len(), "Fetched expenses");
        Ok(expenses)
    }

    /// Record a new expense. The payer must be a member of the active share mapping.
    pub async fn add_expense(&self, new_expense: NewExpense) -> Result<Expense, AppError> {
        let new_expense = new_expense.validate()?;
        let shares = self.shares().await?;
        if !shares.contains(&new_expense.paid_by) {
            return Err(ValidationError::UnknownMember(new_expense.paid_by).into());
        }

        let expense = self.repo.insert_expense(new_expense).await?;
        info!(
            expense_id = %expense.id,
            amount_cents = expense.amount_cents,
            paid_by = %expense.paid_by,
            "Recorded expense"
        );
        Ok(expense)
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, AppError> {
        self.repo
            .get_expense(id)
            .await?
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))
    }

    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), AppError> {
        if !self.repo.delete_expense(id).await? {
            return Err(AppError::ExpenseNotFound(id.to_string()));
        }
        info!(expense_id = %id, "Deleted expense");
        Ok(())
    }

    // ========================
    // Share mapping
    // ========================

    /// The active share mapping.
    pub async fn shares(&self) -> Result<ShareMapping, AppError> {
        match self.repo.load_shares().await? {
            Some(shares) => Ok(shares),
            None => {
                warn!("No share mapping stored, using configured default");
                Ok(self.fallback_shares.clone())
            }
        }
    }

    /// Replace the active share mapping.
    ///
    /// Rejected if it drops a current member who has paid for any recorded expense.
    pub async fn save_shares(&self, mapping: &ShareMapping) -> Result<(), AppError> {
        let current = self.shares().await?;
        let counts = self.repo.count_expenses_by_payer().await?;

        for member in current.members() {
            if mapping.contains(&member.name) {
                continue;
            }
            if let Some((_, count)) = counts.iter().find(|(name, _)| *name == member.name) {
                return Err(ValidationError::MemberHasExpenses {
                    member: member.name.clone(),
                    count: *count as usize,
                }
                .into());
            }
        }

        self.repo.replace_shares(mapping).await?;
        let names: Vec<&str> = mapping.names().collect();
        info!(members = ?names, "Share mapping updated");
        Ok(())
    }

    /// Payers on stored expenses that are not in the active share mapping.
    pub async fn orphaned_payers(&self) -> Result<Vec<OrphanedPayer>, AppError> {
        let shares = self.shares().await?;
        let members: HashSet<&str> = shares.names().collect();

        let orphans: Vec<OrphanedPayer> = self
            .repo
            .count_expenses_by_payer()
            .await?
            .into_iter()
            .filter(|(name, _)| !members.contains(name.as_str()))
            .map(|(name, expense_count)| OrphanedPayer {
                name,
                expense_count,
            })
            .collect();

        for orphan in &orphans {
            warn!(payer = %orphan.name, count = orphan.expense_count, "Expenses paid by non-member");
        }
        Ok(orphans)
    }
}
