use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Expense, ExpenseId, Member, NewExpense, ShareMapping};

use super::MIGRATION_001_INITIAL;

const EXPENSE_DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store for expenses and the active share mapping.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Connect and migrate.
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Expense operations
    // ========================

    /// Insert an expense. The store assigns its id and creation time.
    pub async fn insert_expense(&self, new_expense: NewExpense) -> Result<Expense> {
        let expense = new_expense.into_expense(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO expenses (id, description, amount_cents, paid_by, expense_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(&expense.paid_by)
        .bind(expense.expense_date.format(EXPENSE_DATE_FORMAT).to_string())
        .bind(expense.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert expense")?;

        Ok(expense)
    }

    /// All expenses, newest expense date first.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, amount_cents, paid_by, expense_date, created_at
            FROM expenses
            ORDER BY expense_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(
            r#"
            SELECT id, description, amount_cents, paid_by, expense_date, created_at
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch expense")?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    /// Delete an expense. Returns false if no expense had that id.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete expense")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let date_str: String = row.get("expense_date");
        let created_at_str: String = row.get("created_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            description: row.get("description"),
            amount_cents: row.get("amount_cents"),
            paid_by: row.get("paid_by"),
            expense_date: NaiveDate::parse_from_str(&date_str, EXPENSE_DATE_FORMAT)
                .context("Invalid expense date")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Share mapping operations
    // ========================

    /// Load the stored share mapping, or `None` if no members were ever saved.
    pub async fn load_shares(&self) -> Result<Option<ShareMapping>> {
        let rows = sqlx::query("SELECT name, share FROM members ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load share mapping")?;

        if rows.is_empty() {
            return Ok(None);
        }

        let members = rows
            .iter()
            .map(|row| Member::new(row.get::<String, _>("name"), row.get::<f64, _>("share")))
            .collect();
        let mapping = ShareMapping::new(members).context("Stored share mapping is invalid")?;
        Ok(Some(mapping))
    }

    /// Replace the stored share mapping in a single transaction.
    pub async fn replace_shares(&self, mapping: &ShareMapping) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query("DELETE FROM members")
            .execute(&mut *tx)
            .await
            .context("Failed to clear share mapping")?;

        for (position, member) in mapping.members().iter().enumerate() {
            sqlx::query("INSERT INTO members (position, name, share) VALUES (?, ?, ?)")
                .bind(position as i64)
                .bind(&member.name)
                .bind(member.share)
                .execute(&mut *tx)
                .await
                .context("Failed to save member share")?;
        }

        tx.commit().await.context("Failed to commit share mapping")?;
        Ok(())
    }

    /// Store `mapping` only if no share mapping exists yet. Returns true if it was stored.
    pub async fn seed_shares(&self, mapping: &ShareMapping) -> Result<bool> {
        if self.load_shares().await?.is_some() {
            return Ok(false);
        }
        self.replace_shares(mapping).await?;
        Ok(true)
    }

    /// Number of expenses paid by each member name, including names outside the mapping.
    pub async fn count_expenses_by_payer(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT paid_by, COUNT(*) AS count FROM expenses GROUP BY paid_by ORDER BY paid_by",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count expenses by payer")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("paid_by"), row.get("count")))
            .collect())
    }
}
