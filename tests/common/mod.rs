// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use groupsplit::application::{ExpenseService, GroupSession};
use groupsplit::domain::{Member, NewExpense, ShareMapping};
use tempfile::TempDir;

/// Helper to create a service over a temporary database seeded with the default group
pub async fn test_service() -> Result<(ExpenseService, TempDir)> {
    test_service_with(ShareMapping::default_group()).await
}

pub async fn test_service_with(shares: ShareMapping) -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ExpenseService::init(db_path.to_str().unwrap(), shares).await?;
    Ok((service, temp_dir))
}

/// Helper to create a loaded session over a temporary database
pub async fn test_session() -> Result<(GroupSession, TempDir)> {
    let (service, temp) = test_service().await?;
    let session = GroupSession::load(service).await?;
    Ok((session, temp))
}

/// Helper to parse a date string into NaiveDate
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn new_expense(description: &str, amount_cents: i64, paid_by: &str, on: &str) -> NewExpense {
    NewExpense::new(description, amount_cents, paid_by, date(on))
}

/// Four members with uneven shares
pub fn four_way_split() -> ShareMapping {
    ShareMapping::new(vec![
        Member::new("Ann", 0.1),
        Member::new("Ben", 0.2),
        Member::new("Cat", 0.3),
        Member::new("Dan", 0.4),
    ])
    .unwrap()
}

async fn raw_execute(temp: &TempDir, sql: &str) -> Result<()> {
    let url = format!("sqlite:{}", temp.path().join("test.db").display());
    let pool = sqlx::SqlitePool::connect(&url).await?;
    sqlx::query(sql).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Write a row the store cannot decode, as another misbehaving client might.
/// Every list call fails until it is removed again.
pub async fn insert_undecodable_expense(temp: &TempDir) -> Result<()> {
    raw_execute(
        temp,
        "INSERT INTO expenses (id, description, amount_cents, paid_by, expense_date, created_at) \
         VALUES ('not-a-uuid', 'Broken', 100, 'Alice', '2024-01-01', '2024-01-01T00:00:00Z')",
    )
    .await
}

pub async fn remove_undecodable_expense(temp: &TempDir) -> Result<()> {
    raw_execute(temp, "DELETE FROM expenses WHERE id = 'not-a-uuid'").await
}
