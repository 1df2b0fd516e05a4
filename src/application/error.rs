use thiserror::Error;

use crate::domain::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    /// The store could not be reached or rejected the operation. Prior state is kept.
    #[error("Expense store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Nothing selected to export")]
    EmptySelection,

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl AppError {
    /// True for failures the user can fix by changing their input.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
