use thiserror::Error;

/// Input rejected before any store call. Nothing is changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount is too large, the limit is {max} cents per expense")]
    AmountTooLarge { max: i64 },

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Duplicate member: {0}")]
    DuplicateMember(String),

    #[error("Share mapping must contain at least one member")]
    EmptyMapping,

    #[error("Share for {member} must be between 0 and 1, got {share}")]
    ShareOutOfRange { member: String, share: f64 },

    #[error("Shares must add up to 100%, got {:.1}%", .sum * 100.0)]
    ShareSumMismatch { sum: f64 },

    #[error("Cannot remove {member}: {count} recorded expense(s) were paid by them")]
    MemberHasExpenses { member: String, count: usize },

    #[error("No share edit in progress")]
    NotEditing,
}
