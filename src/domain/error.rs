//! Domain error types.

use super::trade::TradeId;

/// Top-level error type for the trading journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("trade {id} not found")]
    NotFound { id: TradeId },

    #[error("invalid state transition for trade {id}: {reason}")]
    InvalidStateTransition { id: TradeId, reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        JournalError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::validation(field, "is required")
    }

    /// A computed amount does not fit in a `Decimal`.
    pub fn out_of_range(field: impl Into<String>) -> Self {
        Self::validation(field, "result is out of range")
    }

    pub fn already_closed(id: TradeId) -> Self {
        JournalError::InvalidStateTransition {
            id,
            reason: "trade is already closed".into(),
        }
    }

    /// True for failures that originate in the storage collaborator.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. }
        )
    }
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) | JournalError::Csv { .. } => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. } => 3,
            JournalError::Validation { .. } => 4,
            JournalError::NotFound { .. } => 5,
            JournalError::InvalidStateTransition { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
