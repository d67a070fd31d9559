//! Trade persistence port.

use crate::domain::error::JournalError;
use crate::domain::trade::{NewTrade, StatusKind, Trade, TradeId};

/// Storage collaborator for journal trades.
///
/// Implementations assign ids, persist the full field set of a [`Trade`],
/// and surface their own failures as `Database`/`DatabaseQuery` errors.
pub trait TradeStore {
    /// Persist a new open trade and return it with its assigned id.
    fn insert(&self, trade: NewTrade) -> Result<Trade, JournalError>;

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError>;

    /// All trades in insertion order, optionally restricted to one status.
    fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError>;

    /// Overwrite a stored trade, but only while its stored status is still
    /// `expected`. Returns `false` if no row with that id and status exists.
    fn update(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError>;

    /// Returns `false` if the id does not exist.
    fn delete(&self, id: TradeId) -> Result<bool, JournalError>;

    /// Cheap connectivity check.
    fn ping(&self) -> Result<(), JournalError> {
        self.list(Some(StatusKind::Open)).map(|_| ())
    }
}

impl<T: TradeStore + ?Sized> TradeStore for std::sync::Arc<T> {
    fn insert(&self, trade: NewTrade) -> Result<Trade, JournalError> {
        (**self).insert(trade)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        (**self).get(id)
    }

    fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError> {
        (**self).list(status)
    }

    fn update(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError> {
        (**self).update(trade, expected)
    }

    fn delete(&self, id: TradeId) -> Result<bool, JournalError> {
        (**self).delete(id)
    }

    fn ping(&self) -> Result<(), JournalError> {
        (**self).ping()
    }
}
