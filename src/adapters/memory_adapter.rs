//! In-process trade store.
//!
//! Keeps trades in a mutex-guarded map; ids count up from 1. Useful for
//! tests and throwaway sessions. `set_unavailable` makes every call fail
//! with a database error, to exercise storage-failure paths.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::error::JournalError;
use crate::domain::trade::{NewTrade, StatusKind, Trade, TradeId};
use crate::ports::trade_store::TradeStore;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    trades: BTreeMap<TradeId, Trade>,
    unavailable: Option<String>,
}

#[derive(Default)]
pub struct MemoryTradeStore {
    state: Mutex<MemoryState>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, reason: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = reason.map(str::to_string);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, JournalError> {
        let state = self.state.lock().map_err(|e| JournalError::Database {
            reason: e.to_string(),
        })?;
        if let Some(reason) = &state.unavailable {
            return Err(JournalError::Database {
                reason: reason.clone(),
            });
        }
        Ok(state)
    }
}

impl TradeStore for MemoryTradeStore {
    fn insert(&self, trade: NewTrade) -> Result<Trade, JournalError> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let trade = Trade::open(TradeId(state.next_id), trade);
        state.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        Ok(self.lock()?.trades.get(&id).cloned())
    }

    fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError> {
        Ok(self
            .lock()?
            .trades
            .values()
            .filter(|t| status.is_none_or(|s| t.status_kind() == s))
            .cloned()
            .collect())
    }

    fn update(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError> {
        let mut state = self.lock()?;
        match state.trades.get_mut(&trade.id) {
            Some(stored) if stored.status_kind() == expected => {
                *stored = trade.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete(&self, id: TradeId) -> Result<bool, JournalError> {
        Ok(self.lock()?.trades.remove(&id).is_some())
    }

    fn ping(&self) -> Result<(), JournalError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Direction;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn new_trade(pair: &str) -> NewTrade {
        NewTrade {
            date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            pair: pair.to_string(),
            direction: Direction::Long,
            entry_price: dec!(100),
            quantity: dec!(1),
            fees: dec!(0),
            stop_loss: None,
            take_profit: None,
            notes: None,
        }
    }

    #[test]
    fn ids_increase_from_one() {
        let store = MemoryTradeStore::new();
        assert_eq!(store.insert(new_trade("A")).unwrap().id, TradeId(1));
        assert_eq!(store.insert(new_trade("B")).unwrap().id, TradeId(2));
    }

    #[test]
    fn update_refuses_rows_in_another_status() {
        let store = MemoryTradeStore::new();
        let mut trade = store.insert(new_trade("A")).unwrap();
        trade.close(dec!(110), None).unwrap();
        assert!(store.update(&trade, StatusKind::Open).unwrap());

        let mut again = store.get(trade.id).unwrap().unwrap();
        again.notes = Some("second writer".into());
        assert!(!store.update(&again, StatusKind::Open).unwrap());
        assert_eq!(store.get(trade.id).unwrap().unwrap().notes, None);

        assert!(store.update(&again, StatusKind::Closed).unwrap());
        assert_eq!(
            store.get(trade.id).unwrap().unwrap().notes.as_deref(),
            Some("second writer")
        );
    }

    #[test]
    fn update_missing_row_returns_false() {
        let store = MemoryTradeStore::new();
        let trade = Trade::open(TradeId(42), new_trade("A"));
        assert!(!store.update(&trade, StatusKind::Open).unwrap());
        assert!(!store.delete(TradeId(42)).unwrap());
    }

    #[test]
    fn unavailable_store_reports_database_error() {
        let store = MemoryTradeStore::new();
        store.set_unavailable(Some("offline"));
        assert!(matches!(
            store.list(None),
            Err(JournalError::Database { ref reason }) if reason == "offline"
        ));
        assert!(store.ping().is_err());

        store.set_unavailable(None);
        assert!(store.ping().is_ok());
    }
}
