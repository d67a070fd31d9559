#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::cell::Cell;
use tradejournal::adapters::memory_adapter::MemoryTradeStore;
use tradejournal::adapters::sqlite_adapter::SqliteTradeStore;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::journal::Journal;
use tradejournal::domain::trade::{NewTrade, StatusKind, Trade, TradeDraft, TradeId};
use tradejournal::ports::trade_store::TradeStore;

/// Store wrapper that simulates other writers and storage outages.
pub struct MockTradeStore {
    pub inner: MemoryTradeStore,
    /// When set, the next `update` first closes the stored row behind the
    /// caller's back, as a concurrent close would.
    pub race_close: Cell<bool>,
    /// When set, every write fails with this reason.
    pub write_error: Option<String>,
}

impl MockTradeStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryTradeStore::new(),
            race_close: Cell::new(false),
            write_error: None,
        }
    }

    pub fn with_write_error(mut self, reason: &str) -> Self {
        self.write_error = Some(reason.to_string());
        self
    }

    fn check_write(&self) -> Result<(), JournalError> {
        match &self.write_error {
            Some(reason) => Err(JournalError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TradeStore for MockTradeStore {
    fn insert(&self, trade: NewTrade) -> Result<Trade, JournalError> {
        self.check_write()?;
        self.inner.insert(trade)
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        self.inner.get(id)
    }

    fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError> {
        self.inner.list(status)
    }

    fn update(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError> {
        self.check_write()?;
        if self.race_close.replace(false) {
            let mut other = self.inner.get(trade.id)?.expect("raced trade exists");
            other.close(Decimal::ONE, Some(ts(2030, 1, 1)))?;
            assert!(self.inner.update(&other, StatusKind::Open)?);
        }
        self.inner.update(trade, expected)
    }

    fn delete(&self, id: TradeId) -> Result<bool, JournalError> {
        self.check_write()?;
        self.inner.delete(id)
    }
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn draft(pair: &str, direction: &str, entry: Decimal, quantity: Decimal, fees: Decimal) -> TradeDraft {
    TradeDraft {
        date: Some("2024-01-15".into()),
        pair: Some(pair.into()),
        direction: Some(direction.into()),
        entry_price: Some(entry),
        quantity: Some(quantity),
        fees: Some(fees),
        ..Default::default()
    }
}

pub fn memory_journal() -> Journal<MemoryTradeStore> {
    Journal::new(MemoryTradeStore::new())
}

pub fn sqlite_journal() -> Journal<SqliteTradeStore> {
    let store = SqliteTradeStore::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Journal::new(store)
}

/// Seed a journal with trades whose closed P/L is +100, -40, +20, plus one open trade.
pub fn seed_dashboard<S: TradeStore>(journal: &Journal<S>) -> Vec<Trade> {
    let one = Decimal::ONE;
    let zero = Decimal::ZERO;
    let entry = Decimal::from(100);

    let specs: [(&str, Option<i64>); 4] = [
        ("BTC/USD", Some(200)),
        ("ETH/USD", Some(60)),
        ("BTC/USD", None),
        ("SOL/USD", Some(120)),
    ];

    specs
        .iter()
        .map(|(pair, exit)| {
            let trade = journal.create(draft(pair, "long", entry, one, zero)).unwrap();
            match exit {
                Some(exit) => journal
                    .close(trade.id, Some(Decimal::from(*exit)), Some(ts(2024, 2, 1)))
                    .unwrap(),
                None => trade,
            }
        })
        .collect()
}
