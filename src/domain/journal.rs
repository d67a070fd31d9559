//! Journal operations over a [`TradeStore`].
//!
//! This is the boundary every front end (CLI, HTTP) goes through: input
//! validation, existence checks and lifecycle guards happen here, and
//! storage failures are passed back unchanged. Nothing is retried.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::JournalError;
use super::stats::PortfolioStats;
use super::trade::{StatusKind, Trade, TradeDraft, TradeId, TradeUpdate};
use crate::ports::trade_store::TradeStore;

pub struct Journal<S> {
    store: S,
}

impl<S: TradeStore> Journal<S> {
    pub fn new(store: S) -> Self {
        Journal { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and persist a new trade. New trades always start open.
    pub fn create(&self, draft: TradeDraft) -> Result<Trade, JournalError> {
        let new = draft.validate()?;
        let trade = self.store.insert(new)?;
        tracing::info!(
            id = %trade.id,
            pair = %trade.pair,
            direction = %trade.direction,
            "trade created"
        );
        Ok(trade)
    }

    pub fn get(&self, id: TradeId) -> Result<Trade, JournalError> {
        self.store.get(id)?.ok_or(JournalError::NotFound { id })
    }

    pub fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError> {
        let trades = self.store.list(status)?;
        tracing::debug!(count = trades.len(), status = ?status, "trades listed");
        Ok(trades)
    }

    /// Close an open trade at `exit_price`. `exit_date` defaults to now.
    pub fn close(
        &self,
        id: TradeId,
        exit_price: Option<Decimal>,
        exit_date: Option<DateTime<Utc>>,
    ) -> Result<Trade, JournalError> {
        let exit_price = exit_price.ok_or_else(|| JournalError::missing("exit_price"))?;
        let mut trade = self.get(id)?;

        if let Err(e) = trade.close(exit_price, exit_date) {
            tracing::warn!(id = %id, error = %e, "close rejected");
            return Err(e);
        }

        if !self.store.update(&trade, StatusKind::Open)? {
            return Err(self.lost_race(id, StatusKind::Open)?);
        }

        tracing::info!(
            id = %id,
            pair = %trade.pair,
            profit_loss = %trade.profit_loss().unwrap_or_default(),
            "trade closed"
        );
        Ok(trade)
    }

    /// Edit an existing trade. Profit/loss is re-derived before saving, and
    /// the write only lands if the stored status is still the one read.
    pub fn update(&self, id: TradeId, update: TradeUpdate) -> Result<Trade, JournalError> {
        let mut trade = self.get(id)?;
        let read_as = trade.status_kind();
        trade.apply(update)?;

        if !self.store.update(&trade, read_as)? {
            return Err(self.lost_race(id, read_as)?);
        }
        tracing::info!(id = %id, "trade updated");
        Ok(trade)
    }

    /// Explain a guarded write that matched no row: the trade was deleted or
    /// changed status under us.
    fn lost_race(&self, id: TradeId, expected: StatusKind) -> Result<JournalError, JournalError> {
        let Some(current) = self.store.get(id)? else {
            return Ok(JournalError::NotFound { id });
        };
        tracing::warn!(
            id = %id,
            expected = %expected,
            found = %current.status_kind(),
            "trade changed concurrently"
        );
        Ok(match current.status_kind() {
            StatusKind::Closed => JournalError::already_closed(id),
            StatusKind::Open => JournalError::InvalidStateTransition {
                id,
                reason: "trade was reopened concurrently".into(),
            },
        })
    }

    pub fn delete(&self, id: TradeId) -> Result<(), JournalError> {
        if !self.store.delete(id)? {
            return Err(JournalError::NotFound { id });
        }
        tracing::info!(id = %id, "trade deleted");
        Ok(())
    }

    pub fn stats(&self) -> Result<PortfolioStats, JournalError> {
        PortfolioStats::compute(&self.store.list(None)?)
    }
}
