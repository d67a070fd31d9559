//! SQLite trade store.
//!
//! Decimals are stored as TEXT to keep them exact; timestamps as RFC 3339
//! TEXT. The stored `profit_loss` column is informational: it is recomputed
//! from the other columns whenever a row is loaded.

use crate::domain::error::JournalError;
use crate::domain::trade::{Direction, NewTrade, StatusKind, Trade, TradeId};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;

const SELECT_COLUMNS: &str = "SELECT id, date, pair, direction, entry_price, quantity, fees,
        stop_loss, take_profit, notes, status, exit_price, exit_date
     FROM trades";

pub struct SqliteTradeStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteTradeStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        if db_path.trim() == ":memory:" {
            return Self::in_memory();
        }

        let pool_size = config.get_int("database", "pool_size", 4);
        if pool_size < 1 {
            return Err(JournalError::ConfigInvalid {
                section: "database".into(),
                key: "pool_size".into(),
                reason: "must be at least 1".into(),
            });
        }

        let manager = SqliteConnectionManager::file(db_path.trim());
        let pool = Pool::builder()
            .max_size(pool_size as u32)
            .build(manager)
            .map_err(pool_err)?;

        tracing::debug!(path = %db_path, pool_size, "sqlite pool ready");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS trades (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    pair TEXT NOT NULL,
                    direction TEXT NOT NULL CHECK (direction IN ('long', 'short')),
                    entry_price TEXT NOT NULL,
                    quantity TEXT NOT NULL,
                    fees TEXT NOT NULL DEFAULT '0',
                    stop_loss TEXT,
                    take_profit TEXT,
                    notes TEXT,
                    status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
                    exit_price TEXT,
                    exit_date TEXT,
                    profit_loss TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status);",
            )
            .map_err(query_err)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool.get().map_err(pool_err)
    }

    fn write(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError> {
        let cols = TradeColumns::from(trade);
        let changed = self
            .conn()?
            .execute(
                "UPDATE trades SET date = ?1, pair = ?2, direction = ?3, entry_price = ?4,
                    quantity = ?5, fees = ?6, stop_loss = ?7, take_profit = ?8, notes = ?9,
                    status = ?10, exit_price = ?11, exit_date = ?12, profit_loss = ?13,
                    updated_at = ?14
                 WHERE id = ?15 AND status = ?16",
                params![
                    cols.date,
                    cols.pair,
                    cols.direction,
                    cols.entry_price,
                    cols.quantity,
                    cols.fees,
                    cols.stop_loss,
                    cols.take_profit,
                    cols.notes,
                    cols.status,
                    cols.exit_price,
                    cols.exit_date,
                    cols.profit_loss,
                    Utc::now().to_rfc3339(),
                    trade.id.0,
                    expected.as_str()
                ],
            )
            .map_err(query_err)?;

        Ok(changed > 0)
    }
}

impl TradeStore for SqliteTradeStore {
    fn insert(&self, trade: NewTrade) -> Result<Trade, JournalError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO trades (date, pair, direction, entry_price, quantity, fees,
                stop_loss, take_profit, notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'open', ?10, ?10)",
            params![
                trade.date.to_rfc3339(),
                trade.pair,
                trade.direction.as_str(),
                trade.entry_price.to_string(),
                trade.quantity.to_string(),
                trade.fees.to_string(),
                trade.stop_loss.map(|d| d.to_string()),
                trade.take_profit.map(|d| d.to_string()),
                trade.notes,
                now
            ],
        )
        .map_err(query_err)?;

        let id = TradeId(conn.last_insert_rowid());
        Ok(Trade::open(id, trade))
    }

    fn get(&self, id: TradeId) -> Result<Option<Trade>, JournalError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        self.conn()?
            .query_row(&sql, params![id.0], row_to_trade)
            .optional()
            .map_err(query_err)
    }

    fn list(&self, status: Option<StatusKind>) -> Result<Vec<Trade>, JournalError> {
        let conn = self.conn()?;
        let status_str = status.map(|s| s.as_str());
        let sql = format!("{SELECT_COLUMNS} WHERE ?1 IS NULL OR status = ?1 ORDER BY id ASC");

        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(params![status_str], row_to_trade)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }
        Ok(trades)
    }

    fn update(&self, trade: &Trade, expected: StatusKind) -> Result<bool, JournalError> {
        self.write(trade, expected)
    }

    fn delete(&self, id: TradeId) -> Result<bool, JournalError> {
        let changed = self
            .conn()?
            .execute("DELETE FROM trades WHERE id = ?1", params![id.0])
            .map_err(query_err)?;
        Ok(changed > 0)
    }

    fn ping(&self) -> Result<(), JournalError> {
        self.conn()?
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(query_err)
    }
}

/// A trade flattened into column values.
struct TradeColumns {
    date: String,
    pair: String,
    direction: &'static str,
    entry_price: String,
    quantity: String,
    fees: String,
    stop_loss: Option<String>,
    take_profit: Option<String>,
    notes: Option<String>,
    status: &'static str,
    exit_price: Option<String>,
    exit_date: Option<String>,
    profit_loss: Option<String>,
}

impl From<&Trade> for TradeColumns {
    fn from(trade: &Trade) -> Self {
        TradeColumns {
            date: trade.date.to_rfc3339(),
            pair: trade.pair.clone(),
            direction: trade.direction.as_str(),
            entry_price: trade.entry_price.to_string(),
            quantity: trade.quantity.to_string(),
            fees: trade.fees.to_string(),
            stop_loss: trade.stop_loss.map(|d| d.to_string()),
            take_profit: trade.take_profit.map(|d| d.to_string()),
            notes: trade.notes.clone(),
            status: trade.status_kind().as_str(),
            exit_price: trade.exit_price().map(|d| d.to_string()),
            exit_date: trade.exit_date().map(|d| d.to_rfc3339()),
            profit_loss: trade.profit_loss().map(|d| d.to_string()),
        }
    }
}

fn row_to_trade(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let id = TradeId(row.get(0)?);
    let new = NewTrade {
        date: timestamp_col(row, 1)?,
        pair: row.get(2)?,
        direction: parsed_col::<Direction>(row, 3)?,
        entry_price: parsed_col::<Decimal>(row, 4)?,
        quantity: parsed_col::<Decimal>(row, 5)?,
        fees: parsed_col::<Decimal>(row, 6)?,
        stop_loss: optional_decimal_col(row, 7)?,
        take_profit: optional_decimal_col(row, 8)?,
        notes: row.get(9)?,
    };

    let status = parsed_col::<StatusKind>(row, 10)?;
    let exit = match status {
        StatusKind::Open => None,
        StatusKind::Closed => {
            let exit_price = optional_decimal_col(row, 11)?;
            let exit_date: Option<String> = row.get(12)?;
            match (exit_price, exit_date) {
                (Some(price), Some(date)) => Some((price, parse_timestamp_text(12, &date)?)),
                _ => {
                    return Err(conversion_err(
                        11,
                        format!("closed trade {id} is missing exit data"),
                    ));
                }
            }
        }
    };

    Trade::restore(id, new, exit).map_err(|e| conversion_err(11, e.to_string()))
}

fn parsed_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text: String = row.get(idx)?;
    text.parse::<T>()
        .map_err(|e| conversion_err(idx, format!("'{text}': {e}")))
}

fn optional_decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        Decimal::from_str(&t).map_err(|e| conversion_err(idx, format!("'{t}': {e}")))
    })
    .transpose()
}

fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp_text(idx, &text)
}

fn parse_timestamp_text(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, format!("'{text}': {e}")))
}

fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn pool_err(e: r2d2::Error) -> JournalError {
    JournalError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> JournalError {
    JournalError::DatabaseQuery {
        reason: e.to_string(),
    }
}
